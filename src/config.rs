use crate::coord::LatLng;
use crate::detection::{DetectorSettings, FilterConfig, FilterPreset};
use crate::error::TreefallError;
use crate::pipeline::NetworkPolicy;
use crate::projection::{
    DEFAULT_SCALE, DEFAULT_TILE_SIZE, DEFAULT_ZOOM, MAX_ZOOM_LEVEL, TileRequest,
};
use crate::risk::RiskConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}

fn default_size() -> u32 {
    DEFAULT_TILE_SIZE
}

fn default_scale() -> f64 {
    DEFAULT_SCALE
}

/// Everything one assessment run needs besides its collaborators.
///
/// Only `preset` is required when deserialising; explicit `filter` or
/// `detector` sections replace the preset's values wholesale.
///
/// # Example
/// ```
/// use treefall_rs::{AssessmentConfig, FilterPreset};
///
/// let config = AssessmentConfig::new(FilterPreset::Loose)
///     .zoom(20)
///     .scale(2.0)
///     .fall_multiplier(1.5);
/// assert_eq!(config.filter_config().min_box_px, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub preset: FilterPreset,
    #[serde(default)]
    pub filter: Option<FilterConfig>,
    #[serde(default)]
    pub detector: Option<DetectorSettings>,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub network: NetworkPolicy,
}

impl AssessmentConfig {
    pub fn new(preset: FilterPreset) -> Self {
        Self {
            preset,
            filter: None,
            detector: None,
            zoom: DEFAULT_ZOOM,
            size: DEFAULT_TILE_SIZE,
            scale: DEFAULT_SCALE,
            risk: RiskConfig::default(),
            network: NetworkPolicy::default(),
        }
    }

    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn fall_multiplier(mut self, fall_multiplier: f64) -> Self {
        self.risk.fall_multiplier = fall_multiplier;
        self
    }

    pub fn network(mut self, network: NetworkPolicy) -> Self {
        self.network = network;
        self
    }

    /// Overrides the preset's filter thresholds.
    pub fn filter(mut self, filter: FilterConfig) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Overrides the preset's detector settings.
    pub fn detector(mut self, detector: DetectorSettings) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn filter_config(&self) -> FilterConfig {
        self.filter.unwrap_or_else(|| self.preset.filter_config())
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        self.detector
            .unwrap_or_else(|| self.preset.detector_settings())
    }

    pub fn tile_request(&self, center: LatLng) -> TileRequest {
        TileRequest::new(center)
            .zoom(self.zoom)
            .size(self.size)
            .scale(self.scale)
    }

    pub fn validate(&self) -> Result<(), TreefallError> {
        if self.zoom > MAX_ZOOM_LEVEL {
            return Err(TreefallError::InvalidZoomLevel(self.zoom));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(TreefallError::InvalidScale(self.scale));
        }
        if self.size == 0 {
            return Err(TreefallError::InvalidTileDimensions {
                width: self.size,
                height: self.size,
            });
        }
        if self.network.max_attempts == 0 {
            return Err(TreefallError::ConfigError(
                "network.max_attempts must be at least 1".to_string(),
            ));
        }
        self.filter_config().validate()?;
        self.risk.validate()
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(s: &str) -> Result<Self, TreefallError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| TreefallError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TreefallError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TreefallError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&text)
    }
}
