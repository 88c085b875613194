use crate::coord::PixelCoord;
use crate::error::TreefallError;
use log::debug;
use serde::{Deserialize, Serialize};

/// One bounding box reported by the tree-crown detector, in pixels of a
/// single tile image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub score: f64,
    pub label: String,
}

impl Detection {
    /// Creates a detection after checking box ordering and score range.
    pub fn new(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        score: f64,
        label: impl Into<String>,
    ) -> Result<Self, TreefallError> {
        let detection = Self {
            xmin,
            ymin,
            xmax,
            ymax,
            score,
            label: label.into(),
        };
        detection.validate()?;
        Ok(detection)
    }

    /// Checks the invariants a detector is expected to uphold.
    pub fn validate(&self) -> Result<(), TreefallError> {
        let values = [self.xmin, self.ymin, self.xmax, self.ymax, self.score];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TreefallError::InvalidDetection(
                "Box and score must be finite".to_string(),
            ));
        }
        if self.xmin >= self.xmax || self.ymin >= self.ymax {
            return Err(TreefallError::InvalidDetection(format!(
                "Degenerate box ({}, {}, {}, {})",
                self.xmin, self.ymin, self.xmax, self.ymax
            )));
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(TreefallError::InvalidDetection(format!(
                "Score {} outside [0, 1]",
                self.score
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Pixel centroid of the box.
    pub fn center(&self) -> PixelCoord {
        PixelCoord::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }
}

/// Settings handed through to the external detector untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// IoU threshold for the detector's own non-max suppression
    pub nms_threshold: f64,
    /// Edge of the square patches the image is tiled into
    pub patch_size: u32,
    /// Fractional overlap between neighbouring patches
    pub patch_overlap: f64,
}

/// Post-detection thresholds. Box bounds are inclusive on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub score_threshold: f64,
    pub min_box_px: u32,
    pub max_box_px: u32,
}

impl FilterConfig {
    pub fn new(
        score_threshold: f64,
        min_box_px: u32,
        max_box_px: u32,
    ) -> Result<Self, TreefallError> {
        let config = Self {
            score_threshold,
            min_box_px,
            max_box_px,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TreefallError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(TreefallError::InvalidFilterConfig(format!(
                "Score threshold {} outside [0, 1]",
                self.score_threshold
            )));
        }
        if self.min_box_px > self.max_box_px {
            return Err(TreefallError::InvalidFilterConfig(format!(
                "min_box_px {} exceeds max_box_px {}",
                self.min_box_px, self.max_box_px
            )));
        }
        Ok(())
    }

    /// Whether a detection survives the score and size predicates.
    pub fn accepts(&self, detection: &Detection) -> bool {
        let min = self.min_box_px as f64;
        let max = self.max_box_px as f64;
        let (w, h) = (detection.width(), detection.height());

        detection.score >= self.score_threshold
            && (min..=max).contains(&w)
            && (min..=max).contains(&h)
    }
}

/// Named tuning presets observed in practice.
///
/// Neither is canonical, so there is no `Default`. Lower score thresholds
/// favour recall; a larger minimum box favours precision against shrubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    /// Score 0.3, boxes 30-300 px, large overlapping patches.
    Tight,
    /// Score 0.4, boxes 10-300 px, small non-overlapping patches.
    ///
    /// Only the nms threshold of 0.15 and the zero overlap were ever
    /// recorded for this run. The 400 px patch is an assumed value.
    Loose,
}

impl FilterPreset {
    pub fn filter_config(self) -> FilterConfig {
        match self {
            FilterPreset::Tight => FilterConfig {
                score_threshold: 0.3,
                min_box_px: 30,
                max_box_px: 300,
            },
            FilterPreset::Loose => FilterConfig {
                score_threshold: 0.4,
                min_box_px: 10,
                max_box_px: 300,
            },
        }
    }

    pub fn detector_settings(self) -> DetectorSettings {
        match self {
            FilterPreset::Tight => DetectorSettings {
                nms_threshold: 0.3,
                patch_size: 600,
                patch_overlap: 0.25,
            },
            FilterPreset::Loose => DetectorSettings {
                nms_threshold: 0.15,
                patch_size: 400,
                patch_overlap: 0.0,
            },
        }
    }
}

/// Keeps the detections that pass `config`, in their original order.
///
/// # Example
/// ```
/// use treefall_rs::{Detection, FilterPreset, filter_detections};
///
/// # fn main() -> Result<(), treefall_rs::TreefallError> {
/// let detections = vec![
///     Detection::new(0.0, 0.0, 40.0, 40.0, 0.9, "Tree")?,
///     Detection::new(0.0, 0.0, 5.0, 5.0, 0.9, "Tree")?,
/// ];
/// let kept = filter_detections(&detections, &FilterPreset::Tight.filter_config());
/// assert_eq!(kept.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn filter_detections(detections: &[Detection], config: &FilterConfig) -> Vec<Detection> {
    let kept: Vec<Detection> = detections
        .iter()
        .filter(|d| config.accepts(d))
        .cloned()
        .collect();

    debug!(
        "detection filter kept {} of {} (score >= {}, box {}-{} px)",
        kept.len(),
        detections.len(),
        config.score_threshold,
        config.min_box_px,
        config.max_box_px
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, size: f64, score: f64) -> Detection {
        Detection {
            xmin: x,
            ymin: 100.0,
            xmax: x + size,
            ymax: 100.0 + size,
            score,
            label: "Tree".to_string(),
        }
    }

    #[test]
    fn test_detection_geometry() -> Result<(), TreefallError> {
        let det = Detection::new(300.0, 300.0, 320.0, 330.0, 0.8, "Tree")?;
        assert_eq!(det.width(), 20.0);
        assert_eq!(det.height(), 30.0);
        assert_eq!(det.center(), PixelCoord::new(310.0, 315.0));
        Ok(())
    }

    #[test]
    fn test_detection_rejects_bad_boxes() {
        assert!(Detection::new(10.0, 0.0, 10.0, 5.0, 0.5, "Tree").is_err());
        assert!(Detection::new(0.0, 5.0, 10.0, 1.0, 0.5, "Tree").is_err());
        assert!(Detection::new(0.0, 0.0, 10.0, 10.0, 1.5, "Tree").is_err());
        assert!(Detection::new(0.0, 0.0, f64::NAN, 10.0, 0.5, "Tree").is_err());
    }

    #[test]
    fn test_min_box_bound_inclusive() {
        let config = FilterPreset::Tight.filter_config();
        let at_min = square(0.0, 30.0, 0.9);
        let below_min = square(0.0, 29.0, 0.9);

        assert!(config.accepts(&at_min));
        assert!(!config.accepts(&below_min));
    }

    #[test]
    fn test_max_box_bound_inclusive() {
        let config = FilterPreset::Tight.filter_config();
        assert!(config.accepts(&square(0.0, 300.0, 0.9)));
        assert!(!config.accepts(&square(0.0, 301.0, 0.9)));
    }

    #[test]
    fn test_height_checked_independently() {
        let config = FilterPreset::Tight.filter_config();
        let tall = Detection {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 50.0,
            ymax: 400.0,
            score: 0.9,
            label: "Tree".to_string(),
        };
        assert!(!config.accepts(&tall));
    }

    #[test]
    fn test_score_threshold_inclusive() {
        let config = FilterPreset::Loose.filter_config();
        assert!(config.accepts(&square(0.0, 20.0, 0.4)));
        assert!(!config.accepts(&square(0.0, 20.0, 0.39)));
    }

    #[test]
    fn test_filter_preserves_order() {
        let detections = vec![
            square(0.0, 50.0, 0.9),
            square(10.0, 5.0, 0.9),
            square(20.0, 60.0, 0.1),
            square(30.0, 70.0, 0.5),
        ];
        let kept = filter_detections(&detections, &FilterPreset::Tight.filter_config());

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].xmin, 0.0);
        assert_eq!(kept[1].xmin, 30.0);
        assert_eq!(detections.len(), 4);
    }

    #[test]
    fn test_filter_empty_input() {
        let kept = filter_detections(&[], &FilterPreset::Loose.filter_config());
        assert!(kept.is_empty());
    }

    #[test]
    fn test_presets_differ() {
        let tight = FilterPreset::Tight.filter_config();
        let loose = FilterPreset::Loose.filter_config();
        let shrub = square(0.0, 15.0, 0.9);

        assert!(!tight.accepts(&shrub));
        assert!(loose.accepts(&shrub));
        assert!(tight.accepts(&square(0.0, 40.0, 0.35)));
        assert!(!loose.accepts(&square(0.0, 40.0, 0.35)));
    }

    #[test]
    fn test_loose_detector_settings() {
        let loose = FilterPreset::Loose.detector_settings();
        assert_eq!(loose.nms_threshold, 0.15);
        assert_eq!(loose.patch_overlap, 0.0);
        assert_eq!(loose.patch_size, 400);
        assert!(loose.patch_size < FilterPreset::Tight.detector_settings().patch_size);
    }

    #[test]
    fn test_filter_config_validation() {
        assert!(FilterConfig::new(0.5, 10, 300).is_ok());
        assert!(matches!(
            FilterConfig::new(0.5, 400, 300),
            Err(TreefallError::InvalidFilterConfig(_))
        ));
        assert!(FilterConfig::new(-0.1, 10, 300).is_err());
    }
}
