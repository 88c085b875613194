use crate::coord::LatLng;
use crate::danger::BuildingFootprint;
use crate::detection::{Detection, DetectorSettings};
use crate::error::TreefallError;
use crate::io::{read_buildings, read_buildings_wkt, read_detections};
use crate::projection::{TileBounds, TileRequest};
use geo::Intersects;
use log::{debug, info};
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Resolves a free-form address to a WGS84 position.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str, timeout: Duration) -> Result<LatLng, TreefallError>;
}

/// Retrieves a satellite image for a tile request.
pub trait TileFetcher: Send + Sync {
    fn fetch_tile(&self, request: &TileRequest, timeout: Duration)
    -> Result<TileImage, TreefallError>;
}

/// Finds tree crowns in an image. Non-max suppression and patching are
/// the detector's business; it receives them in `settings`.
pub trait TreeDetector: Send + Sync {
    fn detect(
        &self,
        image: &TileImage,
        settings: &DetectorSettings,
    ) -> Result<Vec<Detection>, TreefallError>;
}

/// Supplies building footprints inside a bounding box.
pub trait BuildingSource: Send + Sync {
    fn fetch_buildings(
        &self,
        bounds: &TileBounds,
        timeout: Duration,
    ) -> Result<Vec<BuildingFootprint>, TreefallError>;
}

/// A decoded RGB8 raster as delivered by a [`TileFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TileImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TreefallError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(TreefallError::TileFetchFailed(format!(
                "{}x{} RGB image needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// All-black image of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }
}

type DetectorLoader<D> = Box<dyn Fn() -> Result<D, TreefallError> + Send + Sync>;

/// Owner of the detector model.
///
/// Either wraps an already-built detector, or builds it on first use under
/// a lock so concurrent first calls load the model exactly once. A failed
/// load leaves the handle empty and the next call tries again.
pub struct DetectorHandle<D> {
    cell: OnceLock<D>,
    init_lock: Mutex<()>,
    loader: Option<DetectorLoader<D>>,
}

impl<D> DetectorHandle<D> {
    pub fn new(detector: D) -> Self {
        Self {
            cell: OnceLock::from(detector),
            init_lock: Mutex::new(()),
            loader: None,
        }
    }

    pub fn lazy(loader: impl Fn() -> Result<D, TreefallError> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the detector, loading it first if needed.
    pub fn get(&self) -> Result<&D, TreefallError> {
        if let Some(detector) = self.cell.get() {
            return Ok(detector);
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| TreefallError::DetectorError("detector init lock poisoned".to_string()))?;
        if let Some(detector) = self.cell.get() {
            return Ok(detector);
        }

        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| TreefallError::DetectorError("no detector loader".to_string()))?;
        info!("loading tree detector");
        let detector = loader()?;
        Ok(self.cell.get_or_init(|| detector))
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for DetectorHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorHandle")
            .field("detector", &self.cell.get())
            .field("lazy", &self.loader.is_some())
            .finish()
    }
}

/// Building footprints held in memory, loaded from GeoJSON or WKT.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonBuildingSource {
    buildings: Vec<BuildingFootprint>,
}

impl GeoJsonBuildingSource {
    pub fn new(buildings: Vec<BuildingFootprint>) -> Self {
        Self { buildings }
    }

    /// Loads footprints from a file. A `.wkt` extension means one WKT
    /// geometry per line, anything else is read as GeoJSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TreefallError> {
        let path = path.as_ref();
        let is_wkt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wkt"));
        let buildings = if is_wkt {
            read_buildings_wkt(path)?
        } else {
            read_buildings(path)?
        };
        Ok(Self::new(buildings))
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

impl BuildingSource for GeoJsonBuildingSource {
    fn fetch_buildings(
        &self,
        bounds: &TileBounds,
        _timeout: Duration,
    ) -> Result<Vec<BuildingFootprint>, TreefallError> {
        let rect = bounds.to_rect();
        let found: Vec<BuildingFootprint> = self
            .buildings
            .iter()
            .filter(|b| b.geometry.intersects(&rect))
            .cloned()
            .collect();
        debug!("{} of {} footprints inside tile", found.len(), self.buildings.len());
        Ok(found)
    }
}

/// Detector stand-in that returns detections produced earlier, e.g. by an
/// offline model run exported to CSV.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    detections: Vec<Detection>,
}

impl ReplayDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, TreefallError> {
        Ok(Self::new(read_detections(path)?))
    }
}

impl TreeDetector for ReplayDetector {
    fn detect(
        &self,
        _image: &TileImage,
        _settings: &DetectorSettings,
    ) -> Result<Vec<Detection>, TreefallError> {
        Ok(self.detections.clone())
    }
}
