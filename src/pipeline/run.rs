use crate::config::AssessmentConfig;
use crate::coord::LatLng;
use crate::danger::{BuildingFootprint, classify_danger};
use crate::detection::filter_detections;
use crate::error::TreefallError;
use crate::pipeline::policy::with_retries;
use crate::pipeline::sources::{BuildingSource, DetectorHandle, Geocoder, TileFetcher, TreeDetector};
use crate::projection::{MAX_MERCATOR_LATITUDE, TileBounds, TileContext};
use crate::risk::{TreeRisk, compute_tree_risks};
use geo::Intersects;
use log::{info, warn};

/// Outcome of assessing one location.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub location: LatLng,
    pub tile: TileContext,
    pub bounds: TileBounds,
    /// Footprints inside `bounds`, the ground extent of the delivered image
    pub building_count: usize,
    pub trees: Vec<TreeRisk>,
}

impl RiskAssessment {
    pub fn danger_count(&self) -> usize {
        self.trees.iter().filter(|t| t.danger).count()
    }
}

/// Address-to-classified-trees orchestration over injected collaborators.
pub struct Pipeline<G, T, D, B> {
    geocoder: G,
    tiles: T,
    detector: DetectorHandle<D>,
    buildings: B,
    config: AssessmentConfig,
}

impl<G, T, D, B> Pipeline<G, T, D, B>
where
    G: Geocoder,
    T: TileFetcher,
    D: TreeDetector,
    B: BuildingSource,
{
    pub fn new(
        geocoder: G,
        tiles: T,
        detector: DetectorHandle<D>,
        buildings: B,
        config: AssessmentConfig,
    ) -> Result<Self, TreefallError> {
        config.validate()?;
        Ok(Self {
            geocoder,
            tiles,
            detector,
            buildings,
            config,
        })
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Geocodes `address` and assesses the trees around it.
    pub fn run(&self, address: &str) -> Result<RiskAssessment, TreefallError> {
        let location = with_retries(&self.config.network, "geocode", |timeout| {
            self.geocoder.geocode(address, timeout)
        })?;
        info!("geocoded {:?} to ({}, {})", address, location.lat, location.lng);
        self.assess(location)
    }

    /// Assesses the trees around an already-known position.
    pub fn assess(&self, location: LatLng) -> Result<RiskAssessment, TreefallError> {
        if !location.lat.is_finite() || location.lat.abs() > MAX_MERCATOR_LATITUDE {
            return Err(TreefallError::InvalidLatitude(location.lat));
        }

        let network = &self.config.network;
        let request = self.config.tile_request(location);
        let requested_bounds = request.bounds()?;

        // Retries sleep between attempts, so the fetches get their own
        // threads rather than rayon workers.
        let (tile, buildings) = std::thread::scope(|scope| {
            let buildings = scope.spawn(|| {
                with_retries(network, "building fetch", |timeout| {
                    self.buildings.fetch_buildings(&requested_bounds, timeout)
                })
            });
            let tile = with_retries(network, "tile fetch", |timeout| {
                self.tiles.fetch_tile(&request, timeout)
            });
            let buildings = buildings.join().unwrap_or_else(|_| {
                Err(TreefallError::BuildingFetchFailed(
                    "building fetch panicked".to_string(),
                ))
            });
            (tile, buildings)
        });
        let image = tile?;
        let context = TileContext::from_request(&request, image.width, image.height)?;
        let bounds = context.bounds();

        let fetched = buildings.unwrap_or_else(|e| {
            warn!("building fetch failed, treating every tree as safe: {}", e);
            Vec::new()
        });
        let rect = bounds.to_rect();
        let buildings: Vec<BuildingFootprint> = fetched
            .into_iter()
            .filter(|b| b.geometry.intersects(&rect))
            .collect();

        let detections = self
            .detector
            .get()?
            .detect(&image, &self.config.detector_settings())?;
        let kept = filter_detections(&detections, &self.config.filter_config());
        let risks = compute_tree_risks(&kept, &context, &self.config.risk)?;
        let trees = classify_danger(&risks, &buildings)?;

        let assessment = RiskAssessment {
            location,
            tile: context,
            bounds,
            building_count: buildings.len(),
            trees,
        };
        info!(
            "{} trees near ({}, {}), {} in danger of {} buildings",
            assessment.trees.len(),
            location.lat,
            location.lng,
            assessment.danger_count(),
            assessment.building_count
        );
        Ok(assessment)
    }
}
