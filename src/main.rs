use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use treefall_rs::{
    AssessmentConfig, DetectorHandle, FilterPreset, GeoJsonBuildingSource, Geocoder, LatLng,
    Pipeline, PixelCoord, ReplayDetector, TileContext, TileFetcher, TileImage, TileRequest,
    TreefallError, trees_to_feature_collection, write_tree_risks,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "treefall")]
#[command(about = "Georeference detected tree crowns and flag those that could fall on a building")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify trees from a detection CSV against building footprints.
    Assess(AssessArgs),

    /// Print the ground extent of a tile as JSON.
    Bounds(TileArgs),

    /// Convert a pixel of a tile to WGS84.
    Pixel {
        #[command(flatten)]
        tile: TileArgs,

        /// Column, from the left edge.
        #[arg(long)]
        x: f64,

        /// Row, from the top edge.
        #[arg(long)]
        y: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Tight,
    Loose,
}

impl From<PresetArg> for FilterPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Tight => FilterPreset::Tight,
            PresetArg::Loose => FilterPreset::Loose,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Geojson,
}

#[derive(Debug, Clone, Args)]
struct TileArgs {
    /// Tile center latitude.
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Tile center longitude.
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Map zoom level.
    #[arg(long)]
    zoom: Option<u8>,

    /// Nominal tile edge in pixels, before scale.
    #[arg(long)]
    size: Option<u32>,

    /// Device scale factor of the tile service.
    #[arg(long)]
    scale: Option<f64>,

    /// Actual image width, when it differs from size x scale.
    #[arg(long)]
    image_width: Option<u32>,

    /// Actual image height, when it differs from size x scale.
    #[arg(long)]
    image_height: Option<u32>,
}

impl TileArgs {
    fn request(&self) -> TileRequest {
        let mut request = TileRequest::new(LatLng::new(self.lat, self.lng));
        if let Some(zoom) = self.zoom {
            request = request.zoom(zoom);
        }
        if let Some(size) = self.size {
            request = request.size(size);
        }
        if let Some(scale) = self.scale {
            request = request.scale(scale);
        }
        request
    }

    fn image_dimensions(&self, request: &TileRequest) -> (u32, u32) {
        let (w, h) = request.expected_dimensions();
        (self.image_width.unwrap_or(w), self.image_height.unwrap_or(h))
    }

    fn context(&self) -> CliResult<TileContext> {
        let request = self.request();
        let (w, h) = self.image_dimensions(&request);
        Ok(TileContext::from_request(&request, w, h)?)
    }
}

#[derive(Debug, Clone, Args)]
struct AssessArgs {
    #[command(flatten)]
    tile: TileArgs,

    /// Detector output with xmin,ymin,xmax,ymax,score,label columns.
    #[arg(long)]
    detections: PathBuf,

    /// Building footprints as GeoJSON, or one WKT polygon per line in a
    /// `.wkt` file. Without it every tree is safe.
    #[arg(long)]
    buildings: Option<PathBuf>,

    /// Filter preset. Required unless --config supplies one.
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Fall radius as a multiple of the canopy radius.
    #[arg(long)]
    fall_multiplier: Option<f64>,

    /// JSON assessment config; other flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

impl AssessArgs {
    fn to_config(&self) -> CliResult<AssessmentConfig> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => AssessmentConfig::from_json_file(path)?,
            (None, Some(preset)) => AssessmentConfig::new(preset.into()),
            (None, None) => return Err("pick a filter with --preset tight|loose or --config".into()),
        };

        if let Some(preset) = self.preset {
            config.preset = preset.into();
        }
        if let Some(zoom) = self.tile.zoom {
            config = config.zoom(zoom);
        }
        if let Some(size) = self.tile.size {
            config = config.size(size);
        }
        if let Some(scale) = self.tile.scale {
            config = config.scale(scale);
        }
        if let Some(multiplier) = self.fall_multiplier {
            config = config.fall_multiplier(multiplier);
        }
        config.validate()?;
        Ok(config)
    }
}

/// The CLI takes coordinates directly; there is no address to resolve.
struct NoGeocoder;

impl Geocoder for NoGeocoder {
    fn geocode(&self, address: &str, _timeout: Duration) -> Result<LatLng, TreefallError> {
        Err(TreefallError::GeocodeFailed(format!(
            "offline, cannot resolve {:?}",
            address
        )))
    }
}

/// Stands in for the tile service. Detections come precomputed, so only
/// the image dimensions matter.
struct OfflineTiles {
    width: Option<u32>,
    height: Option<u32>,
}

impl TileFetcher for OfflineTiles {
    fn fetch_tile(
        &self,
        request: &TileRequest,
        _timeout: Duration,
    ) -> Result<TileImage, TreefallError> {
        let (w, h) = request.expected_dimensions();
        Ok(TileImage::blank(
            self.width.unwrap_or(w),
            self.height.unwrap_or(h),
        ))
    }
}

fn main() -> CliResult<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Assess(args) => run_assess(&args),
        Commands::Bounds(tile) => run_bounds(&tile),
        Commands::Pixel { tile, x, y } => run_pixel(&tile, x, y),
    }
}

fn run_assess(args: &AssessArgs) -> CliResult<()> {
    let config = args.to_config()?;

    let detector = ReplayDetector::from_csv(&args.detections)?;
    let buildings = match &args.buildings {
        Some(path) => GeoJsonBuildingSource::from_file(path)?,
        None => GeoJsonBuildingSource::default(),
    };
    info!("loaded {} building footprints", buildings.len());

    let pipeline = Pipeline::new(
        NoGeocoder,
        OfflineTiles {
            width: args.tile.image_width,
            height: args.tile.image_height,
        },
        DetectorHandle::new(detector),
        buildings,
        config,
    )?;
    let assessment = pipeline.assess(LatLng::new(args.tile.lat, args.tile.lng))?;

    let stdout = std::io::stdout();
    match args.format {
        OutputFormat::Csv => write_tree_risks(stdout.lock(), &assessment.trees)?,
        OutputFormat::Geojson => {
            let fc = trees_to_feature_collection(&assessment.trees);
            writeln!(stdout.lock(), "{}", fc)?;
        }
    }

    eprintln!(
        "{} trees, {} in danger",
        assessment.trees.len(),
        assessment.danger_count()
    );
    Ok(())
}

fn run_bounds(tile: &TileArgs) -> CliResult<()> {
    let context = tile.context()?;
    info!(
        "{}x{} px at {:.4} m/px",
        context.image_width(),
        context.image_height(),
        context.meters_per_pixel()
    );
    println!("{}", serde_json::to_string_pretty(&context.bounds())?);
    Ok(())
}

fn run_pixel(tile: &TileArgs, x: f64, y: f64) -> CliResult<()> {
    let context = tile.context()?;
    let pixel = PixelCoord::new(x, y);
    if !context.contains_pixel(pixel) {
        warn!("pixel ({}, {}) lies outside the image", x, y);
    }
    let location = context.pixel_to_lat_lng(pixel);
    println!("{},{}", location.lat, location.lng);
    Ok(())
}
