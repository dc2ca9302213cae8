use std::cell::RefCell;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use gtk4::glib::ExitCode;
use quakelayers::{
    colormap::{DepthColorMap, MARKER_THRESHOLDS},
    config::{LegendPalette, MapConfig},
    earthquakes::{depth_histogram, EarthquakeLayer},
    feed::{FeedClient, QuakeProperties},
    legend::build_legend,
    overlay::LegendLayer,
    plates::PlateBoundaryLayer,
    tiles::TileLayer,
    view::ViewState,
    window::Visualizer,
};
use tracing::{error, info, warn};

const STREET_MAP: &str = "Street Map";
const EARTHQUAKES: &str = "Earthquakes";
const TECTONIC_PLATES: &str = "Tectonic Plates";

#[derive(Parser)]
#[command(name = "quakelayers")]
#[command(about = "Recent earthquakes and tectonic plate boundaries on a map")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    map: MapArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the depth legend as color and label pairs
    Legend,

    /// Load the earthquake feed and count events per depth bucket
    Summary,
}

#[derive(Args, Debug, Default)]
struct MapArgs {
    /// Latitude of the initial map center
    #[arg(long, global = true, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the initial map center
    #[arg(long, global = true, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Initial zoom level (0-19)
    #[arg(long, global = true)]
    zoom: Option<f64>,

    /// Earthquake GeoJSON feed, URL or file path
    #[arg(long, global = true)]
    earthquake_feed: Option<String>,

    /// Tectonic plate boundary GeoJSON feed, URL or file path
    #[arg(long, global = true)]
    tectonic_feed: Option<String>,

    /// Tile URL template with {s}, {z}, {x} and {y} placeholders
    #[arg(long, global = true)]
    tile_url: Option<String>,

    /// Do not load a tile base layer
    #[arg(long, global = true)]
    no_tiles: bool,

    /// Palette described by the legend
    #[arg(long, global = true, value_enum)]
    legend_palette: Option<LegendPalette>,

    /// Window width in pixels
    #[arg(long, global = true)]
    width: Option<i32>,

    /// Window height in pixels
    #[arg(long, global = true)]
    height: Option<i32>,
}

impl MapArgs {
    fn apply(self, mut config: MapConfig) -> MapConfig {
        if let Some(lat) = self.lat {
            config.center_latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.center_longitude = lon;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some(feed) = self.earthquake_feed {
            config.earthquake_feed = feed;
        }
        if let Some(feed) = self.tectonic_feed {
            config.tectonic_feed = feed;
        }
        if let Some(tile_url) = self.tile_url {
            config.tile_url = tile_url;
        }
        if self.no_tiles {
            config.tiles_enabled = false;
        }
        if let Some(palette) = self.legend_palette {
            config.legend_palette = palette;
        }
        if let Some(width) = self.width {
            config.window_width = width;
        }
        if let Some(height) = self.height {
            config.window_height = height;
        }
        config
    }
}

fn main() -> ExitCode {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=quakelayers=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli.map.apply(MapConfig::from_env());

    let result = match cli.command {
        Some(Commands::Legend) => {
            print_legend(config.legend_palette);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Summary) => print_summary(&config),
        None => run_map(&config),
    };

    result.unwrap_or_else(|err| {
        error!("{err}");
        ExitCode::FAILURE
    })
}

fn print_legend(palette: LegendPalette) {
    for entry in build_legend(palette.table()) {
        println!("{}\t{}", entry.color, entry.label);
    }
}

fn print_summary(config: &MapConfig) -> quakelayers::Result<ExitCode> {
    let client = FeedClient::new(config)?;
    let collection = client.load::<QuakeProperties>(&config.earthquake_feed)?;
    let colors = DepthColorMap::new(MARKER_THRESHOLDS)?;
    let layer = EarthquakeLayer::from_collection(&collection, colors);

    let counts = depth_histogram(layer.quakes(), MARKER_THRESHOLDS);
    for (entry, count) in build_legend(MARKER_THRESHOLDS).iter().zip(counts) {
        println!("{}\t{}\t{}", entry.color, entry.label, count);
    }
    println!("total\t{}", layer.quakes().len());
    Ok(ExitCode::SUCCESS)
}

fn run_map(config: &MapConfig) -> quakelayers::Result<ExitCode> {
    let client = FeedClient::new(config)?;

    let marker_colors = DepthColorMap::new(MARKER_THRESHOLDS)?;
    let earthquakes = match client.load::<QuakeProperties>(&config.earthquake_feed) {
        Ok(collection) => EarthquakeLayer::from_collection(&collection, marker_colors),
        Err(err) => {
            warn!("earthquake feed unavailable: {err}");
            EarthquakeLayer::new(marker_colors)
        }
    };
    let plates = match client.load::<serde_json::Value>(&config.tectonic_feed) {
        Ok(collection) => PlateBoundaryLayer::from_collection(&collection),
        Err(err) => {
            warn!("tectonic plate feed unavailable: {err}");
            PlateBoundaryLayer::new()
        }
    };
    info!(
        "showing {} earthquakes and {} plate boundary lines",
        earthquakes.quakes().len(),
        plates.lines().len()
    );

    let legend = LegendLayer::new(&build_legend(config.legend_palette.table()))?;

    let view = ViewState::new(config.center_longitude, config.center_latitude, config.zoom);
    let mut visualizer = Visualizer::new(config.window_width, config.window_height, view);

    if config.tiles_enabled {
        let tiles = TileLayer::new(
            client.clone(),
            &config.tile_url,
            &config.tile_subdomains,
            &config.attribution,
        )?;
        visualizer.add_base_layer(STREET_MAP, Rc::new(RefCell::new(tiles)), 0);
    }
    visualizer.add_overlay(EARTHQUAKES, Rc::new(RefCell::new(earthquakes)), 2);
    visualizer.add_overlay(TECTONIC_PLATES, Rc::new(RefCell::new(plates)), 1);
    visualizer.add_layer(Rc::new(RefCell::new(legend)), 3);

    Ok(visualizer.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn map_args_override_config() {
        let cli = Cli::parse_from([
            "quakelayers",
            "--lat",
            "-33.4",
            "--lon=-70.6",
            "--zoom",
            "5",
            "--no-tiles",
            "--legend-palette",
            "markers",
        ]);
        let config = cli.map.apply(MapConfig::default());
        assert_eq!(config.center_latitude, -33.4);
        assert_eq!(config.center_longitude, -70.6);
        assert_eq!(config.zoom, 5.0);
        assert!(!config.tiles_enabled);
        assert_eq!(config.legend_palette, LegendPalette::Markers);
        assert!(cli.command.is_none());
    }

    #[test]
    fn options_follow_subcommands() {
        let cli = Cli::parse_from([
            "quakelayers",
            "summary",
            "--earthquake-feed",
            "data/quakes.geojson",
        ]);
        assert!(matches!(cli.command, Some(Commands::Summary)));
        let config = cli.map.apply(MapConfig::default());
        assert_eq!(config.earthquake_feed, "data/quakes.geojson");
    }
}
