use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::colormap::{ThresholdTable, LEGEND_THRESHOLDS, MARKER_THRESHOLDS};

pub const DEFAULT_EARTHQUAKE_FEED: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_week.geojson";
pub const DEFAULT_TECTONIC_FEED: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_ATTRIBUTION: &str = "\u{a9} OpenStreetMap contributors";

/// Which threshold table the legend panel describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LegendPalette {
    /// The legend's own -10..90 palette
    #[default]
    Legend,
    /// The palette markers are actually filled with
    Markers,
}

impl LegendPalette {
    pub fn table(self) -> &'static ThresholdTable {
        match self {
            Self::Legend => LEGEND_THRESHOLDS,
            Self::Markers => MARKER_THRESHOLDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: f64,
    pub earthquake_feed: String,
    pub tectonic_feed: String,
    pub tile_url: String,
    pub tile_subdomains: Vec<String>,
    pub attribution: String,
    pub tiles_enabled: bool,
    pub legend_palette: LegendPalette,
    pub window_width: i32,
    pub window_height: i32,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: 27.96044,
            center_longitude: -82.30695,
            zoom: 3.0,
            earthquake_feed: DEFAULT_EARTHQUAKE_FEED.to_string(),
            tectonic_feed: DEFAULT_TECTONIC_FEED.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_subdomains: vec!["a".into(), "b".into(), "c".into()],
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            tiles_enabled: true,
            legend_palette: LegendPalette::default(),
            window_width: 1000,
            window_height: 700,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl MapConfig {
    /// Defaults overridden by `QUAKELAYERS_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Values that fail to parse are logged
    /// and leave the current setting in place.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        override_parsed(&lookup, "QUAKELAYERS_LAT", &mut self.center_latitude);
        override_parsed(&lookup, "QUAKELAYERS_LON", &mut self.center_longitude);
        override_parsed(&lookup, "QUAKELAYERS_ZOOM", &mut self.zoom);
        override_parsed(&lookup, "QUAKELAYERS_EARTHQUAKE_FEED", &mut self.earthquake_feed);
        override_parsed(&lookup, "QUAKELAYERS_TECTONIC_FEED", &mut self.tectonic_feed);
        override_parsed(&lookup, "QUAKELAYERS_TILE_URL", &mut self.tile_url);
        self
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("ignoring {key}={raw:?}: not a valid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_published_feeds() {
        let config = MapConfig::default();
        assert_eq!(config.center_latitude, 27.96044);
        assert_eq!(config.center_longitude, -82.30695);
        assert_eq!(config.zoom, 3.0);
        assert!(config.earthquake_feed.ends_with("4.5_week.geojson"));
        assert!(config.tectonic_feed.ends_with("PB2002_boundaries.json"));
        assert!(config.tiles_enabled);
    }

    #[test]
    fn env_overrides_apply() {
        let config = MapConfig::default().with_overrides(lookup(&[
            ("QUAKELAYERS_LAT", " 35.5 "),
            ("QUAKELAYERS_ZOOM", "5"),
            ("QUAKELAYERS_EARTHQUAKE_FEED", "data/quakes.geojson"),
        ]));
        assert_eq!(config.center_latitude, 35.5);
        assert_eq!(config.zoom, 5.0);
        assert_eq!(config.earthquake_feed, "data/quakes.geojson");
        assert_eq!(config.center_longitude, -82.30695);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let config =
            MapConfig::default().with_overrides(lookup(&[("QUAKELAYERS_LON", "west-ish")]));
        assert_eq!(config, MapConfig::default());
    }

    #[test]
    fn palette_selects_table() {
        assert_eq!(LegendPalette::Legend.table(), LEGEND_THRESHOLDS);
        assert_eq!(LegendPalette::Markers.table(), MARKER_THRESHOLDS);
    }
}
