//! Depth classification.
//!
//! A [`ThresholdTable`] is an ascending list of lower bounds, each owning the
//! color of the bucket that starts there. The last bucket has no upper bound
//! and depths below the first bound fall into the first bucket.
//!
//! Tables must be non-empty with strictly increasing bounds. This is not
//! checked at runtime.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub lower_bound: f64,
    pub color: &'static str,
}

impl Threshold {
    pub const fn new(lower_bound: f64, color: &'static str) -> Self {
        Self { lower_bound, color }
    }
}

pub type ThresholdTable = [Threshold];

/// Buckets shown in the legend panel.
pub const LEGEND_THRESHOLDS: &ThresholdTable = &[
    Threshold::new(-10.0, "#98ee00"),
    Threshold::new(10.0, "#d4ee00"),
    Threshold::new(30.0, "#eecc00"),
    Threshold::new(50.0, "#ee9c00"),
    Threshold::new(70.0, "#ea822c"),
    Threshold::new(90.0, "#ea2c2c"),
];

/// Buckets used to fill earthquake markers. The first bound is nominal since
/// anything below it lands in the first bucket anyway.
pub const MARKER_THRESHOLDS: &ThresholdTable = &[
    Threshold::new(-10.0, "#B6F34C"),
    Threshold::new(10.0, "#E1F34C"),
    Threshold::new(30.0, "#F3DB4C"),
    Threshold::new(50.0, "#F3B94C"),
    Threshold::new(70.0, "#F0A76A"),
    Threshold::new(90.0, "#F06A6A"),
];

/// Index of the bucket `depth` belongs to.
pub fn classify_index(depth: f64, table: &ThresholdTable) -> usize {
    table
        .iter()
        .rposition(|threshold| threshold.lower_bound <= depth)
        .unwrap_or(0)
}

pub fn classify(depth: f64, table: &ThresholdTable) -> &'static str {
    table[classify_index(depth, table)].color
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        let (r, g, b) = match digits.len() {
            6 => (
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ),
            3 => (
                channel(&digits[0..1])? * 17,
                channel(&digits[1..2])? * 17,
                channel(&digits[2..3])? * 17,
            ),
            _ => return Err(invalid()),
        };

        Ok(Self::new(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
        ))
    }
}

/// A threshold table with its colors parsed once for drawing.
#[derive(Debug, Clone)]
pub struct DepthColorMap {
    table: &'static ThresholdTable,
    colors: Vec<Rgb>,
}

impl DepthColorMap {
    pub fn new(table: &'static ThresholdTable) -> Result<Self> {
        let colors = table
            .iter()
            .map(|threshold| Rgb::from_hex(threshold.color))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { table, colors })
    }

    pub fn get_color(&self, depth: f64) -> Rgb {
        self.colors[classify_index(depth, self.table)]
    }

    /// Color of the lowest bucket.
    pub fn base_color(&self) -> Rgb {
        self.colors[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn below_smallest_bound_is_lowest_bucket() {
        for depth in [-10.5, -100.0, f64::NEG_INFINITY] {
            assert_eq!(classify(depth, LEGEND_THRESHOLDS), "#98ee00");
        }
        assert_eq!(classify(-700.0, MARKER_THRESHOLDS), "#B6F34C");
    }

    #[test]
    fn bound_is_inclusive_lower_edge() {
        for threshold in LEGEND_THRESHOLDS {
            assert_eq!(
                classify(threshold.lower_bound, LEGEND_THRESHOLDS),
                threshold.color
            );
        }
        assert_eq!(classify(9.999, LEGEND_THRESHOLDS), "#98ee00");
    }

    #[test]
    fn above_largest_bound_is_open_ended() {
        for depth in [90.5, 650.0, f64::INFINITY] {
            assert_eq!(classify(depth, LEGEND_THRESHOLDS), "#ea2c2c");
            assert_eq!(classify(depth, MARKER_THRESHOLDS), "#F06A6A");
        }
    }

    #[test]
    fn concrete_depths() {
        assert_eq!(classify(5.0, LEGEND_THRESHOLDS), "#98ee00");
        assert_eq!(classify(10.0, LEGEND_THRESHOLDS), "#d4ee00");
        assert_eq!(classify(95.0, LEGEND_THRESHOLDS), "#ea2c2c");
        assert_eq!(classify(45.0, MARKER_THRESHOLDS), "#F3DB4C");
    }

    #[test]
    fn nan_falls_into_lowest_bucket() {
        assert_eq!(classify_index(f64::NAN, MARKER_THRESHOLDS), 0);
    }

    #[test]
    fn single_entry_table() {
        let table = [Threshold::new(0.0, "#000")];
        assert_eq!(classify(-5.0, &table), "#000");
        assert_eq!(classify(5.0, &table), "#000");
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::from_hex("#ff0000").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(Rgb::from_hex("#fff").unwrap(), Rgb::WHITE);
        assert_eq!(Rgb::from_hex("#000000").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["98ee00", "#98ee0", "#zzzzzz", "#98ee00ff", "#é12"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(Error::InvalidColor(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn color_map_uses_parsed_bucket_colors() {
        let map = DepthColorMap::new(LEGEND_THRESHOLDS).unwrap();
        assert_eq!(map.get_color(95.0), Rgb::from_hex("#ea2c2c").unwrap());
        assert_eq!(map.get_color(-50.0), map.base_color());
    }
}
