use gtk4::{cairo::Context, prelude::WidgetExt, DrawingArea};

use crate::{
    colormap::Rgb,
    feed::{FeatureCollection, Geometry},
    geometry::{project, FocusRange},
    window::Layer,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgb,
    pub weight: f64,
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Rgb::BLUE,
            weight: 2.0,
            opacity: 1.0,
        }
    }
}

/// Splits a lon/lat path wherever it jumps across the antimeridian and
/// projects the pieces to world coordinates. Positions with fewer than two
/// values are dropped.
pub fn project_path(coordinates: &[Vec<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut paths = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut last_lon: Option<f64> = None;

    for position in coordinates {
        let (Some(&lon), Some(&lat)) = (position.first(), position.get(1)) else {
            continue;
        };
        if last_lon.is_some_and(|last| (lon - last).abs() > 180.0) {
            paths.push(std::mem::take(&mut current));
        }
        current.push(project(lon, lat));
        last_lon = Some(lon);
    }
    paths.push(current);

    paths.retain(|path| path.len() >= 2);
    paths
}

/// Tectonic plate boundaries as projected polylines.
pub struct PlateBoundaryLayer {
    lines: Vec<Vec<(f64, f64)>>,
    style: LineStyle,
}

impl PlateBoundaryLayer {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            style: LineStyle::default(),
        }
    }

    pub fn from_collection<P>(collection: &FeatureCollection<P>) -> Self {
        let lines = collection
            .features
            .iter()
            .flat_map(|feature| match &feature.geometry {
                Some(Geometry::LineString { coordinates }) => project_path(coordinates),
                Some(Geometry::MultiLineString { coordinates }) => coordinates
                    .iter()
                    .flat_map(|line| project_path(line))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();

        Self {
            lines,
            ..Self::new()
        }
    }

    pub fn lines(&self) -> &[Vec<(f64, f64)>] {
        &self.lines
    }

}

impl Default for PlateBoundaryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for PlateBoundaryLayer {
    fn draw(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
        focus_range: &FocusRange,
    ) -> Result<(), gtk4::cairo::Error> {
        let area_width = drawing_area.width() as f64;
        let area_height = drawing_area.height() as f64;
        let rect = focus_range.to_rect(area_width, area_height);

        cr.new_path();
        for line in &self.lines {
            for (i, point) in line.iter().enumerate() {
                let x = rect.map_coord_x(point.0, 0.0, area_width);
                let y = rect.map_coord_y(point.1, 0.0, area_height);
                if i == 0 {
                    cr.move_to(x, y);
                } else {
                    cr.line_to(x, y);
                }
            }
        }

        let LineStyle {
            color,
            weight,
            opacity,
        } = self.style;
        cr.set_source_rgba(color.r, color.g, color.b, opacity);
        cr.set_line_width(weight);
        cr.stroke()
    }
}
