use std::cell::Cell;
use std::f64::consts::PI;

use gtk4::{cairo::Context, prelude::WidgetExt, DrawingArea};
use tracing::debug;

use crate::{
    colormap::{classify_index, DepthColorMap, Rgb, ThresholdTable},
    feed::{Feature, FeatureCollection, Geometry, QuakeProperties},
    geometry::{project, FocusRange},
    overlay::{draw_text_box, measure_text_box},
    window::Layer,
};

/// Extra pixels around a marker that still count as a hit.
const PICK_TOLERANCE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Earthquake {
    pub longitude: f64,
    pub latitude: f64,
    pub depth: Option<f64>,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    /// Projected world coordinates.
    pub position: (f64, f64),
}

impl Earthquake {
    /// Point features become earthquakes; everything else is skipped.
    pub fn from_feature(feature: &Feature<QuakeProperties>) -> Option<Self> {
        let Some(Geometry::Point { coordinates }) = &feature.geometry else {
            return None;
        };
        let (&longitude, &latitude) = (coordinates.first()?, coordinates.get(1)?);

        Some(Self {
            longitude,
            latitude,
            depth: coordinates.get(2).copied(),
            magnitude: feature.properties.mag,
            place: feature.properties.place.clone(),
            position: project(longitude, latitude),
        })
    }

    pub fn popup_lines(&self) -> Vec<String> {
        let describe = |value: Option<f64>| match value {
            Some(value) => value.to_string(),
            None => "unknown".to_string(),
        };
        vec![
            self.place
                .clone()
                .unwrap_or_else(|| "Unknown location".to_string()),
            String::new(),
            format!("Magnitude: {}", describe(self.magnitude)),
            String::new(),
            format!("depth: {}", describe(self.depth)),
        ]
    }
}

/// Number of earthquakes per bucket of `table`. Events without a depth count
/// towards the lowest bucket, the same one their markers are filled with.
pub fn depth_histogram(quakes: &[Earthquake], table: &ThresholdTable) -> Vec<usize> {
    let mut counts = vec![0; table.len()];
    for quake in quakes {
        let bucket = quake
            .depth
            .map_or(0, |depth| classify_index(depth, table));
        counts[bucket] += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill: Rgb,
    pub stroke: Rgb,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

pub struct EarthquakeLayer {
    quakes: Vec<Earthquake>,
    color_map: DepthColorMap,
    selected: Cell<Option<usize>>,
}

impl EarthquakeLayer {
    pub fn new(color_map: DepthColorMap) -> Self {
        Self {
            quakes: Vec::new(),
            color_map,
            selected: Cell::new(None),
        }
    }

    pub fn from_collection(
        collection: &FeatureCollection<QuakeProperties>,
        color_map: DepthColorMap,
    ) -> Self {
        let quakes = collection
            .features
            .iter()
            .filter_map(Earthquake::from_feature)
            .collect::<Vec<_>>();
        let skipped = collection.features.len() - quakes.len();
        if skipped > 0 {
            debug!("skipped {skipped} earthquake features without point geometry");
        }

        Self {
            quakes,
            ..Self::new(color_map)
        }
    }

    pub fn quakes(&self) -> &[Earthquake] {
        &self.quakes
    }

    pub fn marker_style(&self, quake: &Earthquake) -> MarkerStyle {
        let fill = match quake.depth {
            Some(depth) => self.color_map.get_color(depth),
            None => self.color_map.base_color(),
        };
        MarkerStyle {
            radius: (quake.magnitude.unwrap_or(0.0) * 3.0).max(0.0),
            fill,
            stroke: Rgb::BLACK,
            weight: 0.5,
            opacity: 1.0,
            fill_opacity: 0.8,
        }
    }

    /// Topmost marker under the world point (`x`, `y`) at `scale` pixels per
    /// world unit.
    pub fn pick(&self, x: f64, y: f64, scale: f64) -> Option<usize> {
        self.quakes.iter().enumerate().rev().find_map(|(i, quake)| {
            let dx = (quake.position.0 - x) * scale;
            let dy = (quake.position.1 - y) * scale;
            let reach = self.marker_style(quake).radius + PICK_TOLERANCE;
            (dx * dx + dy * dy <= reach * reach).then_some(i)
        })
    }

    pub fn select(&self, index: Option<usize>) {
        self.selected.set(index.filter(|&i| i < self.quakes.len()));
    }

    pub fn selected(&self) -> Option<&Earthquake> {
        self.selected.get().and_then(|i| self.quakes.get(i))
    }
}

impl Layer for EarthquakeLayer {
    fn draw(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
        focus_range: &FocusRange,
    ) -> Result<(), gtk4::cairo::Error> {
        let area_width = drawing_area.width() as f64;
        let area_height = drawing_area.height() as f64;
        let rect = focus_range.to_rect(area_width, area_height);

        for quake in &self.quakes {
            let style = self.marker_style(quake);
            let x = rect.map_coord_x(quake.position.0, 0.0, area_width);
            let y = rect.map_coord_y(quake.position.1, 0.0, area_height);
            if x < -style.radius
                || y < -style.radius
                || x > area_width + style.radius
                || y > area_height + style.radius
            {
                continue;
            }

            cr.new_path();
            cr.arc(x, y, style.radius, 0.0, 2.0 * PI);
            cr.set_source_rgba(style.fill.r, style.fill.g, style.fill.b, style.fill_opacity);
            cr.fill_preserve()?;
            cr.set_source_rgba(
                style.stroke.r,
                style.stroke.g,
                style.stroke.b,
                style.opacity,
            );
            cr.set_line_width(style.weight);
            cr.stroke()?;
        }

        if let Some(quake) = self.selected() {
            let lines = quake.popup_lines();
            let (width, height) = measure_text_box(cr, &lines)?;
            let x = rect.map_coord_x(quake.position.0, 0.0, area_width);
            let y = rect.map_coord_y(quake.position.1, 0.0, area_height);
            let radius = self.marker_style(quake).radius;
            draw_text_box(cr, x - width / 2.0, y - radius - height - 6.0, &lines)?;
        }

        Ok(())
    }

    fn click(&self, x: f64, y: f64, drawing_area: &DrawingArea, focus_range: &FocusRange) -> bool {
        let area_width = drawing_area.width() as f64;
        let area_height = drawing_area.height() as f64;
        let rect = focus_range.to_rect(area_width, area_height);
        let world_x = rect.unmap_coord_x(x, 0.0, area_width);
        let world_y = rect.unmap_coord_y(y, 0.0, area_height);

        let picked = self.pick(world_x, world_y, focus_range.scale());
        self.select(picked);
        picked.is_some()
    }
}
