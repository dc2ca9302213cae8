use gtk4::{cairo::Context, prelude::WidgetExt, DrawingArea};

use crate::geometry::{project, unproject, FocusRange, MAX_LATITUDE};

/// Graticule spacings in degrees, finest first.
const GRATICULE_STEPS: [f64; 4] = [1.0, 5.0, 10.0, 30.0];

/// On-screen spacing in pixels at which a graticule step starts to fade in.
const GRATICULE_MIN_SPACING: f64 = 24.0;

pub struct ViewState {
    focus_range: FocusRange,
    zoom_step: f64,
}

impl ViewState {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64) -> Self {
        let (x, y) = project(center_lon, center_lat);
        Self {
            focus_range: FocusRange::new(x, y, zoom),
            zoom_step: 0.25,
        }
    }

    pub fn focus_range(&self) -> &FocusRange {
        &self.focus_range
    }

    /// Scrolling down (positive `d_zoom_level`) zooms out.
    pub fn zoom(&mut self, d_zoom_level: f64) {
        let goal = self.focus_range.zoom_goal() - d_zoom_level * self.zoom_step;
        self.focus_range.set_zoom(goal);
    }

    /// Pans so the map follows a pointer drag of `dx`, `dy` pixels.
    pub fn move_focus(&mut self, dx: f64, dy: f64) {
        let scale = self.focus_range.scale();
        self.focus_range.move_center(-dx / scale, -dy / scale);
    }

    pub fn update(&mut self) -> bool {
        self.focus_range.update()
    }

    pub fn draw_graticule(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
    ) -> Result<(), gtk4::cairo::Error> {
        let area_width = drawing_area.width() as f64;
        let area_height = drawing_area.height() as f64;
        let rect = self.focus_range.to_rect(area_width, area_height);
        let scale = self.focus_range.scale();

        let (min_lon, max_lat) = unproject(rect.min_x.max(0.0), rect.min_y.max(0.0));
        let (max_lon, min_lat) = unproject(rect.max_x.min(1.0), rect.max_y.min(1.0));

        cr.set_line_width(1.0);

        for step in GRATICULE_STEPS {
            let alpha = graticule_alpha(step, scale);
            if alpha <= 0.0 {
                continue;
            }
            cr.set_source_rgba(0.0, 0.333, 0.533, alpha);

            let mut lon = (min_lon / step).floor() * step;
            while lon <= max_lon {
                let (x, _) = project(lon, 0.0);
                let ix = rect.map_coord_x(x, 0.0, area_width);
                cr.move_to(ix, rect.map_coord_y(0.0_f64.max(rect.min_y), 0.0, area_height));
                cr.line_to(ix, rect.map_coord_y(1.0_f64.min(rect.max_y), 0.0, area_height));
                lon += step;
            }

            let mut lat = (min_lat.max(-MAX_LATITUDE) / step).floor() * step;
            while lat <= max_lat.min(MAX_LATITUDE) {
                let (_, y) = project(0.0, lat);
                let iy = rect.map_coord_y(y, 0.0, area_height);
                cr.move_to(rect.map_coord_x(0.0_f64.max(rect.min_x), 0.0, area_width), iy);
                cr.line_to(rect.map_coord_x(1.0_f64.min(rect.max_x), 0.0, area_width), iy);
                lat += step;
            }

            cr.stroke()?;
        }

        Ok(())
    }
}

/// Opacity of the graticule lines `step` degrees apart at `scale` pixels per
/// world unit. Zero hides the step.
pub fn graticule_alpha(step: f64, scale: f64) -> f64 {
    let spacing = step / 360.0 * scale;
    ((spacing - GRATICULE_MIN_SPACING) / (GRATICULE_MIN_SPACING * 2.0)).clamp(0.0, 1.0) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fine_steps_hidden_when_zoomed_out() {
        let scale = 256.0;
        assert_eq!(graticule_alpha(1.0, scale), 0.0);
        assert_eq!(graticule_alpha(5.0, scale), 0.0);
        assert!(graticule_alpha(30.0, scale) <= 0.0);

        let scale = 256.0 * 8.0;
        assert_eq!(graticule_alpha(1.0, scale), 0.0);
        assert!(graticule_alpha(10.0, scale) > 0.0);
        assert_eq!(graticule_alpha(30.0, scale), 0.4);
    }

    #[test]
    fn scroll_down_zooms_out() {
        let mut view = ViewState::new(0.0, 0.0, 3.0);
        view.zoom(4.0);
        assert_eq!(view.focus_range().zoom_goal(), 2.0);
        view.zoom(-8.0);
        assert_eq!(view.focus_range().zoom_goal(), 4.0);
    }

    #[test]
    fn drag_moves_map_with_pointer() {
        let mut view = ViewState::new(0.0, 0.0, 0.0);
        // Dragging right by a quarter of the world moves the center west.
        view.move_focus(64.0, 0.0);
        for _ in 0..64 {
            view.update();
        }
        let (x, y) = view.focus_range().center();
        assert!((x - 0.25).abs() < 1e-6);
        assert!((y - 0.5).abs() < 1e-6);
    }
}
