use std::f64::consts::PI;

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude at which Web Mercator becomes a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Projects longitude/latitude in degrees to Web Mercator world coordinates
/// in the unit square, x growing east and y growing south.
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// A rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn map_coord_x(&self, x: f64, map_min_x: f64, map_max_x: f64) -> f64 {
        map_min_x + ((x - self.min_x) / self.width()) * (map_max_x - map_min_x)
    }

    pub fn map_coord_y(&self, y: f64, map_min_y: f64, map_max_y: f64) -> f64 {
        map_min_y + ((y - self.min_y) / self.height()) * (map_max_y - map_min_y)
    }

    pub fn unmap_coord_x(&self, x: f64, map_min_x: f64, map_max_x: f64) -> f64 {
        self.min_x + ((x - map_min_x) / (map_max_x - map_min_x)) * self.width()
    }

    pub fn unmap_coord_y(&self, y: f64, map_min_y: f64, map_max_y: f64) -> f64 {
        self.min_y + ((y - map_min_y) / (map_max_y - map_min_y)) * self.height()
    }
}

/// The part of the world the viewer is looking at. Center and zoom glide
/// towards their goals on every [`FocusRange::update`].
#[derive(Debug)]
pub struct FocusRange {
    center_x: f64,
    center_y: f64,
    center_goal_x: f64,
    center_goal_y: f64,
    move_smooth_factor: f64,
    zoom_smooth_factor: f64,
    zoom: f64,
    zoom_goal: f64,
}

impl FocusRange {
    pub fn new(center_x: f64, center_y: f64, zoom: f64) -> Self {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self {
            center_x,
            center_y,
            center_goal_x: center_x,
            center_goal_y: center_y,
            move_smooth_factor: 0.5,
            zoom_smooth_factor: 0.5,
            zoom,
            zoom_goal: zoom,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_goal(&self) -> f64 {
        self.zoom_goal
    }

    /// Pixels per world unit.
    pub fn scale(&self) -> f64 {
        TILE_SIZE * 2.0_f64.powf(self.zoom)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_x, self.center_y)
    }

    pub fn move_center(&mut self, dx: f64, dy: f64) {
        self.center_goal_x = (self.center_goal_x + dx).clamp(0.0, 1.0);
        self.center_goal_y = (self.center_goal_y + dy).clamp(0.0, 1.0);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom_goal = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Steps towards the goals. Returns whether anything visibly changed.
    pub fn update(&mut self) -> bool {
        let before = (self.center_x, self.center_y, self.zoom);

        self.center_x = self.center_x * (1.0 - self.move_smooth_factor)
            + self.center_goal_x * self.move_smooth_factor;
        self.center_y = self.center_y * (1.0 - self.move_smooth_factor)
            + self.center_goal_y * self.move_smooth_factor;
        self.zoom =
            self.zoom * (1.0 - self.zoom_smooth_factor) + self.zoom_goal * self.zoom_smooth_factor;

        let scale = self.scale();
        (self.center_x - before.0).abs() * scale > 0.01
            || (self.center_y - before.1).abs() * scale > 0.01
            || (self.zoom - before.2).abs() > 1e-4
    }

    pub fn to_rect(&self, image_width: f64, image_height: f64) -> Rect {
        let scale = self.scale();
        let width_2 = image_width / scale / 2.0;
        let height_2 = image_height / scale / 2.0;

        Rect::new(
            self.center_x - width_2,
            self.center_y - height_2,
            self.center_x + width_2,
            self.center_y + height_2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn projects_known_points() {
        let (x, y) = project(0.0, 0.0);
        assert_close(x, 0.5);
        assert_close(y, 0.5);

        let (x, y) = project(-180.0, MAX_LATITUDE);
        assert_close(x, 0.0);
        assert!(y.abs() < 1e-6);

        let (x, y) = project(180.0, -MAX_LATITUDE);
        assert_close(x, 1.0);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn polar_latitudes_are_clamped() {
        assert_eq!(project(10.0, 90.0), project(10.0, MAX_LATITUDE));
        assert_eq!(project(10.0, -90.0), project(10.0, -MAX_LATITUDE));
    }

    #[test]
    fn unproject_inverts_project() {
        for (lon, lat) in [(-82.30695, 27.96044), (139.7, 35.7), (-70.6, -33.4)] {
            let (x, y) = project(lon, lat);
            let (lon2, lat2) = unproject(x, y);
            assert_close(lon, lon2);
            assert_close(lat, lat2);
        }
    }

    #[test]
    fn rect_maps_and_unmaps_pixels() {
        let rect = Rect::new(0.25, 0.25, 0.75, 0.5);
        assert_close(rect.map_coord_x(0.5, 0.0, 800.0), 400.0);
        assert_close(rect.map_coord_y(0.5, 0.0, 400.0), 400.0);
        // Points outside the rectangle map outside the screen.
        assert_close(rect.map_coord_x(1.0, 0.0, 800.0), 1200.0);
        assert_close(rect.unmap_coord_x(400.0, 0.0, 800.0), 0.5);
        assert_close(rect.unmap_coord_y(200.0, 0.0, 400.0), 0.375);
    }

    #[test]
    fn rect_matches_zoom_scale() {
        let focus = FocusRange::new(0.5, 0.5, 1.0);
        assert_close(focus.scale(), 512.0);
        let rect = focus.to_rect(512.0, 256.0);
        assert_close(rect.width(), 1.0);
        assert_close(rect.height(), 0.5);
        assert_close(rect.min_x, 0.0);
        assert_close(rect.min_y, 0.25);
    }

    #[test]
    fn update_glides_towards_goal() {
        let mut focus = FocusRange::new(0.5, 0.5, 2.0);
        focus.move_center(0.2, -0.2);
        focus.set_zoom(4.0);

        assert!(focus.update());
        let (x, y) = focus.center();
        assert_close(x, 0.6);
        assert_close(y, 0.4);
        assert_close(focus.zoom(), 3.0);

        for _ in 0..64 {
            focus.update();
        }
        assert!(!focus.update());
        assert!((focus.zoom() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn goals_are_clamped() {
        let mut focus = FocusRange::new(0.9, 0.1, 3.0);
        focus.move_center(0.5, -0.5);
        focus.set_zoom(40.0);
        for _ in 0..64 {
            focus.update();
        }
        let (x, y) = focus.center();
        assert!((x - 1.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        assert_eq!(focus.zoom_goal(), MAX_ZOOM);
    }
}
