use std::f64::consts::PI;

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 100.0;
const ZOOM_STEP: f64 = 1.5;

/// Normalized Web Mercator y (0 at the north edge, 1 at the south edge)
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

/// Inverse of [`mercator_y`]
#[inline]
fn mercator_lat(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom factor; 1.0 fits the whole world across the canvas width
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Change the canvas size, keeping center and zoom
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.zoom * self.width.max(1) as f64;
        let x = (self.center_lon + 180.0) / 360.0 + dx as f64 / scale;
        let y = mercator_y(self.center_lat) + dy as f64 / scale;
        self.set_center(x, y);
    }

    /// Set the center from normalized Mercator coordinates, wrapping
    /// longitude and clamping latitude
    fn set_center(&mut self, x: f64, y: f64) {
        self.center_lon = x * 360.0 - 180.0;
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = mercator_lat(y).clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor, keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let scale = self.zoom * self.width.max(1) as f64;
        let x = (lon + 180.0) / 360.0 - (px as f64 - self.width as f64 / 2.0) / scale;
        let y = mercator_y(lat) - (py as f64 - self.height as f64 / 2.0) / scale;
        self.set_center(x, y);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    /// Sub-pixel variant of [`Viewport::unproject`]
    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;
        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let x = (px - self.width as f64 / 2.0) / scale + center_x;
        let y = (py - self.height as f64 / 2.0) / scale + center_y;

        (x * 360.0 - 180.0, mercator_lat(y))
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon + 180.0) / 360.0;
        let y = mercator_y(lat);

        let center_x = (self.center_lon + 180.0) / 360.0;
        let center_y = mercator_y(self.center_lat);

        let scale = self.zoom * self.width.max(1) as f64;

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a projected point is visible in the viewport (with margin)
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_unproject_round_trip() {
        let vp = Viewport::new(-96.0, 37.8, 4.0, 400, 200);
        let (px, py) = vp.project(-89.6, 39.8);
        let (lon, lat) = vp.unproject(px, py);
        // One pixel at this scale is ~0.23 degrees
        assert!((lon + 89.6).abs() < 0.5, "lon {lon}");
        assert!((lat - 39.8).abs() < 0.5, "lat {lat}");
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut vp = Viewport::new(-96.0, 37.8, 4.0, 400, 200);
        let before = vp.unproject(300, 50);
        vp.zoom_in_at(300, 50);
        let after = vp.unproject(300, 50);
        assert!(vp.zoom > 4.0);
        assert!((before.0 - after.0).abs() < 0.5);
        assert!((before.1 - after.1).abs() < 0.5);
    }

    #[test]
    fn test_vertical_pan_tracks_pointer() {
        let mut vp = Viewport::new(-96.0, 37.8, 4.0, 400, 200);
        let (cx, cy) = (vp.center_lon, vp.center_lat);
        vp.pan(0, -40);
        let (px, py) = vp.project(cx, cy);
        assert!((px - 200).abs() <= 1, "px {px}");
        assert!((py - 140).abs() <= 1, "py {py}");

        vp.pan(0, 40);
        assert!((vp.center_lat - cy).abs() < 1e-9);
        assert!((vp.center_lon - cx).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_out_at_keeps_point_fixed() {
        let mut vp = Viewport::new(-96.0, 37.8, 6.0, 400, 200);
        let before = vp.unproject_f(30.0, 180.0);
        vp.zoom_out_at(30, 180);
        let after = vp.unproject_f(30.0, 180.0);
        assert!((before.0 - after.0).abs() < 1e-6);
        assert!((before.1 - after.1).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        for _ in 0..50 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
    }
}
