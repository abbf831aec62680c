use crate::braille::BrailleCanvas;
use crate::data::{PointCollection, StateFeature};
use crate::map::geometry::{draw_circle, draw_line, draw_ring, draw_stroke, Stroke};
use crate::map::popup::{HoverHandler, Popup, PopupState};
use crate::map::projection::Viewport;
use crate::map::spatial::FeatureGrid;
use crate::style::Rgb;
use geo::{Contains, Point};
use rayon::prelude::*;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Braille dots per marker-radius unit. Marker radii are screen pixels;
/// a Braille dot is roughly four of them.
const MARKER_SCALE: f64 = 0.25;

/// Grid cell size (degrees) for polygon hit testing
const HIT_GRID_DEGREES: f64 = 1.0;

/// Terminal background the fills are composited over
const BACKGROUND: Rgb = Rgb(0, 0, 0);

/// Background layer drawn under every overlay
#[derive(Clone, Debug, Default)]
pub struct BaseLayer {
    pub attribution: String,
    pub lines: Vec<LineString>,
}

/// Marker appearance for point layers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub fill: Rgb,
    /// One-dot outline colour
    pub stroke: Rgb,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            fill: Rgb(0xff, 0, 0),
            stroke: Rgb(0, 0, 0),
        }
    }
}

/// Polygon appearance for choropleth layers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonStyle {
    pub border: Rgb,
    pub stroke: Stroke,
    pub fill_opacity: f64,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            border: Rgb(0xff, 0xff, 0xff),
            stroke: Stroke {
                weight: 2,
                dash: Some(3),
            },
            fill_opacity: 0.7,
        }
    }
}

struct Marker {
    lon: f64,
    lat: f64,
    radius: u32,
    popup: Popup,
}

struct PointLayer {
    markers: Vec<Marker>,
    style: MarkerStyle,
    open: Option<usize>,
}

struct PolygonLayer {
    features: Vec<StateFeature>,
    fills: Vec<Rgb>,
    style: PolygonStyle,
    grid: FeatureGrid,
    handlers: Box<dyn HoverHandler>,
    states: Vec<PopupState>,
    /// Feature under the pointer, if any
    hovered: Option<usize>,
    /// Open popups keyed by feature, with their geographic anchor
    open: Vec<(usize, (f64, f64), Popup)>,
}

impl PolygonLayer {
    fn hit_test(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        self.grid
            .query_point(lon, lat)
            .iter()
            .copied()
            .find(|&i| self.features[i].geometry.contains(&point))
    }

    fn open_popup(&mut self, idx: usize, anchor: (f64, f64)) {
        let popup = self.handlers.on_hover(&self.features[idx]);
        self.states[idx] = PopupState::Open;
        match self.open.iter_mut().find(|(i, _, _)| *i == idx) {
            Some(entry) => *entry = (idx, anchor, popup),
            None => self.open.push((idx, anchor, popup)),
        }
    }

    fn close_popup(&mut self, idx: usize) {
        self.states[idx] = PopupState::Closed;
        self.open.retain(|(i, _, _)| *i != idx);
        self.handlers.on_hover_end(&self.features[idx]);
    }
}

/// A popup positioned in terminal cells relative to the map's inner area
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedPopup {
    pub popup: Popup,
    pub col: i32,
    pub row: i32,
}

/// Rendered map layers, ready for the terminal widget
pub struct MapLayers {
    pub base: BrailleCanvas,
    pub outlines: BrailleCanvas,
    pub markers: BrailleCanvas,
    /// Marker outlines; drawn under `markers` so filled cells keep the fill colour
    pub marker_strokes: BrailleCanvas,
    /// Per-cell fill colour, row-major
    pub fills: Vec<Option<Rgb>>,
    pub marker_color: Rgb,
    pub marker_stroke: Rgb,
    pub outline_color: Rgb,
    pub popups: Vec<PlacedPopup>,
}

/// One map: viewport, base layer, and overlay layers with their popup state
pub struct MapView {
    pub viewport: Viewport,
    home: Viewport,
    pub base: BaseLayer,
    points: Option<PointLayer>,
    polygons: Option<PolygonLayer>,
}

impl MapView {
    pub fn new(viewport: Viewport, base: BaseLayer) -> Self {
        Self {
            home: viewport.clone(),
            viewport,
            base,
            points: None,
            polygons: None,
        }
    }

    /// Restore the initial center and zoom
    pub fn reset(&mut self) {
        let (width, height) = (self.viewport.width, self.viewport.height);
        self.viewport = self.home.clone();
        self.viewport.resize(width, height);
    }

    pub fn has_overlay(&self) -> bool {
        self.points.is_some() || self.polygons.is_some()
    }

    /// Add a proportional-symbol layer: one marker per feature, sized by `radius`
    pub fn render_points(&mut self, collection: PointCollection, radius: impl Fn(u64) -> u32, style: MarkerStyle) {
        let markers = collection
            .features
            .into_iter()
            .map(|f| Marker {
                lon: f.lon,
                lat: f.lat,
                radius: radius(f.population),
                popup: Popup::for_city(&f),
            })
            .collect();

        self.points = Some(PointLayer {
            markers,
            style,
            open: None,
        });
    }

    /// Add a choropleth layer: each polygon filled by `color(density)`,
    /// with hover callbacks from `handlers`
    pub fn render_polygons(
        &mut self,
        features: Vec<StateFeature>,
        color: impl Fn(f64) -> Rgb,
        handlers: impl HoverHandler + 'static,
        style: PolygonStyle,
    ) {
        let fills = features.iter().map(|f| color(f.density)).collect();
        let grid = FeatureGrid::build(features.iter().map(StateFeature::bbox), HIT_GRID_DEGREES);
        let states = vec![PopupState::Closed; features.len()];

        self.polygons = Some(PolygonLayer {
            features,
            fills,
            style,
            grid,
            handlers: Box::new(handlers),
            states,
            hovered: None,
            open: Vec::new(),
        });
    }

    /// Popup state of polygon `idx`
    pub fn popup_state(&self, idx: usize) -> Option<PopupState> {
        self.polygons.as_ref()?.states.get(idx).copied()
    }

    /// Open the hover popup for polygon `idx`. Idempotent.
    pub fn on_hover(&mut self, idx: usize, anchor: (f64, f64)) {
        if let Some(layer) = self.polygons.as_mut().filter(|l| idx < l.features.len()) {
            layer.open_popup(idx, anchor);
        }
    }

    /// Close the hover popup for polygon `idx`. Idempotent.
    pub fn on_hover_end(&mut self, idx: usize) {
        if let Some(layer) = self.polygons.as_mut().filter(|l| idx < l.features.len()) {
            if layer.states[idx] == PopupState::Open {
                layer.close_popup(idx);
            }
        }
    }

    /// Pointer moved to pixel (px, py): fire hover-end on the polygon it left
    /// and hover on the polygon it entered. `None` leaves the map.
    pub fn pointer_moved(&mut self, pixel: Option<(i32, i32)>) {
        let Some(layer) = self.polygons.as_ref() else {
            return;
        };

        let at = pixel.map(|(px, py)| self.viewport.unproject(px, py));
        let hit = at.and_then(|(lon, lat)| layer.hit_test(lon, lat));
        let previous = layer.hovered;

        if previous != hit {
            if let Some(prev) = previous {
                self.on_hover_end(prev);
            }
            if let (Some(idx), Some(anchor)) = (hit, at) {
                self.on_hover(idx, anchor);
            }
        }
        if let Some(layer) = self.polygons.as_mut() {
            layer.hovered = hit;
        }
    }

    /// Classified radius of marker `idx`
    pub fn marker_radius(&self, idx: usize) -> Option<u32> {
        self.points.as_ref()?.markers.get(idx).map(|m| m.radius)
    }

    /// Index of the topmost marker under pixel (px, py)
    fn marker_at(&self, px: i32, py: i32) -> Option<usize> {
        let layer = self.points.as_ref()?;
        layer.markers.iter().enumerate().rev().find_map(|(i, m)| {
            let (mx, my) = self.viewport.project(m.lon, m.lat);
            let r = marker_dots(m.radius) + 1;
            let (dx, dy) = (mx - px, my - py);
            (dx * dx + dy * dy <= r * r).then_some(i)
        })
    }

    /// Click at pixel (px, py): open the popup of the marker under it,
    /// or close the open marker popup. Returns the marker index opened.
    pub fn click(&mut self, px: i32, py: i32) -> Option<usize> {
        let hit = self.marker_at(px, py);
        if let Some(layer) = self.points.as_mut() {
            layer.open = hit;
        }
        hit
    }

    /// Currently open popups (markers and polygons)
    pub fn open_popups(&self) -> Vec<&Popup> {
        let marker = self
            .points
            .as_ref()
            .and_then(|l| l.open.map(|i| &l.markers[i].popup));
        let polygons = self.polygons.iter().flat_map(|l| l.open.iter().map(|(_, _, p)| p));
        marker.into_iter().chain(polygons).collect()
    }

    /// Render every layer into a `cols` x `rows` cell grid
    pub fn draw(&self, cols: usize, rows: usize) -> MapLayers {
        let viewport = &self.viewport;

        let mut base = BrailleCanvas::new(cols, rows);
        for line in &self.base.lines {
            draw_linestring(&mut base, line, viewport);
        }

        let mut outlines = BrailleCanvas::new(cols, rows);
        let mut fills = vec![None; cols * rows];
        let mut markers = BrailleCanvas::new(cols, rows);
        let mut marker_strokes = BrailleCanvas::new(cols, rows);
        let mut popups = Vec::new();
        let mut marker_color = MarkerStyle::default().fill;
        let mut marker_stroke = MarkerStyle::default().stroke;
        let mut outline_color = PolygonStyle::default().border;

        if let Some(layer) = &self.polygons {
            outline_color = layer.style.border;
            fill_cells(&mut fills, cols, layer, viewport);

            for feature in &layer.features {
                for polygon in &feature.geometry {
                    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
                    for ring in rings {
                        let coords: Vec<(f64, f64)> = ring.coords().map(|c| (c.x, c.y)).collect();
                        stroke_ring(&mut outlines, &coords, viewport, layer.style.stroke);
                    }
                }
            }

            for (_, (lon, lat), popup) in &layer.open {
                popups.push(place_popup(popup, viewport.project(*lon, *lat)));
            }
        }

        if let Some(layer) = &self.points {
            marker_color = layer.style.fill;
            marker_stroke = layer.style.stroke;
            for marker in &layer.markers {
                let (px, py) = viewport.project(marker.lon, marker.lat);
                if viewport.is_visible(px, py) {
                    let dots = marker_dots(marker.radius);
                    draw_circle(&mut markers, px, py, dots);
                    draw_ring(&mut marker_strokes, px, py, dots + 1);
                }
            }

            if let Some(marker) = layer.open.map(|i| &layer.markers[i]) {
                let (px, py) = viewport.project(marker.lon, marker.lat);
                popups.push(place_popup(&marker.popup, (px, py - marker_dots(marker.radius))));
            }
        }

        MapLayers {
            base,
            outlines,
            markers,
            marker_strokes,
            fills,
            marker_color,
            marker_stroke,
            outline_color,
            popups,
        }
    }
}

/// Marker radius in Braille dots
pub fn marker_dots(radius: u32) -> i32 {
    ((radius as f64 * MARKER_SCALE).round() as i32).max(1)
}

fn place_popup(popup: &Popup, (px, py): (i32, i32)) -> PlacedPopup {
    PlacedPopup {
        popup: popup.clone(),
        col: px.div_euclid(2),
        row: py.div_euclid(4),
    }
}

/// Colour each cell by the polygon containing its center
fn fill_cells(fills: &mut [Option<Rgb>], cols: usize, layer: &PolygonLayer, viewport: &Viewport) {
    if cols == 0 {
        return;
    }
    fills.par_chunks_mut(cols).enumerate().for_each(|(row, cells)| {
        for (col, cell) in cells.iter_mut().enumerate() {
            let (lon, lat) = viewport.unproject_f(col as f64 * 2.0 + 1.0, row as f64 * 4.0 + 2.0);
            *cell = layer
                .hit_test(lon, lat)
                .map(|i| layer.fills[i].over(BACKGROUND, layer.style.fill_opacity));
        }
    });
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

/// Stroke a polygon ring, keeping the dash phase continuous around it
fn stroke_ring(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], viewport: &Viewport, stroke: Stroke) {
    let mut phase = 0;
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in ring {
        let p = viewport.project(lon, lat);
        if let Some(q) = prev {
            if viewport.line_might_be_visible(q, p) {
                draw_stroke(canvas, q.0, q.1, p.0, p.1, stroke, &mut phase);
            } else {
                phase = 0;
            }
        }
        prev = Some(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PointFeature, StateFeature};
    use crate::map::popup::DensityPopup;
    use crate::style::{density_color, radius};
    use geo::{polygon, MultiPolygon};

    fn square(name: &str, density: f64, min: (f64, f64), max: (f64, f64)) -> StateFeature {
        StateFeature {
            name: name.into(),
            density,
            geometry: MultiPolygon::new(vec![polygon![
                (x: min.0, y: min.1),
                (x: max.0, y: min.1),
                (x: max.0, y: max.1),
                (x: min.0, y: max.1),
                (x: min.0, y: min.1),
            ]]),
        }
    }

    fn density_view() -> MapView {
        let mut view = MapView::new(Viewport::new(-104.0, 40.0, 8.0, 200, 120), BaseLayer::default());
        view.render_polygons(
            vec![
                square("Colorado", 49.33, (-109.05, 37.0), (-102.05, 41.0)),
                square("Wyoming", 5.851, (-111.05, 41.0), (-104.05, 45.0)),
            ],
            density_color,
            DensityPopup,
            PolygonStyle::default(),
        );
        view
    }

    #[test]
    fn test_hover_opens_and_closes() {
        let mut view = density_view();
        assert_eq!(view.popup_state(0), Some(PopupState::Closed));

        let colorado = view.viewport.project(-105.5, 39.0);
        view.pointer_moved(Some(colorado));
        assert_eq!(view.popup_state(0), Some(PopupState::Open));
        assert_eq!(view.popup_state(1), Some(PopupState::Closed));
        assert_eq!(view.open_popups()[0].title, "Colorado");

        let wyoming = view.viewport.project(-108.0, 43.0);
        view.pointer_moved(Some(wyoming));
        assert_eq!(view.popup_state(0), Some(PopupState::Closed));
        assert_eq!(view.popup_state(1), Some(PopupState::Open));
        assert_eq!(view.open_popups().len(), 1);
        assert_eq!(view.open_popups()[0].lines[0], "Density: 5.851 people/sq mi");

        view.pointer_moved(None);
        assert_eq!(view.popup_state(1), Some(PopupState::Closed));
        assert!(view.open_popups().is_empty());
    }

    #[test]
    fn test_hover_idempotent_and_independent() {
        let mut view = density_view();
        view.on_hover(0, (-105.0, 39.0));
        view.on_hover(0, (-105.0, 39.0));
        view.on_hover(1, (-108.0, 43.0));
        assert_eq!(view.open_popups().len(), 2);

        view.on_hover_end(0);
        view.on_hover_end(0);
        assert_eq!(view.popup_state(0), Some(PopupState::Closed));
        assert_eq!(view.popup_state(1), Some(PopupState::Open));
        assert_eq!(view.open_popups().len(), 1);

        // Out-of-range indices are ignored
        view.on_hover(99, (0.0, 0.0));
        assert_eq!(view.popup_state(99), None);
    }

    #[test]
    fn test_fills_follow_density() {
        let view = density_view();
        let layers = view.draw(100, 30);
        let (px, py) = view.viewport.project(-105.5, 39.0);
        let cell = (py / 4) as usize * 100 + (px / 2) as usize;
        let expected = density_color(49.33).over(Rgb(0, 0, 0), 0.7);
        assert_eq!(layers.fills[cell], Some(expected));
        assert!(layers.fills.iter().any(Option::is_none));
    }

    #[test]
    fn test_springfield_marker() {
        let mut view = MapView::new(Viewport::new(-96.0, 37.8, 4.0, 200, 120), BaseLayer::default());
        let springfield = PointFeature {
            lon: -89.6,
            lat: 39.8,
            city: "Springfield".into(),
            state: "Illinois".into(),
            rank: 150,
            population: 150_000,
        };
        view.render_points(PointCollection { features: vec![springfield] }, radius, MarkerStyle::default());

        assert_eq!(view.marker_radius(0), Some(7));
        assert_eq!(view.marker_radius(1), None);

        let (px, py) = view.viewport.project(-89.6, 39.8);
        assert_eq!(view.click(px + 1, py), Some(0));
        let text = view.open_popups()[0].text();
        assert!(text.contains("Springfield"));
        assert!(text.contains("150,000"));

        let layers = view.draw(100, 30);
        assert_eq!(layers.popups.len(), 1);
        assert!(layers.markers.glyph((px / 2) as usize, (py / 4) as usize).is_some());
        assert_eq!(layers.marker_stroke, Rgb(0, 0, 0));
        // Outline ring sits just outside the two-dot fill
        assert!(layers.marker_strokes.glyph(((px + 3) / 2) as usize, (py / 4) as usize).is_some());

        assert_eq!(view.click(0, 0), None);
        assert!(view.open_popups().is_empty());
    }

    #[test]
    fn test_marker_dots() {
        assert_eq!(marker_dots(4), 1);
        assert_eq!(marker_dots(7), 2);
        assert_eq!(marker_dots(25), 6);
    }

    #[test]
    fn test_reset_keeps_size() {
        let mut view = MapView::new(Viewport::new(-96.0, 37.8, 4.0, 10, 10), BaseLayer::default());
        view.viewport.resize(300, 200);
        view.viewport.zoom_in();
        view.viewport.pan(40, 0);
        view.reset();
        assert_eq!(view.viewport, Viewport::new(-96.0, 37.8, 4.0, 300, 200));
    }
}
