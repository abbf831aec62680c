use crate::config::AppConfig;
use crate::data::{self, CityRecord, LoadHandle, StateLoad};
use crate::legend::Legend;
use crate::map::{BaseLayer, DensityPopup, MapView, MarkerStyle, PolygonStyle};
use crate::style::{density_color, radius};
use crate::ui;
use ratatui::layout::Rect;
use tracing::{error, info, warn};

/// Which map a pane shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    Cities,
    Density,
}

impl Pane {
    pub fn other(self) -> Self {
        match self {
            Pane::Cities => Pane::Density,
            Pane::Density => Pane::Cities,
        }
    }
}

/// Lifecycle of one data pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    Loading,
    Ready,
    Failed,
}

/// Application state
pub struct App {
    pub cities: MapView,
    pub density: MapView,
    pub cities_status: PipelineStatus,
    pub density_status: PipelineStatus,
    /// Built once the density layer has rendered
    pub legend: Option<Legend>,
    pub focus: Pane,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Whether the current press has moved (a drag, not a click)
    dragged: bool,
    /// Last pointer position, for the cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Inner map areas (cities, density) in terminal cells
    areas: [Rect; 2],
    cities_load: Option<LoadHandle<Vec<CityRecord>>>,
    states_load: Option<LoadHandle<StateLoad>>,
    marker_style: MarkerStyle,
    polygon_style: PolygonStyle,
}

impl App {
    /// Build the app and issue both loads
    pub fn new(config: &AppConfig, base: BaseLayer, width: u16, height: u16) -> Self {
        let cities_load = data::load_cities(&config.data.cities);
        let states_load = data::load_states(&config.data.states);
        info!(cities = ?config.data.cities, states = ?config.data.states, "loads issued");

        Self::with_loads(config, base, width, height, Some(cities_load), Some(states_load))
    }

    fn with_loads(
        config: &AppConfig,
        base: BaseLayer,
        width: u16,
        height: u16,
        cities_load: Option<LoadHandle<Vec<CityRecord>>>,
        states_load: Option<LoadHandle<StateLoad>>,
    ) -> Self {
        let mut app = Self {
            cities: MapView::new(config.cities_view.viewport(0, 0), base.clone()),
            density: MapView::new(config.density_view.viewport(0, 0), base),
            cities_status: PipelineStatus::Loading,
            density_status: PipelineStatus::Loading,
            legend: None,
            focus: Pane::Cities,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            areas: [Rect::default(); 2],
            cities_load,
            states_load,
            marker_style: config.style.marker_style(),
            polygon_style: config.style.polygon_style(),
        };
        app.resize(width, height);
        app
    }

    /// Recompute pane areas and viewport sizes for a new terminal size
    pub fn resize(&mut self, width: u16, height: u16) {
        let [cities, density] = ui::map_areas(Rect::new(0, 0, width, height));
        self.areas = [cities, density];
        // Braille gives 2x4 resolution per character
        self.cities.viewport.resize(cities.width as usize * 2, cities.height as usize * 4);
        self.density.viewport.resize(density.width as usize * 2, density.height as usize * 4);
    }

    /// Check both loads; run each pipeline's continuation once its data arrives
    pub fn poll_loads(&mut self) {
        if let Some(result) = self.cities_load.as_ref().and_then(LoadHandle::try_complete) {
            self.cities_load = None;
            match result {
                Ok(records) => self.show_cities(&records),
                Err(e) => {
                    error!(error = %e, "city load failed");
                    self.cities_status = PipelineStatus::Failed;
                }
            }
        }

        if let Some(result) = self.states_load.as_ref().and_then(LoadHandle::try_complete) {
            self.states_load = None;
            match result {
                Ok(states) => self.show_states(states),
                Err(e) => {
                    error!(error = %e, "state load failed");
                    self.density_status = PipelineStatus::Failed;
                }
            }
        }
    }

    /// Transform city records and draw them as proportional symbols
    pub fn show_cities(&mut self, records: &[CityRecord]) {
        let (collection, errors) = data::to_point_collection(records);
        for e in &errors {
            warn!(error = %e, "dropping city record");
        }
        info!(cities = collection.len(), dropped = errors.len(), "city layer ready");

        self.cities.render_points(collection, radius, self.marker_style);
        self.cities_status = PipelineStatus::Ready;
    }

    /// Draw state polygons as a choropleth, then build the legend
    pub fn show_states(&mut self, (states, errors): StateLoad) {
        for e in &errors {
            warn!(error = %e, "dropping state feature");
        }
        info!(states = states.len(), dropped = errors.len(), "density layer ready");

        self.density.render_polygons(states, density_color, DensityPopup, self.polygon_style);
        self.legend = Some(Legend::density());
        self.density_status = PipelineStatus::Ready;
    }

    pub fn view(&self, pane: Pane) -> &MapView {
        match pane {
            Pane::Cities => &self.cities,
            Pane::Density => &self.density,
        }
    }

    fn view_mut(&mut self, pane: Pane) -> &mut MapView {
        match pane {
            Pane::Cities => &mut self.cities,
            Pane::Density => &mut self.density,
        }
    }

    pub fn area(&self, pane: Pane) -> Rect {
        match pane {
            Pane::Cities => self.areas[0],
            Pane::Density => self.areas[1],
        }
    }

    /// Pane under a terminal cell, with the Braille pixel inside that pane
    pub fn locate(&self, col: u16, row: u16) -> Option<(Pane, (i32, i32))> {
        [Pane::Cities, Pane::Density].into_iter().find_map(|pane| {
            let area = self.area(pane);
            let inside = col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height;
            inside.then(|| {
                let px = (col - area.x) as i32 * 2 + 1;
                let py = (row - area.y) as i32 * 4 + 2;
                (pane, (px, py))
            })
        })
    }

    pub fn switch_focus(&mut self) {
        self.focus = self.focus.other();
    }

    /// Pan the focused map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.view_mut(self.focus).viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.view_mut(self.focus).viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.view_mut(self.focus).viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((pane, (px, py))) = self.locate(col, row) {
            self.focus = pane;
            self.view_mut(pane).viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((pane, (px, py))) = self.locate(col, row) {
            self.focus = pane;
            self.view_mut(pane).viewport.zoom_out_at(px, py);
        }
    }

    /// Restore both maps to their initial view
    pub fn reset_views(&mut self) {
        self.cities.reset();
        self.density.reset();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Mouse button pressed
    pub fn begin_press(&mut self, col: u16, row: u16) {
        if let Some((pane, _)) = self.locate(col, row) {
            self.focus = pane;
        }
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag: pan the focused map
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // One cell is 2x4 Braille pixels
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse button released: a press without movement is a click
    pub fn end_press(&mut self, col: u16, row: u16) {
        if self.last_mouse.is_some() && !self.dragged {
            self.click(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    /// Click on the city map opens the popup of the marker under the cursor
    pub fn click(&mut self, col: u16, row: u16) {
        if let Some((Pane::Cities, (px, py))) = self.locate(col, row) {
            self.cities.click(px, py);
        }
    }

    /// Pointer moved: drive hover state on the density map
    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let pixel = match self.locate(col, row) {
            Some((Pane::Density, pixel)) => Some(pixel),
            _ => None,
        };
        self.density.pointer_moved(pixel);
    }

    /// Status line text for the focused map: zoom and center
    pub fn focus_summary(&self) -> String {
        let vp = &self.view(self.focus).viewport;
        format!(
            "{:.1}x  {:.1}°{}, {:.1}°{}",
            vp.zoom,
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}
