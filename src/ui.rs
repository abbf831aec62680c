use crate::app::{App, Pane, PipelineStatus};
use crate::braille::BrailleCanvas;
use crate::legend::Legend;
use crate::map::{MapLayers, PlacedPopup, Popup};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget},
    Frame,
};

/// Split the screen into the two map panes and the status bar
fn layout(area: Rect) -> ([Rect; 2], Rect) {
    let [maps, status] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Maps
            Constraint::Length(1), // Status bar
        ])
        .areas(area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .areas(maps);

    (panes, status)
}

/// Inner (borderless) map areas for the cities and density panes
pub fn map_areas(area: Rect) -> [Rect; 2] {
    let (panes, _) = layout(area);
    panes.map(|pane| Block::default().borders(Borders::ALL).inner(pane))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let (panes, status) = layout(frame.area());

    render_map(frame, app, Pane::Cities, panes[0]);
    render_map(frame, app, Pane::Density, panes[1]);
    render_status_bar(frame, app, status);
}

fn pane_title(pane: Pane) -> &'static str {
    match pane {
        Pane::Cities => " U.S. Cities by Population ",
        Pane::Density => " U.S. Population Density ",
    }
}

fn render_map(frame: &mut Frame, app: &App, pane: Pane, area: Rect) {
    let view = app.view(pane);
    let border = if app.focus == pane { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            pane_title(pane),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            format!(" {} ", view.base.attribution),
            Style::default().fg(Color::DarkGray),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let status = match pane {
        Pane::Cities => app.cities_status,
        Pane::Density => app.density_status,
    };
    let notice = match (pane, status) {
        (_, PipelineStatus::Ready) => None,
        (Pane::Cities, PipelineStatus::Loading) => Some("Loading cities..."),
        (Pane::Density, PipelineStatus::Loading) => Some("Loading states..."),
        (Pane::Cities, PipelineStatus::Failed) => Some("City data failed to load"),
        (Pane::Density, PipelineStatus::Failed) => Some("State data failed to load"),
    };

    // Cursor marker only in the pane under the pointer
    let cursor_pos = app.mouse_pos.and_then(|(col, row)| match app.locate(col, row) {
        Some((hit, _)) if hit == pane => Some((col.saturating_sub(inner.x), row.saturating_sub(inner.y))),
        _ => None,
    });

    let mut layers = view.draw(inner.width as usize, inner.height as usize);
    let popups = std::mem::take(&mut layers.popups);

    let map_widget = MapWidget {
        layers,
        notice,
        cursor_pos,
    };
    frame.render_widget(map_widget, inner);

    if pane == Pane::Density {
        if let Some(legend) = &app.legend {
            frame.render_widget(LegendWidget { legend }, legend_area(legend, inner));
        }
    }

    for placed in &popups {
        if let Some(rect) = popup_area(placed, inner) {
            frame.render_widget(PopupWidget { popup: &placed.popup }, rect);
        }
    }
}

/// Custom widget that renders the braille map layers over the fill colours
struct MapWidget {
    layers: MapLayers,
    notice: Option<&'static str>,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(ch) = canvas.glyph(col, row) {
                    let (x, y) = (area.x + col as u16, area.y + row as u16);
                    buf[(x, y)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = area.width as usize;

        // 1. Polygon fills as cell backgrounds
        if cols > 0 {
            for (i, fill) in self.layers.fills.iter().enumerate() {
                let (col, row) = (i % cols, i / cols);
                if row >= area.height as usize {
                    break;
                }
                if let Some(rgb) = fill {
                    buf[(area.x + col as u16, area.y + row as u16)].set_bg((*rgb).into());
                }
            }
        }

        // 2. Base outline, then polygon borders, then marker outlines and fills on top
        Self::render_layer(&self.layers.base, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.outlines, self.layers.outline_color.into(), area, buf);
        Self::render_layer(&self.layers.marker_strokes, self.layers.marker_stroke.into(), area, buf);
        Self::render_layer(&self.layers.markers, self.layers.marker_color.into(), area, buf);

        if let Some(text) = self.notice {
            let width = text.chars().count() as u16;
            if width <= area.width && area.height > 0 {
                let x = area.x + (area.width - width) / 2;
                let y = area.y + area.height / 2;
                buf.set_string(x, y, text, Style::default().fg(Color::Yellow));
            }
        }

        // Render cursor marker
        if let Some((cx, cy)) = self.cursor_pos {
            if cx < area.width && cy < area.height {
                buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

/// Box for a popup: above its anchor, clamped inside the map area
fn popup_area(placed: &PlacedPopup, area: Rect) -> Option<Rect> {
    let width = (placed.popup.width() as u16 + 2).min(area.width);
    let height = (placed.popup.lines.len() as u16 + 3).min(area.height);
    if width < 3 || height < 3 {
        return None;
    }

    let max_x = (area.width - width) as i32;
    let max_y = (area.height - height) as i32;
    let x = (placed.col - width as i32 / 2).clamp(0, max_x);
    let y = (placed.row - height as i32).clamp(0, max_y);

    Some(Rect::new(area.x + x as u16, area.y + y as u16, width, height))
}

/// First popup line: bold title, plain tail
fn heading_line(popup: &Popup) -> Line<'_> {
    Line::from(vec![
        Span::styled(popup.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(popup.title_tail.as_str()),
    ])
}

struct PopupWidget<'a> {
    popup: &'a Popup,
}

impl Widget for PopupWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![heading_line(self.popup)];
        lines.extend(self.popup.lines.iter().map(|l| Line::from(l.as_str())));

        Clear.render(area, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray)),
            )
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .render(area, buf);
    }
}

/// Legend box anchored to the bottom-right corner of the map area
fn legend_area(legend: &Legend, area: Rect) -> Rect {
    let width = (legend.width() as u16 + 4).min(area.width);
    let height = (legend.entries.len() as u16 + 4).min(area.height);
    Rect::new(
        area.x + area.width - width,
        area.y + area.height - height,
        width,
        height,
    )
}

struct LegendWidget<'a> {
    legend: &'a Legend,
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines = vec![
            Line::from(Span::styled(
                self.legend.title.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.legend.subtitle.as_str(), Style::default().fg(Color::Gray))),
        ];
        lines.extend(self.legend.entries.iter().map(|entry| {
            Line::from(vec![
                Span::styled("██", Style::default().fg(entry.color.into())),
                Span::raw(" "),
                Span::raw(entry.label.as_str()),
            ])
        }));

        Clear.render(area, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .padding(Padding::horizontal(1)),
            )
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .render(area, buf);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focus = match app.focus {
        Pane::Cities => "cities",
        Pane::Density => "density",
    };

    let status = Line::from(vec![
        Span::styled(" [", Style::default().fg(Color::DarkGray)),
        Span::styled(focus, Style::default().fg(Color::Magenta)),
        Span::styled("] Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.focus_summary(), Style::default().fg(Color::Yellow)),
        Span::styled(
            " | Tab:focus hjkl:pan +/-:zoom r:reset click:city hover:state q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_areas_split_evenly() {
        let [cities, density] = map_areas(Rect::new(0, 0, 160, 48));
        assert_eq!(cities, Rect::new(1, 1, 78, 45));
        assert_eq!(density, Rect::new(81, 1, 78, 45));
    }

    #[test]
    fn test_popup_clamped_inside_area() {
        let area = Rect::new(10, 5, 40, 20);
        let placed = PlacedPopup {
            popup: Popup::new("Springfield, Illinois", vec!["Population: 150,000".into()]),
            col: 0,
            row: 1,
        };
        let rect = popup_area(&placed, area).expect("fits");
        assert_eq!(rect, Rect::new(10, 5, 23, 4));

        let centered = PlacedPopup { col: 20, row: 10, ..placed };
        assert_eq!(popup_area(&centered, area), Some(Rect::new(19, 11, 23, 4)));
    }

    #[test]
    fn test_city_heading_bolds_only_city() {
        let popup = Popup {
            title: "Springfield".into(),
            title_tail: ", Illinois".into(),
            lines: vec!["Population: 150,000".into()],
        };
        let line = heading_line(&popup);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "Springfield");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[1].content, ", Illinois");
        assert!(!line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_legend_bottom_right() {
        let legend = Legend::density();
        let rect = legend_area(&legend, Rect::new(0, 0, 80, 40));
        assert_eq!(rect, Rect::new(62, 28, 18, 12));
    }
}
