use crate::data::{PointFeature, StateFeature};
use crate::format;

/// Text shown in a map popup. The first line is the bold `title` followed
/// by plain `title_tail`; body lines are plain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub title_tail: String,
    pub lines: Vec<String>,
}

impl Popup {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            title_tail: String::new(),
            lines,
        }
    }

    /// City marker popup: bold city, then `", <state>"` / `"Population: 150,000"`
    pub fn for_city(feature: &PointFeature) -> Self {
        Self {
            title: feature.city.clone(),
            title_tail: format!(", {}", feature.state),
            lines: vec![format!("Population: {}", format::thousands(feature.population))],
        }
    }

    /// Full first line, bold and plain parts together
    pub fn heading(&self) -> String {
        format!("{}{}", self.title, self.title_tail)
    }

    /// All text as one newline-separated string
    pub fn text(&self) -> String {
        std::iter::once(self.heading())
            .chain(self.lines.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Widest line in characters
    pub fn width(&self) -> usize {
        std::iter::once(self.heading())
            .chain(self.lines.iter().cloned())
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// Per-feature popup state. Starts closed; no terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopupState {
    #[default]
    Closed,
    Open,
}

/// Interaction callbacks attached to a polygon layer.
pub trait HoverHandler: Send + Sync {
    /// Popup to open when the pointer enters `feature`.
    fn on_hover(&self, feature: &StateFeature) -> Popup;

    /// Called when the pointer leaves `feature`, after its popup closes.
    fn on_hover_end(&self, _feature: &StateFeature) {}
}

/// Hover popup showing a state's name and population density.
pub struct DensityPopup;

impl HoverHandler for DensityPopup {
    fn on_hover(&self, feature: &StateFeature) -> Popup {
        Popup::new(
            feature.name.clone(),
            vec![format!("Density: {} people/sq mi", format::decimal(feature.density))],
        )
    }

    fn on_hover_end(&self, feature: &StateFeature) {
        tracing::trace!(state = %feature.name, "hover end");
    }
}
