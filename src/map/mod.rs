mod geometry;
mod popup;
mod projection;
mod renderer;
mod spatial;

pub use geometry::Stroke;
pub use popup::{DensityPopup, HoverHandler, Popup, PopupState};
pub use projection::Viewport;
pub use renderer::{marker_dots, BaseLayer, LineString, MapLayers, MapView, MarkerStyle, PlacedPopup, PolygonStyle};
