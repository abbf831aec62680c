//! Terminal renditions of two U.S. population maps: a proportional-symbol
//! map of cities and a choropleth of state population density.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod legend;
pub mod map;
pub mod style;
pub mod ui;
