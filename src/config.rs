use crate::error::ConfigError;
use crate::map::{MarkerStyle, PolygonStyle, Viewport};
use crate::style::Rgb;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "popmap.toml";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub base: BaseConfig,
    pub cities_view: ViewConfig,
    pub density_view: ViewConfig,
    pub style: StyleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub cities: PathBuf,
    pub states: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cities: PathBuf::from("data/cities.json"),
            states: PathBuf::from("data/states.geojson"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BaseConfig {
    pub attribution: String,
    /// GeoJSON outline for the base layer; a built-in U.S. outline when unset
    pub outline: Option<PathBuf>,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            attribution: "\u{a9} OpenStreetMap contributors".to_string(),
            outline: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lat: 37.8,
            center_lon: -96.0,
            zoom: 4.0,
        }
    }
}

impl ViewConfig {
    pub fn viewport(&self, width: usize, height: usize) -> Viewport {
        Viewport::new(self.center_lon, self.center_lat, self.zoom, width, height)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// City marker colour, `#rrggbb`
    pub marker_color: String,
    /// City marker outline colour, `#rrggbb`
    pub marker_stroke: String,
    /// State border colour, `#rrggbb`
    pub border_color: String,
    pub fill_opacity: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            marker_color: "#ff0000".to_string(),
            marker_stroke: "#000000".to_string(),
            border_color: "#ffffff".to_string(),
            fill_opacity: 0.7,
        }
    }
}

impl StyleConfig {
    fn color(value: &str, fallback: Rgb, key: &str) -> Rgb {
        Rgb::from_hex(value).unwrap_or_else(|| {
            tracing::warn!(key, value, "invalid colour, using {fallback}");
            fallback
        })
    }

    pub fn marker_style(&self) -> MarkerStyle {
        let default = MarkerStyle::default();
        MarkerStyle {
            fill: Self::color(&self.marker_color, default.fill, "style.marker_color"),
            stroke: Self::color(&self.marker_stroke, default.stroke, "style.marker_stroke"),
        }
    }

    pub fn polygon_style(&self) -> PolygonStyle {
        let default = PolygonStyle::default();
        PolygonStyle {
            border: Self::color(&self.border_color, default.border, "style.border_color"),
            fill_opacity: self.fill_opacity.clamp(0.0, 1.0),
            ..default
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file used while the terminal UI is running
    pub file: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("popmap.log"),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given; otherwise `popmap.toml` if present; otherwise defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_page() {
        let config = AppConfig::default();
        assert_eq!(config.cities_view.center_lat, 37.8);
        assert_eq!(config.cities_view.center_lon, -96.0);
        assert_eq!(config.density_view, config.cities_view);
        assert_eq!(config.data.cities, PathBuf::from("data/cities.json"));
        assert_eq!(config.data.states, PathBuf::from("data/states.geojson"));
        assert!(config.base.attribution.contains("OpenStreetMap"));
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r##"
            [data]
            cities = "other/cities.json"

            [density_view]
            zoom = 6.5

            [style]
            marker_color = "#00ff00"
            "##,
        )
        .expect("valid toml");

        assert_eq!(config.data.cities, PathBuf::from("other/cities.json"));
        assert_eq!(config.data.states, PathBuf::from("data/states.geojson"));
        assert_eq!(config.density_view.zoom, 6.5);
        assert_eq!(config.density_view.center_lat, 37.8);
        assert_eq!(config.cities_view.zoom, 4.0);
        assert_eq!(config.style.marker_style().fill, Rgb(0, 0xff, 0));
        assert_eq!(config.style.marker_style().stroke, Rgb(0, 0, 0));
    }

    #[test]
    fn test_invalid_colour_falls_back() {
        let style = StyleConfig {
            border_color: "white".into(),
            fill_opacity: 3.0,
            ..StyleConfig::default()
        };
        let polygon = style.polygon_style();
        assert_eq!(polygon.border, PolygonStyle::default().border);
        assert_eq!(polygon.fill_opacity, 1.0);
        assert_eq!(polygon.stroke, PolygonStyle::default().stroke);
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Some(Path::new("no/such/popmap.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_toml() {
        let path = std::env::temp_dir().join(format!("popmap-{}-bad.toml", std::process::id()));
        fs::write(&path, "[data\ncities = 3").expect("write temp file");
        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
        let _ = fs::remove_file(path);
    }
}
