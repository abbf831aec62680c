use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse one of the static input resources.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The resource could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The city array is not valid JSON for the expected record layout.
    #[error("malformed JSON: {0}")]
    Json(#[from] simd_json::Error),

    /// The document is not valid GeoJSON.
    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// The resource is not UTF-8 text.
    #[error("resource is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The document parsed but has the wrong top-level shape.
    #[error("unexpected document shape: {0}")]
    Shape(String),

    /// The load worker exited without reporting a result.
    #[error("load worker for {0:?} went away")]
    Disconnected(PathBuf),
}

impl From<geojson::Error> for LoadError {
    fn from(err: geojson::Error) -> Self {
        Self::GeoJson(Box::new(err))
    }
}

/// A field that could not be turned into the type the map needs.
/// The offending record or feature is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("record {index}: field `{field}` = {raw:?}: {reason}")]
pub struct CoercionError {
    pub index: usize,
    pub field: &'static str,
    pub raw: String,
    pub reason: &'static str,
}

impl CoercionError {
    pub fn new(index: usize, field: &'static str, raw: impl Into<String>, reason: &'static str) -> Self {
        Self {
            index,
            field,
            raw: raw.into(),
            reason,
        }
    }
}

/// Failure to read the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
