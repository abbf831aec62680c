use crate::error::{CoercionError, LoadError};
use geo::{BoundingRect, MultiPolygon};
use geojson::GeoJson;

/// A state polygon with its population density.
#[derive(Debug, Clone)]
pub struct StateFeature {
    pub name: String,
    /// People per square mile.
    pub density: f64,
    pub geometry: MultiPolygon<f64>,
}

impl StateFeature {
    /// `(min_lon, min_lat, max_lon, max_lat)`, or `None` for empty geometry.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
    }
}

/// Parse a GeoJSON `FeatureCollection` of states. Features without a string
/// `name`, a numeric `density`, or polygonal geometry are dropped.
pub fn parse_states(text: &str) -> Result<(Vec<StateFeature>, Vec<CoercionError>), LoadError> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(LoadError::Shape("states must be a FeatureCollection".into()));
    };

    let mut states = Vec::with_capacity(fc.features.len());
    let mut errors = Vec::new();

    for (index, feature) in fc.features.into_iter().enumerate() {
        let props = feature.properties.as_ref();

        let Some(name) = props.and_then(|p| p.get("name")).and_then(|v| v.as_str()) else {
            errors.push(CoercionError::new(index, "name", "", "missing or not a string"));
            continue;
        };
        let name = name.to_string();

        let density = props.and_then(|p| p.get("density"));
        let Some(density) = density.and_then(|v| v.as_f64()).filter(|d| d.is_finite()) else {
            let raw = density.map(|v| v.to_string()).unwrap_or_default();
            errors.push(CoercionError::new(index, "density", raw, "missing or not a number"));
            continue;
        };

        let geometry = match feature.geometry {
            Some(geometry) => match geo::Geometry::<f64>::try_from(geometry.value) {
                Ok(geo::Geometry::MultiPolygon(mp)) => mp,
                Ok(geo::Geometry::Polygon(p)) => MultiPolygon::new(vec![p]),
                _ => {
                    errors.push(CoercionError::new(index, "geometry", name, "not a polygon"));
                    continue;
                }
            },
            None => {
                errors.push(CoercionError::new(index, "geometry", name, "missing"));
                continue;
            }
        };

        states.push(StateFeature { name, density, geometry });
    }

    Ok((states, errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type":"Feature","properties":{"name":"Colorado","density":49.33},
             "geometry":{"type":"Polygon","coordinates":[[[-109.05,41.0],[-102.05,41.0],[-102.05,37.0],[-109.05,37.0],[-109.05,41.0]]]}},
            {"type":"Feature","properties":{"name":"Nowhere"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"name":"Islands","density":"12"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":{"name":"Pin","density":3},
             "geometry":{"type":"Point","coordinates":[0,0]}},
            {"type":"Feature","properties":{"name":"Split","density":1200},
             "geometry":{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,0]]],[[[5,5],[6,5],[6,6],[5,5]]]]}}
        ]
    }"#;

    #[test]
    fn test_parse_states() {
        let (states, errors) = parse_states(STATES).expect("valid geojson");

        let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Colorado", "Split"]);
        assert!((states[0].density - 49.33).abs() < 1e-9);
        assert_eq!(states[1].geometry.0.len(), 2);

        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["density", "density", "geometry"]);
        assert_eq!(errors[1].raw, "\"12\"");
    }

    #[test]
    fn test_bbox() {
        let (states, _) = parse_states(STATES).expect("valid geojson");
        assert_eq!(states[0].bbox(), Some((-109.05, 37.0, -102.05, 41.0)));
    }

    #[test]
    fn test_not_a_collection() {
        let err = parse_states(r#"{"type":"Point","coordinates":[0,0]}"#).unwrap_err();
        assert!(matches!(err, LoadError::Shape(_)));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse_states("{nope"), Err(LoadError::GeoJson(_))));
    }
}
