use crate::error::{CoercionError, LoadError};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use rayon::prelude::*;
use serde::Deserialize;

/// A JSON scalar as it appears in the city file. Numeric fields are
/// published both as numbers and as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn raw(&self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn to_f64(&self) -> Option<f64> {
        let v = match self {
            Scalar::Int(n) => *n as f64,
            Scalar::Float(f) => *f,
            Scalar::Text(s) => s.trim().parse().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Base-10 integer; fractional values truncate toward zero.
    fn to_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Text(s) if s.trim().parse::<i64>().is_ok() => s.trim().parse().ok(),
            _ => self.to_f64().map(|f| f.trunc() as i64),
        }
    }
}

/// One row of the city population file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityRecord {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub rank: Option<Scalar>,
    #[serde(default)]
    pub population: Option<Scalar>,
    #[serde(default)]
    pub longitude: Option<Scalar>,
    #[serde(default)]
    pub latitude: Option<Scalar>,
}

/// A city as a map point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub lon: f64,
    pub lat: f64,
    pub city: String,
    pub state: String,
    pub rank: u32,
    pub population: u64,
}

/// Ordered point features, one per accepted city record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCollection {
    pub features: Vec<PointFeature>,
}

impl PointCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// GeoJSON `FeatureCollection`; coordinates are `[longitude, latitude]`.
    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::from).collect(),
            foreign_members: None,
        }
    }
}

impl From<&PointFeature> for Feature {
    fn from(p: &PointFeature) -> Self {
        let mut properties = JsonObject::new();
        properties.insert("city".into(), JsonValue::from(p.city.clone()));
        properties.insert("state".into(), JsonValue::from(p.state.clone()));
        properties.insert("rank".into(), JsonValue::from(p.rank));
        properties.insert("population".into(), JsonValue::from(p.population));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![p.lon, p.lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Parse the city file: a JSON array of records.
pub fn parse_cities(bytes: &mut [u8]) -> Result<Vec<CityRecord>, LoadError> {
    Ok(simd_json::serde::from_slice(bytes)?)
}

fn coordinate(index: usize, field: &'static str, value: Option<&Scalar>) -> Result<f64, CoercionError> {
    let value = value.ok_or_else(|| CoercionError::new(index, field, "", "missing"))?;
    value
        .to_f64()
        .ok_or_else(|| CoercionError::new(index, field, value.raw(), "not a finite number"))
}

fn count(index: usize, field: &'static str, value: Option<&Scalar>) -> Result<u64, CoercionError> {
    let value = value.ok_or_else(|| CoercionError::new(index, field, "", "missing"))?;
    let n = value
        .to_i64()
        .ok_or_else(|| CoercionError::new(index, field, value.raw(), "not an integer"))?;
    u64::try_from(n).map_err(|_| CoercionError::new(index, field, value.raw(), "negative"))
}

/// Coerce one record into a point feature.
pub fn to_point_feature(index: usize, record: &CityRecord) -> Result<PointFeature, CoercionError> {
    let lon = coordinate(index, "longitude", record.longitude.as_ref())?;
    let lat = coordinate(index, "latitude", record.latitude.as_ref())?;
    let rank = count(index, "rank", record.rank.as_ref())?;
    let rank = u32::try_from(rank).map_err(|_| CoercionError::new(index, "rank", rank.to_string(), "out of range"))?;
    let population = count(index, "population", record.population.as_ref())?;

    Ok(PointFeature {
        lon,
        lat,
        city: record.city.clone(),
        state: record.state.clone(),
        rank,
        population,
    })
}

/// Convert city records into point features, preserving order.
/// Records that fail coercion are dropped and returned as errors.
pub fn to_point_collection(records: &[CityRecord]) -> (PointCollection, Vec<CoercionError>) {
    let results: Vec<Result<PointFeature, CoercionError>> = records
        .par_iter()
        .enumerate()
        .map(|(i, r)| to_point_feature(i, r))
        .collect();

    let mut features = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(f) => features.push(f),
            Err(e) => errors.push(e),
        }
    }

    (PointCollection { features }, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<CityRecord> {
        let mut bytes = json.as_bytes().to_vec();
        parse_cities(&mut bytes).expect("valid city json")
    }

    #[test]
    fn test_string_and_number_fields() {
        let records = parse(
            r#"[
                {"city":"Springfield","state":"Illinois","rank":"150","population":"150000","latitude":"39.8","longitude":"-89.6"},
                {"city":"Denver","state":"Colorado","rank":19,"population":715522,"latitude":39.7392,"longitude":-104.9903}
            ]"#,
        );
        let (collection, errors) = to_point_collection(&records);
        assert!(errors.is_empty());
        assert_eq!(collection.len(), 2);

        let springfield = &collection.features[0];
        assert_eq!(springfield.city, "Springfield");
        assert_eq!(springfield.rank, 150);
        assert_eq!(springfield.population, 150_000);
        assert!((springfield.lat - 39.8).abs() < 1e-9);
        assert!((springfield.lon + 89.6).abs() < 1e-9);

        assert_eq!(collection.features[1].population, 715_522);
    }

    #[test]
    fn test_order_and_coordinates_preserved() {
        let records: Vec<CityRecord> = (0..50)
            .map(|i| CityRecord {
                city: format!("City {i}"),
                state: "Test".into(),
                rank: Some(Scalar::Int(i)),
                population: Some(Scalar::Int(1000 * i)),
                longitude: Some(Scalar::Float(-120.0 + i as f64)),
                latitude: Some(Scalar::Float(30.0 + i as f64 / 10.0)),
            })
            .collect();

        let (collection, errors) = to_point_collection(&records);
        assert!(errors.is_empty());

        let fc = collection.to_geojson();
        assert_eq!(fc.features.len(), 50);
        for (i, feature) in fc.features.iter().enumerate() {
            let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
                panic!("feature {i} is not a point");
            };
            assert_eq!(coords, &vec![-120.0 + i as f64, 30.0 + i as f64 / 10.0]);
            let props = feature.properties.as_ref().expect("properties");
            assert_eq!(props["city"], JsonValue::from(format!("City {i}")));
        }
    }

    #[test]
    fn test_fractional_counts_truncate() {
        let records = parse(r#"[{"city":"A","state":"B","rank":"3.9","population":1234.7,"latitude":1,"longitude":2}]"#);
        let (collection, _) = to_point_collection(&records);
        assert_eq!(collection.features[0].rank, 3);
        assert_eq!(collection.features[0].population, 1234);
    }

    #[test]
    fn test_bad_records_dropped() {
        let records = parse(
            r#"[
                {"city":"Good","state":"X","rank":1,"population":"10","latitude":"1","longitude":"2"},
                {"city":"NoPop","state":"X","rank":2,"population":"n/a","latitude":"1","longitude":"2"},
                {"city":"Negative","state":"X","rank":3,"population":-4,"latitude":"1","longitude":"2"},
                {"city":"NoLat","state":"X","rank":4,"population":"10","longitude":"2"},
                {"city":"AlsoGood","state":"X","rank":5,"population":"20","latitude":"3","longitude":"4"}
            ]"#,
        );
        let (collection, errors) = to_point_collection(&records);

        let names: Vec<&str> = collection.features.iter().map(|f| f.city.as_str()).collect();
        assert_eq!(names, ["Good", "AlsoGood"]);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].index, 1);
        assert_eq!(errors[0].field, "population");
        assert_eq!(errors[0].raw, "n/a");
        assert_eq!(errors[1].reason, "negative");
        assert_eq!(errors[2].field, "latitude");
        assert_eq!(errors[2].reason, "missing");
    }

    #[test]
    fn test_malformed_json() {
        let mut bytes = br#"[{"city": "Oops""#.to_vec();
        assert!(matches!(parse_cities(&mut bytes), Err(LoadError::Json(_))));
    }
}
