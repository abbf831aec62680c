use crate::error::LoadError;
use crate::map::LineString;
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Load base-layer outline lines from any GeoJSON document.
pub fn load_outline(path: &Path) -> Result<Vec<LineString>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = content.parse()?;

    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Walk a GeoJSON document and emit every line and polygon exterior ring
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn ring_to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(ring_to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(ring_to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(ring_to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(ring_to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse outline of the contiguous United States, used when no outline
/// file is configured or it cannot be read.
pub fn simple_us_outline() -> Vec<LineString> {
    vec![
        vec![
            (-124.7, 48.4), (-123.0, 46.2), (-124.1, 43.0), (-124.2, 40.4),
            (-122.4, 37.2), (-120.6, 34.6), (-117.1, 32.5), (-114.7, 32.7),
            (-111.1, 31.3), (-108.2, 31.3), (-106.5, 31.8), (-104.5, 29.6),
            (-103.0, 29.0), (-101.4, 29.8), (-99.5, 27.5), (-97.4, 25.9),
            (-97.2, 27.8), (-94.7, 29.4), (-90.0, 29.1), (-89.2, 30.3),
            (-85.4, 29.7), (-82.7, 27.5), (-81.1, 25.1), (-80.0, 26.8),
            (-81.4, 30.7), (-79.2, 33.2), (-75.5, 35.2), (-76.0, 37.0),
            (-74.0, 39.5), (-71.9, 41.3), (-70.0, 41.7), (-70.7, 43.1),
            (-67.0, 44.8), (-67.8, 47.1), (-69.2, 47.4), (-71.5, 45.0),
            (-74.9, 45.0), (-76.8, 43.6), (-79.0, 43.3), (-79.8, 42.3),
            (-83.1, 42.0), (-82.4, 43.0), (-84.8, 45.8), (-87.0, 45.3),
            (-87.8, 42.5), (-86.8, 41.7), (-88.0, 44.6), (-89.5, 47.0),
            (-84.8, 46.5), (-89.6, 48.0), (-95.2, 49.0), (-123.3, 49.0),
            (-124.7, 48.4),
        ],
    ]
}
