use criterion::{black_box, criterion_group, criterion_main, Criterion};
use popmap::data::{parse_states, to_point_collection, CityRecord, Scalar};
use popmap::map::{BaseLayer, DensityPopup, MapView, PolygonStyle, Viewport};
use popmap::style::{density_color, radius};

const STATES: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"name":"Colorado","density":49.33},
     "geometry":{"type":"Polygon","coordinates":[[[-109.05,41.0],[-102.05,41.0],[-102.05,37.0],[-109.05,37.0],[-109.05,41.0]]]}},
    {"type":"Feature","properties":{"name":"Kansas","density":34.54},
     "geometry":{"type":"Polygon","coordinates":[[[-102.05,40.0],[-94.6,40.0],[-94.6,37.0],[-102.05,37.0],[-102.05,40.0]]]}}
]}"#;

fn records(n: usize) -> Vec<CityRecord> {
    (0..n)
        .map(|i| CityRecord {
            city: format!("City {i}"),
            state: "Kansas".to_string(),
            rank: Some(Scalar::Text(i.to_string())),
            population: Some(Scalar::Text((i * 997).to_string())),
            longitude: Some(Scalar::Float(-120.0 + (i % 50) as f64)),
            latitude: Some(Scalar::Float(30.0 + (i % 15) as f64)),
        })
        .collect()
}

fn bench_classifiers(c: &mut Criterion) {
    c.bench_function("radius", |b| {
        b.iter(|| (0..10_000u64).map(|p| radius(black_box(p * 37))).sum::<u32>())
    });
    c.bench_function("density_color", |b| {
        b.iter(|| (0..10_000).map(|d| density_color(black_box(d as f64 * 0.13)).0 as u32).sum::<u32>())
    });
}

fn bench_transform(c: &mut Criterion) {
    let records = records(1_000);
    c.bench_function("to_point_collection_1000", |b| b.iter(|| to_point_collection(black_box(&records))));
}

fn bench_draw_density(c: &mut Criterion) {
    let (states, _) = parse_states(STATES).expect("valid states");
    let mut view = MapView::new(Viewport::new(-96.0, 37.8, 4.0, 240, 200), BaseLayer::default());
    view.render_polygons(states, density_color, DensityPopup, PolygonStyle::default());

    c.bench_function("draw_density_120x50", |b| b.iter(|| view.draw(black_box(120), black_box(50))));
}

criterion_group!(benches, bench_classifiers, bench_transform, bench_draw_density);
criterion_main!(benches);
