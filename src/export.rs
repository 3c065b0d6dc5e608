use crate::error::Result;
use crate::trace::SliceTrace;
use geo::MapCoords;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use geo_types::{Coord, LineString, Point, Polygon};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn polygon_geometry(ls: &LineString<i64>) -> Geometry {
    let ring: LineString<f64> = ls.map_coords(|c| Coord { x: c.x as f64, y: c.y as f64 });
    let value = match ring.0.len() {
        1 => Value::from(&Point(ring.0[0])),
        2 => Value::from(&ring),
        // Polygon::new closes the exterior.
        _ => Value::from(&Polygon::new(ring, vec![])),
    };
    Geometry::new(value)
}

/// One feature per polygon, tagged with its layer and its ordinal within
/// that layer.
pub fn to_geojson(trace: &SliceTrace) -> FeatureCollection {
    let features = trace
        .layers
        .iter()
        .flat_map(|layer| {
            layer
                .polygons
                .iter()
                .enumerate()
                .filter(|(_, p)| !p.0.is_empty())
                .map(move |(i, poly)| {
                    let mut properties = JsonObject::new();
                    properties.insert("layer".to_string(), JsonValue::from(layer.index));
                    properties.insert("polygon".to_string(), JsonValue::from(i));
                    Feature {
                        bbox: None,
                        geometry: Some(polygon_geometry(poly)),
                        id: None,
                        properties: Some(properties),
                        foreign_members: None,
                    }
                })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(trace: &SliceTrace, path: impl AsRef<Path>) -> Result<()> {
    let fc = to_geojson(trace);
    let count = fc.features.len();
    let writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(writer, &GeoJson::FeatureCollection(fc))?;
    log::info!("Wrote {} features to {}", count, path.as_ref().display());
    Ok(())
}
