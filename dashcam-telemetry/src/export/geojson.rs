//! GeoJSON exporter
//!
//! A `FeatureCollection` holding one route feature. Coordinates are
//! `[lon, lat]` or `[lon, lat, alt]`; per-point values go in the
//! `coordinate_properties` array, aligned with the coordinates by index.

use super::format_time;
use crate::track::GpsTrack;
use crate::types::GpsPoint;
use serde_json::{json, Value};

pub fn render(track: &GpsTrack) -> String {
    let coordinates: Vec<Value> = track.iter().map(coordinate).collect();
    // A LineString needs at least two positions
    let geometry_type = if track.len() >= 2 { "LineString" } else { "MultiPoint" };

    let per_point: Vec<Value> = track.iter().map(point_properties).collect();
    let properties = json!({
        "name": track.name(),
        "source_file": track.source_file().to_string_lossy(),
        "point_count": track.len(),
        "duration_seconds": track.duration_secs(),
        "bounds": track.bounds(),
        "device": track.device_info(),
        "coordinate_properties": per_point
    });

    let mut feature = json!({
        "type": "Feature",
        "geometry": {
            "type": geometry_type,
            "coordinates": coordinates
        },
        "properties": properties
    });
    if let Some(b) = track.bounds() {
        feature["bbox"] = json!([b.min_lon, b.min_lat, b.max_lon, b.max_lat]);
    }

    let collection = json!({
        "type": "FeatureCollection",
        "features": [feature]
    });
    format!("{:#}\n", collection)
}

fn coordinate(point: &GpsPoint) -> Value {
    match point.altitude {
        Some(alt) => json!([point.longitude, point.latitude, alt]),
        None => json!([point.longitude, point.latitude]),
    }
}

fn point_properties(point: &GpsPoint) -> Value {
    let mut props = json!({
        "timestamp": format_time(&point.timestamp),
        "speed": point.speed,
        "heading": point.heading,
        "fix_quality": point.fix_quality
    });
    if let Some(sats) = point.satellites {
        props["satellites"] = json!(sats);
    }
    for (key, value) in [
        ("gsensor_x", point.gsensor_x),
        ("gsensor_y", point.gsensor_y),
        ("gsensor_z", point.gsensor_z),
    ] {
        if let Some(value) = value {
            props[key] = json!(value);
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::types::DeviceInfo;
    use chrono::{Duration, TimeZone, Utc};

    fn parse(points: Vec<GpsPoint>) -> Value {
        let track = assemble(points.into_iter().map(Ok), DeviceInfo::new(), "clip.mp4", false).unwrap();
        serde_json::from_str(&render(&track)).unwrap()
    }

    #[test]
    fn test_line_string_axis_order() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 20, 14, 24, 12).unwrap();
        let doc = parse(vec![
            GpsPoint::new(38.5, -77.25, ts).with_speed(40.0),
            GpsPoint::new(38.625, -77.375, ts + Duration::seconds(1)).with_altitude(12.0),
        ]);

        let feature = &doc["features"][0];
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(feature["geometry"]["type"], "LineString");
        assert_eq!(feature["geometry"]["coordinates"][0], json!([-77.25, 38.5]));
        assert_eq!(feature["geometry"]["coordinates"][1], json!([-77.375, 38.625, 12.0]));

        let props = &feature["properties"];
        assert_eq!(props["point_count"], 2);
        assert_eq!(props["duration_seconds"], 1.0);
        assert_eq!(props["coordinate_properties"][0]["timestamp"], "2024-04-20T14:24:12Z");
        assert_eq!(props["coordinate_properties"][0]["speed"], 40.0);
        assert_eq!(props["coordinate_properties"][0]["fix_quality"], 1);
    }

    #[test]
    fn test_single_point_is_multipoint() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 20, 14, 24, 12).unwrap();
        let doc = parse(vec![GpsPoint::new(1.0, 2.0, ts)]);
        assert_eq!(doc["features"][0]["geometry"]["type"], "MultiPoint");
    }

    #[test]
    fn test_empty_track() {
        let doc = parse(Vec::new());
        let feature = &doc["features"][0];
        assert_eq!(feature["geometry"]["type"], "MultiPoint");
        assert_eq!(feature["geometry"]["coordinates"], json!([]));
        assert!(feature["properties"]["bounds"].is_null());
        assert!(feature.get("bbox").is_none());
    }
}
