//! CSV exporter
//!
//! RFC 4180 style: header row, CRLF line endings, one row per point in
//! [`GpsPoint`] field order. Absent optional values are empty cells.

use super::format_time;
use crate::track::GpsTrack;
use crate::types::GpsPoint;

pub const HEADER: &str = "latitude,longitude,timestamp,speed,heading,altitude,fix_quality,gsensor_x,gsensor_y,gsensor_z,satellites";

pub fn render(track: &GpsTrack) -> String {
    let mut csv = String::with_capacity((track.len() + 1) * 96);
    csv.push_str(HEADER);
    csv.push_str("\r\n");
    for point in track {
        csv.push_str(&row(point));
        csv.push_str("\r\n");
    }
    csv
}

fn row(point: &GpsPoint) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{}",
        point.latitude,
        point.longitude,
        format_time(&point.timestamp),
        point.speed,
        point.heading,
        optional(point.altitude),
        point.fix_quality,
        optional(point.gsensor_x),
        optional(point.gsensor_y),
        optional(point.gsensor_z),
        optional(point.satellites),
    )
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::types::{DeviceInfo, FixQuality};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_rows() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 20, 14, 24, 12).unwrap();
        let points = vec![
            GpsPoint::new(38.678898, -77.271553, ts).with_speed(45.5),
            GpsPoint::new(38.5, -77.5, ts)
                .with_altitude(12.5)
                .with_gsensor(0.5, -1.0, 9.8)
                .with_satellites(7)
                .with_fix_quality(FixQuality::Dgps),
        ];
        let track = assemble(points.into_iter().map(Ok), DeviceInfo::new(), "a.mp4", false).unwrap();
        let csv = render(&track);
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "38.678898,-77.271553,2024-04-20T14:24:12Z,45.5,0,,1,,,,");
        assert_eq!(lines[2], "38.5,-77.5,2024-04-20T14:24:12Z,0,0,12.5,2,0.5,-1,9.8,7");
        assert_eq!(lines[3], "");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_every_row_has_every_column() {
        let columns = HEADER.split(',').count();
        let ts = Utc.with_ymd_and_hms(2024, 4, 20, 14, 24, 12).unwrap();
        let track = assemble(
            vec![Ok(GpsPoint::new(1.0, 2.0, ts))],
            DeviceInfo::new(),
            "a.mp4",
            false,
        )
        .unwrap();
        for line in render(&track).lines() {
            assert_eq!(line.split(',').count(), columns);
        }
    }

    #[test]
    fn test_empty_track_is_header_only() {
        let track = assemble(Vec::new(), DeviceInfo::new(), "a.mp4", false).unwrap();
        assert_eq!(render(&track), format!("{}\r\n", HEADER));
    }
}
