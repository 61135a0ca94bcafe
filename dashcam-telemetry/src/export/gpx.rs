//! GPX 1.1 exporter
//!
//! One `<trk>` with a single `<trkseg>`. Values GPX has no element for
//! (speed, heading, fix quality, satellites, g-sensor) are written under a
//! private extension namespace so strict readers can ignore them.

use super::{description, escape_xml, format_tag, format_time};
use crate::track::GpsTrack;
use crate::types::GpsPoint;

/// Namespace of the per-point extension elements
pub const EXTENSION_NS: &str = "urn:dashcam-telemetry:gpx-extensions:1";

pub fn render(track: &GpsTrack) -> String {
    let creator = match format_tag(track) {
        Some(tag) => format!("dashcam-telemetry ({})", tag),
        None => "dashcam-telemetry".to_string(),
    };
    let name = escape_xml(&track.name());

    let mut gpx = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(&format!(
        r#"<gpx version="1.1" creator="{}" xmlns="http://www.topografix.com/GPX/1/1" xmlns:dtx="{}">"#,
        escape_xml(&creator),
        EXTENSION_NS
    ));
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", name));
    gpx.push_str(&format!("    <desc>{}</desc>\n", escape_xml(&description(track))));
    if let Some(start) = track.start_time() {
        gpx.push_str(&format!("    <time>{}</time>\n", format_time(&start)));
    }
    if let Some(bounds) = track.bounds() {
        gpx.push_str(&format!(
            "    <bounds minlat=\"{:.8}\" minlon=\"{:.8}\" maxlat=\"{:.8}\" maxlon=\"{:.8}\"/>\n",
            bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
        ));
    }
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", name));
    if !track.is_empty() {
        gpx.push_str("    <trkseg>\n");
        for point in track {
            push_trkpt(&mut gpx, point);
        }
        gpx.push_str("    </trkseg>\n");
    }
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");
    gpx
}

fn push_trkpt(gpx: &mut String, point: &GpsPoint) {
    gpx.push_str(&format!(
        "      <trkpt lat=\"{:.8}\" lon=\"{:.8}\">\n",
        point.latitude, point.longitude
    ));
    if let Some(ele) = point.altitude {
        gpx.push_str(&format!("        <ele>{:.2}</ele>\n", ele));
    }
    gpx.push_str(&format!("        <time>{}</time>\n", format_time(&point.timestamp)));

    gpx.push_str("        <extensions>\n");
    gpx.push_str(&format!("          <dtx:speed_kmh>{:.2}</dtx:speed_kmh>\n", point.speed));
    gpx.push_str(&format!("          <dtx:heading>{:.1}</dtx:heading>\n", point.heading));
    gpx.push_str(&format!(
        "          <dtx:fix_quality>{}</dtx:fix_quality>\n",
        point.fix_quality
    ));
    if let Some(sats) = point.satellites {
        gpx.push_str(&format!("          <dtx:satellites>{}</dtx:satellites>\n", sats));
    }
    for (axis, value) in [
        ("gsensor_x", point.gsensor_x),
        ("gsensor_y", point.gsensor_y),
        ("gsensor_z", point.gsensor_z),
    ] {
        if let Some(value) = value {
            gpx.push_str(&format!("          <dtx:{0}>{1}</dtx:{0}>\n", axis, value));
        }
    }
    gpx.push_str("        </extensions>\n");
    gpx.push_str("      </trkpt>\n");
}
