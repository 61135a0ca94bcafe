//! KML 2.2 exporter
//!
//! The default [`KmlMode::Track`] writes a `gx:Track` so Google Earth can
//! replay the drive with per-point speed and heading. [`KmlMode::LineString`]
//! writes positions only.

use super::{description, escape_xml, format_time};
use crate::track::GpsTrack;
use crate::types::GpsPoint;
use serde::{Deserialize, Serialize};

/// Route geometry written for the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KmlMode {
    /// `gx:Track` with timestamps and extended data
    #[default]
    Track,
    /// Plain `LineString`, positions only
    LineString,
}

pub fn render(track: &GpsTrack) -> String {
    render_with_mode(track, KmlMode::default())
}

pub fn render_with_mode(track: &GpsTrack, mode: KmlMode) -> String {
    // absolute only when every point carries an altitude
    let altitude_mode = if !track.is_empty() && track.iter().all(|p| p.altitude.is_some()) {
        "absolute"
    } else {
        "clampToGround"
    };

    let mut kml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
  <Document>
"#,
    );
    kml.push_str(&format!("    <name>{}</name>\n", escape_xml(&track.name())));
    kml.push_str(&format!(
        "    <description>{}</description>\n",
        escape_xml(&description(track))
    ));
    kml.push_str(STYLES);
    if mode == KmlMode::Track {
        kml.push_str(SCHEMA);
    }

    if !track.is_empty() {
        kml.push_str("    <Placemark>\n");
        kml.push_str("      <name>Route</name>\n");
        kml.push_str("      <styleUrl>#route</styleUrl>\n");
        match mode {
            KmlMode::Track => push_gx_track(&mut kml, track, altitude_mode),
            KmlMode::LineString => push_line_string(&mut kml, track, altitude_mode),
        }
        kml.push_str("    </Placemark>\n");
    }

    if let Some(first) = track.first() {
        push_marker(&mut kml, "Start", "#start", first, altitude_mode);
    }
    if track.len() >= 2 {
        if let Some(last) = track.last() {
            push_marker(&mut kml, "End", "#end", last, altitude_mode);
        }
    }

    kml.push_str("  </Document>\n</kml>\n");
    kml
}

const STYLES: &str = r#"    <Style id="route">
      <LineStyle><color>ff0000ff</color><width>4</width></LineStyle>
    </Style>
    <Style id="start">
      <IconStyle><color>ff00ff00</color></IconStyle>
    </Style>
    <Style id="end">
      <IconStyle><color>ff0000ff</color></IconStyle>
    </Style>
"#;

const SCHEMA: &str = r#"    <Schema id="telemetry">
      <gx:SimpleArrayField name="speed" type="float"><displayName>Speed (km/h)</displayName></gx:SimpleArrayField>
      <gx:SimpleArrayField name="heading" type="float"><displayName>Heading</displayName></gx:SimpleArrayField>
      <gx:SimpleArrayField name="fix_quality" type="int"><displayName>Fix quality</displayName></gx:SimpleArrayField>
    </Schema>
"#;

/// `lon,lat[,alt]` tuple for `<coordinates>`
fn coordinate(point: &GpsPoint) -> String {
    match point.altitude {
        Some(alt) => format!("{:.8},{:.8},{:.2}", point.longitude, point.latitude, alt),
        None => format!("{:.8},{:.8}", point.longitude, point.latitude),
    }
}

fn push_gx_track(kml: &mut String, track: &GpsTrack, altitude_mode: &str) {
    kml.push_str("      <gx:Track>\n");
    kml.push_str(&format!("        <altitudeMode>{}</altitudeMode>\n", altitude_mode));
    for point in track {
        kml.push_str(&format!("        <when>{}</when>\n", format_time(&point.timestamp)));
    }
    // gx:coord always has three values; altitude is ignored when clamped
    for point in track {
        kml.push_str(&format!(
            "        <gx:coord>{:.8} {:.8} {:.2}</gx:coord>\n",
            point.longitude,
            point.latitude,
            point.altitude.unwrap_or(0.0)
        ));
    }

    kml.push_str("        <ExtendedData>\n");
    kml.push_str("          <SchemaData schemaUrl=\"#telemetry\">\n");
    push_array(kml, "speed", track.iter().map(|p| format!("{:.2}", p.speed)));
    push_array(kml, "heading", track.iter().map(|p| format!("{:.1}", p.heading)));
    push_array(kml, "fix_quality", track.iter().map(|p| p.fix_quality.to_string()));
    kml.push_str("          </SchemaData>\n");
    kml.push_str("        </ExtendedData>\n");
    kml.push_str("      </gx:Track>\n");
}

fn push_array(kml: &mut String, name: &str, values: impl Iterator<Item = String>) {
    kml.push_str(&format!("            <gx:SimpleArrayData name=\"{}\">\n", name));
    for value in values {
        kml.push_str(&format!("              <gx:value>{}</gx:value>\n", value));
    }
    kml.push_str("            </gx:SimpleArrayData>\n");
}

fn push_line_string(kml: &mut String, track: &GpsTrack, altitude_mode: &str) {
    if track.len() == 1 {
        kml.push_str("      <Point>\n");
        kml.push_str(&format!("        <altitudeMode>{}</altitudeMode>\n", altitude_mode));
        kml.push_str(&format!("        <coordinates>{}</coordinates>\n", coordinate(&track[0])));
        kml.push_str("      </Point>\n");
        return;
    }

    let coordinates: Vec<String> = track.iter().map(coordinate).collect();
    kml.push_str("      <LineString>\n");
    kml.push_str("        <tessellate>1</tessellate>\n");
    kml.push_str(&format!("        <altitudeMode>{}</altitudeMode>\n", altitude_mode));
    kml.push_str(&format!(
        "        <coordinates>{}</coordinates>\n",
        coordinates.join(" ")
    ));
    kml.push_str("      </LineString>\n");
}

fn push_marker(kml: &mut String, name: &str, style: &str, point: &GpsPoint, altitude_mode: &str) {
    kml.push_str("    <Placemark>\n");
    kml.push_str(&format!("      <name>{}</name>\n", name));
    kml.push_str(&format!("      <styleUrl>{}</styleUrl>\n", style));
    kml.push_str(&format!(
        "      <TimeStamp><when>{}</when></TimeStamp>\n",
        format_time(&point.timestamp)
    ));
    kml.push_str("      <Point>\n");
    kml.push_str(&format!("        <altitudeMode>{}</altitudeMode>\n", altitude_mode));
    kml.push_str(&format!("        <coordinates>{}</coordinates>\n", coordinate(point)));
    kml.push_str("      </Point>\n");
    kml.push_str("    </Placemark>\n");
}
