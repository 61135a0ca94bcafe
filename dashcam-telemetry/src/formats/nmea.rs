//! NMEA coordinate helpers
//!
//! NMEA encodes a coordinate as degrees and decimal minutes packed into one
//! number: `DDMM.MMMM` for latitude, `DDDMM.MMMM` for longitude.

/// Convert a packed `DDMM.MMMM` value to decimal degrees
///
/// The sign of the input is carried through; hemisphere flags are applied by
/// the caller.
pub fn nmea_to_decimal(value: f64) -> f64 {
    let magnitude = value.abs();
    let degrees = (magnitude / 100.0).trunc();
    let minutes = magnitude - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    if value.is_sign_negative() {
        -decimal
    } else {
        decimal
    }
}

/// Convert decimal degrees to packed `DDMM.MMMM` (magnitude only)
pub fn decimal_to_nmea(value: f64) -> f64 {
    let magnitude = value.abs();
    let degrees = magnitude.trunc();
    let minutes = (magnitude - degrees) * 60.0;
    degrees * 100.0 + minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nmea_to_decimal() {
        assert!((nmea_to_decimal(3840.7339) - 38.678898).abs() < 1e-6);
        assert!((nmea_to_decimal(7716.2932) - 77.271553).abs() < 1e-6);
        assert_eq!(nmea_to_decimal(0.0), 0.0);
        assert!((nmea_to_decimal(-3840.7339) + 38.678898).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip() {
        for &degrees in &[0.5, 12.345678, 38.678898, 89.999999, 179.123456] {
            let back = nmea_to_decimal(decimal_to_nmea(degrees));
            assert!((back - degrees).abs() < 1e-9, "{} -> {}", degrees, back);
        }
    }
}
