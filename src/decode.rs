// src/decode.rs
//
// Pure conversions from raw register bytes or raw text lines into
// physical units. Nothing here touches a transport.

use crate::error::SensorError;

/// LPS25-family pressure readout: three little-endian count bytes, 4096
/// counts per hPa.
pub fn pressure_hpa(raw: [u8; 3]) -> f64 {
    let counts = (raw[2] as u32) << 16 | (raw[1] as u32) << 8 | raw[0] as u32;
    counts as f64 / 4096.0
}

/// Temperature channel of the pressure sensor: two little-endian bytes,
/// 480 counts per degree around the 42.5 C reference point.
pub fn pressure_temperature_celsius(raw: [u8; 2]) -> f64 {
    let counts = (raw[1] as u32) << 8 | raw[0] as u32;
    42.5 + (counts as f64 - 65535.0) / 480.0
}

/// Barometric altitude estimate from station pressure and temperature.
pub fn altitude_meters(pressure_hpa: f64, temperature_celsius: f64) -> f64 {
    const ALTIMETER_SETTING_MBAR: f64 = 1013.25;
    ((pressure_hpa / ALTIMETER_SETTING_MBAR).powf(0.190263) - 1.0) * temperature_celsius / 0.0065
}

/// SHT31 temperature word (big-endian), full scale -45..130 C.
pub fn sht31_temperature_celsius(msb: u8, lsb: u8) -> f64 {
    let raw = ((msb as u16) << 8 | lsb as u16) as f64;
    -45.0 + 175.0 * raw / 65535.0
}

/// SHT31 humidity word (big-endian), full scale 0..100 %RH.
pub fn sht31_humidity_percent(msb: u8, lsb: u8) -> f64 {
    let raw = ((msb as u16) << 8 | lsb as u16) as f64;
    100.0 * raw / 65535.0
}

/// One serial line carrying a single numeric temperature.
pub fn thermistor_celsius(line: &str) -> Result<f64, SensorError> {
    let trimmed = line.trim();
    trimmed
        .parse()
        .map_err(|_| SensorError::Parse(trimmed.to_owned()))
}

/// One comma-separated serial line carrying exactly three accelerations.
/// Any bad token rejects the whole line; axes are never published partially.
pub fn accelerometer_mps2(line: &str) -> Result<[f64; 3], SensorError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split(',');
    let mut axes = [0.0f64; 3];
    for axis in &mut axes {
        let token = parts
            .next()
            .ok_or_else(|| SensorError::Parse(trimmed.to_owned()))?;
        *axis = token
            .trim()
            .parse()
            .map_err(|_| SensorError::Parse(trimmed.to_owned()))?;
    }
    if parts.next().is_some() {
        return Err(SensorError::Parse(trimmed.to_owned()));
    }
    Ok(axes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn pressure_scenario() {
        // Raw bytes [0x00, 0x00, 0x40] -> 0x400000 counts -> 1024 hPa.
        assert!((pressure_hpa([0x00, 0x00, 0x40]) - 1024.0).abs() < TOL);
        // Raw temperature word 0x8000.
        let expected = 42.5 + (32768.0 - 65535.0) / 480.0;
        assert!((pressure_temperature_celsius([0x00, 0x80]) - expected).abs() < TOL);
    }

    #[test]
    fn altitude_at_reference_pressure_is_zero() {
        assert!(altitude_meters(1013.25, 20.0).abs() < TOL);
    }

    #[test]
    fn altitude_sign_follows_pressure_ratio() {
        // The formula is positive above the reference pressure and
        // negative below it.
        assert!(altitude_meters(1030.0, 15.0) > 0.0);
        assert!(altitude_meters(900.0, 15.0) < 0.0);
    }

    #[test]
    fn sht31_extremes() {
        assert!((sht31_temperature_celsius(0x00, 0x00) + 45.0).abs() < TOL);
        assert!((sht31_temperature_celsius(0xff, 0xff) - 130.0).abs() < TOL);
        assert!(sht31_humidity_percent(0x00, 0x00).abs() < TOL);
        assert!((sht31_humidity_percent(0xff, 0xff) - 100.0).abs() < TOL);
    }

    #[test]
    fn thermistor_accepts_terminated_lines() {
        assert_eq!(thermistor_celsius("23.5\r\n").unwrap(), 23.5);
        assert_eq!(thermistor_celsius("-4\n").unwrap(), -4.0);
    }

    #[test]
    fn thermistor_rejects_noise() {
        assert!(thermistor_celsius("2x.5\n").is_err());
        assert!(thermistor_celsius("\n").is_err());
    }

    #[test]
    fn accelerometer_accepts_three_axes() {
        assert_eq!(accelerometer_mps2("1.0,2.0,3.0\n").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(accelerometer_mps2(" 0.1, -0.2, 9.8 \r\n").unwrap(), [0.1, -0.2, 9.8]);
    }

    #[test]
    fn accelerometer_rejects_bad_lines() {
        assert!(accelerometer_mps2("1.0,bad,3.0\n").is_err());
        assert!(accelerometer_mps2("1.0,2.0\n").is_err());
        assert!(accelerometer_mps2("1.0,2.0,3.0,4.0\n").is_err());
        assert!(accelerometer_mps2("\n").is_err());
    }

    proptest! {
        #[test]
        fn pressure_matches_reference_formula(p0: u8, p1: u8, p2: u8) {
            let expected = (p2 as f64 * 65536.0 + p1 as f64 * 256.0 + p0 as f64) / 4096.0;
            prop_assert!((pressure_hpa([p0, p1, p2]) - expected).abs() < TOL);
        }

        #[test]
        fn sht31_temperature_stays_in_range(raw: u16) {
            let t = sht31_temperature_celsius((raw >> 8) as u8, raw as u8);
            prop_assert!((-45.0..=130.0).contains(&t));
        }

        #[test]
        fn sht31_humidity_stays_in_range(raw: u16) {
            let h = sht31_humidity_percent((raw >> 8) as u8, raw as u8);
            prop_assert!((0.0..=100.0).contains(&h));
        }
    }
}
