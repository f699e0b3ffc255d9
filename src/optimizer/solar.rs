//! Pluggable solar-position capability.
//!
//! The optimizer only needs (elevation, azimuth) for a civil timestamp; the
//! cloud/wind heuristic remains a valid fallback when no implementation is
//! wired in, so nothing here is a hard requirement of the control loop.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Source of the sun's apparent position for a given local civil time.
pub trait SolarPosition: Send + Sync {
    /// Returns (elevation_deg, azimuth_deg). Elevation is the angle above
    /// the horizon (negative at night); azimuth is degrees from north.
    fn position(&self, time: NaiveDateTime) -> (f64, f64);
}

/// Declination/hour-angle solar position model.
///
/// Good to a degree or two, which is plenty against a 5° movement
/// hysteresis band. Not an ephemeris.
pub struct ClearSkyPosition {
    latitude_deg: f64,
    longitude_deg: f64,
    timezone_offset_hours: i32,
}

impl ClearSkyPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64, timezone_offset_hours: i32) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            timezone_offset_hours,
        }
    }
}

impl SolarPosition for ClearSkyPosition {
    fn position(&self, time: NaiveDateTime) -> (f64, f64) {
        let day_of_year = time.ordinal() as f64;
        let hour = time.hour() as f64 + time.minute() as f64 / 60.0;

        // Declination swings ±23.45° over the year.
        let declination_rad =
            (23.45 * (360.0 / 365.0 * (day_of_year + 284.0)).to_radians().sin()).to_radians();
        let latitude_rad = self.latitude_deg.to_radians();

        // Hour angle relative to solar noon, corrected for longitude within
        // the timezone.
        let solar_time =
            hour + self.longitude_deg / 15.0 - self.timezone_offset_hours as f64;
        let hour_angle_deg = 15.0 * (solar_time - 12.0);
        let hour_angle_rad = hour_angle_deg.to_radians();

        let elevation_sin = latitude_rad.sin() * declination_rad.sin()
            + latitude_rad.cos() * declination_rad.cos() * hour_angle_rad.cos();
        let elevation_rad = elevation_sin.clamp(-1.0, 1.0).asin();
        let elevation_deg = elevation_rad.to_degrees();

        // cos can drift a hair outside [-1, 1] near solar noon.
        let azimuth_cos = ((declination_rad.sin()
            - latitude_rad.sin() * elevation_rad.sin())
            / (latitude_rad.cos() * elevation_rad.cos()))
        .clamp(-1.0, 1.0);
        let mut azimuth_deg = azimuth_cos.acos().to_degrees();

        // Afternoon sun sits in the western half of the sky.
        if hour_angle_deg > 0.0 {
            azimuth_deg = 360.0 - azimuth_deg;
        }

        (elevation_deg, azimuth_deg)
    }
}
