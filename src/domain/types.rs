use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single weather observation, produced once per control cycle by a
/// [`crate::weather::WeatherSource`] and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Cloud cover in percent (0-100).
    pub cloud_cover_pct: f64,
    /// Wind speed in m/s.
    pub wind_speed_m_s: f64,
    /// Rain rate in mm/h.
    pub rain_mm_per_h: f64,
    /// Snow rate in mm/h. Live providers often omit this.
    #[serde(default)]
    pub snow_mm_per_h: f64,
    /// Free-text condition label ("Sunny", "Thunderstorm", ...).
    pub condition: String,
    /// Observation date, when the provider carries one (trace replay does).
    pub date: Option<NaiveDate>,
    /// Observation time of day.
    pub time: Option<NaiveTime>,
}

impl WeatherObservation {
    /// Conservative fallback record used when a live fetch fails: calm and
    /// clear, so a transport hiccup neither stows the panel nor chases a
    /// phantom storm.
    pub fn safe_default() -> Self {
        Self {
            cloud_cover_pct: 0.0,
            wind_speed_m_s: 0.0,
            rain_mm_per_h: 0.0,
            snow_mm_per_h: 0.0,
            condition: "Clear".to_string(),
            date: None,
            time: None,
        }
    }

    /// Cloud cover as a 0-1 ratio.
    pub fn cloud_fraction(&self) -> f64 {
        (self.cloud_cover_pct / 100.0).clamp(0.0, 1.0)
    }
}

/// Panel orientation: tilt from horizontal in [0, 90], azimuth from north
/// in [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelOrientation {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
}

impl PanelOrientation {
    pub const fn new(tilt_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            tilt_deg,
            azimuth_deg,
        }
    }

    /// Euclidean distance to `other` in (tilt, azimuth) angle space.
    pub fn angle_distance(&self, other: &Self) -> f64 {
        let dt = other.tilt_deg - self.tilt_deg;
        let da = other.azimuth_deg - self.azimuth_deg;
        (dt * dt + da * da).sqrt()
    }
}

impl Default for PanelOrientation {
    /// Flat, facing south. The stow position panels start a run in.
    fn default() -> Self {
        Self {
            tilt_deg: 0.0,
            azimuth_deg: 180.0,
        }
    }
}

impl std::fmt::Display for PanelOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tilt {:.1}°, azimuth {:.1}°",
            self.tilt_deg, self.azimuth_deg
        )
    }
}

/// Controller-owned state. Both fields are updated together under one lock;
/// `orientation` only ever reflects the last successfully completed move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControllerState {
    pub orientation: PanelOrientation,
    pub is_moving: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            orientation: PanelOrientation::default(),
            is_moving: false,
        }
    }
}
