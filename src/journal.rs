//! Per-cycle CSV journal.
//!
//! One row per control cycle: the observation that drove the decision plus
//! the orientation the optimizer asked for. Kept append-only and flushed per
//! row so a killed process still leaves a usable log.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::domain::{PanelOrientation, WeatherObservation};

#[derive(Debug, Serialize)]
struct CycleRow<'a> {
    date: String,
    time: String,
    clouds: f64,
    wind_speed: f64,
    rain: f64,
    snow: f64,
    weather_condition: &'a str,
    optimal_tilt: f64,
    optimal_azimuth: f64,
}

pub struct CycleJournal {
    writer: csv::Writer<File>,
}

impl CycleJournal {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let writer = csv::Writer::from_path(path.as_ref())
            .with_context(|| format!("cannot open journal {}", path.as_ref().display()))?;
        Ok(Self { writer })
    }

    /// Appends one cycle row. The observation's own date/time wins when the
    /// provider carries them (trace replay); otherwise `now` is used.
    pub fn record(
        &mut self,
        now: NaiveDateTime,
        observation: &WeatherObservation,
        target: &PanelOrientation,
    ) -> Result<()> {
        let date = observation
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
        let time = observation
            .time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| now.format("%H:%M").to_string());

        self.writer.serialize(CycleRow {
            date,
            time,
            clouds: observation.cloud_cover_pct,
            wind_speed: observation.wind_speed_m_s,
            rain: observation.rain_mm_per_h,
            snow: observation.snow_mm_per_h,
            weather_condition: &observation.condition,
            optimal_tilt: target.tilt_deg,
            optimal_azimuth: target.azimuth_deg,
        })?;
        self.writer.flush().context("journal flush failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn writes_header_and_one_row_per_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.csv");

        let mut journal = CycleJournal::create(&path).unwrap();
        let mut obs = WeatherObservation::safe_default();
        obs.cloud_cover_pct = 10.0;
        obs.date = NaiveDate::from_ymd_opt(2024, 4, 1);
        obs.time = NaiveTime::from_hms_opt(6, 0, 0);

        let now = NaiveDate::from_ymd_opt(2024, 4, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        journal
            .record(now, &obs, &PanelOrientation::new(45.0, 180.0))
            .unwrap();
        journal
            .record(now, &WeatherObservation::safe_default(), &PanelOrientation::new(0.0, 0.0))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "date,time,clouds,wind_speed,rain,snow,weather_condition,optimal_tilt,optimal_azimuth"
        );
        // Observation timestamp wins over the wall clock.
        assert!(lines[1].starts_with("2024-04-01,06:00,"));
        // No observation timestamp: wall clock fills in.
        assert!(lines[2].starts_with("2024-04-02,09:30,"));
    }
}
