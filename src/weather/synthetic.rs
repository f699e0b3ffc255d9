//! Synthetic weather trace generation.
//!
//! Produces the hourly CSV traces the replay provider consumes: dramatic
//! spring-weather states with jittered cloud, wind and precipitation so the
//! control loop gets exercised across its whole decision space, including
//! the safe-position overrides.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;

struct WeatherState {
    condition: &'static str,
    clouds: f64,
    rain_mm: f64,
    snow_mm: f64,
}

const WEATHER_STATES: [WeatherState; 10] = [
    WeatherState { condition: "Sunny", clouds: 10.0, rain_mm: 0.0, snow_mm: 0.0 },
    WeatherState { condition: "Partly Cloudy", clouds: 30.0, rain_mm: 0.0, snow_mm: 0.0 },
    WeatherState { condition: "Cloudy", clouds: 60.0, rain_mm: 0.0, snow_mm: 0.0 },
    WeatherState { condition: "Light Rain", clouds: 80.0, rain_mm: 2.0, snow_mm: 0.0 },
    WeatherState { condition: "Heavy Rain", clouds: 90.0, rain_mm: 15.0, snow_mm: 0.0 },
    WeatherState { condition: "Thunderstorm", clouds: 95.0, rain_mm: 20.0, snow_mm: 0.0 },
    WeatherState { condition: "Snow Showers", clouds: 90.0, rain_mm: 0.0, snow_mm: 5.0 },
    WeatherState { condition: "Heavy Snow", clouds: 95.0, rain_mm: 0.0, snow_mm: 15.0 },
    WeatherState { condition: "Freezing Rain", clouds: 85.0, rain_mm: 10.0, snow_mm: 3.0 },
    WeatherState { condition: "Clear and Warm", clouds: 5.0, rain_mm: 0.0, snow_mm: 0.0 },
];

/// Probability of jumping to a fresh weather state each hour.
const STATE_CHANGE_PROBABILITY: f64 = 0.6;

/// One trace row, column-compatible with [`super::replay::TraceSource`].
#[derive(Debug, Clone, Serialize)]
pub struct TraceRow {
    pub date: String,
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub clouds: f64,
    pub wind_speed_m_s: f64,
    pub rain_mm: f64,
    pub snow_mm: f64,
    pub weather_condition: String,
}

pub struct TraceGenerator {
    latitude: f64,
    longitude: f64,
    rng: StdRng,
}

impl TraceGenerator {
    pub fn new(latitude: f64, longitude: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            latitude,
            longitude,
            rng,
        }
    }

    pub fn generate(&mut self, start: NaiveDateTime, hours: usize) -> Vec<TraceRow> {
        let mut state = &WEATHER_STATES[self.rng.gen_range(0..WEATHER_STATES.len())];
        let mut rows = Vec::with_capacity(hours);

        for hour in 0..hours {
            if self.rng.gen::<f64>() < STATE_CHANGE_PROBABILITY {
                state = &WEATHER_STATES[self.rng.gen_range(0..WEATHER_STATES.len())];
            }

            let at = start + Duration::hours(hour as i64);
            let clouds =
                (state.clouds + self.rng.gen_range(-10.0..=10.0)).clamp(0.0, 100.0).round();
            let wind_speed_m_s = round1(self.rng.gen_range(2.0..=25.0));
            let rain_mm = round1((state.rain_mm + self.rng.gen_range(-2.0..=2.0)).max(0.0));
            let snow_mm = round1((state.snow_mm + self.rng.gen_range(-2.0..=2.0)).max(0.0));

            rows.push(TraceRow {
                date: at.format("%Y-%m-%d").to_string(),
                time: at.format("%H:%M").to_string(),
                latitude: self.latitude,
                longitude: self.longitude,
                clouds,
                wind_speed_m_s,
                rain_mm,
                snow_mm,
                weather_condition: state.condition.to_string(),
            });
        }

        rows
    }
}

pub fn write_trace<P: AsRef<Path>>(path: P, rows: &[TraceRow]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create trace {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().context("trace flush failed")?;
    Ok(())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::{TraceSource, WeatherSource};
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    #[test]
    fn generated_rows_respect_bounds() {
        let mut generator = TraceGenerator::new(45.4215, -75.6972, Some(7));
        let rows = generator.generate(start(), 48);
        assert_eq!(rows.len(), 48);

        for row in &rows {
            assert!((0.0..=100.0).contains(&row.clouds), "clouds {}", row.clouds);
            assert!((2.0..=25.0).contains(&row.wind_speed_m_s));
            assert!(row.rain_mm >= 0.0);
            assert!(row.snow_mm >= 0.0);
            assert!(!row.weather_condition.is_empty());
        }

        assert_eq!(rows[0].date, "2024-04-01");
        assert_eq!(rows[0].time, "06:00");
        assert_eq!(rows[24].date, "2024-04-02");
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let rows_a = TraceGenerator::new(45.0, -75.0, Some(42)).generate(start(), 24);
        let rows_b = TraceGenerator::new(45.0, -75.0, Some(42)).generate(start(), 24);
        for (a, b) in rows_a.iter().zip(&rows_b) {
            assert_eq!(a.weather_condition, b.weather_condition);
            assert_eq!(a.wind_speed_m_s, b.wind_speed_m_s);
            assert_eq!(a.clouds, b.clouds);
        }
    }

    #[tokio::test]
    async fn generated_trace_feeds_the_replay_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");

        let rows = TraceGenerator::new(45.4215, -75.6972, Some(1)).generate(start(), 12);
        write_trace(&path, &rows).unwrap();

        let source = TraceSource::from_path(&path).unwrap();

        let first = source.observe().await.unwrap();
        assert_eq!(first.condition, rows[0].weather_condition);
        assert_eq!(first.wind_speed_m_s, rows[0].wind_speed_m_s);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 4, 1));

        // All twelve rows replay before the trace wraps.
        for row in &rows[1..] {
            let obs = source.observe().await.unwrap();
            assert_eq!(obs.condition, row.weather_condition);
        }
        let wrapped = source.observe().await.unwrap();
        assert_eq!(wrapped.condition, rows[0].weather_condition);
    }
}
