//! Replayed weather trace.
//!
//! Reads a pre-generated hourly CSV trace (see [`super::synthetic`]) and
//! hands records out in order, wrapping back to the first record on
//! exhaustion so long soak runs never hit end-of-data.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use super::WeatherSource;
use crate::domain::WeatherObservation;

#[derive(Debug, Clone, Deserialize)]
struct TraceRecord {
    date: NaiveDate,
    #[serde(deserialize_with = "de_clock_time")]
    time: NaiveTime,
    #[serde(default)]
    #[allow(dead_code)]
    latitude: f64,
    #[serde(default)]
    #[allow(dead_code)]
    longitude: f64,
    clouds: f64,
    wind_speed_m_s: f64,
    rain_mm: f64,
    #[serde(default)]
    snow_mm: f64,
    weather_condition: String,
}

/// Traces write times as "HH:MM"; accept "HH:MM:SS" too.
fn de_clock_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .map_err(serde::de::Error::custom)
}

pub struct TraceSource {
    records: Vec<TraceRecord>,
    cursor: AtomicUsize,
}

impl TraceSource {
    /// Loads the whole trace up front. An empty trace is a construction
    /// error and aborts startup.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("cannot open weather trace {}", path.display()))?;
        let records: Vec<TraceRecord> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .with_context(|| format!("malformed weather trace {}", path.display()))?;
        if records.is_empty() {
            anyhow::bail!("weather trace {} contains no records", path.display());
        }
        info!(records = records.len(), path = %path.display(), "loaded weather trace");
        Ok(Self {
            records,
            cursor: AtomicUsize::new(0),
        })
    }

}

#[async_trait]
impl WeatherSource for TraceSource {
    async fn observe(&self) -> Result<WeatherObservation> {
        let raw = self.cursor.fetch_add(1, Ordering::Relaxed);
        let index = raw % self.records.len();
        if index == 0 && raw > 0 {
            debug!("weather trace exhausted, wrapping to start");
        }

        let record = &self.records[index];
        Ok(WeatherObservation {
            cloud_cover_pct: record.clouds,
            wind_speed_m_s: record.wind_speed_m_s,
            rain_mm_per_h: record.rain_mm,
            snow_mm_per_h: record.snow_mm,
            condition: record.weather_condition.clone(),
            date: Some(record.date),
            time: Some(record.time),
        })
    }
}
