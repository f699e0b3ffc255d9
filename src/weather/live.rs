//! Live weather provider backed by weatherapi.com.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::WeatherSource;
use crate::config::{LocationConfig, WeatherConfig};
use crate::domain::WeatherObservation;

/// Environment variable holding the weatherapi.com key. Loaded from `.env`
/// by `dotenvy` at startup.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

pub struct WeatherApiSource {
    client: Client,
    base_url: String,
    api_key: String,
    latitude: f64,
    longitude: f64,
}

impl WeatherApiSource {
    /// Fails fast when the API key is absent; a live run without
    /// credentials is a configuration error, not something to retry.
    pub fn new(weather: &WeatherConfig, location: &LocationConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{API_KEY_ENV} not set (required for the live provider)"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(weather.http_timeout_seconds))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: weather.base_url.trim_end_matches('/').to_string(),
            api_key,
            latitude: location.latitude,
            longitude: location.longitude,
        })
    }

    async fn fetch(&self) -> Result<WeatherObservation> {
        let url = format!("{}/current.json", self.base_url);
        let query = format!("{},{}", self.latitude, self.longitude);

        debug!(%url, q = %query, "fetching current conditions");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("aqi", "no"),
            ])
            .send()
            .await
            .context("weather request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("weather API returned {}", response.status());
        }

        let payload: CurrentResponse = response
            .json()
            .await
            .context("malformed weather API payload")?;
        Ok(map_current(payload))
    }
}

#[async_trait]
impl WeatherSource for WeatherApiSource {
    /// Transport and parse failures are swallowed here: the loop gets a
    /// calm, clear default record instead of an error.
    async fn observe(&self) -> Result<WeatherObservation> {
        match self.fetch().await {
            Ok(observation) => Ok(observation),
            Err(e) => {
                warn!(error = %e, "weather fetch failed, substituting safe default");
                Ok(WeatherObservation::safe_default())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    cloud: f64,
    wind_kph: f64,
    precip_mm: f64,
    condition: ConditionLabel,
}

#[derive(Debug, Deserialize)]
struct ConditionLabel {
    text: String,
}

fn map_current(payload: CurrentResponse) -> WeatherObservation {
    WeatherObservation {
        cloud_cover_pct: payload.current.cloud,
        // weatherapi reports km/h.
        wind_speed_m_s: payload.current.wind_kph / 3.6,
        rain_mm_per_h: payload.current.precip_mm,
        snow_mm_per_h: 0.0,
        condition: payload.current.condition.text,
        date: None,
        time: None,
    }
}
