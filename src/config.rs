use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub location: LocationConfig,
    pub panel: PanelConfig,
    pub safety: SafetyConfig,
    pub controller: ControllerConfig,
    pub weather: WeatherConfig,
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Hours offset from UTC, used by the solar-position model.
    pub timezone_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    pub min_tilt_deg: f64,
    pub max_tilt_deg: f64,
    /// Stow tilt used during extreme weather (flat).
    pub safe_tilt_deg: f64,
    /// When true the optimizer tracks computed solar position instead of
    /// the fixed south-facing heuristic.
    pub use_solar_position: bool,
}

/// Extreme-weather limits. A condition label matching any keyword
/// (case-insensitive substring) also counts as extreme.
#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    pub max_wind_m_s: f64,
    pub max_rain_mm_per_h: f64,
    pub condition_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    pub poll_seconds: u64,
    /// Movement happens only when priority exceeds this.
    pub priority_threshold: f64,
    pub movement_speed_deg_per_s: f64,
    /// Ceiling on the simulated slew so interactive runs stay responsive.
    pub max_simulated_move_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProvider {
    Live,
    Replay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub provider: WeatherProvider,
    pub base_url: String,
    pub http_timeout_seconds: u64,
    /// CSV trace consumed by the replay provider.
    pub trace_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    pub path: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("TRACKER__").split("__"));
        Ok(figment.extract()?)
    }
}
