//! Writes a synthetic hourly weather trace for the replay provider.
//!
//! Usage: gen_trace [PATH] [HOURS] [SEED]

use anyhow::Result;
use chrono::NaiveDate;
use solar_tracking_controller::weather::synthetic::{write_trace, TraceGenerator};
use tracing::info;

const DEFAULT_HOURS: usize = 720; // 30 days

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "weather_trace.csv".to_string());
    let hours: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => DEFAULT_HOURS,
    };
    let seed: Option<u64> = args.next().map(|raw| raw.parse()).transpose()?;

    // Ottawa in early spring: wind, rain and snow all show up.
    let start = NaiveDate::from_ymd_opt(2024, 4, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    let rows = TraceGenerator::new(45.4215, -75.6972, seed).generate(start, hours);
    write_trace(&path, &rows)?;

    info!(rows = rows.len(), %path, "wrote weather trace");
    Ok(())
}
