use anyhow::Result;
use solar_tracking_controller::{
    config::{Config, WeatherProvider},
    controller::{SimulatedMotor, TrackingController},
    journal::CycleJournal,
    optimizer::{ClearSkyPosition, PanelLimits, PanelOptimizer, SafetyLimits},
    telemetry,
    weather::{TraceSource, WeatherApiSource, WeatherSource},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cfg = Config::load()?;

    let limits = PanelLimits {
        min_tilt_deg: cfg.panel.min_tilt_deg,
        max_tilt_deg: cfg.panel.max_tilt_deg,
        safe_tilt_deg: cfg.panel.safe_tilt_deg,
    };
    let safety = SafetyLimits {
        max_wind_m_s: cfg.safety.max_wind_m_s,
        max_rain_mm_per_h: cfg.safety.max_rain_mm_per_h,
        condition_keywords: cfg.safety.condition_keywords.clone(),
    };
    let mut optimizer = PanelOptimizer::new(limits, safety);
    if cfg.panel.use_solar_position {
        optimizer = optimizer.with_solar_position(Arc::new(ClearSkyPosition::new(
            cfg.location.latitude,
            cfg.location.longitude,
            cfg.location.timezone_offset_hours,
        )));
    }

    let source: Arc<dyn WeatherSource> = match cfg.weather.provider {
        WeatherProvider::Live => Arc::new(WeatherApiSource::new(&cfg.weather, &cfg.location)?),
        WeatherProvider::Replay => Arc::new(TraceSource::from_path(&cfg.weather.trace_path)?),
    };

    let motor = Arc::new(SimulatedMotor::new(
        cfg.controller.movement_speed_deg_per_s,
        Duration::from_millis(cfg.controller.max_simulated_move_ms),
    ));
    let controller = Arc::new(TrackingController::new(motor, Arc::new(optimizer)));
    let mut journal = CycleJournal::create(&cfg.journal.path)?;

    info!(
        latitude = cfg.location.latitude,
        longitude = cfg.location.longitude,
        provider = ?cfg.weather.provider,
        poll_seconds = cfg.controller.poll_seconds,
        "starting solar tracking controller"
    );

    tokio::select! {
        result = controller.run(source.as_ref(), &mut journal, &cfg.controller) => {
            // run() has already stowed the controller on its error path.
            if let Err(e) = result {
                warn!(error = %e, "tracking loop stopped");
                return Err(e);
            }
        }
        _ = telemetry::shutdown_signal() => {
            controller.emergency_stop().await;
        }
    }

    warn!("shutdown complete");
    Ok(())
}
