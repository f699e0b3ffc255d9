pub mod motor;

pub use motor::{Motor, MotorError, SimulatedMotor};

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::domain::{ControllerState, PanelOrientation, WeatherObservation};
use crate::journal::CycleJournal;
use crate::optimizer::PanelOptimizer;
use crate::weather::WeatherSource;

/// Owns the panel state and drives the decide-then-move cycle.
///
/// State lives behind a single lock so `orientation` and `is_moving` are
/// always updated together. The orientation is committed only after a slew
/// completes; failed or pre-empted slews leave it untouched.
pub struct TrackingController {
    motor: Arc<dyn Motor>,
    optimizer: Arc<PanelOptimizer>,
    state: Arc<RwLock<ControllerState>>,
}

impl TrackingController {
    pub fn new(motor: Arc<dyn Motor>, optimizer: Arc<PanelOptimizer>) -> Self {
        Self {
            motor,
            optimizer,
            state: Arc::new(RwLock::new(ControllerState::default())),
        }
    }

    pub async fn current_position(&self) -> PanelOrientation {
        self.state.read().await.orientation
    }

    pub async fn is_moving(&self) -> bool {
        self.state.read().await.is_moving
    }

    /// Slews the panel to `target`. Returns true on success; on any motor
    /// failure, or when an emergency stop pre-empts the slew, the current
    /// orientation is left unchanged and false is returned. The moving flag
    /// is cleared on every exit path.
    pub async fn move_to_position(&self, target: PanelOrientation) -> bool {
        let from = {
            let mut state = self.state.write().await;
            if state.is_moving {
                warn!("move requested while already moving, ignoring");
                return false;
            }
            state.is_moving = true;
            state.orientation
        };

        let result = self.motor.slew(from, target).await;

        let mut state = self.state.write().await;
        // The flag having been cleared under us means emergency_stop fired
        // mid-slew; the move is abandoned rather than committed.
        let pre_empted = !state.is_moving;
        state.is_moving = false;
        match result {
            Ok(()) if !pre_empted => {
                state.orientation = target;
                info!(position = %target, "move completed");
                true
            }
            Ok(()) => {
                warn!(target = %target, "slew pre-empted by emergency stop, position not committed");
                false
            }
            Err(e) => {
                warn!(error = %e, target = %target, "slew failed, position unchanged");
                false
            }
        }
    }

    /// Halts any in-flight movement immediately. The interrupted move's
    /// target is never committed.
    pub async fn emergency_stop(&self) {
        let mut state = self.state.write().await;
        if state.is_moving {
            warn!("emergency stop triggered");
            state.is_moving = false;
        }
    }

    /// One control cycle: observe, derive target angles, score the move,
    /// actuate when it clears the threshold, journal the outcome.
    pub async fn run_cycle(
        &self,
        source: &dyn WeatherSource,
        journal: &mut CycleJournal,
        priority_threshold: f64,
    ) -> Result<()> {
        let observation = source.observe().await?;
        let now = observation_timestamp(&observation);

        let current = self.current_position().await;
        let target = self.optimizer.calculate_optimal_angles(&observation, now);
        let priority = self
            .optimizer
            .movement_priority(&observation, &current, &target);

        info!(
            clouds_pct = observation.cloud_cover_pct,
            wind_m_s = observation.wind_speed_m_s,
            rain_mm_per_h = observation.rain_mm_per_h,
            condition = %observation.condition,
            target = %target,
            priority,
            "cycle"
        );

        if priority > priority_threshold {
            self.move_to_position(target).await;
        } else {
            info!(priority, "skipping movement, priority too low");
        }

        journal.record(now, &observation, &target)?;
        Ok(())
    }

    /// Polling loop. Any cycle error stops the panel before propagating,
    /// so the controller is never left mid-move on an unhandled fault.
    pub async fn run(
        &self,
        source: &dyn WeatherSource,
        journal: &mut CycleJournal,
        cfg: &ControllerConfig,
    ) -> Result<()> {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cfg.poll_seconds.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = self
                .run_cycle(source, journal, cfg.priority_threshold)
                .await
            {
                self.emergency_stop().await;
                return Err(e);
            }
        }
    }
}

/// Trace records carry their own date/time; live observations use the wall
/// clock. The solar-position variant depends on this being the trace time
/// during replays.
fn observation_timestamp(observation: &WeatherObservation) -> NaiveDateTime {
    match (observation.date, observation.time) {
        (Some(date), Some(time)) => date.and_time(time),
        _ => Local::now().naive_local(),
    }
}
