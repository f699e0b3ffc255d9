use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::domain::PanelOrientation;

/// Actuator-level failures. The controller converts these into a boolean
/// move result; they never propagate past it.
#[derive(Debug, Error)]
pub enum MotorError {
    #[error("actuator fault: {0}")]
    Fault(String),
    #[error("actuator offline")]
    Offline,
}

/// Drives the two panel axes. The seam a real stepper/linear-actuator
/// driver would plug into.
#[async_trait]
pub trait Motor: Send + Sync {
    /// Slews both axes from `from` to `target`, returning once the motion
    /// has completed.
    async fn slew(&self, from: PanelOrientation, target: PanelOrientation)
        -> Result<(), MotorError>;
}

/// Timed stand-in for real hardware. Both axes move in parallel, so the
/// slower axis bounds the slew; the actual wait is capped so interactive
/// runs stay responsive.
pub struct SimulatedMotor {
    speed_deg_per_s: f64,
    max_simulated_slew: Duration,
    fail_next: AtomicBool,
}

impl SimulatedMotor {
    pub fn new(speed_deg_per_s: f64, max_simulated_slew: Duration) -> Self {
        Self {
            speed_deg_per_s,
            max_simulated_slew,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Estimated real-world slew time: the dominant axis delta over the
    /// slew rate.
    pub fn slew_duration(&self, from: &PanelOrientation, target: &PanelOrientation) -> Duration {
        let tilt_delta = (target.tilt_deg - from.tilt_deg).abs();
        let azimuth_delta = (target.azimuth_deg - from.azimuth_deg).abs();
        Duration::from_secs_f64(tilt_delta.max(azimuth_delta) / self.speed_deg_per_s)
    }

    /// Makes the next slew report a fault. Test hook for the controller's
    /// failure path.
    pub fn fail_next_slew(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl Motor for SimulatedMotor {
    async fn slew(
        &self,
        from: PanelOrientation,
        target: PanelOrientation,
    ) -> Result<(), MotorError> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(MotorError::Fault("injected actuator fault".to_string()));
        }

        let estimated = self.slew_duration(&from, &target);
        info!(
            from = %from,
            target = %target,
            estimated_seconds = estimated.as_secs_f64(),
            "slewing panel"
        );
        sleep(estimated.min(self.max_simulated_slew)).await;
        Ok(())
    }
}
