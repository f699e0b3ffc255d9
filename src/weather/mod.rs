pub mod live;
pub mod replay;
pub mod synthetic;

pub use live::WeatherApiSource;
pub use replay::TraceSource;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::WeatherObservation;

/// Supplies one weather observation per control cycle.
///
/// Implementations own their failure policy: the live provider swallows
/// transport errors and returns a safe default, the replay provider wraps
/// around at end of trace. The control loop never handles fetch errors.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn observe(&self) -> Result<WeatherObservation>;
}
