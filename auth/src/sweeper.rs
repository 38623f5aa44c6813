//! Periodic removal of expired two-factor challenges.
//!
//! Verification already drops an expired challenge when it is looked at;
//! the sweeper only bounds memory for challenges nobody comes back to.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::service::AuthService;

/// Spawns a task that purges expired challenges every `period`.
///
/// Must be called from within a tokio runtime. Abort the returned handle to
/// stop sweeping.
pub fn spawn_challenge_sweeper(service: Arc<AuthService>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting challenge sweeper");

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = service.purge_expired_challenges() {
                error!("Challenge sweep failed: {e:?}");
            }
        }
    })
}
