//! Minimum spacing between outgoing provider requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces calls to [`RequestThrottle::wait`] at least `min_gap` apart.
///
/// Concurrent callers queue on the inner lock and are released one slot
/// at a time.
#[derive(Debug)]
pub struct RequestThrottle {
    min_gap: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            next_slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Waits until the next request slot is open and claims it.
    pub async fn wait(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(at) = *next_slot
            && at > Instant::now()
        {
            log::debug!("Throttling geocoding request for {:?}", at - Instant::now());
            tokio::time::sleep_until(at).await;
        }
        *next_slot = Some(Instant::now() + self.min_gap);
    }
}
