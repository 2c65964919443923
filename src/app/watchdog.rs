use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error};

/// Exit status used when shutdown overruns its grace period
pub const GRACE_EXPIRED_EXIT_CODE: i32 = 1;

type ExpiryAction = Arc<dyn Fn() + Send + Sync>;

/// Deadline for a graceful shutdown. Arming again replaces the pending
/// deadline rather than extending it.
pub struct GraceWatchdog {
    grace: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    on_expire: ExpiryAction,
}

impl GraceWatchdog {
    /// Watchdog that terminates the process when the grace period runs out
    pub fn new(grace: Duration) -> Self {
        Self::with_action(grace, move || {
            error!(
                "Shutdown did not complete within {}ms, terminating",
                grace.as_millis()
            );
            std::process::exit(GRACE_EXPIRED_EXIT_CODE);
        })
    }

    pub fn with_action<F>(grace: Duration, on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            grace,
            pending: Mutex::new(None),
            on_expire: Arc::new(on_expire),
        }
    }

    /// Start the grace period from now. Must be called within a tokio runtime.
    pub fn arm(&self) {
        let grace = self.grace;
        let on_expire = Arc::clone(&self.on_expire);

        let handle = tokio::spawn(async move {
            sleep(grace).await;
            on_expire();
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }

        debug!("Shutdown grace period armed: {}ms", grace.as_millis());
    }

    pub fn disarm(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
            debug!("Shutdown grace period disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for GraceWatchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
