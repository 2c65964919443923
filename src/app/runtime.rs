use super::watchdog::GraceWatchdog;
use super::{ShutdownReason, StateLedApp};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shared by the signal handlers to stop the monitor
#[derive(Clone)]
pub(super) struct ShutdownTrigger {
    token: CancellationToken,
    watchdog: Arc<GraceWatchdog>,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl ShutdownTrigger {
    pub(super) fn new(watchdog: Arc<GraceWatchdog>) -> Self {
        Self {
            token: CancellationToken::new(),
            watchdog,
            reason: Arc::new(Mutex::new(None)),
        }
    }

    pub(super) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Arm the grace period and ask the monitor to stop after its current tick
    pub(super) fn fire(&self, reason: ShutdownReason) {
        info!("Shutdown initiated: {:?}", reason);
        self.watchdog.arm();
        self.reason.lock().get_or_insert(reason);
        self.token.cancel();
    }

    fn take_reason(&self) -> ShutdownReason {
        self.reason.lock().take().unwrap_or(ShutdownReason::Requested)
    }
}

impl StateLedApp {
    /// Run the monitor until SIGINT or SIGTERM
    pub async fn run(&mut self) -> Result<ShutdownReason> {
        info!("Stateled is running");

        self.setup_signal_handlers();
        self.monitor.run(self.trigger.token()).await;

        for task in self.signal_tasks.drain(..) {
            task.abort();
        }
        self.trigger.watchdog.disarm();

        let reason = self.trigger.take_reason();
        info!("Stateled stopped: {:?}", reason);
        Ok(reason)
    }

    /// Request shutdown as a signal would
    pub fn request_shutdown(&self, reason: ShutdownReason) {
        self.trigger.fire(reason);
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&mut self) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    let trigger = self.trigger.clone();
                    self.signal_tasks.push(tokio::spawn(async move {
                        while sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            trigger.fire(ShutdownReason::Signal("SIGTERM".to_string()));
                        }
                    }));
                }
                Err(e) => error!("Couldn't install signal handler for SIGTERM: {}", e),
            }
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let trigger = self.trigger.clone();
        self.signal_tasks.push(tokio::spawn(async move {
            loop {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Received SIGINT signal (Ctrl+C)");
                        trigger.fire(ShutdownReason::Signal("SIGINT".to_string()));
                    }
                    Err(e) => {
                        error!("Couldn't install signal handler for SIGINT: {}", e);
                        break;
                    }
                }
            }
        }));
    }
}
