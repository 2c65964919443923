use super::runtime::ShutdownTrigger;
use super::watchdog::GraceWatchdog;
use crate::config::StateLedConfig;
use crate::error::Result;
use crate::indicator::{IndicatorDevice, IndicatorDriver};
use crate::monitor::Monitor;
use crate::status::{StatusSource, SystemdStatusSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Owns the monitor and the process lifecycle around it
pub struct StateLedApp {
    pub(super) config: StateLedConfig,
    pub(super) monitor: Monitor,
    pub(super) trigger: ShutdownTrigger,
    pub(super) signal_tasks: Vec<JoinHandle<()>>,
}

impl StateLedApp {
    /// Prepare the indicator and connect the monitor to systemd.
    ///
    /// Fails if the configuration is invalid or the indicator device is not
    /// usable; nothing is polled in that case.
    pub fn new(config: StateLedConfig) -> Result<Self> {
        config.validate()?;

        let indicator = Self::prepare_indicator(&config.indicator)?;
        let source =
            SystemdStatusSource::new(config.status.clone(), config.timing.fetch_timeout);

        info!(
            "Watching {} {} on {}",
            config.status.interface, config.status.property, config.status.destination
        );

        Ok(Self::with_parts(config, Box::new(source), indicator))
    }

    /// Assemble from an already prepared source and indicator device
    pub fn with_parts<D>(config: StateLedConfig, source: Box<dyn StatusSource>, device: D) -> Self
    where
        D: IndicatorDevice + 'static,
    {
        let driver = IndicatorDriver::new(device, config.indicator.palette);
        let monitor = Monitor::with_handler(source, config.timing.poll_interval, driver);
        let watchdog = GraceWatchdog::new(config.timing.shutdown_grace);

        Self {
            config,
            monitor,
            trigger: ShutdownTrigger::new(Arc::new(watchdog)),
            signal_tasks: Vec::new(),
        }
    }

    /// Replace the shutdown grace watchdog
    pub fn set_watchdog(&mut self, watchdog: GraceWatchdog) {
        self.trigger = ShutdownTrigger::new(Arc::new(watchdog));
    }

    pub fn config(&self) -> &StateLedConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Token cancelled when shutdown is requested
    pub fn shutdown_token(&self) -> CancellationToken {
        self.trigger.token()
    }
}
