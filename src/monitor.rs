use crate::error::FetchError;
use crate::state::{CanonicalState, StateLabel};
use crate::status::StatusSource;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reaction to a change of the system state. Runs on the polling loop and
/// must return before the next tick starts.
pub trait TransitionHandler: Send {
    fn on_transition(&mut self, new_state: CanonicalState, old_state: CanonicalState);
}

impl<F> TransitionHandler for F
where
    F: FnMut(CanonicalState, CanonicalState) + Send,
{
    fn on_transition(&mut self, new_state: CanonicalState, old_state: CanonicalState) {
        self(new_state, old_state)
    }
}

/// Polls the system state and reports transitions
pub struct Monitor {
    source: Box<dyn StatusSource>,
    current_state: CanonicalState,
    previous_state: CanonicalState,
    raw_label: StateLabel,
    on_transition: Option<Box<dyn TransitionHandler>>,
    poll_interval: Duration,
}

impl Monitor {
    /// Create a monitor without a transition handler
    pub fn new(source: Box<dyn StatusSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            current_state: CanonicalState::Unknown,
            previous_state: CanonicalState::Unknown,
            raw_label: StateLabel::unknown(),
            on_transition: None,
            poll_interval,
        }
    }

    /// Create a monitor bound to a transition handler
    pub fn with_handler<H>(
        source: Box<dyn StatusSource>,
        poll_interval: Duration,
        handler: H,
    ) -> Self
    where
        H: TransitionHandler + 'static,
    {
        Self {
            on_transition: Some(Box::new(handler)),
            ..Self::new(source, poll_interval)
        }
    }

    pub fn current_state(&self) -> CanonicalState {
        self.current_state
    }

    pub fn previous_state(&self) -> CanonicalState {
        self.previous_state
    }

    pub fn raw_label(&self) -> &StateLabel {
        &self.raw_label
    }

    pub fn has_changed(&self) -> bool {
        self.current_state != self.previous_state
    }

    /// Take one sample. A failed fetch is recorded as the unknown label and
    /// reported to the caller; the state is updated either way.
    pub async fn update(&mut self) -> Result<(), FetchError> {
        self.previous_state = self.current_state;

        let outcome = match self.source.fetch_state_label().await {
            Ok(label) => {
                self.raw_label = StateLabel::new(&label);
                if self.raw_label.is_truncated() {
                    debug!("State label truncated: {:?}", label);
                }
                Ok(())
            }
            Err(e) => {
                self.raw_label = StateLabel::unknown();
                Err(e)
            }
        };

        self.current_state = self.raw_label.state();
        outcome
    }

    /// Invoke the handler if the last update changed the state
    pub fn dispatch(&mut self) -> bool {
        if !self.has_changed() {
            return false;
        }

        info!(
            "System state changed: {} -> {}",
            self.previous_state, self.current_state
        );

        if let Some(handler) = self.on_transition.as_mut() {
            handler.on_transition(self.current_state, self.previous_state);
        }

        true
    }

    /// Sample, compare and dispatch once
    pub async fn tick(&mut self) -> bool {
        if let Err(e) = self.update().await {
            if e.is_transient() {
                warn!("Failed to fetch system state: {}", e);
            } else {
                warn!("Invalid system state reply: {}", e);
            }
        }

        self.dispatch()
    }

    /// Poll until `shutdown` is cancelled. Cancellation interrupts the sleep
    /// between ticks, never a tick in progress.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            "Monitoring system state every {}ms",
            self.poll_interval.as_millis()
        );

        while !shutdown.is_cancelled() {
            self.tick().await;

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    debug!("Sleep interrupted by shutdown request");
                    break;
                }
            }
        }

        info!("State monitor stopped in state {}", self.current_state);
    }
}
