mod orchestrator;
mod runtime;
mod startup;
mod types;
mod watchdog;


pub use orchestrator::StateLedApp;
pub use types::ShutdownReason;
pub use watchdog::{GraceWatchdog, GRACE_EXPIRED_EXIT_CODE};
