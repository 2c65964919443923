pub mod app;
pub mod config;
pub mod error;
pub mod indicator;
pub mod monitor;
pub mod state;
pub mod status;

pub use app::{GraceWatchdog, ShutdownReason, StateLedApp};
pub use config::{IndicatorConfig, PaletteConfig, StateLedConfig, StatusConfig, TimingConfig};
pub use error::{FetchError, IndicatorError, Result, StateLedError};
pub use indicator::{IndicatorColor, IndicatorDevice, IndicatorDriver, SysfsIndicator};
pub use monitor::{Monitor, TransitionHandler};
pub use state::{CanonicalState, StateLabel, STATE_LABEL_CAPACITY};
pub use status::{ScriptedStatusSource, StatusSource, SystemdStatusSource};
