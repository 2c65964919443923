use crate::indicator::IndicatorColor;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StateLedConfig {
    pub status: StatusConfig,
    pub indicator: IndicatorConfig,

    /// Loop cadence and deadlines, fixed at build time
    #[serde(skip)]
    pub timing: TimingConfig,
}

/// Where the system state is read from
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatusConfig {
    /// Well-known bus name of the service manager
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Object exposing the manager properties
    #[serde(default = "default_object_path")]
    pub object_path: String,

    /// Interface owning the property
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Property holding the overall state label
    #[serde(default = "default_property")]
    pub property: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndicatorConfig {
    /// Device file accepting a palette index
    #[serde(default = "default_color_device")]
    pub color_device: String,

    /// Device file selecting the LED mode
    #[serde(default = "default_mode_device")]
    pub mode_device: String,

    /// Mode written once at startup
    #[serde(default = "default_mode_token")]
    pub mode_token: String,

    #[serde(default)]
    pub palette: PaletteConfig,
}

/// Color used for each category of state
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PaletteConfig {
    /// Running
    #[serde(default = "default_nominal_color")]
    pub nominal: IndicatorColor,

    /// Degraded or maintenance
    #[serde(default = "default_alert_color")]
    pub alert: IndicatorColor,

    /// Starting or stopping
    #[serde(default = "default_transitional_color")]
    pub transitional: IndicatorColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl StateLedConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("status.destination", default_destination())?
            .set_default("status.object_path", default_object_path())?
            .set_default("status.interface", default_interface())?
            .set_default("status.property", default_property())?
            .set_default("indicator.color_device", default_color_device())?
            .set_default("indicator.mode_device", default_mode_device())?
            .set_default("indicator.mode_token", default_mode_token())?
            .set_default("indicator.palette.nominal", default_nominal_color().name())?
            .set_default("indicator.palette.alert", default_alert_color().name())?
            .set_default("indicator.palette.transitional", default_transitional_color().name())?
            .add_source(File::with_name(&path_str).required(false))
            // STATELED_INDICATOR__COLOR_DEVICE=/tmp/color
            .add_source(
                Environment::with_prefix("STATELED")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: StateLedConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("status.destination", &self.status.destination),
            ("status.object_path", &self.status.object_path),
            ("status.interface", &self.status.interface),
            ("status.property", &self.status.property),
            ("indicator.color_device", &self.indicator.color_device),
            ("indicator.mode_device", &self.indicator.mode_device),
            ("indicator.mode_token", &self.indicator.mode_token),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{} must not be empty", key)));
            }
        }

        if !self.status.object_path.starts_with('/') {
            return Err(ConfigError::Message(
                "status.object_path must be an absolute object path".to_string(),
            ));
        }

        if self.timing.poll_interval.is_zero() {
            return Err(ConfigError::Message(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.timing.fetch_timeout.is_zero() {
            return Err(ConfigError::Message(
                "Fetch timeout must be greater than 0".to_string(),
            ));
        }

        if self.timing.fetch_timeout >= self.timing.poll_interval {
            return Err(ConfigError::Message(
                "Fetch timeout must be shorter than the poll interval".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for StateLedConfig {
    fn default() -> Self {
        Self {
            status: StatusConfig::default(),
            indicator: IndicatorConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            object_path: default_object_path(),
            interface: default_interface(),
            property: default_property(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            color_device: default_color_device(),
            mode_device: default_mode_device(),
            mode_token: default_mode_token(),
            palette: PaletteConfig::default(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            nominal: default_nominal_color(),
            alert: default_alert_color(),
            transitional: default_transitional_color(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            fetch_timeout: Duration::from_millis(400),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

// Default value functions
fn default_destination() -> String {
    "org.freedesktop.systemd1".to_string()
}
fn default_object_path() -> String {
    "/org/freedesktop/systemd1".to_string()
}
fn default_interface() -> String {
    "org.freedesktop.systemd1.Manager".to_string()
}
fn default_property() -> String {
    "SystemState".to_string()
}

fn default_color_device() -> String {
    "/sys/bus/platform/devices/bubbatwo/color".to_string()
}
fn default_mode_device() -> String {
    "/sys/bus/platform/devices/bubbatwo/ledmode".to_string()
}
fn default_mode_token() -> String {
    "lit".to_string()
}

fn default_nominal_color() -> IndicatorColor {
    IndicatorColor::Blue
}
fn default_alert_color() -> IndicatorColor {
    IndicatorColor::Red
}
fn default_transitional_color() -> IndicatorColor {
    IndicatorColor::Purple
}
