use crate::config::{IndicatorConfig, PaletteConfig};
use crate::error::IndicatorError;
use crate::monitor::TransitionHandler;
use crate::state::CanonicalState;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::{debug, info, warn};

/// Colors understood by the LED controller, by palette index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorColor {
    Blue,
    Red,
    Green,
    Purple,
}

impl IndicatorColor {
    /// Index written to the color device
    pub fn code(&self) -> u8 {
        match self {
            IndicatorColor::Blue => 0,
            IndicatorColor::Red => 1,
            IndicatorColor::Green => 2,
            IndicatorColor::Purple => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorColor::Blue => "blue",
            IndicatorColor::Red => "red",
            IndicatorColor::Green => "green",
            IndicatorColor::Purple => "purple",
        }
    }
}

impl PaletteConfig {
    /// Color for a state, or `None` when the indicator should be left alone
    pub fn color_for(&self, state: CanonicalState) -> Option<IndicatorColor> {
        match state {
            CanonicalState::Starting | CanonicalState::Stopping => Some(self.transitional),
            CanonicalState::Degraded | CanonicalState::Maintenance => Some(self.alert),
            CanonicalState::Running => Some(self.nominal),
            CanonicalState::Unknown => None,
        }
    }
}

/// Output side of the indicator. Writes run on the polling loop and must
/// complete quickly.
pub trait IndicatorDevice: Send {
    fn set_color(&mut self, color: IndicatorColor) -> Result<(), IndicatorError>;
}

/// LED driven through sysfs attribute files
#[derive(Debug, Clone)]
pub struct SysfsIndicator {
    color_device: String,
    mode_device: String,
}

impl SysfsIndicator {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            color_device: config.color_device.clone(),
            mode_device: config.mode_device.clone(),
        }
    }

    /// Check that the color device can be opened for writing
    pub fn probe(&self) -> Result<(), IndicatorError> {
        self.open(&self.color_device)?;
        debug!("Indicator color device is writable: {}", self.color_device);
        Ok(())
    }

    /// Switch the LED into the given mode
    pub fn activate(&self, mode_token: &str) -> Result<(), IndicatorError> {
        self.write_device(&self.mode_device, mode_token)?;
        info!("Indicator mode set to '{}'", mode_token);
        Ok(())
    }

    fn open(&self, device: &str) -> Result<std::fs::File, IndicatorError> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(device)
            .map_err(|e| IndicatorError::DeviceOpen {
                device: device.to_string(),
                source: e,
            })
    }

    fn write_device(&self, device: &str, value: &str) -> Result<(), IndicatorError> {
        let mut file = self.open(device)?;

        file.write_all(value.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| IndicatorError::DeviceWrite {
                device: device.to_string(),
                source: e,
            })
    }
}

impl IndicatorDevice for SysfsIndicator {
    fn set_color(&mut self, color: IndicatorColor) -> Result<(), IndicatorError> {
        self.write_device(&self.color_device, &color.code().to_string())
    }
}

/// Reacts to state transitions by recoloring the indicator
pub struct IndicatorDriver<D: IndicatorDevice> {
    device: D,
    palette: PaletteConfig,
}

impl<D: IndicatorDevice> IndicatorDriver<D> {
    pub fn new(device: D, palette: PaletteConfig) -> Self {
        Self { device, palette }
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: IndicatorDevice> TransitionHandler for IndicatorDriver<D> {
    fn on_transition(&mut self, new_state: CanonicalState, _old_state: CanonicalState) {
        let Some(color) = self.palette.color_for(new_state) else {
            debug!("No indicator change for state {}", new_state);
            return;
        };

        match self.device.set_color(color) {
            Ok(()) => debug!("Indicator set to {} for state {}", color.name(), new_state),
            Err(e) => warn!("Skipping indicator update for state {}: {}", new_state, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingDevice {
        writes: Arc<Mutex<Vec<IndicatorColor>>>,
    }

    impl IndicatorDevice for RecordingDevice {
        fn set_color(&mut self, color: IndicatorColor) -> Result<(), IndicatorError> {
            self.writes.lock().push(color);
            Ok(())
        }
    }

    struct BrokenDevice {
        attempts: usize,
    }

    impl IndicatorDevice for BrokenDevice {
        fn set_color(&mut self, _color: IndicatorColor) -> Result<(), IndicatorError> {
            self.attempts += 1;
            Err(IndicatorError::DeviceOpen {
                device: "/nonexistent/color".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    fn indicator_config(dir: &tempfile::TempDir) -> IndicatorConfig {
        IndicatorConfig {
            color_device: dir.path().join("color").to_string_lossy().into_owned(),
            mode_device: dir.path().join("ledmode").to_string_lossy().into_owned(),
            ..IndicatorConfig::default()
        }
    }

    #[test]
    fn test_palette_codes() {
        assert_eq!(IndicatorColor::Blue.code(), 0);
        assert_eq!(IndicatorColor::Red.code(), 1);
        assert_eq!(IndicatorColor::Green.code(), 2);
        assert_eq!(IndicatorColor::Purple.code(), 3);
    }

    #[test]
    fn test_color_depends_only_on_new_state() {
        let palette = PaletteConfig::default();
        let expected = [
            (CanonicalState::Starting, Some(IndicatorColor::Purple)),
            (CanonicalState::Stopping, Some(IndicatorColor::Purple)),
            (CanonicalState::Degraded, Some(IndicatorColor::Red)),
            (CanonicalState::Maintenance, Some(IndicatorColor::Red)),
            (CanonicalState::Running, Some(IndicatorColor::Blue)),
            (CanonicalState::Unknown, None),
        ];

        for (new_state, color) in expected {
            for old_state in CanonicalState::ALL {
                let device = RecordingDevice::default();
                let mut driver = IndicatorDriver::new(device.clone(), palette);
                driver.on_transition(new_state, old_state);

                let writes = device.writes.lock().clone();
                assert_eq!(writes, color.into_iter().collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_unknown_state_leaves_device_untouched() {
        let device = RecordingDevice::default();
        let mut driver = IndicatorDriver::new(device.clone(), PaletteConfig::default());

        driver.on_transition(CanonicalState::Unknown, CanonicalState::Running);

        assert!(device.writes.lock().is_empty());
    }

    #[test]
    fn test_custom_palette() {
        let palette = PaletteConfig {
            nominal: IndicatorColor::Green,
            ..PaletteConfig::default()
        };
        let device = RecordingDevice::default();
        let mut driver = IndicatorDriver::new(device.clone(), palette);

        driver.on_transition(CanonicalState::Running, CanonicalState::Starting);

        assert_eq!(*device.writes.lock(), vec![IndicatorColor::Green]);
    }

    #[test]
    fn test_device_failure_is_swallowed() {
        let mut driver =
            IndicatorDriver::new(BrokenDevice { attempts: 0 }, PaletteConfig::default());

        driver.on_transition(CanonicalState::Degraded, CanonicalState::Running);
        driver.on_transition(CanonicalState::Running, CanonicalState::Degraded);

        assert_eq!(driver.device().attempts, 2);
    }

    #[test]
    fn test_sysfs_indicator_writes_palette_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = indicator_config(&dir);
        std::fs::write(&config.color_device, "").unwrap();

        let mut indicator = SysfsIndicator::new(&config);
        indicator.set_color(IndicatorColor::Purple).unwrap();
        assert_eq!(std::fs::read_to_string(&config.color_device).unwrap(), "3");

        indicator.set_color(IndicatorColor::Blue).unwrap();
        assert_eq!(std::fs::read_to_string(&config.color_device).unwrap(), "0");
    }

    #[test]
    fn test_sysfs_indicator_activate_and_probe() {
        let dir = tempfile::tempdir().unwrap();
        let config = indicator_config(&dir);
        std::fs::write(&config.color_device, "").unwrap();
        std::fs::write(&config.mode_device, "off").unwrap();

        let indicator = SysfsIndicator::new(&config);
        indicator.probe().unwrap();
        indicator.activate("lit").unwrap();

        assert_eq!(std::fs::read_to_string(&config.mode_device).unwrap(), "lit");
    }

    #[test]
    fn test_sysfs_indicator_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let config = indicator_config(&dir);

        let mut indicator = SysfsIndicator::new(&config);

        assert!(matches!(
            indicator.probe(),
            Err(IndicatorError::DeviceOpen { .. })
        ));
        assert!(indicator.set_color(IndicatorColor::Red).is_err());
    }
}
