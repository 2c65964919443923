use super::StateLedApp;
use crate::config::IndicatorConfig;
use crate::error::Result;
use crate::indicator::SysfsIndicator;
use tracing::{error, info};

impl StateLedApp {
    /// Check the color device and light the LED
    pub(super) fn prepare_indicator(config: &IndicatorConfig) -> Result<SysfsIndicator> {
        let indicator = SysfsIndicator::new(config);

        indicator.probe().map_err(|e| {
            error!("Couldn't open led color control file for writing: {}", e);
            e
        })?;

        indicator.activate(&config.mode_token).map_err(|e| {
            error!("Couldn't open led mode control file for writing: {}", e);
            e
        })?;

        info!("Indicator ready on {}", config.color_device);
        Ok(indicator)
    }
}
