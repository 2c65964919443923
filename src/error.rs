use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateLedError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Status fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),
}

/// Failures of a single status round trip
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("Status request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed status reply: {details}")]
    MalformedReply { details: String },

    #[error("Unexpected status reply type: v<{signature}>, expected v<s>")]
    UnexpectedType { signature: String },

    #[error("Status provider unavailable: {details}")]
    Unavailable { details: String },
}

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Failed to open indicator device {device}: {source}")]
    DeviceOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write indicator device {device}: {source}")]
    DeviceWrite {
        device: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether a later tick is likely to succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Bus(_) | FetchError::Unavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StateLedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_classification() {
        assert!(FetchError::Timeout { timeout_ms: 400 }.is_transient());
        assert!(FetchError::Unavailable {
            details: "no bus".to_string()
        }
        .is_transient());
        assert!(!FetchError::UnexpectedType {
            signature: "u".to_string()
        }
        .is_transient());
        assert!(!FetchError::MalformedReply {
            details: "empty body".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::UnexpectedType {
            signature: "u".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status reply type: v<u>, expected v<s>"
        );

        let err: StateLedError = IndicatorError::DeviceOpen {
            device: "/sys/led/color".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(err.to_string().contains("/sys/led/color"));
    }
}
