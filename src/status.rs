use crate::config::StatusConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use zbus::zvariant::{OwnedValue, Value};
use zbus::Connection;

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Source of the raw system state label.
///
/// Each call makes at most one attempt; retrying is left to the caller.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_state_label(&self) -> Result<String, FetchError>;
}

/// Reads the manager's state property from systemd over the system bus
#[derive(Debug, Clone)]
pub struct SystemdStatusSource {
    config: StatusConfig,
    timeout: Duration,
}

impl SystemdStatusSource {
    pub fn new(config: StatusConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Connection and reply live only for the duration of this call and are
    /// released on every return path, including timeout.
    async fn query(&self) -> Result<String, FetchError> {
        let connection = Connection::system().await?;

        let reply = connection
            .call_method(
                Some(self.config.destination.as_str()),
                self.config.object_path.as_str(),
                Some(PROPERTIES_INTERFACE),
                "Get",
                &(self.config.interface.as_str(), self.config.property.as_str()),
            )
            .await?;

        let value: OwnedValue = reply
            .body()
            .deserialize()
            .map_err(|e| FetchError::MalformedReply {
                details: e.to_string(),
            })?;

        extract_label(&value)
    }
}

/// Unwrap the `v<s>` reply of a property read
fn extract_label(value: &Value<'_>) -> Result<String, FetchError> {
    match value {
        Value::Str(label) => Ok(label.as_str().to_string()),
        Value::Value(inner) => extract_label(inner),
        other => Err(FetchError::UnexpectedType {
            signature: other.value_signature().to_string(),
        }),
    }
}

#[async_trait]
impl StatusSource for SystemdStatusSource {
    async fn fetch_state_label(&self) -> Result<String, FetchError> {
        let label = timeout(self.timeout, self.query())
            .await
            .map_err(|_| FetchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        debug!("{}.{} = {}", self.config.interface, self.config.property, label);
        Ok(label)
    }
}

/// Status source replaying a fixed script, for tests and dry runs without a
/// system bus. `None` entries and an exhausted script report a failure.
#[derive(Debug, Default)]
pub struct ScriptedStatusSource {
    script: Mutex<VecDeque<Option<String>>>,
    fetches: AtomicUsize,
}

impl ScriptedStatusSource {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(steps.into_iter().map(|s| s.map(Into::into)).collect()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Script where every step succeeds with the given label
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels.into_iter().map(Some))
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn fetch_state_label(&self) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        match self.script.lock().pop_front() {
            Some(Some(label)) => Ok(label),
            Some(None) => Err(FetchError::Unavailable {
                details: "scripted failure".to_string(),
            }),
            None => Err(FetchError::Unavailable {
                details: "script exhausted".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::time::Instant;

    #[test]
    fn test_extract_label_from_string_variant() {
        let value = Value::from("degraded");
        assert_eq!(extract_label(&value).unwrap(), "degraded");

        let nested = Value::Value(Box::new(Value::from("running")));
        assert_eq!(extract_label(&nested).unwrap(), "running");
    }

    #[test]
    fn test_extract_label_rejects_other_types() {
        let value = Value::from(7u32);
        match extract_label(&value) {
            Err(FetchError::UnexpectedType { signature }) => assert_eq!(signature, "u"),
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            extract_label(&Value::from(true)),
            Err(FetchError::UnexpectedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_scripted_source_replays_steps() {
        let source = ScriptedStatusSource::new([Some("starting"), None, Some("running")]);

        assert_eq!(source.fetch_state_label().await.unwrap(), "starting");
        assert!(source.fetch_state_label().await.is_err());
        assert_eq!(source.fetch_state_label().await.unwrap(), "running");
        assert!(matches!(
            source.fetch_state_label().await,
            Err(FetchError::Unavailable { .. })
        ));
        assert_eq!(source.fetch_count(), 4);
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_systemd_source_bus_failures() {
        let dir = tempfile::tempdir().unwrap();
        let fetch_timeout = Duration::from_millis(400);
        let source = SystemdStatusSource::new(StatusConfig::default(), fetch_timeout);

        // Both cases share the process-wide bus address, so run them in sequence
        let silent_socket = dir.path().join("silent_bus");
        let _listener = UnixListener::bind(&silent_socket).unwrap();
        std::env::set_var(
            "DBUS_SYSTEM_BUS_ADDRESS",
            format!("unix:path={}", silent_socket.display()),
        );

        let started = Instant::now();
        let result = source.fetch_state_label().await;
        let elapsed = started.elapsed();

        assert!(
            matches!(result, Err(FetchError::Timeout { timeout_ms: 400 })),
            "unexpected result: {:?}",
            result
        );
        assert!(elapsed >= fetch_timeout);
        assert!(elapsed < Duration::from_secs(2), "fetch took {:?}", elapsed);

        let missing_socket = dir.path().join("missing_bus");
        std::env::set_var(
            "DBUS_SYSTEM_BUS_ADDRESS",
            format!("unix:path={}", missing_socket.display()),
        );

        let result = source.fetch_state_label().await;
        std::env::remove_var("DBUS_SYSTEM_BUS_ADDRESS");

        match result {
            Err(e @ FetchError::Bus(_)) => assert!(e.is_transient()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
