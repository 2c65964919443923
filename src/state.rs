use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest label the monitor keeps from a status reply, in bytes
pub const STATE_LABEL_CAPACITY: usize = 11;

/// Overall system state as reported by the init system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalState {
    #[default]
    Unknown,
    Starting,
    Running,
    Maintenance,
    Degraded,
    Stopping,
}

impl CanonicalState {
    pub const ALL: [CanonicalState; 6] = [
        CanonicalState::Unknown,
        CanonicalState::Starting,
        CanonicalState::Running,
        CanonicalState::Maintenance,
        CanonicalState::Degraded,
        CanonicalState::Stopping,
    ];

    /// Wire label used by the status provider
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalState::Unknown => "unknown",
            CanonicalState::Starting => "starting",
            CanonicalState::Running => "running",
            CanonicalState::Maintenance => "maintenance",
            CanonicalState::Degraded => "degraded",
            CanonicalState::Stopping => "stopping",
        }
    }

    /// Map raw status text onto a state. Exact and case-sensitive; anything
    /// unrecognised is `Unknown`.
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "starting" => CanonicalState::Starting,
            "running" => CanonicalState::Running,
            "maintenance" => CanonicalState::Maintenance,
            "degraded" => CanonicalState::Degraded,
            "stopping" => CanonicalState::Stopping,
            _ => CanonicalState::Unknown,
        }
    }
}

impl fmt::Display for CanonicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounded copy of the last label received from the status provider.
///
/// Input longer than [`STATE_LABEL_CAPACITY`] is cut at a character boundary
/// and flagged, so a long reply never matches a known label by its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLabel {
    text: String,
    truncated: bool,
}

impl StateLabel {
    pub fn new(raw: &str) -> Self {
        if raw.len() <= STATE_LABEL_CAPACITY {
            return Self {
                text: raw.to_string(),
                truncated: false,
            };
        }

        let mut end = STATE_LABEL_CAPACITY;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }

        Self {
            text: raw[..end].to_string(),
            truncated: true,
        }
    }

    pub fn unknown() -> Self {
        Self::new(CanonicalState::Unknown.label())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn state(&self) -> CanonicalState {
        if self.truncated {
            CanonicalState::Unknown
        } else {
            CanonicalState::normalize(&self.text)
        }
    }
}

impl Default for StateLabel {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
