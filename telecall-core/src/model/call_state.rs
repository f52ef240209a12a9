use serde::{Deserialize, Serialize};

/// Lifecycle of a call as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallState {
    Idle,
    AcquiringMedia,
    /// Camera or microphone access was refused. Not retried.
    PermissionDenied,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl CallState {
    /// No further state changes follow for this peer connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }
}
