use serde_json::Value;
use telecall_core::{CallState, MediaKind, MediaState};

/// Everything a UI needs to render the call.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(CallState),

    /// Local capture succeeded and its tracks are attached.
    LocalMediaReady { tracks: usize },

    /// Capture failed for a reason other than a permission refusal.
    MediaUnavailable(String),

    MediaStateChanged(MediaState),

    RemoteTrack { kind: MediaKind, id: String },

    /// Non-negotiation JSON seen on the relay (chat traffic).
    RelayMessage(Value),

    RelayClosed,

    /// A negotiation step failed; the round was abandoned.
    NegotiationFailed(String),

    /// Last event of a session.
    Closed { connection_closed: bool },
}
