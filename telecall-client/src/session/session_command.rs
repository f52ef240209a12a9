use crate::error::Result;
use telecall_core::{MediaKind, MediaState};
use tokio::sync::oneshot;

/// Requests from call handles to the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Flip the enabled flag of every local track of `kind`.
    ToggleMedia {
        kind: MediaKind,
        reply: oneshot::Sender<Result<MediaState>>,
    },

    MediaState {
        reply: oneshot::Sender<MediaState>,
    },

    /// Push a chat line through the relay as `{"message": text}`.
    SendChat {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },

    /// End the call: close relay, peer connection and local media.
    HangUp,
}
