pub mod config;
pub mod error;
pub mod media;
pub mod negotiation;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::{CallRole, SessionConfig};
pub use error::{MediaError, NegotiationError, RelayError, SessionError};
pub use media::{LocalMediaStream, LocalTrack, MediaDevices, SyntheticDevices};
pub use session::{CallHandle, CallSession, SessionCommand, SessionEvent};
pub use signaling::{SignalingRelay, WsRelay};
