mod call_state;
mod media;
mod peer;
mod signaling;

pub use call_state::CallState;
pub use media::{MediaConstraints, MediaKind, MediaState};
pub use peer::PeerId;
pub use signaling::{
    CodecError, IceCandidate, IceServerConfig, RelayFrame, SdpKind, SessionDescription,
    SignalMessage, decode_frame, encode_signal,
};
