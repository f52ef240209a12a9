use telecall_core::{CodecError, MediaKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    /// The user (or platform policy) refused camera/microphone access.
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no {0} device available")]
    NotFound(MediaKind),

    #[error("capture device failed: {0}")]
    Device(String),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid relay url: {0}")]
    Url(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("relay channel is closed")]
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("an offer is already outstanding")]
    OfferInFlight,

    #[error("received an answer with no outstanding offer")]
    UnexpectedAnswer,

    #[error("cannot answer: no remote offer is pending")]
    NoRemoteOffer,

    #[error("negotiation is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("no local media stream is attached")]
    NoLocalMedia,

    #[error("call session has ended")]
    SessionEnded,
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
