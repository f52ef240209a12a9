use telecall_core::{IceCandidate, MediaKind};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

/// Events raised by webrtc callbacks for the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local ICE candidate to forward to the remote side.
    CandidateGenerated(IceCandidate),

    StateChanged(RTCPeerConnectionState),

    /// The remote side started sending a track.
    RemoteTrack { kind: MediaKind, id: String },
}
