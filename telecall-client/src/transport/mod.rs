mod peer_transport;
mod transport_event;

pub use peer_transport::PeerTransport;
pub use transport_event::TransportEvent;
