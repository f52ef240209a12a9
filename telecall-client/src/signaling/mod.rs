mod signaling_relay;
mod ws_relay;

pub use signaling_relay::SignalingRelay;
pub use ws_relay::WsRelay;
