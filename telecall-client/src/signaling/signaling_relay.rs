use crate::error::RelayError;
use async_trait::async_trait;

/// Out-of-band text channel carrying negotiation messages between the two
/// parties. The relay itself is external; implementations only move frames.
#[async_trait]
pub trait SignalingRelay: Send + 'static {
    /// Send one text frame to the relay.
    async fn send(&mut self, text: String) -> Result<(), RelayError>;

    /// Next inbound text frame, or `None` once the relay has gone away.
    /// Must be cancel safe: it is polled inside `tokio::select!`.
    async fn recv(&mut self) -> Option<String>;

    /// Close the channel. Further sends fail with [`RelayError::Closed`].
    async fn close(&mut self);
}
