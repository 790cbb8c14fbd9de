//! Telemetry transport trait

/// Outbound message transport
///
/// The transport owns connectivity; the core only asks it to deliver one
/// message and learns whether that succeeded.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Publish `payload` on `topic`
    ///
    /// Returns `true` once the message has been accepted by the broker.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;
}
