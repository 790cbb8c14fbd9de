//! Network co-processor link
//!
//! The controller has no radio; a co-processor on UART0 owns Wi-Fi and the
//! MQTT session. Publishing sends a `Publish` frame and waits for the
//! matching `PublishResult`, which the link RX task relays through
//! `PUBLISH_RESULT`.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;

use gasmon_core::config::NetworkConfig;
use gasmon_core::traits::Transport;
use gasmon_protocol::{ControllerMessage, FrameError};

use crate::channels::{MQTT_UP, PONG_RECEIVED, PUBLISH_RESULT};

/// Round trip budget for one publish; stays under the hardware watchdog
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for a `Pong`
const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Link errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Message does not fit in a frame
    Frame(FrameError),
    /// UART write failed
    Uart,
}

impl From<FrameError> for LinkError {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

/// Controller side of the co-processor link
pub struct LinkTransport {
    tx: BufferedUartTx,
    seq: u8,
}

impl LinkTransport {
    pub fn new(tx: BufferedUartTx) -> Self {
        Self { tx, seq: 0 }
    }

    async fn send(&mut self, message: &ControllerMessage<'_>) -> Result<(), LinkError> {
        let bytes = message.to_frame()?.encode_to_vec()?;
        self.tx.write_all(&bytes).await.map_err(|_| LinkError::Uart)?;
        self.tx.flush().await.map_err(|_| LinkError::Uart)
    }

    /// Hand the network credentials to the co-processor
    pub async fn configure(
        &mut self,
        network: &NetworkConfig,
        client_id: &str,
    ) -> Result<(), LinkError> {
        info!(
            "Configuring co-processor: ssid={}, broker={}:{}",
            network.wifi_ssid.as_str(),
            network.mqtt_server.as_str(),
            network.mqtt_port
        );
        self.send(&ControllerMessage::Configure {
            wifi_ssid: &network.wifi_ssid,
            wifi_password: &network.wifi_password,
            mqtt_host: &network.mqtt_server,
            mqtt_port: network.mqtt_port,
            mqtt_user: &network.mqtt_user,
            mqtt_password: &network.mqtt_password,
            client_id,
        })
        .await
    }

    /// Check that the co-processor answers
    pub async fn ping(&mut self) -> bool {
        PONG_RECEIVED.reset();
        if let Err(e) = self.send(&ControllerMessage::Ping).await {
            warn!("PING not sent: {:?}", e);
            return false;
        }
        with_timeout(PING_TIMEOUT, PONG_RECEIVED.wait()).await.is_ok()
    }
}

/// Wait for the result carrying `seq`, skipping late answers to older publishes
async fn wait_result(seq: u8) -> bool {
    loop {
        let ack = PUBLISH_RESULT.wait().await;
        if ack.seq == seq {
            return ack.ok;
        }
        trace!("Ignoring result for publish {}", ack.seq);
    }
}

impl Transport for LinkTransport {
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !MQTT_UP.load(Ordering::Relaxed) {
            debug!("MQTT down, not publishing to {}", topic);
            return false;
        }

        self.seq = self.seq.wrapping_add(1);
        let seq = self.seq;
        PUBLISH_RESULT.reset();

        let message = ControllerMessage::Publish {
            seq,
            topic,
            payload,
        };
        if let Err(e) = self.send(&message).await {
            warn!("Publish {} not sent: {:?}", seq, e);
            return false;
        }

        match with_timeout(PUBLISH_TIMEOUT, wait_result(seq)).await {
            Ok(ok) => {
                trace!("Publish {} acknowledged: ok={}", seq, ok);
                ok
            }
            Err(_) => {
                warn!("Publish {} timed out", seq);
                false
            }
        }
    }
}
