//! Co-processor UART receive task
//!
//! Parses frames from the network co-processor and dispatches them.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use gasmon_protocol::{FrameParser, ModemMessage};

use crate::channels::{PublishAck, MQTT_UP, PONG_RECEIVED, PUBLISH_RESULT};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                // Bytes were lost, so a partial frame cannot complete
                if !parser.is_idle() {
                    parser.reset();
                }
                continue;
            }
        };
        trace!("RX: {} bytes", n);

        let mut pending = &buf[..n];
        while !pending.is_empty() {
            let (result, consumed) = parser.feed_bytes(pending);
            pending = &pending[consumed..];
            match result {
                Ok(Some(frame)) => match ModemMessage::from_frame(&frame) {
                    Ok(message) => handle_message(message),
                    Err(e) => warn!("Bad message type 0x{:02x}: {:?}", frame.msg_type, e),
                },
                Ok(None) => {}
                Err(e) => warn!("Frame parse error: {:?}", e),
            }
        }
    }
}

fn handle_message(message: ModemMessage) {
    match message {
        ModemMessage::PublishResult { seq, ok } => {
            PUBLISH_RESULT.signal(PublishAck { seq, ok });
        }
        ModemMessage::Pong => {
            trace!("PONG received");
            PONG_RECEIVED.signal(());
        }
        ModemMessage::LinkState { wifi_up, mqtt_up } => {
            info!("Link state: wifi={}, mqtt={}", wifi_up, mqtt_up);
            MQTT_UP.store(mqtt_up, Ordering::Relaxed);
        }
    }
}
