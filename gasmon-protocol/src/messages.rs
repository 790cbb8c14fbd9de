//! Message types for the co-processor link
//!
//! Message types are divided into two categories:
//! - Controller → Modem: network configuration, publish requests, heartbeat
//! - Modem → Controller: publish results, heartbeat responses, link status
//!
//! Strings are encoded as `[len u8][bytes]`; publish payloads as
//! `[len u16 LE][bytes]`.

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use heapless::Vec;

// Message type IDs: Controller → Modem
pub const MSG_CONFIGURE: u8 = 0x10;
pub const MSG_PUBLISH: u8 = 0x11;
pub const MSG_PING: u8 = 0x12;

// Message type IDs: Modem → Controller
pub const MSG_PUBLISH_RESULT: u8 = 0x30;
pub const MSG_PONG: u8 = 0x31;
pub const MSG_LINK_STATE: u8 = 0x32;

/// Messages from the controller to the modem
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerMessage<'a> {
    /// Network credentials, sent once after boot and after a modem reset
    Configure {
        wifi_ssid: &'a str,
        wifi_password: &'a str,
        mqtt_host: &'a str,
        mqtt_port: u16,
        mqtt_user: &'a str,
        mqtt_password: &'a str,
        client_id: &'a str,
    },
    /// Publish one message; answered by `PublishResult` with the same `seq`
    Publish {
        seq: u8,
        topic: &'a str,
        payload: &'a [u8],
    },
    /// Heartbeat request
    Ping,
}

impl<'a> ControllerMessage<'a> {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ControllerMessage::Configure {
                wifi_ssid,
                wifi_password,
                mqtt_host,
                mqtt_port,
                mqtt_user,
                mqtt_password,
                client_id,
            } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                put_str(&mut payload, wifi_ssid)?;
                put_str(&mut payload, wifi_password)?;
                put_str(&mut payload, mqtt_host)?;
                put_bytes(&mut payload, &mqtt_port.to_le_bytes())?;
                put_str(&mut payload, mqtt_user)?;
                put_str(&mut payload, mqtt_password)?;
                put_str(&mut payload, client_id)?;
                Frame::new(MSG_CONFIGURE, &payload)
            }
            ControllerMessage::Publish {
                seq,
                topic,
                payload: body,
            } => {
                let len = u16::try_from(body.len()).map_err(|_| FrameError::PayloadTooLarge)?;
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                put_bytes(&mut payload, &[*seq])?;
                put_str(&mut payload, topic)?;
                put_bytes(&mut payload, &len.to_le_bytes())?;
                put_bytes(&mut payload, body)?;
                Frame::new(MSG_PUBLISH, &payload)
            }
            ControllerMessage::Ping => Ok(Frame::empty(MSG_PING)),
        }
    }

    /// Parse a message from a frame (used by the modem side and tests)
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let mut r = Reader::new(&frame.payload);
        let msg = match frame.msg_type {
            MSG_CONFIGURE => ControllerMessage::Configure {
                wifi_ssid: r.str()?,
                wifi_password: r.str()?,
                mqtt_host: r.str()?,
                mqtt_port: r.u16()?,
                mqtt_user: r.str()?,
                mqtt_password: r.str()?,
                client_id: r.str()?,
            },
            MSG_PUBLISH => {
                let seq = r.u8()?;
                let topic = r.str()?;
                let len = r.u16()? as usize;
                ControllerMessage::Publish {
                    seq,
                    topic,
                    payload: r.take(len)?,
                }
            }
            MSG_PING => ControllerMessage::Ping,
            _ => return Err(FrameError::InvalidFrame),
        };
        r.finish()?;
        Ok(msg)
    }
}

/// Messages from the modem to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemMessage {
    /// Outcome of the publish with the same sequence number
    PublishResult { seq: u8, ok: bool },
    /// Heartbeat response
    Pong,
    /// Connectivity changed
    LinkState { wifi_up: bool, mqtt_up: bool },
}

impl ModemMessage {
    /// Parse a message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let mut r = Reader::new(&frame.payload);
        let msg = match frame.msg_type {
            MSG_PUBLISH_RESULT => ModemMessage::PublishResult {
                seq: r.u8()?,
                ok: r.bool()?,
            },
            MSG_PONG => ModemMessage::Pong,
            MSG_LINK_STATE => ModemMessage::LinkState {
                wifi_up: r.bool()?,
                mqtt_up: r.bool()?,
            },
            _ => return Err(FrameError::InvalidFrame),
        };
        r.finish()?;
        Ok(msg)
    }

    /// Encode this message into a frame (for testing or simulation)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ModemMessage::PublishResult { seq, ok } => {
                Frame::new(MSG_PUBLISH_RESULT, &[*seq, *ok as u8])
            }
            ModemMessage::Pong => Ok(Frame::empty(MSG_PONG)),
            ModemMessage::LinkState { wifi_up, mqtt_up } => {
                Frame::new(MSG_LINK_STATE, &[*wifi_up as u8, *mqtt_up as u8])
            }
        }
    }
}

fn put_bytes(buf: &mut Vec<u8, MAX_PAYLOAD_SIZE>, bytes: &[u8]) -> Result<(), FrameError> {
    buf.extend_from_slice(bytes)
        .map_err(|_| FrameError::PayloadTooLarge)
}

fn put_str(buf: &mut Vec<u8, MAX_PAYLOAD_SIZE>, s: &str) -> Result<(), FrameError> {
    let len = u8::try_from(s.len()).map_err(|_| FrameError::PayloadTooLarge)?;
    put_bytes(buf, &[len])?;
    put_bytes(buf, s.as_bytes())
}

/// Cursor over a frame payload
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.data.len() < n {
            return Err(FrameError::Incomplete);
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn bool(&mut self) -> Result<bool, FrameError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    fn str(&mut self) -> Result<&'a str, FrameError> {
        let len = self.u8()? as usize;
        core::str::from_utf8(self.take(len)?).map_err(|_| FrameError::InvalidFrame)
    }

    /// Trailing bytes mean the frame does not match its type
    fn finish(&self) -> Result<(), FrameError> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(FrameError::InvalidFrame)
        }
    }
}
