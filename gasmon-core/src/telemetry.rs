//! Telemetry message construction
//!
//! Messages are serialized as JSON into fixed-capacity buffers. Field order
//! is fixed, so identical inputs always produce identical bytes.

use core::fmt::Write;

use heapless::String;

use crate::level::GasLevel;

/// Capacity of a serialized payload
pub const MAX_PAYLOAD_LEN: usize = 512;

/// Capacity of a topic string
pub const MAX_TOPIC_LEN: usize = 64;

/// Errors building telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Output does not fit the fixed buffer
    BufferOverflow,
}

impl From<core::fmt::Error> for TelemetryError {
    fn from(_: core::fmt::Error) -> Self {
        TelemetryError::BufferOverflow
    }
}

/// Message category, selecting the topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    #[default]
    Telemetry,
    Heartbeat,
}

impl MessageKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Telemetry => "telemetry",
            MessageKind::Heartbeat => "heartbeat",
        }
    }
}

/// Device health fields appended after the level fields
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Filtered weight on the platform (kg)
    pub weight_kg: f32,
    /// Reading is a re-issued last good value
    pub stale: bool,
    pub low_battery: bool,
    /// Consecutive failed sends before this one
    pub tx_failures: u8,
    /// Most recent load cell read faulted
    pub sensor_fault: bool,
    /// Load cell faults since boot
    pub fault_count: u32,
}

/// One outbound message
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryMessage<'a> {
    pub device_id: &'a str,
    pub level: GasLevel,
    pub battery_percent: f32,
    pub firmware_version: &'a str,
    pub timestamp_ms: u64,
    pub kind: MessageKind,
    pub diagnostics: Diagnostics,
}

impl<'a> TelemetryMessage<'a> {
    /// Set the message category
    pub fn with_kind(self, kind: MessageKind) -> Self {
        Self { kind, ..self }
    }

    /// Attach device health fields
    pub fn with_diagnostics(self, diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            ..self
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String<MAX_PAYLOAD_LEN>, TelemetryError> {
        let mut out: String<MAX_PAYLOAD_LEN> = String::new();

        out.push_str("{\"device_id\":")
            .map_err(|_| TelemetryError::BufferOverflow)?;
        write_json_str(&mut out, self.device_id)?;
        write!(out, ",\"percentage\":")?;
        write_number(&mut out, self.level.percentage)?;
        write!(out, ",\"status\":\"{}\"", self.level.status.as_str())?;
        write!(out, ",\"battery_percent\":")?;
        write_number(&mut out, self.battery_percent)?;
        write!(out, ",\"firmware_version\":")?;
        write_json_str(&mut out, self.firmware_version)?;
        write!(out, ",\"timestamp_ms\":{}", self.timestamp_ms)?;

        write!(out, ",\"kind\":\"{}\"", self.kind.as_str())?;
        write!(out, ",\"weight_kg\":")?;
        write_number(&mut out, self.diagnostics.weight_kg)?;
        write!(
            out,
            ",\"stale\":{},\"low_battery\":{},\"tx_failures\":{}",
            self.diagnostics.stale, self.diagnostics.low_battery, self.diagnostics.tx_failures
        )?;
        write!(
            out,
            ",\"sensor_fault\":{},\"fault_count\":{}}}",
            self.diagnostics.sensor_fault, self.diagnostics.fault_count
        )?;

        Ok(out)
    }

    /// Topic this message is published on
    pub fn topic(&self) -> Result<String<MAX_TOPIC_LEN>, TelemetryError> {
        topic(self.device_id, self.kind)
    }
}

/// Builds telemetry messages
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryFormatter;

impl TelemetryFormatter {
    /// Build a telemetry message
    pub fn format<'a>(
        &self,
        device_id: &'a str,
        level: &GasLevel,
        battery_percent: f32,
        firmware_version: &'a str,
        clock_ms: u64,
    ) -> TelemetryMessage<'a> {
        TelemetryMessage {
            device_id,
            level: *level,
            battery_percent,
            firmware_version,
            timestamp_ms: clock_ms,
            kind: MessageKind::Telemetry,
            diagnostics: Diagnostics::default(),
        }
    }
}

/// `devices/{device_id}/{kind}`
pub fn topic(device_id: &str, kind: MessageKind) -> Result<String<MAX_TOPIC_LEN>, TelemetryError> {
    let mut out = String::new();
    write!(out, "devices/{}/{}", device_id, kind.as_str())?;
    Ok(out)
}

/// Numbers carry one decimal place; non-finite values become zero
fn write_number<const N: usize>(out: &mut String<N>, value: f32) -> Result<(), TelemetryError> {
    let value = if value.is_finite() { value } else { 0.0 };
    write!(out, "{:.1}", value)?;
    Ok(())
}

fn write_json_str<const N: usize>(out: &mut String<N>, value: &str) -> Result<(), TelemetryError> {
    out.push('"').map_err(|_| TelemetryError::BufferOverflow)?;
    for c in value.chars() {
        match c {
            '"' => write!(out, "\\\"")?,
            '\\' => write!(out, "\\\\")?,
            '\n' => write!(out, "\\n")?,
            '\r' => write!(out, "\\r")?,
            '\t' => write!(out, "\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.push(c).map_err(|_| TelemetryError::BufferOverflow)?,
        }
    }
    out.push('"').map_err(|_| TelemetryError::BufferOverflow)?;
    Ok(())
}
