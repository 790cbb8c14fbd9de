//! Board-agnostic core logic for the gas level monitor firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (load cell, battery ADC, transport, storage, LED, watchdog)
//! - Weight sampling and noise filtering
//! - Weight to fill-level conversion and threshold classification
//! - Telemetry message construction
//! - Transmission scheduling and failure accounting
//! - Battery supervision and sleep gating
//! - Device state machine and the cooperative controller
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod level;
pub mod power;
pub mod sampler;
pub mod state;
pub mod telemetry;
pub mod traits;
pub mod transmission;
