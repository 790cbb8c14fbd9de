//! Weight sampling
//!
//! Turns raw load cell conversions into calibrated, noise-filtered weight
//! readings.

pub mod filter;
pub mod weight;

pub use filter::SmoothingFilter;
pub use weight::{SensorReading, WeightSampler};
