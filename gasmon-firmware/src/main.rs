//! Gas cylinder level monitor firmware
//!
//! Weighs an LPG cylinder on a load cell, converts the weight to a fill
//! level and publishes it over MQTT through a network co-processor.
//! Runs on RP2040 boards under Embassy.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use gasmon_core::config::{CalibrationProfile, MonitorConfig};
use gasmon_core::controller::DeviceIo;

use crate::board::Board;
use crate::config::calibration::load_calibration;
use crate::config::{load_config, LINK_BAUDRATE, PINS};
use crate::io::{FlashCalibrationStore, SignalIndicator};
use crate::link::LinkTransport;

mod board;
mod channels;
mod config;
mod io;
mod link;
mod tasks;

static CONFIG: StaticCell<MonitorConfig> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gas monitor firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config: &'static MonitorConfig = CONFIG.init(load_config());

    let board = match Board::init(p, &PINS, config, LINK_BAUDRATE) {
        Ok(board) => board,
        Err(e) => defmt::panic!("Pin assignment failed: {:?}", e),
    };
    let Board {
        load_cell,
        battery,
        led,
        button,
        link_tx,
        link_rx,
        mut flash,
        watchdog,
    } = board;
    info!("Peripherals initialized");

    let profile = load_calibration(
        &mut flash,
        CalibrationProfile::from_config(&config.calibration),
    )
    .await;

    spawner.spawn(unwrap!(tasks::link_rx_task(link_rx)));

    let mut link = LinkTransport::new(link_tx);
    if let Err(e) = link
        .configure(&config.network, &config.device.device_id)
        .await
    {
        warn!("Co-processor configuration not sent: {:?}", e);
    }
    if link.ping().await {
        info!("Co-processor responding");
    } else {
        warn!("Co-processor did not answer PING");
    }

    spawner.spawn(unwrap!(tasks::calibration_task(flash)));
    spawner.spawn(unwrap!(tasks::button_task(button)));
    spawner.spawn(unwrap!(tasks::led_task(led)));

    let io = DeviceIo {
        load_cell,
        battery,
        transport: link,
        store: FlashCalibrationStore,
        indicator: SignalIndicator,
        watchdog,
    };
    spawner.spawn(unwrap!(tasks::controller_task(config, io, profile)));

    info!("All tasks spawned, firmware running");
}
