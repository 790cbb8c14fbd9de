//! Board wiring
//!
//! Builds the drivers from the pin bank, the fixed-function peripherals
//! and the compiled configuration. UART0 on GPIO0/1 talks to the network
//! co-processor; GPIO29 senses VSYS through the Pico's divider.

use embassy_rp::adc::{Adc, Channel as AdcPin, Config as AdcConfig};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx, Config as UartConfig, Uart};
use embassy_rp::{bind_interrupts, peripherals::UART0, Peripherals};
use embassy_time::Delay;
use static_cell::StaticCell;

use gasmon_core::config::MonitorConfig;
use gasmon_core::controller::DeviceController;
use gasmon_drivers::button::CalibrationButton;
use gasmon_drivers::led::BlinkingLed;
use gasmon_drivers::sensor::{DividerAdc, Gain, Hx711};
use gasmon_hal_rp2040::adc::AdcChannel;
use gasmon_hal_rp2040::flash::FlashStorage;
use gasmon_hal_rp2040::pins::{PinBank, PinError};

use crate::config::PinAssignment;
use crate::io::{FlashCalibrationStore, HardwareWatchdog, SignalIndicator};
use crate::link::LinkTransport;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::BufferedInterruptHandler<UART0>;
});

/// HX711 data-ready wait; one conversion takes 100 ms at 10 SPS
const HX711_READY_TIMEOUT_US: u32 = 200_000;

/// ADC reads averaged per battery sample
const BATTERY_OVERSAMPLE: u8 = 8;

static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

pub type LoadCellDriver = Hx711<Output<'static>, Input<'static>, Delay>;
pub type BatteryDriver = DividerAdc<AdcChannel>;
pub type Controller = DeviceController<
    'static,
    LoadCellDriver,
    BatteryDriver,
    LinkTransport,
    FlashCalibrationStore,
    SignalIndicator,
    HardwareWatchdog,
>;

/// Everything the tasks need, built from the peripherals
pub struct Board {
    pub load_cell: LoadCellDriver,
    pub battery: BatteryDriver,
    pub led: BlinkingLed<Output<'static>>,
    pub button: CalibrationButton<Input<'static>>,
    pub link_tx: BufferedUartTx,
    pub link_rx: BufferedUartRx,
    pub flash: FlashStorage<'static>,
    pub watchdog: HardwareWatchdog,
}

impl Board {
    pub fn init(
        p: Peripherals,
        pins: &PinAssignment,
        config: &MonitorConfig,
        link_baudrate: u32,
    ) -> Result<Self, PinError> {
        let (mut bank, board) = PinBank::split(p);

        let sck = Output::new(bank.take(pins.hx711_sck)?, Level::Low);
        let dout = Input::new(bank.take(pins.hx711_dout)?, Pull::None);
        let load_cell = Hx711::new(sck, dout, Delay, Gain::A128, HX711_READY_TIMEOUT_US);

        let led = BlinkingLed::new(
            Output::new(bank.take(pins.led)?, Level::Low),
            pins.led_inverted,
        );

        let pull = if pins.button_active_low {
            Pull::Up
        } else {
            Pull::Down
        };
        let button = CalibrationButton::with_defaults(
            Input::new(bank.take(pins.button)?, pull),
            pins.button_active_low,
        );

        let adc = Adc::new_blocking(board.adc, AdcConfig::default());
        let battery_pin = AdcPin::new_pin(board.battery_sense, Pull::None);
        let battery = DividerAdc::new(
            AdcChannel::new(adc, battery_pin),
            BATTERY_OVERSAMPLE,
            config.power.adc_max,
        );

        let mut uart_config = UartConfig::default();
        uart_config.baudrate = link_baudrate;
        let uart = Uart::new_blocking(board.uart0, board.link_tx, board.link_rx, uart_config)
            .into_buffered(Irqs, TX_BUF.init([0u8; 256]), RX_BUF.init([0u8; 256]));
        let (link_tx, link_rx) = uart.split();

        Ok(Self {
            load_cell,
            battery,
            led,
            button,
            link_tx,
            link_rx,
            flash: FlashStorage::new(board.flash, board.dma_ch0),
            watchdog: HardwareWatchdog::new(board.watchdog),
        })
    }
}
