//! Build script for gasmon-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml and generates the `device_config()` constructor

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// GPIOs with a fixed board function (co-processor UART, battery sense)
const RESERVED_PINS: [u8; 3] = [0, 1, 29];

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    device: RawDevice,
    network: RawNetwork,
    calibration: RawCalibration,
    timing: RawTiming,
    thresholds: RawThresholds,
    filter: RawFilter,
    power: RawPower,
    safety: RawSafety,
    pins: RawPins,
    link: RawLink,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDevice {
    device_id: String,
    hardware_version: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNetwork {
    wifi_ssid: String,
    wifi_password: String,
    mqtt_server: String,
    mqtt_port: u16,
    mqtt_user: String,
    mqtt_password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCalibration {
    calibration_factor: f64,
    #[serde(default)]
    tare_offset: i32,
    empty_weight_kg: f64,
    full_weight_kg: f64,
    reference_weight_kg: f64,
    samples: u8,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTiming {
    sensor_read_interval_ms: u32,
    data_transmission_interval_ms: u32,
    heartbeat_interval_ms: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    low_gas_percent: f64,
    critical_gas_percent: f64,
    change_percent: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilter {
    kind: String,
    window: u8,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPower {
    enable_deep_sleep: bool,
    sleep_duration_s: u32,
    low_battery_percent: f64,
    low_battery_interval_factor: u8,
    adc_vref_mv: u16,
    adc_max: u16,
    divider_ratio: f64,
    battery_empty_mv: u16,
    battery_full_mv: u16,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSafety {
    max_transmission_failures: u8,
    watchdog_timeout_ms: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPins {
    hx711_sck: u8,
    hx711_dout: u8,
    led: u8,
    #[serde(default)]
    led_inverted: bool,
    button: u8,
    #[serde(default = "default_true")]
    button_active_low: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLink {
    baudrate: u32,
}

fn default_true() -> bool {
    true
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_linker()?;

    println!("cargo:rerun-if-changed=device.toml");
    let content = fs::read_to_string("device.toml").map_err(|e| {
        format!("device.toml not found or unreadable ({e}); the firmware requires one next to Cargo.toml")
    })?;
    let raw: RawConfig = match toml::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => report("Invalid device.toml", &[e.to_string()]),
    };

    let errors = validate(&raw);
    if !errors.is_empty() {
        report("Invalid device configuration", &errors);
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::write(out_dir.join("device_config.rs"), generate(&raw))?;
    Ok(())
}

/// Copy memory.x next to the build output and point the linker at it
fn setup_linker() -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x"))?;
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}

fn report(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn check_len(errors: &mut Vec<String>, field: &str, value: &str, max: usize) {
    if value.len() > max {
        errors.push(format!("{field} is longer than {max} bytes"));
    }
}

fn validate(raw: &RawConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let id = &raw.device.device_id;
    if id.is_empty() || id.contains(['/', '+', '#']) || id.contains(char::is_whitespace) {
        errors.push("[device] device_id must be non-empty, without / + # or spaces".into());
    }
    check_len(&mut errors, "[device] device_id", id, 32);
    check_len(&mut errors, "[device] hardware_version", &raw.device.hardware_version, 16);
    check_len(&mut errors, "CARGO_PKG_VERSION", env!("CARGO_PKG_VERSION"), 16);

    let net = &raw.network;
    check_len(&mut errors, "[network] wifi_ssid", &net.wifi_ssid, 32);
    check_len(&mut errors, "[network] wifi_password", &net.wifi_password, 64);
    check_len(&mut errors, "[network] mqtt_server", &net.mqtt_server, 64);
    check_len(&mut errors, "[network] mqtt_user", &net.mqtt_user, 64);
    check_len(&mut errors, "[network] mqtt_password", &net.mqtt_password, 64);
    if net.mqtt_port == 0 {
        errors.push("[network] mqtt_port must be non-zero".into());
    }

    let cal = &raw.calibration;
    if !(cal.empty_weight_kg > 0.0 && cal.full_weight_kg > cal.empty_weight_kg) {
        errors.push("[calibration] weights must satisfy full > empty > 0".into());
    }
    if cal.calibration_factor == 0.0 || !cal.calibration_factor.is_finite() {
        errors.push("[calibration] calibration_factor must be non-zero".into());
    }
    if !(cal.reference_weight_kg > 0.0) {
        errors.push("[calibration] reference_weight_kg must be positive".into());
    }
    if cal.samples == 0 || cal.samples > 64 {
        errors.push("[calibration] samples must be 1-64".into());
    }

    let timing = &raw.timing;
    if timing.sensor_read_interval_ms == 0
        || timing.data_transmission_interval_ms == 0
        || timing.heartbeat_interval_ms == 0
    {
        errors.push("[timing] intervals must be non-zero".into());
    }

    let th = &raw.thresholds;
    if !(th.critical_gas_percent >= 0.0
        && th.critical_gas_percent < th.low_gas_percent
        && th.low_gas_percent <= 100.0)
    {
        errors.push("[thresholds] must satisfy 0 <= critical < low <= 100".into());
    }
    if !(th.change_percent > 0.0) {
        errors.push("[thresholds] change_percent must be positive".into());
    }

    if !["median", "moving_average"].contains(&raw.filter.kind.as_str()) {
        errors.push("[filter] kind must be 'median' or 'moving_average'".into());
    }
    if raw.filter.window == 0 || raw.filter.window > 16 {
        errors.push("[filter] window must be 1-16".into());
    }

    let power = &raw.power;
    if power.battery_full_mv <= power.battery_empty_mv {
        errors.push("[power] battery_full_mv must exceed battery_empty_mv".into());
    }
    if power.adc_max == 0 || power.adc_vref_mv == 0 || !(power.divider_ratio > 0.0) {
        errors.push("[power] ADC model must be positive".into());
    }
    if power.low_battery_interval_factor == 0 {
        errors.push("[power] low_battery_interval_factor must be at least 1".into());
    }
    if !(0.0..=100.0).contains(&power.low_battery_percent) {
        errors.push("[power] low_battery_percent must be 0-100".into());
    }
    if power.enable_deep_sleep && power.sleep_duration_s == 0 {
        errors.push("[power] sleep_duration_s must be non-zero with deep sleep".into());
    }

    if raw.safety.max_transmission_failures == 0 {
        errors.push("[safety] max_transmission_failures must be at least 1".into());
    }
    if raw.safety.watchdog_timeout_ms == 0 {
        errors.push("[safety] watchdog_timeout_ms must be non-zero".into());
    }

    let pins = &raw.pins;
    let assigned = [
        ("hx711_sck", pins.hx711_sck),
        ("hx711_dout", pins.hx711_dout),
        ("led", pins.led),
        ("button", pins.button),
    ];
    for (i, (name, pin)) in assigned.iter().enumerate() {
        if *pin > 29 {
            errors.push(format!("[pins] {name} = {pin} is not a GPIO (0-29)"));
        } else if RESERVED_PINS.contains(pin) {
            errors.push(format!("[pins] {name} = {pin} is reserved by the board"));
        }
        if let Some((other, _)) = assigned[..i].iter().find(|(_, p)| p == pin) {
            errors.push(format!("[pins] {name} and {other} share GPIO{pin}"));
        }
    }

    if raw.link.baudrate == 0 {
        errors.push("[link] baudrate must be non-zero".into());
    }

    errors
}

fn generate(raw: &RawConfig) -> String {
    let filter_kind = match raw.filter.kind.as_str() {
        "moving_average" => "FilterKind::MovingAverage",
        _ => "FilterKind::Median",
    };
    let (d, n, c, t, th, p, s, pins) = (
        &raw.device,
        &raw.network,
        &raw.calibration,
        &raw.timing,
        &raw.thresholds,
        &raw.power,
        &raw.safety,
        &raw.pins,
    );

    format!(
        r#"
/// Configuration compiled from device.toml
pub fn device_config() -> Result<MonitorConfig, ConfigError> {{
    Ok(MonitorConfig {{
        device: DeviceInfo {{
            device_id: text({device_id:?})?,
            firmware_version: text(env!("CARGO_PKG_VERSION"))?,
            hardware_version: text({hardware_version:?})?,
        }},
        network: NetworkConfig {{
            wifi_ssid: text({wifi_ssid:?})?,
            wifi_password: text({wifi_password:?})?,
            mqtt_server: text({mqtt_server:?})?,
            mqtt_port: {mqtt_port},
            mqtt_user: text({mqtt_user:?})?,
            mqtt_password: text({mqtt_password:?})?,
        }},
        calibration: CalibrationConfig {{
            calibration_factor: {calibration_factor:?},
            tare_offset: {tare_offset},
            empty_weight_kg: {empty_weight_kg:?},
            full_weight_kg: {full_weight_kg:?},
            reference_weight_kg: {reference_weight_kg:?},
            samples: {samples},
        }},
        timing: TimingConfig {{
            sensor_read_interval_ms: {sensor_read_interval_ms},
            data_transmission_interval_ms: {data_transmission_interval_ms},
            heartbeat_interval_ms: {heartbeat_interval_ms},
        }},
        thresholds: ThresholdConfig {{
            low_gas_percent: {low_gas_percent:?},
            critical_gas_percent: {critical_gas_percent:?},
            change_percent: {change_percent:?},
        }},
        filter: FilterConfig {{
            kind: {filter_kind},
            window: {window},
        }},
        power: PowerConfig {{
            enable_deep_sleep: {enable_deep_sleep},
            sleep_duration_s: {sleep_duration_s},
            low_battery_percent: {low_battery_percent:?},
            low_battery_interval_factor: {low_battery_interval_factor},
            adc_vref_mv: {adc_vref_mv},
            adc_max: {adc_max},
            divider_ratio: {divider_ratio:?},
            battery_empty_mv: {battery_empty_mv},
            battery_full_mv: {battery_full_mv},
        }},
        safety: SafetyConfig {{
            max_transmission_failures: {max_transmission_failures},
            watchdog_timeout_ms: {watchdog_timeout_ms},
        }},
    }})
}}

/// GPIO wiring from device.toml
pub const PINS: PinAssignment = PinAssignment {{
    hx711_sck: {hx711_sck},
    hx711_dout: {hx711_dout},
    led: {led},
    led_inverted: {led_inverted},
    button: {button},
    button_active_low: {button_active_low},
}};

/// Co-processor UART baud rate
pub const LINK_BAUDRATE: u32 = {baudrate};
"#,
        device_id = d.device_id,
        hardware_version = d.hardware_version,
        wifi_ssid = n.wifi_ssid,
        wifi_password = n.wifi_password,
        mqtt_server = n.mqtt_server,
        mqtt_port = n.mqtt_port,
        mqtt_user = n.mqtt_user,
        mqtt_password = n.mqtt_password,
        calibration_factor = c.calibration_factor as f32,
        tare_offset = c.tare_offset,
        empty_weight_kg = c.empty_weight_kg as f32,
        full_weight_kg = c.full_weight_kg as f32,
        reference_weight_kg = c.reference_weight_kg as f32,
        samples = c.samples,
        sensor_read_interval_ms = t.sensor_read_interval_ms,
        data_transmission_interval_ms = t.data_transmission_interval_ms,
        heartbeat_interval_ms = t.heartbeat_interval_ms,
        low_gas_percent = th.low_gas_percent as f32,
        critical_gas_percent = th.critical_gas_percent as f32,
        change_percent = th.change_percent as f32,
        filter_kind = filter_kind,
        window = raw.filter.window,
        enable_deep_sleep = p.enable_deep_sleep,
        sleep_duration_s = p.sleep_duration_s,
        low_battery_percent = p.low_battery_percent as f32,
        low_battery_interval_factor = p.low_battery_interval_factor,
        adc_vref_mv = p.adc_vref_mv,
        adc_max = p.adc_max,
        divider_ratio = p.divider_ratio as f32,
        battery_empty_mv = p.battery_empty_mv,
        battery_full_mv = p.battery_full_mv,
        max_transmission_failures = s.max_transmission_failures,
        watchdog_timeout_ms = s.watchdog_timeout_ms,
        hx711_sck = pins.hx711_sck,
        hx711_dout = pins.hx711_dout,
        led = pins.led,
        led_inverted = pins.led_inverted,
        button = pins.button,
        button_active_low = pins.button_active_low,
        baudrate = raw.link.baudrate,
    )
}
