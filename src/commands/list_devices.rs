//! List audio devices usable as capture sources.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use crate::capture::device::suppress_alsa_warnings;

/// One row of the device listing.
struct DeviceRow {
    name: String,
    config: String,
    is_default: bool,
}

/// Lists input devices, and output devices for `source = "loopback"`.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let (inputs, outputs) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();

        let default_input = host.default_input_device().and_then(|d| d.name().ok());
        let inputs = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate input devices: {e}"))?
            .filter_map(|device| {
                let name = device.name().ok()?;
                let config = describe_config(device.default_input_config());
                let is_default = default_input.as_deref() == Some(name.as_str());
                Some(DeviceRow { name, config, is_default })
            })
            .collect::<Vec<_>>();

        let default_output = host.default_output_device().and_then(|d| d.name().ok());
        let outputs = host
            .output_devices()
            .map_err(|e| anyhow!("Failed to enumerate output devices: {e}"))?
            .filter_map(|device| {
                let name = device.name().ok()?;
                let config = describe_config(device.default_output_config());
                let is_default = default_output.as_deref() == Some(name.as_str());
                Some(DeviceRow { name, config, is_default })
            })
            .collect::<Vec<_>>();

        Ok((inputs, outputs))
    })?;

    print_section("Input devices (source = \"input\")", &inputs);
    print_section("Output devices (source = \"loopback\")", &outputs);

    Ok(())
}

fn describe_config(
    config: Result<cpal::SupportedStreamConfig, cpal::DefaultStreamConfigError>,
) -> String {
    match config {
        Ok(config) => format!(
            " ({}Hz, {} channels, {:?})",
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        ),
        Err(_) => " (configuration unavailable)".to_string(),
    }
}

fn print_section(title: &str, rows: &[DeviceRow]) {
    println!();
    println!("{title}:");
    println!();

    if rows.is_empty() {
        println!("  none found");
        return;
    }

    for (index, row) in rows.iter().enumerate() {
        let default_indicator = if row.is_default { " [DEFAULT]" } else { "" };
        println!("  ID: {}", index);
        println!("    Name: {}{}", row.name, default_indicator);
        println!("    Config:{}", row.config);
        println!();
    }
}
