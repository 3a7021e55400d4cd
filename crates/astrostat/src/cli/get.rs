//! `get` subcommand — query one attribute.

use super::{
    A50Client, Attribute, Output, Result, SliderType, ValueOutput, effective_config,
};

pub(super) fn cmd_get(
    attribute: Attribute,
    saved: bool,
    slider: SliderType,
    output: Output,
    vendor_id: Option<u16>,
) -> Result<()> {
    let mut client = A50Client::with_config(effective_config(vendor_id))?;

    match attribute {
        Attribute::Battery => {
            warn_saved_ignored(saved, "battery");
            let battery = client.battery_status()?;
            if output.json {
                output.print_json(&battery)
            } else {
                let charging = if battery.is_charging { " (charging)" } else { "" };
                println!("{}%{charging}", battery.charge_percent);
                Ok(())
            }
        }
        Attribute::Headset => {
            warn_saved_ignored(saved, "headset");
            let headset = client.headset_status()?;
            if output.json {
                output.print_json(&headset)
            } else {
                println!("docked={} on={}", headset.is_docked, headset.is_on);
                Ok(())
            }
        }
        _ => {
            let (name, slider_name, value) = match attribute {
                Attribute::Slider => (
                    "slider",
                    Some(slider.to_string()),
                    client.slider_value(slider, saved)?,
                ),
                Attribute::Eq => {
                    warn_saved_ignored(saved, "eq");
                    ("eq", None, client.active_eq_preset()?)
                }
                Attribute::Balance => {
                    warn_saved_ignored(saved, "balance");
                    ("balance", None, client.balance()?)
                }
                Attribute::DefaultBalance => {
                    ("default-balance", None, client.default_balance(saved)?)
                }
                Attribute::AlertVolume => ("alert-volume", None, client.alert_volume(saved)?),
                Attribute::MicEq => ("mic-eq", None, client.mic_eq(saved)?),
                Attribute::NoiseGate => ("noise-gate", None, client.noise_gate_mode(saved)?),
                Attribute::Battery | Attribute::Headset => unreachable!(),
            };
            if output.json {
                output.print_json(&ValueOutput {
                    attribute: name,
                    slider: slider_name,
                    saved,
                    value,
                })
            } else {
                println!("{value}");
                Ok(())
            }
        }
    }
}

fn warn_saved_ignored(saved: bool, attribute: &str) {
    if saved {
        log::warn!("--saved has no effect for `{attribute}` (ignored)");
    }
}
