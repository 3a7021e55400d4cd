//! `devices` subcommand — list HID interfaces matching the vendor id.

use super::{A50Client, DevicesOutput, Output, Result, effective_config};

pub(super) fn cmd_devices(output: Output, vendor_id: Option<u16>) -> Result<()> {
    let mut client = A50Client::with_config(effective_config(vendor_id))?;
    let devices = client.discover()?;

    if output.json {
        return output.print_json(&DevicesOutput {
            count: devices.len(),
            devices,
        });
    }

    if devices.is_empty() {
        println!(
            "No HID interfaces found for vendor id {:#06x}.",
            client.config().vendor_id
        );
        return Ok(());
    }

    for (index, device) in devices.iter().enumerate() {
        println!(
            "Device {index}: {:04x}:{:04x}",
            device.vendor_id, device.product_id
        );
        if let Some(manufacturer) = &device.manufacturer {
            println!("  Manufacturer:  {manufacturer}");
        }
        if let Some(product) = &device.product {
            println!("  Product:       {product}");
        }
        println!("  Path:          {}", device.path);
    }
    Ok(())
}
