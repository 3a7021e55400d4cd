//! `config` subcommand — show effective configuration and file path.

use super::{Config, ConfigOutput, Output, Result, effective_config};

pub(super) fn cmd_config(output: Output, vendor_id: Option<u16>) -> Result<()> {
    let config = effective_config(vendor_id);
    if let Err(errors) = config.validate() {
        for e in &errors {
            log::warn!("config: {e}");
        }
    }

    let config_file = Config::path();
    let config_file_exists = config_file.as_ref().is_some_and(|p| p.exists());

    if output.json {
        return output.print_json(&ConfigOutput {
            config_file: config_file.map(|p| p.display().to_string()),
            config_file_exists,
            settings: config,
        });
    }

    match &config_file {
        Some(path) if config_file_exists => println!("Config file:       {}", path.display()),
        Some(path) => println!("Config file:       {} (not present, using defaults)", path.display()),
        None => println!("Config file:       (no config directory)"),
    }
    println!("Vendor id:         {:#06x}", config.vendor_id);
    println!(
        "Report lengths:    {}",
        config
            .report_lengths
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Retries:           {}", config.retries);
    println!("Command delay:     {} ms", config.command_delay_ms);
    println!("Retry backoff:     {} ms", config.retry_backoff_ms);
    println!("Settle delay:      {} ms", config.settle_delay_ms);
    println!("Read timeout:      {} ms", config.read_timeout_ms);
    println!("Battery retries:   {}", config.battery_retries);
    println!("Battery delay:     {} ms", config.battery_retry_delay_ms);
    println!("Watch interval:    {} s", config.effective_watch_interval_secs());
    Ok(())
}
