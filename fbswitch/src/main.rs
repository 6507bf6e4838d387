use std::env;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use fbconfig::Config;
use fbtr064::{DeviceData, Tr064Client, Tr064ConfigExt, UreqTransport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Usage: `fbswitch [CONFIG_DIR]`
///
/// Calls the configured TR-064 action and prints the extracted values as one
/// JSON object per line. With `poll.interval_secs` > 0 the call is repeated
/// until the process is stopped.
fn main() -> Result<()> {
    let config_dir = env::args().nth(1).unwrap_or_default();
    let config = Config::load_config(&config_dir).context("Failed to load configuration")?;

    init_logging(&config.get_log_min_level()?);
    info!(config_file = %config.path(), "Configuration loaded");

    let target = config.get_connection_target()?;
    let credentials = config.get_credentials()?;
    let action = config.get_action_spec()?;
    let tags = config.get_tag_spec()?;

    if credentials.username.is_empty() {
        warn!("device.username is empty, the FritzBox will reject the digest response");
    }

    let transport = UreqTransport::new(config.get_request_timeout()?, config.get_max_body_bytes()?);
    let mut client = Tr064Client::new(target, transport);
    if let Some(cnonce) = config.get_device_cnonce()? {
        client = client.with_client_nonce(cnonce);
    }

    info!(
        host = %client.target().host,
        port = client.target().port,
        action = %action.action_name,
        "📡 Calling TR-064 action"
    );

    let interval = config.get_poll_interval_secs()?;
    if interval == 0 {
        let data = client
            .call_action(&action, &tags, &credentials)
            .with_context(|| format!("{} failed", action.action_name))?;
        return print_data(&data);
    }

    loop {
        // Failures are logged with their kind by the client.
        if let Ok(data) = client.call_action(&action, &tags, &credentials) {
            print_data(&data)?;
        }
        thread::sleep(Duration::from_secs(interval));
    }
}

fn init_logging(min_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_data(data: &DeviceData) -> Result<()> {
    println!("{}", serde_json::to_string(data)?);
    Ok(())
}
