use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{Read, Write};
use tracing::info;

use crate::core::SettingsClient;
use crate::locator::Locator;
use crate::session::SessionFactory;

/// Print the settings stored at `locator`
pub async fn cmd_get<F, W>(client: &SettingsClient<F>, locator: &str, pretty: bool, out: &mut W) -> Result<()>
where
    F: SessionFactory,
    W: Write,
{
    let loaded = client
        .load_from_locator(locator)
        .await
        .with_context(|| format!("Failed to load settings from {}", locator))?;

    info!(endpoint = %loaded.endpoint, "Loaded settings");

    let text = if pretty {
        serde_json::to_string_pretty(&loaded.settings)?
    } else {
        serde_json::to_string(&loaded.settings)?
    };
    writeln!(out, "{}", text)?;
    Ok(())
}

/// Read a JSON payload from a file, or from stdin when `source` is `-`
pub fn read_payload(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read settings from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).context(format!("Failed to read settings file: {}", source))?
    };

    serde_json::from_str(&text).context(format!("{} does not contain valid JSON", source))
}

/// Store `payload` at `locator`
pub async fn cmd_put<F, W>(client: &SettingsClient<F>, locator: &str, payload: &Value, out: &mut W) -> Result<()>
where
    F: SessionFactory,
    W: Write,
{
    let stored = client
        .store_to_locator(locator, payload)
        .await
        .with_context(|| format!("Failed to store settings to {}", locator))?;

    writeln!(
        out,
        "Stored {} bytes at {} via {}",
        stored.bytes, stored.path, stored.endpoint
    )?;
    Ok(())
}

/// Print the endpoints and path of a locator
pub fn cmd_parse<W: Write>(locator: &str, out: &mut W) -> Result<()> {
    let locator = Locator::parse(locator)?;

    writeln!(out, "scheme: {}", locator.scheme())?;
    writeln!(out, "path: {}", locator.path())?;
    for (idx, endpoint) in locator.endpoints().iter().enumerate() {
        writeln!(out, "endpoint[{}]: {}", idx, endpoint)?;
    }
    Ok(())
}
