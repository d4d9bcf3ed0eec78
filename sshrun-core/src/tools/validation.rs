use anyhow::{anyhow, Result};

use crate::tools::types::DEFAULT_PORT;

pub fn validate_host(host: &str) -> Result<()> {
    if host.trim().is_empty() {
        return Err(anyhow!("Host cannot be empty"));
    }
    Ok(())
}

pub fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(anyhow!("Port cannot be 0"));
    }
    Ok(())
}

/// Parse a port typed as text. Blank input means the default SSH port.
pub fn parse_port(input: &str) -> Result<u16> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    let port: u16 = input
        .parse()
        .map_err(|_| anyhow!("Invalid port: {}", input))?;
    validate_port(port)?;
    Ok(port)
}
