use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::StartupError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the access code from stdin, once, before anything else runs.
pub fn prompt_code() -> Result<String, StartupError> {
    print!("Enter your 4-digit code: ");
    io::stdout().flush().map_err(StartupError::Stdin)?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(StartupError::Stdin)?;
    Ok(line.trim().to_string())
}

pub fn code_is_well_formed(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Checks the entered code against the remotely hosted code→bool map.
/// Malformed codes are rejected before any request is made. The map is
/// fetched fresh every time (cache-busting query parameter plus no-cache
/// header) so a key disabled upstream takes effect immediately.
pub async fn verify(
    client: &reqwest::Client,
    url: &str,
    code: &str,
) -> Result<(), StartupError> {
    if !code_is_well_formed(code) {
        return Err(StartupError::CodeFormat);
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let resp = client
        .get(url)
        .query(&[("t", now_ms.to_string())])
        .header("Cache-Control", "no-cache")
        .header("Accept", "application/json")
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;

    let keys: serde_json::Value = resp.json().await?;
    // Some hosts serve the map as a JSON-encoded string body.
    let keys = match keys {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null)
        }
        other => other,
    };

    if keys.get(code).and_then(|v| v.as_bool()) == Some(true) {
        Ok(())
    } else {
        Err(StartupError::GateDenied)
    }
}
