//! Bearer token acquisition for the ARM REST API.
//!
//! A token from the configuration (or `APIMTOOL_AZURE_ACCESS_TOKEN`) is used
//! as-is. Otherwise the Azure CLI is asked for one:
//!
//! ```text
//! az account get-access-token --resource https://management.azure.com --query accessToken --output tsv
//! ```

use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::core::{ApimError, Result};

const OPERATION: &str = "acquire access token";

/// Return the configured token, or ask the Azure CLI for one.
///
/// # Errors
///
/// [`ApimError::RemoteUnavailable`] when `az` is not installed, times out or
/// exits with an error.
pub async fn resolve_access_token(config: &AppConfig) -> Result<String> {
    if let Some(token) = config.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        debug!("Using access token from configuration");
        return Ok(token.trim().to_string());
    }

    let az = which::which("az").map_err(|_| {
        ApimError::remote(
            OPERATION,
            "Azure CLI 'az' not found in PATH; run 'az login' or set APIMTOOL_AZURE_ACCESS_TOKEN",
        )
    })?;

    let resource = config.management_endpoint.clone();
    let mut cmd = Command::new(&az);
    cmd.args([
        "account",
        "get-access-token",
        "--resource",
        resource.as_str(),
        "--query",
        "accessToken",
        "--output",
        "tsv",
    ]);
    if let Some(sub) = config.subscription_id.as_deref() {
        cmd.args(["--subscription", sub]);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    debug!("Executing command: {} account get-access-token --resource {}", az.display(), resource);
    let output = match timeout(config.token_timeout(), cmd.output()).await {
        Ok(result) => result.map_err(|e| ApimError::remote(OPERATION, e))?,
        Err(_) => {
            warn!("az account get-access-token timed out after {}s", config.token_timeout_secs);
            return Err(ApimError::remote(
                OPERATION,
                format!("az timed out after {} seconds", config.token_timeout_secs),
            ));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ApimError::remote(OPERATION, stderr.trim()));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(ApimError::remote(OPERATION, "az returned an empty token"));
    }
    Ok(token)
}
