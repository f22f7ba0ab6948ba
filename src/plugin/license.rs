// License key validation against the vendor endpoint.
//
// The vendor has shipped two response shapes. The current one reports
// `data.valid` with `max_sites`/`activations`; the legacy one only carries
// `data.timesActivated`/`data.timesActivatedMax` and signals validity
// through the top-level `success` flag. Both are accepted.

use serde::Deserialize;
use serde_json::json;

use crate::model::config::AppConfig;
use crate::net::Fetcher;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseStatus {
    pub valid: bool,
    /// `None` when the server reports no activation limit.
    pub remaining_activations: Option<u32>,
    pub error: Option<String>,
}

impl LicenseStatus {
    fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            remaining_activations: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<LicenseData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseData {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    max_sites: Option<u32>,
    #[serde(default)]
    activations: Option<u32>,
    #[serde(default, rename = "timesActivated")]
    times_activated: Option<u32>,
    #[serde(default, rename = "timesActivatedMax")]
    times_activated_max: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

/// Ask the license server about `key` for `product`. Never fails; transport
/// and parse problems come back as an invalid status with an error message.
pub fn validate(config: &AppConfig, fetcher: &dyn Fetcher, key: &str, product: &str) -> LicenseStatus {
    let key = key.trim();
    if key.is_empty() {
        return LicenseStatus::invalid("no license key given");
    }

    let body = json!({ "license_key": key, "product": product });
    let status = match fetcher.post_json(&config.remote.license_url, &body) {
        Ok(response) => interpret(response.status, &response.body),
        Err(err) => LicenseStatus::invalid(err.to_string()),
    };

    tracing::info!(
        "license check for {product}: valid={} remaining={:?}",
        status.valid,
        status.remaining_activations
    );
    status
}

pub fn interpret(http_status: u16, body: &[u8]) -> LicenseStatus {
    let parsed: LicenseResponse = match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(err) if (200..300).contains(&http_status) => {
            return LicenseStatus::invalid(format!("malformed license response: {err}"));
        }
        Err(_) => {
            return LicenseStatus::invalid(format!("license server returned HTTP {http_status}"));
        }
    };

    let data = parsed.data.unwrap_or_default();
    let message = parsed.message.or(data.message);

    let (valid, remaining) = if let Some(valid) = data.valid {
        let remaining = data
            .max_sites
            .map(|max| max.saturating_sub(data.activations.unwrap_or(0)));
        (valid && parsed.success.unwrap_or(true), remaining)
    } else if let Some(max) = data.times_activated_max {
        let used = data.times_activated.unwrap_or(0);
        (parsed.success.unwrap_or(false), Some(max.saturating_sub(used)))
    } else {
        return LicenseStatus::invalid(
            message.unwrap_or_else(|| "unrecognized license response".to_string()),
        );
    };

    let valid = valid && (200..300).contains(&http_status);
    LicenseStatus {
        valid,
        remaining_activations: remaining,
        error: if valid {
            None
        } else {
            Some(message.unwrap_or_else(|| "license key is not valid".to_string()))
        },
    }
}
