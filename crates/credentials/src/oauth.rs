//! Device Authorization Grant (RFC 8628) login, per component C1.1.

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::constants::{
    COPILOT_HEADERS, DEVICE_CODE_POLL_INTERVAL_SECS, DEVICE_CODE_TIMEOUT_SECS, GITHUB_ACCESS_TOKEN_URL,
    GITHUB_CLIENT_ID, GITHUB_DEVICE_CODE_URL, GITHUB_SCOPE,
};
use crate::error::Error;

/// The device code and verification details the operator must act on.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCode {
    /// Opaque code polled by this process.
    pub device_code: String,
    /// Short code the operator types at `verification_uri`.
    pub user_code: String,
    /// URL the operator should open in a browser.
    pub verification_uri: String,
    /// Minimum seconds between polls.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds until the device code itself expires.
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_interval() -> u64 {
    DEVICE_CODE_POLL_INTERVAL_SECS
}

fn default_expires_in() -> u64 {
    DEVICE_CODE_TIMEOUT_SECS
}

/// Requests a device code from GitHub. The first step of the login flow; present
/// `user_code`/`verification_uri` to the operator, then call [`poll_for_grant_token`].
pub async fn request_device_code(http: &reqwest::Client) -> Result<DeviceCode, Error> {
    let response = http
        .post(GITHUB_DEVICE_CODE_URL)
        .header("Accept", "application/json")
        .form(&[("client_id", GITHUB_CLIENT_ID), ("scope", GITHUB_SCOPE)])
        .send()
        .await
        .map_err(|err| Error::Request(GITHUB_DEVICE_CODE_URL, err))?;

    response
        .json()
        .await
        .map_err(|err| Error::Request(GITHUB_DEVICE_CODE_URL, err))
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Polls GitHub for the device code's resulting access token until a terminal outcome or
/// the device code's own deadline elapses.
pub async fn poll_for_grant_token(http: &reqwest::Client, device: &DeviceCode) -> Result<String, Error> {
    let deadline = Instant::now() + Duration::from_secs(device.expires_in);
    let mut interval = Duration::from_secs(device.interval.max(DEVICE_CODE_POLL_INTERVAL_SECS));

    loop {
        if Instant::now() >= deadline {
            return Err(Error::DeviceFlowTimeout);
        }

        tokio::time::sleep(interval).await;

        let mut request = http
            .post(GITHUB_ACCESS_TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", GITHUB_CLIENT_ID),
                ("device_code", device.device_code.as_str()),
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ]);

        for (name, value) in COPILOT_HEADERS {
            request = request.header(*name, *value);
        }

        let response: PollResponse = request
            .send()
            .await
            .map_err(|err| Error::Request(GITHUB_ACCESS_TOKEN_URL, err))?
            .json()
            .await
            .map_err(|err| Error::Request(GITHUB_ACCESS_TOKEN_URL, err))?;

        if let Some(token) = response.access_token {
            return Ok(token);
        }

        match response.error.as_deref() {
            Some("authorization_pending") => continue,
            Some("slow_down") => {
                interval += Duration::from_secs(5);
                continue;
            }
            Some(other) => return Err(Error::DeviceFlow(other.to_owned())),
            None => return Err(Error::DeviceFlow("no access_token and no error in poll response".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_code_defaults_interval_and_expiry_when_absent() {
        let device: DeviceCode = serde_json::from_str(
            r#"{"device_code":"d","user_code":"U","verification_uri":"https://github.com/login/device"}"#,
        )
        .unwrap();

        assert_eq!(device.interval, DEVICE_CODE_POLL_INTERVAL_SECS);
        assert_eq!(device.expires_in, DEVICE_CODE_TIMEOUT_SECS);
    }
}
