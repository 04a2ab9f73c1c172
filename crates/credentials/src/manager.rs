//! The credential manager (C1): owns the grant/bearer pair and serializes refreshes.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::constants::{
    COPILOT_HEADERS, DEFAULT_UPSTREAM_BASE, GITHUB_COPILOT_TOKEN_URL, TOKEN_REFRESH_BUFFER_SECS,
};
use crate::error::Error;
use crate::storage::{AuthStorage, Credentials};

/// Authentication status, as returned by [`CredentialManager::status`].
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    /// Whether a grant token is stored.
    pub authenticated: bool,
    /// Whether the cached bearer is still within its refresh buffer. Absent when unauthenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copilot_token_valid: Option<bool>,
    /// Seconds remaining until the bearer expires. Absent when unauthenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl Status {
    fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            copilot_token_valid: None,
            expires_in: None,
        }
    }
}

/// Owns the two-layer token lifecycle described in component C1. Cheap to clone (internally
/// `Arc`-free; wrap in `Arc` at the call site) and safe to share across request handlers.
pub struct CredentialManager {
    storage: AuthStorage,
    state: Mutex<Option<Credentials>>,
    http: reqwest::Client,
}

impl CredentialManager {
    /// Creates a manager rooted at `<dir>/auth.json`. Does not touch disk until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: AuthStorage::new(dir.into().join("auth.json")),
            state: Mutex::new(None),
            http: reqwest::Client::new(),
        }
    }

    /// Loads credentials from disk into memory. Returns `true` if valid credentials exist.
    pub async fn load(&self) -> bool {
        let mut guard = self.state.lock().await;
        *guard = self.storage.load().await;
        guard.is_some()
    }

    /// Stores a freshly obtained grant token (from device-flow login or a `--token` flag),
    /// replacing any prior credential record.
    pub async fn save_grant(&self, github_token: String) -> Result<(), Error> {
        let creds = Credentials::with_grant(github_token);
        self.storage.save(&creds).await?;
        *self.state.lock().await = Some(creds);
        Ok(())
    }

    /// Returns a valid upstream bearer and base URL, refreshing if necessary.
    ///
    /// Concurrency: the guard is held across the (awaited) refresh call, so concurrent callers
    /// serialize behind the same in-flight exchange and observe its single outcome — this is
    /// the single-flight guarantee required by the design.
    pub async fn ensure_bearer(&self) -> Result<(String, String), Error> {
        let mut guard = self.state.lock().await;

        if guard.is_none() {
            *guard = self.storage.load().await;
        }

        let Some(creds) = guard.as_mut() else {
            return Err(Error::NotAuthenticated);
        };

        if bearer_is_fresh(creds) {
            return Ok((creds.copilot_token.clone(), base_url(creds)));
        }

        let minted = fetch_copilot_token(&self.http, &creds.github_token).await?;
        creds.copilot_token = minted.token;
        creds.expires_at = minted.expires_at;
        if let Some(api_base) = minted.api_base {
            creds.api_base_url = api_base;
        }

        if let Err(err) = self.storage.save(creds).await {
            log::warn!("failed to persist refreshed credentials: {err}");
        }

        Ok((creds.copilot_token.clone(), base_url(creds)))
    }

    /// Clears in-memory and on-disk credentials. Returns `true` if a credential file existed.
    pub async fn logout(&self) -> Result<bool, Error> {
        *self.state.lock().await = None;
        self.storage.delete().await
    }

    /// Returns a point-in-time authentication status for display (e.g. `GET /health`, CLI `status`).
    pub async fn status(&self) -> Status {
        let guard = self.state.lock().await;
        let Some(creds) = guard.as_ref().filter(|c| !c.github_token.is_empty()) else {
            return Status::unauthenticated();
        };

        Status {
            authenticated: true,
            copilot_token_valid: Some(bearer_is_fresh(creds)),
            expires_in: Some(expires_in_seconds(creds)),
        }
    }
}

fn bearer_is_fresh(creds: &Credentials) -> bool {
    !creds.copilot_token.is_empty() && creds.expires_at > now_secs() + TOKEN_REFRESH_BUFFER_SECS
}

fn expires_in_seconds(creds: &Credentials) -> i64 {
    if creds.expires_at == 0 {
        return 0;
    }
    (creds.expires_at - now_secs()).max(0)
}

fn base_url(creds: &Credentials) -> String {
    if creds.api_base_url.is_empty() {
        DEFAULT_UPSTREAM_BASE.to_owned()
    } else {
        creds.api_base_url.clone()
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs() as i64
}

struct MintedToken {
    token: String,
    expires_at: i64,
    api_base: Option<String>,
}

#[derive(serde::Deserialize)]
struct MintResponse {
    token: String,
    expires_at: i64,
    endpoints: Option<MintEndpoints>,
}

#[derive(serde::Deserialize)]
struct MintEndpoints {
    api: Option<String>,
}

async fn fetch_copilot_token(http: &reqwest::Client, github_token: &str) -> Result<MintedToken, Error> {
    let mut request = http
        .get(GITHUB_COPILOT_TOKEN_URL)
        .header("Authorization", format!("token {github_token}"))
        .header("Accept", "application/json")
        .header("Content-Type", "application/json");

    for (name, value) in COPILOT_HEADERS {
        request = request.header(*name, *value);
    }

    let response = request
        .send()
        .await
        .map_err(|err| Error::Request(GITHUB_COPILOT_TOKEN_URL, err))?;

    match response.status().as_u16() {
        401 => return Err(Error::GrantRevoked),
        403 => return Err(Error::SubscriptionMissing),
        status if !(200..300).contains(&status) => {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream { status, message });
        }
        _ => {}
    }

    let body: MintResponse = response
        .json()
        .await
        .map_err(|err| Error::Request(GITHUB_COPILOT_TOKEN_URL, err))?;

    Ok(MintedToken {
        token: body.token,
        expires_at: body.expires_at,
        api_base: body.endpoints.and_then(|e| e.api),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_bearer_fails_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialManager::new(dir.path());

        let err = manager.ensure_bearer().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }

    #[tokio::test]
    async fn status_reports_unauthenticated_before_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialManager::new(dir.path());

        assert!(!manager.status().await.authenticated);
    }

    #[tokio::test]
    async fn save_grant_is_immediately_visible_in_status() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialManager::new(dir.path());

        manager.save_grant("gho_example".into()).await.unwrap();

        let status = manager.status().await;
        assert!(status.authenticated);
        assert_eq!(status.copilot_token_valid, Some(false));
    }

    #[tokio::test]
    async fn logout_clears_state_and_reports_prior_existence() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CredentialManager::new(dir.path());

        manager.save_grant("gho_example".into()).await.unwrap();
        assert!(manager.logout().await.unwrap());
        assert!(!manager.status().await.authenticated);
    }
}
