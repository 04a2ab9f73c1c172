//! Constants shared by the device-code login flow and the bearer-minting exchange.
//!
//! Grouped in one place, per the design note that impersonation headers are a
//! contract with an external vendor and may drift.

/// GitHub OAuth app client id used for the device authorization grant.
pub const GITHUB_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";

/// OAuth scope requested during device-code login.
pub const GITHUB_SCOPE: &str = "read:user";

/// Device-code initiation endpoint.
pub const GITHUB_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";

/// Device-code poll (access token exchange) endpoint.
pub const GITHUB_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Bearer-minting endpoint: exchanges the long-lived grant token for a short-lived Copilot JWT.
pub const GITHUB_COPILOT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";

/// Compiled-in fallback upstream base URL, used until `endpoints.api` is learned.
pub const DEFAULT_UPSTREAM_BASE: &str = "https://api.githubcopilot.com";

/// Slack subtracted from the bearer's expiry to force proactive refresh.
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

/// Poll interval floor for the device-code flow, widened by `slow_down` responses.
pub const DEVICE_CODE_POLL_INTERVAL_SECS: u64 = 5;

/// Device-code flow deadline.
pub const DEVICE_CODE_TIMEOUT_SECS: u64 = 900;

/// Impersonation headers presented on every request to GitHub/Copilot endpoints.
/// This table is the only place to update should the upstream vendor's contract drift.
pub const COPILOT_HEADERS: &[(&str, &str)] = &[
    ("Editor-Version", "vscode/1.104.3"),
    ("Editor-Plugin-Version", "copilot-chat/0.26.7"),
    ("User-Agent", "GitHubCopilotChat/0.26.7"),
    ("Copilot-Integration-Id", "vscode-chat"),
    ("X-GitHub-Api-Version", "2025-04-01"),
];
