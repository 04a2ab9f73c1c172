//! Credential lifecycle management (component C1): device-code login, on-disk storage of the
//! long-lived GitHub grant token, and single-flight minting/refresh of the short-lived Copilot
//! bearer token used to call the upstream API.

mod constants;
mod error;
mod manager;
mod oauth;
mod storage;

pub use constants::{COPILOT_HEADERS, DEFAULT_UPSTREAM_BASE};
pub use error::Error;
pub use manager::{CredentialManager, Status};
pub use oauth::{poll_for_grant_token, request_device_code, DeviceCode};
pub use storage::Credentials;
