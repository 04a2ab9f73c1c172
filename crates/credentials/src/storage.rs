//! On-disk credential persistence: `~/.copilotx/auth.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The stored credential pair. `github_token` is the long-lived grant token; `copilot_token`
/// is the short-lived upstream bearer, empty until the first mint.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Credentials {
    /// Long-lived GitHub OAuth token.
    pub github_token: String,
    /// Short-lived Copilot JWT, minted from `github_token`.
    #[serde(default)]
    pub copilot_token: String,
    /// Unix timestamp (seconds) of the Copilot JWT's expiry. 0 means unknown/expired.
    #[serde(default)]
    pub expires_at: i64,
    /// Dynamic API base URL learned from the mint response's `endpoints.api`, if any.
    #[serde(default)]
    pub api_base_url: String,
}

impl Credentials {
    pub(crate) fn with_grant(github_token: String) -> Self {
        Self {
            github_token,
            ..Default::default()
        }
    }
}

/// Reads and writes [`Credentials`] to a JSON file with owner-only permissions.
pub struct AuthStorage {
    path: PathBuf,
}

impl AuthStorage {
    /// Creates a storage handle rooted at `path` (typically `<dir>/auth.json`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads credentials from disk. Returns `None` if the file is absent or malformed.
    pub async fn load(&self) -> Option<Credentials> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Writes credentials atomically (temp file + rename) with mode 0600 on POSIX.
    pub async fn save(&self, creds: &Credentials) -> Result<(), Error> {
        ensure_parent_dir(&self.path).await.map_err(Error::Persistence)?;

        let payload = serde_json::to_string_pretty(creds).expect("Credentials always serializes") + "\n";
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_file_secure(&path, payload.as_bytes()))
            .await
            .expect("blocking credential write task panicked")
            .map_err(Error::Persistence)
    }

    /// Removes the credentials file. Returns `true` if it existed.
    pub async fn delete(&self) -> Result<bool, Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Error::Persistence(err)),
        }
    }
}

async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    let Some(dir) = path.parent() else { return Ok(()) };
    tokio::fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).await?;
    }

    Ok(())
}

/// Writes `contents` to `path` via a same-directory temp file plus rename, so readers never
/// observe a partially-written file. Sets mode 0600 on POSIX before the rename.
fn write_file_secure(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AuthStorage::new(dir.path().join("auth.json"));

        assert!(storage.load().await.is_none());

        let creds = Credentials {
            github_token: "gho_example".into(),
            copilot_token: "jwt_example".into(),
            expires_at: 1_000,
            api_base_url: String::new(),
        };
        storage.save(&creds).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, creds);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        let storage = AuthStorage::new(&path);

        storage.save(&Credentials::with_grant("gho_x".into())).await.unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[tokio::test]
    async fn delete_reports_whether_file_existed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AuthStorage::new(dir.path().join("auth.json"));

        assert!(!storage.delete().await.unwrap());

        storage.save(&Credentials::with_grant("gho_x".into())).await.unwrap();
        assert!(storage.delete().await.unwrap());
        assert!(storage.load().await.is_none());
    }
}
