//! Service endpoints and local token storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Host handling device registration and token renewal.
pub const DEFAULT_AUTH_URL: &str = "https://my.remarkable.com";

/// Host that tells us where the storage API lives.
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://service-manager-production-dot-remarkable-production.appspot.com";

/// Storage host used until discovery says otherwise.
pub const DEFAULT_STORAGE_URL: &str =
    "https://document-storage-production-dot-remarkable-production.appspot.com";

/// Group identifier the service expects in discovery queries.
pub const DEFAULT_DISCOVERY_GROUP: &str = "auth0|5a68dc51cb30df3877a1d7c4";

/// Device description sent on registration.
pub const DEVICE_DESCRIPTION: &str = "desktop-windows";

/// Base URLs and routes of the remote service.
///
/// The routes have moved between service versions, so every literal lives
/// here rather than in the client.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth_url: String,
    pub discovery_url: String,
    pub storage_url: String,
    pub discovery_environment: String,
    pub discovery_group: String,
    pub discovery_api_version: u32,
    pub register_route: String,
    pub refresh_route: String,
    pub discovery_route: String,
    pub storage_prefix: String,
    pub docs_route: String,
    pub upload_request_route: String,
    pub update_status_route: String,
    pub delete_route: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            discovery_environment: "production".to_string(),
            discovery_group: DEFAULT_DISCOVERY_GROUP.to_string(),
            discovery_api_version: 2,
            register_route: "/token/json/2/device/new".to_string(),
            refresh_route: "/token/json/2/user/new".to_string(),
            discovery_route: "/service/json/1/document-storage".to_string(),
            storage_prefix: "/document-storage/json/2".to_string(),
            docs_route: "docs".to_string(),
            upload_request_route: "upload/request".to_string(),
            update_status_route: "upload/update-status".to_string(),
            delete_route: "delete".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every host at a single base URL. Mostly useful for tests.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            auth_url: base.clone(),
            discovery_url: base.clone(),
            storage_url: base,
            ..Self::default()
        }
    }

    pub fn register_url(&self) -> String {
        format!("{}{}", self.auth_url, self.register_route)
    }

    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.auth_url, self.refresh_route)
    }

    pub fn discovery_endpoint(&self) -> String {
        format!("{}{}", self.discovery_url, self.discovery_route)
    }

    /// URL of a storage API route relative to the given storage base.
    pub fn storage_endpoint(&self, storage_base: &str, route: &str) -> String {
        format!(
            "{}{}/{}",
            storage_base.trim_end_matches('/'),
            self.storage_prefix,
            route.trim_start_matches('/')
        )
    }
}

/// A file holding the bearer token between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Default token location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("remarkable-cloud")
            .join("auth.token")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token. A missing file means "not registered yet".
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)?;
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)?;
        Ok(())
    }
}
