//! Device registration, token renewal and storage discovery.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{Endpoints, DEVICE_DESCRIPTION};
use crate::error::{CloudError, Result};
use crate::http::{body_text, execute};
use crate::models::{DiscoveryResponse, RegistrationRequest};

/// Holds the bearer token of the current session.
#[derive(Clone)]
pub struct Authenticator {
    endpoints: Arc<Endpoints>,
    client: Client,
    token: Arc<RwLock<Option<String>>>,
}

impl Authenticator {
    /// Create an authenticator without a token.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
            client: Client::new(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Exchange a one-time pairing code for a long lived device token.
    ///
    /// A fresh device ID is generated for every attempt.
    pub async fn register(&self, code: &str) -> Result<String> {
        let body = RegistrationRequest {
            code: code.trim().to_string(),
            device_desc: DEVICE_DESCRIPTION.to_string(),
            device_id: uuid::Uuid::new_v4().to_string(),
        };

        let request = self
            .client
            .post(self.endpoints.register_url())
            .header(AUTHORIZATION, "Bearer")
            .json(&body);

        let token = self.request_token(request, "registration").await?;
        info!("registered new device {}", body.device_id);
        Ok(token)
    }

    /// Exchange a held token for a renewed one.
    pub async fn refresh(&self, token: &str) -> Result<String> {
        let request = self
            .client
            .post(self.endpoints.refresh_url())
            .bearer_auth(token.trim());

        self.request_token(request, "token refresh").await
    }

    /// Ask the discovery service where the storage API lives.
    ///
    /// Returns a base URL; a bare host name gets `https://`.
    pub async fn discover_storage(&self) -> Result<String> {
        let token = self.access_token().await?;
        let api_version = self.endpoints.discovery_api_version.to_string();

        let request = self
            .client
            .get(self.endpoints.discovery_endpoint())
            .bearer_auth(&token)
            .query(&[
                ("environment", self.endpoints.discovery_environment.as_str()),
                ("group", self.endpoints.discovery_group.as_str()),
                ("apiVer", api_version.as_str()),
            ]);

        let (status, body) = execute(&self.client, request).await?;
        if !status.is_success() {
            return Err(CloudError::Protocol(format!(
                "service discovery failed with status {}: {}",
                status,
                body_text(&body)
            )));
        }

        let discovery: DiscoveryResponse = serde_json::from_slice(&body)?;
        if discovery.status != "OK" {
            return Err(CloudError::Protocol(format!(
                "service discovery returned status {}",
                discovery.status
            )));
        }

        let host = discovery
            .host
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CloudError::Protocol("service discovery returned no host".to_string()))?;

        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };
        debug!("storage API at {}", base);
        Ok(base)
    }

    /// The token of the current session.
    pub async fn access_token(&self) -> Result<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or_else(|| CloudError::Auth("no token available, register this device first".to_string()))
    }

    async fn request_token(&self, request: reqwest::RequestBuilder, what: &str) -> Result<String> {
        let (status, body) = execute(&self.client, request).await?;
        if !status.is_success() {
            return Err(CloudError::Auth(format!(
                "{} rejected with status {}: {}",
                what,
                status,
                body_text(&body)
            )));
        }

        let token = body_text(&body);
        if token.is_empty() {
            return Err(CloudError::Auth(format!("{} returned an empty token", what)));
        }

        {
            let mut held = self.token.write().await;
            *held = Some(token.clone());
        }

        Ok(token)
    }
}
