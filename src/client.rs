//! Document storage API client.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::archive::{package_document, FileType};
use crate::auth::Authenticator;
use crate::error::{CloudError, Result};
use crate::http::{body_text, execute};
use crate::models::{single, Item, ItemStub, ItemType, StatusResponse};

/// Client for the metadata and blob endpoints of the storage service.
pub struct StorageClient {
    auth: Authenticator,
    storage_url: String,
    http: Client,
}

impl StorageClient {
    /// Create a new StorageClient.
    ///
    /// The storage URL starts out as the configured default and is replaced
    /// by [`StorageClient::init`].
    pub fn new(auth: Authenticator) -> Self {
        let storage_url = auth.endpoints().storage_url.clone();
        Self {
            auth,
            storage_url,
            http: Client::new(),
        }
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    /// Renew the token and locate the storage API.
    ///
    /// Must complete before any other call. Returns the renewed token.
    pub async fn init(&mut self, token: &str) -> Result<String> {
        let token = self.auth.refresh(token).await?;
        self.storage_url = self.auth.discover_storage().await?;
        Ok(token)
    }

    /// Fetch metadata of every item in the store.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let token = self.auth.access_token().await?;
        let request = self
            .http
            .get(self.url(&self.auth.endpoints().docs_route))
            .bearer_auth(&token);

        let (status, body) = execute(&self.http, request).await?;
        if !status.is_success() {
            return Err(remote_status(status, &body));
        }

        let items: Vec<Item> = serde_json::from_slice(&body)?;
        debug!("listed {} items", items.len());
        Ok(items)
    }

    /// Fetch a single item, optionally with a download URL for its blob.
    ///
    /// # Arguments
    /// * `id` - The ID of the item
    /// * `with_blob` - Ask for a pre-signed download URL in `BlobURLGet`
    pub async fn get_item(&self, id: &str, with_blob: bool) -> Result<Item> {
        let token = self.auth.access_token().await?;
        let request = self
            .http
            .get(self.url(&self.auth.endpoints().docs_route))
            .bearer_auth(&token)
            .query(&[("doc", id), ("withBlob", if with_blob { "true" } else { "false" })]);

        let (status, body) = execute(&self.http, request).await?;
        if !status.is_success() {
            return Err(remote_status(status, &body));
        }

        let items: Vec<Item> = serde_json::from_slice(&body)?;
        if items.is_empty() {
            return Err(CloudError::NotFound(format!("item {}", id)));
        }
        let item = single(items, "item lookup")?;
        if item.success == Some(false) {
            return Err(CloudError::Remote(item.message.unwrap_or_default()));
        }
        Ok(item)
    }

    /// Create or update an item's metadata.
    pub async fn update_metadata(&self, item: &Item) -> Result<StatusResponse> {
        self.storage_request(&self.auth.endpoints().update_status_route, item)
            .await
    }

    /// Create a folder. The returned record is built locally from what was
    /// sent plus the version echoed by the server.
    ///
    /// # Arguments
    /// * `name` - Visible name of the new folder
    /// * `parent_id` - The ID of the parent folder, `""` for the top level
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> Result<Item> {
        let mut folder = Item::new(name, ItemType::Collection, parent_id)?;
        let status = self.update_metadata(&folder).await?;
        if status.version > 0 {
            folder.version = status.version;
        }
        info!("created folder {} ({})", name, folder.id);
        Ok(folder)
    }

    /// Ask for a pre-signed URL to upload the blob of a new document.
    pub async fn request_upload(&self, id: &str) -> Result<String> {
        let stub = ItemStub {
            id: id.to_string(),
            item_type: Some(ItemType::Document),
            version: 1,
        };

        let status = self
            .storage_request(&self.auth.endpoints().upload_request_route, &stub)
            .await?;
        status
            .blob_url_put
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CloudError::Protocol(format!("no upload URL returned for {}", id)))
    }

    /// Upload a new document into the given folder.
    ///
    /// # Arguments
    /// * `content` - Raw bytes of the PDF or EPUB file
    /// * `name` - Visible name of the document
    /// * `parent_id` - The ID of the parent folder, `""` for the top level
    /// * `file_type` - Format of `content`
    pub async fn upload_document(
        &self,
        content: &[u8],
        name: &str,
        parent_id: &str,
        file_type: FileType,
    ) -> Result<Item> {
        let mut document = Item::new(name, ItemType::Document, parent_id)?;
        let blob = package_document(&document.id, content, file_type)?;

        let put_url = self.request_upload(&document.id).await?;

        let token = self.auth.access_token().await?;
        let request = self.http.put(&put_url).bearer_auth(&token).body(blob);
        let (status, body) = execute(&self.http, request).await?;
        if !status.is_success() {
            return Err(remote_status(status, &body));
        }

        let status = self.update_metadata(&document).await?;
        if status.version > 0 {
            document.version = status.version;
        }

        info!("uploaded {} ({})", name, document.id);
        Ok(document)
    }

    /// Download the raw blob (zip container) of a document.
    pub async fn download_document(&self, id: &str) -> Result<Vec<u8>> {
        let item = self.get_item(id, true).await?;
        let get_url = item
            .blob_url_get
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CloudError::Remote(format!("no download URL for {}", id)))?;

        let token = self.auth.access_token().await?;
        let request = self.http.get(&get_url).bearer_auth(&token);
        let (status, body) = execute(&self.http, request).await?;
        if !status.is_success() {
            return Err(remote_status(status, &body));
        }

        Ok(body)
    }

    /// Delete an item, echoing the version the server currently holds.
    pub async fn delete_item(&self, id: &str) -> Result<()> {
        let item = self.get_item(id, false).await?;
        let stub = ItemStub {
            id: item.id,
            item_type: None,
            version: item.version,
        };

        self.storage_request(&self.auth.endpoints().delete_route, &stub).await?;
        info!("deleted {} at version {}", id, stub.version);
        Ok(())
    }

    /// Send one item through the batch-shaped metadata API.
    ///
    /// The request is a one-element array and so must be the response.
    async fn storage_request<T: Serialize>(&self, route: &str, payload: &T) -> Result<StatusResponse> {
        let token = self.auth.access_token().await?;
        let request = self
            .http
            .put(self.url(route))
            .bearer_auth(&token)
            .json(&[payload]);

        let (status, body) = execute(&self.http, request).await?;
        if !status.is_success() {
            return Err(remote_status(status, &body));
        }

        let responses: Vec<StatusResponse> = serde_json::from_slice(&body)
            .map_err(|e| CloudError::Protocol(format!("malformed {} response: {}", route, e)))?;
        let response = single(responses, route)?;
        if !response.success {
            return Err(CloudError::Remote(response.message));
        }

        Ok(response)
    }

    fn url(&self, route: &str) -> String {
        self.auth
            .endpoints()
            .storage_endpoint(&self.storage_url, route)
    }
}

fn remote_status(status: reqwest::StatusCode, body: &[u8]) -> CloudError {
    CloudError::Remote(format!("Status {}: {}", status, body_text(body)))
}
