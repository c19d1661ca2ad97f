//! Folder hierarchy on top of the flat item store.

use tracing::debug;

use crate::client::StorageClient;
use crate::error::Result;
use crate::index::{normalize_path, Index};
use crate::models::{Item, ItemType};

/// Filesystem view of the store, backed by an [`Index`].
///
/// The index is a snapshot. Call [`RemarkableFs::refresh`] after the store
/// was changed by anything other than this value.
pub struct RemarkableFs<'a> {
    client: &'a StorageClient,
    index: Index,
}

impl<'a> RemarkableFs<'a> {
    /// List the store and build the index.
    pub async fn load(client: &'a StorageClient) -> Result<Self> {
        let mut fs = Self {
            client,
            index: Index::new(),
        };
        fs.refresh().await?;
        Ok(fs)
    }

    /// Replace the index with a fresh listing.
    pub async fn refresh(&mut self) -> Result<()> {
        let items = self.client.list_items().await?;
        self.index = Index::build(items)?;
        debug!("index holds {} items", self.index.len());
        Ok(())
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn find_first(&self, path: &str, item_type: ItemType) -> Option<&Item> {
        self.index.find_first(path, item_type)
    }

    /// Return the ID of the last folder of `path`, creating missing folders.
    ///
    /// An empty path is the top level and yields `""`. Created folders are
    /// added to the index so later calls find them. Folders created before a
    /// failure stay on the server; calling again picks up where it stopped.
    pub async fn ensure_path(&mut self, path: &str) -> Result<String> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Ok(String::new());
        }

        let mut current = String::new();
        let mut parent = String::new();
        for part in path.trim_start_matches('/').split('/') {
            if part.is_empty() {
                continue;
            }
            current.push('/');
            current.push_str(part);

            parent = match self.index.find_first(&current, ItemType::Collection) {
                Some(folder) => folder.id.clone(),
                None => {
                    let folder = self.client.create_folder(part, &parent).await?;
                    self.index.insert(folder)?.id.clone()
                }
            };
        }

        Ok(parent)
    }
}
