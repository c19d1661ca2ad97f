//! remarkable_cloud - A client for the reMarkable cloud document storage.
//!
//! The service only knows a flat list of items linked by parent IDs. This
//! library provides functionality to:
//! - Register a device and renew its token
//! - Rebuild a folder tree from the flat listing
//! - Create folder hierarchies idempotently
//! - Upload, download and delete documents
//!
//! # Example
//!
//! ```no_run
//! use remarkable_cloud::{Authenticator, Endpoints, RemarkableFs, StorageClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::new(Endpoints::default());
//!     let mut client = StorageClient::new(auth);
//!     client.init("device-token").await?;
//!
//!     let mut fs = RemarkableFs::load(&client).await?;
//!     let folder = fs.ensure_path("Books/2024").await?;
//!     println!("folder id: {}", folder);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fs;
mod http;
pub mod index;
pub mod models;

// Re-exports for convenience
pub use archive::FileType;
pub use auth::Authenticator;
pub use client::StorageClient;
pub use config::{Endpoints, TokenStore};
pub use error::{CloudError, Result};
pub use fs::RemarkableFs;
pub use index::Index;
pub use models::{Item, ItemType};
