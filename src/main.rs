//! remarkable_cloud CLI - Manage documents in the reMarkable cloud.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use remarkable_cloud::config::{
    DEFAULT_AUTH_URL, DEFAULT_DISCOVERY_GROUP, DEFAULT_DISCOVERY_URL, DEFAULT_STORAGE_URL,
};
use remarkable_cloud::{
    Authenticator, CloudError, Endpoints, FileType, ItemType, RemarkableFs, StorageClient,
    TokenStore,
};

/// Command line client for the reMarkable cloud file API.
#[derive(Parser)]
#[command(name = "remarkable_cloud")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File holding the device token.
    #[arg(long, env = "RMCLOUD_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Authentication service base URL.
    #[arg(long, env = "RMCLOUD_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    auth_url: String,

    /// Service discovery base URL.
    #[arg(long, env = "RMCLOUD_DISCOVERY_URL", default_value = DEFAULT_DISCOVERY_URL)]
    discovery_url: String,

    /// Storage API base URL used until discovery answers.
    #[arg(long, env = "RMCLOUD_STORAGE_URL", default_value = DEFAULT_STORAGE_URL)]
    storage_url: String,

    /// Group identifier sent to service discovery.
    #[arg(long, env = "RMCLOUD_DISCOVERY_GROUP", default_value = DEFAULT_DISCOVERY_GROUP)]
    discovery_group: String,

    /// Log HTTP traffic.
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register this client as a new device using a one-time code.
    Register {
        /// Code obtained from https://my.remarkable.com/generator-desktop.
        code: String,
    },

    /// List all files and folders.
    List,

    /// Upload a PDF or EPUB file into a folder.
    Upload {
        /// The file to upload.
        file: PathBuf,

        /// Destination folder path. Empty for the top level.
        #[arg(default_value = "")]
        parent: String,

        /// The given parent is a UUID, not a path.
        #[arg(long, short = 'u')]
        uuid: bool,
    },

    /// Download a document. The result is the zip container holding all
    /// files that make up the document.
    Download {
        /// Document path or UUID.
        file: String,

        /// Where to save the document. Defaults to ./<id>.zip.
        to: Option<PathBuf>,

        /// The given file is a UUID, not a path.
        #[arg(long, short = 'u')]
        uuid: bool,
    },

    /// Delete a file or folder.
    Delete {
        /// UUID of the item to delete.
        id: String,
    },

    /// Create a folder hierarchy (slash separated).
    Mkdir {
        /// Folders in Unix notation.
        folder: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let store = TokenStore::new(cli.token_file.clone().unwrap_or_else(TokenStore::default_path));
    let endpoints = Endpoints {
        auth_url: cli.auth_url.trim_end_matches('/').to_string(),
        discovery_url: cli.discovery_url.trim_end_matches('/').to_string(),
        storage_url: cli.storage_url.trim_end_matches('/').to_string(),
        discovery_group: cli.discovery_group.clone(),
        ..Endpoints::default()
    };

    let auth = Authenticator::new(endpoints);

    match cli.command {
        Commands::Register { code } => {
            let token = auth.register(&code).await.context("Failed to register device")?;
            store
                .save(&token)
                .with_context(|| format!("Failed to save token to {:?}", store.path()))?;
            println!("Registered. Token saved to {:?}", store.path());
        }

        Commands::List => {
            let client = connect(auth, &store).await?;
            let fs = RemarkableFs::load(&client).await.context("Failed to list items")?;
            if fs.index().is_empty() {
                println!("No files found.");
            } else {
                for (_, items) in fs.index().tree() {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
        }

        Commands::Upload { file, parent, uuid } => {
            let file_type = FileType::from_path(&file)?;
            let content =
                std::fs::read(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let name = document_name(&file)?;

            let client = connect(auth, &store).await?;

            let parent_id = if uuid {
                parent
            } else {
                let mut fs = RemarkableFs::load(&client).await.context("Failed to list items")?;
                fs.ensure_path(&parent)
                    .await
                    .with_context(|| format!("Failed to create folder: {}", parent))?
            };

            print!("Uploading {}... ", name);
            let item = client
                .upload_document(&content, &name, &parent_id, file_type)
                .await
                .with_context(|| format!("Failed to upload {:?}", file))?;
            println!("OK ({})", item.id);
        }

        Commands::Download { file, to, uuid } => {
            let client = connect(auth, &store).await?;
            let id = if uuid {
                file
            } else {
                let fs = RemarkableFs::load(&client).await.context("Failed to list items")?;
                fs.find_first(&file, ItemType::Document)
                    .map(|item| item.id.clone())
                    .ok_or_else(|| CloudError::NotFound(format!("document {}", file)))?
            };

            let to = to.unwrap_or_else(|| PathBuf::from(format!("{}.zip", id)));
            if let Some(parent) = to.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory: {:?}", parent))?;
                }
            }

            print!("Downloading {}... ", id);
            let blob = client
                .download_document(&id)
                .await
                .with_context(|| format!("Failed to download document: {}", id))?;
            std::fs::write(&to, blob).with_context(|| format!("Failed to write {:?}", to))?;

            println!("OK");
            println!("Saved to: {:?}", to);
        }

        Commands::Delete { id } => {
            let client = connect(auth, &store).await?;
            client
                .delete_item(&id)
                .await
                .with_context(|| format!("Failed to delete item: {}", id))?;
            println!("Deleted {}", id);
        }

        Commands::Mkdir { folder } => {
            let client = connect(auth, &store).await?;
            let mut fs = RemarkableFs::load(&client).await.context("Failed to list items")?;
            let id = fs
                .ensure_path(&folder)
                .await
                .with_context(|| format!("Failed to create folder: {}", folder))?;
            println!("{}", id);
        }
    }

    Ok(())
}

/// Load the stored token and start a session with it.
async fn connect(auth: Authenticator, store: &TokenStore) -> Result<StorageClient> {
    let token = store
        .load()
        .with_context(|| format!("Failed to read token from {:?}", store.path()))?
        .ok_or_else(|| {
            CloudError::Auth("no auth token available, use the register command".to_string())
        })?;

    let mut client = StorageClient::new(auth);
    client
        .init(&token)
        .await
        .context("Failed to initialize session")?;
    Ok(client)
}

/// Visible name of an uploaded file: its name without extension.
fn document_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CloudError::InvalidInput(format!("no file name in {:?}", path)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name_strips_extension() {
        assert_eq!(document_name(Path::new("/tmp/Paper.pdf")).unwrap(), "Paper");
        assert_eq!(document_name(Path::new("book.v2.epub")).unwrap(), "book.v2");
    }

    #[test]
    fn test_document_name_without_file() {
        assert!(document_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_cli_parses_upload() {
        let cli = Cli::try_parse_from(["remarkable_cloud", "upload", "paper.pdf", "Work/2024"]).unwrap();
        match cli.command {
            Commands::Upload { file, parent, uuid } => {
                assert_eq!(file, PathBuf::from("paper.pdf"));
                assert_eq!(parent, "Work/2024");
                assert!(!uuid);
            }
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_cli_parses_download_uuid() {
        let cli = Cli::try_parse_from(["remarkable_cloud", "download", "-u", "abc", "out.zip"]).unwrap();
        match cli.command {
            Commands::Download { file, to, uuid } => {
                assert_eq!(file, "abc");
                assert_eq!(to, Some(PathBuf::from("out.zip")));
                assert!(uuid);
            }
            _ => panic!("expected download"),
        }
    }
}
