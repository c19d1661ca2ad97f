//! Packaging of documents into the service's zip container.
//!
//! A document blob holds the raw file as `<ID>.<ext>`, an empty
//! `<ID>.pagedata` and a `<ID>.content` JSON descriptor.

use std::io::{Cursor, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{CloudError, Result};

/// File formats the service accepts for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Epub,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Epub => "epub",
        }
    }

    /// Detect the file type from a file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        match mime.essence_str() {
            "application/pdf" => Ok(FileType::Pdf),
            "application/epub+zip" => Ok(FileType::Epub),
            other => Err(CloudError::InvalidInput(format!(
                "unsupported file type {} for {}",
                other,
                path.display()
            ))),
        }
    }
}

/// Contents of the `<ID>.content` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub extra_metadata: Map<String, Value>,
    pub file_type: String,
    pub last_opened_page: u32,
    pub line_height: i32,
    pub margins: u32,
    pub page_count: u32,
    pub text_scale: u32,
    pub transform: Map<String, Value>,
}

impl ContentDescriptor {
    pub fn new(file_type: FileType) -> Self {
        Self {
            extra_metadata: Map::new(),
            file_type: file_type.extension().to_string(),
            last_opened_page: 0,
            line_height: -1,
            margins: 100,
            page_count: 0,
            text_scale: 1,
            transform: Map::new(),
        }
    }
}

/// Build the zip blob uploaded for a new document.
///
/// # Arguments
/// * `id` - The ID of the document, used to name every entry
/// * `content` - Raw bytes of the file
/// * `file_type` - Format of `content`
pub fn package_document(id: &str, content: &[u8], file_type: FileType) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    zip.start_file(format!("{}.{}", id, file_type.extension()), options)?;
    zip.write_all(content)?;

    zip.start_file(format!("{}.pagedata", id), options)?;

    let descriptor = serde_json::to_vec(&ContentDescriptor::new(file_type))?;
    zip.start_file(format!("{}.content", id), options)?;
    zip.write_all(&descriptor)?;

    Ok(zip.finish()?.into_inner())
}
