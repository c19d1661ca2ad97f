//! Data models for the document storage API.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{CloudError, Result};

/// Kind of an item in the storage service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    /// A folder.
    #[serde(rename = "CollectionType")]
    Collection,
    /// A leaf document (PDF, EPUB, notebook).
    #[serde(rename = "DocumentType")]
    Document,
    /// Anything this client does not know about yet.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Collection => "collection",
            ItemType::Document => "document",
            ItemType::Unknown => "unknown",
        }
    }

    /// Icon used in listings.
    pub fn icon(&self) -> &'static str {
        match self {
            ItemType::Collection => "📁",
            ItemType::Document => "📄",
            ItemType::Unknown => "❓",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record of the remote item store.
///
/// The service returns the same shape from listing and from single item
/// lookups; the blob URLs and the status fields are only present in some
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Parent", default)]
    pub parent: String,
    #[serde(rename = "Type", default)]
    pub item_type: ItemType,
    #[serde(rename = "VissibleName", default)]
    pub visible_name: String,
    #[serde(rename = "Version", default)]
    pub version: u64,
    #[serde(rename = "ModifiedClient", default)]
    pub modified_client: String,
    #[serde(rename = "CurrentPage", default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(rename = "Bookmarked", default, skip_serializing_if = "Option::is_none")]
    pub bookmarked: Option<bool>,
    #[serde(rename = "BlobURLGet", default, skip_serializing)]
    pub blob_url_get: Option<String>,
    #[serde(rename = "Success", default, skip_serializing)]
    pub success: Option<bool>,
    #[serde(rename = "Message", default, skip_serializing)]
    pub message: Option<String>,
    /// Absolute path, filled in by the index.
    #[serde(skip)]
    pub(crate) path: Option<String>,
}

impl Item {
    /// Create a fresh item with a new UUID, stamped with the current time.
    pub fn new(name: &str, item_type: ItemType, parent: &str) -> Result<Self> {
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent: parent.to_string(),
            item_type,
            visible_name: name.to_string(),
            version: 1,
            modified_client: now_timestamp()?,
            current_page: None,
            bookmarked: None,
            blob_url_get: None,
            success: None,
            message: None,
            path: None,
        })
    }

    /// The absolute path computed by the index, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is_collection(&self) -> bool {
        self.item_type == ItemType::Collection
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.item_type.icon(),
            format_modified(&self.modified_client),
            self.path.as_deref().unwrap_or(&self.visible_name),
            self.id,
            self.version
        )
    }
}

/// Minimal item payload used for upload slots and deletes.
#[derive(Debug, Clone, Serialize)]
pub struct ItemStub {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(rename = "Version")]
    pub version: u64,
}

/// One element of a storage envelope response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Version", default)]
    pub version: u64,
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "BlobURLPut", default)]
    pub blob_url_put: Option<String>,
    #[serde(rename = "BlobURLPutExpires", default)]
    pub blob_url_put_expires: Option<String>,
}

/// Service discovery response.
#[derive(Debug, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Host", default)]
    pub host: Option<String>,
}

/// Device registration request body.
#[derive(Debug, Serialize)]
pub struct RegistrationRequest {
    pub code: String,
    #[serde(rename = "deviceDesc")]
    pub device_desc: String,
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

/// Current time as an RFC 3339 timestamp.
pub fn now_timestamp() -> Result<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

/// Render a `ModifiedClient` timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// Unparseable values are returned unchanged.
pub fn format_modified(timestamp: &str) -> String {
    match OffsetDateTime::parse(timestamp, &Rfc3339) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => timestamp.to_string(),
    }
}

/// Take the only element of a one-element response sequence.
pub(crate) fn single<T>(items: Vec<T>, what: &str) -> Result<T> {
    let count = items.len();
    let mut iter = items.into_iter();
    match (iter.next(), count) {
        (Some(item), 1) => Ok(item),
        _ => Err(CloudError::Protocol(format!(
            "expected exactly one element in {} response, got {}",
            what, count
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_deserialize() {
        let json = r#"{
            "ID": "1d5d5bbc-4e4a-4a4f-8a35-7ad3a0a4bd6c",
            "Version": 3,
            "Message": "",
            "Success": true,
            "BlobURLGet": "https://blob.example/get",
            "BlobURLGetExpires": "0001-01-01T00:00:00Z",
            "ModifiedClient": "2018-01-24T21:02:59.624624Z",
            "Type": "DocumentType",
            "VissibleName": "Paper",
            "CurrentPage": 4,
            "Bookmarked": false,
            "Parent": "abc"
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "1d5d5bbc-4e4a-4a4f-8a35-7ad3a0a4bd6c");
        assert_eq!(item.item_type, ItemType::Document);
        assert_eq!(item.visible_name, "Paper");
        assert_eq!(item.version, 3);
        assert_eq!(item.parent, "abc");
        assert_eq!(item.blob_url_get.as_deref(), Some("https://blob.example/get"));
        assert!(item.path().is_none());
    }

    #[test]
    fn test_unknown_type_does_not_fail() {
        let json = r#"{"ID": "x", "Type": "TemplateType", "VissibleName": "t"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_type, ItemType::Unknown);
        assert_eq!(item.item_type.to_string(), "unknown");
        assert_eq!(item.item_type.icon(), "❓");
    }

    #[test]
    fn test_item_serialize_omits_response_fields() {
        let mut item = Item::new("Books", ItemType::Collection, "").unwrap();
        item.blob_url_get = Some("https://blob.example".to_string());
        item.success = Some(true);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["Type"], "CollectionType");
        assert_eq!(json["VissibleName"], "Books");
        assert_eq!(json["Parent"], "");
        assert_eq!(json["Version"], 1);
        assert!(json.get("BlobURLGet").is_none());
        assert!(json.get("Success").is_none());
        assert!(json.get("CurrentPage").is_none());
    }

    #[test]
    fn test_stub_without_type() {
        let stub = ItemStub {
            id: "abc".to_string(),
            item_type: None,
            version: 7,
        };
        let json = serde_json::to_string(&stub).unwrap();
        assert_eq!(json, r#"{"ID":"abc","Version":7}"#);
    }

    #[test]
    fn test_format_modified() {
        assert_eq!(
            format_modified("2018-01-24T21:02:59.624624Z"),
            "2018-01-24 21:02:59"
        );
        assert_eq!(format_modified("yesterday"), "yesterday");
    }

    #[test]
    fn test_item_display() {
        let mut item = Item::new("Paper", ItemType::Document, "").unwrap();
        item.path = Some("/Paper".to_string());

        let display = format!("{}", item);
        assert!(display.contains("📄"));
        assert!(display.contains("/Paper"));
        assert!(display.contains(&item.id));
    }

    #[test]
    fn test_single() {
        assert_eq!(single(vec![1], "test").unwrap(), 1);
        assert!(matches!(
            single(Vec::<u8>::new(), "test"),
            Err(CloudError::Protocol(_))
        ));
        assert!(matches!(
            single(vec![1, 2], "test"),
            Err(CloudError::Protocol(_))
        ));
    }
}
