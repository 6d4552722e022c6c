use serde::{Deserialize, Serialize};

/// A file received through the inbound multipart endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Reference to a stored media object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: u64,
    pub url: String,
    pub edit_url: String,
}

/// Reference to a created content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: u64,
    pub url: String,
    pub edit_url: String,
}

/// Distinguishes real posts from the save-pipeline artifacts the host
/// produces alongside them. Triggers never fire for artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Post,
    Revision,
    Autosave,
}

/// Full record of a content item as the Content Store holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: u64,
    pub status: String,
    #[serde(default)]
    pub kind: ItemKind,
    pub url: String,
    pub edit_url: String,
    pub thumbnail: Option<u64>,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
    pub created_at: i64,
}

impl Item {
    /// True for revision/autosave artifacts of the save pipeline.
    pub fn is_artifact(&self) -> bool {
        self.kind != ItemKind::Post
    }
}

/// Fields for creating a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub content: String,
    pub author: u64,
    pub status: String,
    #[serde(default)]
    pub categories: Vec<u64>,
    #[serde(default)]
    pub tags: Vec<u64>,
}

/// Term taxonomies a content item can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    Category,
    Tag,
}

/// A comment attached to a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub item_id: u64,
    pub author_name: String,
    pub content: String,
    pub created_at: i64,
}
