pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Comment, Item, ItemRef, MediaRef, NewItem, Taxonomy, UploadedFile};

pub use memory::MemoryContentStore;

/// The content-management collaborator the gateway delegates to. The gateway
/// never persists content itself; it validates, delegates and formats.
///
/// Implementations must not leave partially written media behind on a failed
/// store operation.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store an uploaded file and return its media reference.
    async fn store_local_file(&self, file: &UploadedFile) -> Result<MediaRef>;

    /// Side-load a file from a remote URL and return its media reference.
    async fn store_remote_file(&self, url: &str) -> Result<MediaRef>;

    /// Create a content item.
    async fn create_item(&self, item: NewItem) -> Result<ItemRef>;

    /// Look up a content item by id.
    async fn get_item(&self, id: u64) -> Result<Option<Item>>;

    /// Resolve a term name to an existing term id, creating the term when it
    /// does not exist yet.
    async fn resolve_or_create_term(&self, name: &str, taxonomy: Taxonomy) -> Result<u64>;

    /// Set an item's thumbnail to an existing media object.
    async fn set_thumbnail(&self, item_id: u64, media_id: u64) -> Result<()>;

    /// Whether a media object with this id exists.
    async fn media_exists(&self, media_id: u64) -> Result<bool>;

    /// Remove a media object.
    async fn remove_media(&self, media_id: u64) -> Result<()>;
}

/// Domain events raised at the Content Store boundary. Delivery is
/// synchronous, at-most-once, and never retried; the event source is never
/// failed by a listener.
#[async_trait]
pub trait ContentEvents: Send + Sync {
    /// An item was saved. `is_update` is true for re-saves of an existing
    /// item.
    async fn post_created(&self, item: &Item, is_update: bool);

    /// An item's status changed.
    async fn post_published(&self, new_status: &str, old_status: &str, item: &Item);

    /// A comment was added.
    async fn new_comment(&self, comment: &Comment);
}
