use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::content::{ContentEvents, ContentStore};
use crate::models::{Comment, Item, ItemKind, ItemRef, MediaRef, NewItem, Taxonomy, UploadedFile};

/// In-memory Content Store so the gateway runs standalone and is testable
/// without a real host application. Raises the domain events a real host
/// would raise from its save pipeline, synchronously and at most once.
pub struct MemoryContentStore {
    base_url: String,
    state: Mutex<State>,
    events: RwLock<Option<Arc<dyn ContentEvents>>>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    items: HashMap<u64, Item>,
    media: HashMap<u64, MediaRef>,
    terms: HashMap<(Taxonomy, String), u64>,
    comments: HashMap<u64, Comment>,
}

impl MemoryContentStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Mutex::new(State::default()),
            events: RwLock::new(None),
        }
    }

    /// Wire the event listener. Events raised before this point are dropped.
    pub fn set_events(&self, events: Arc<dyn ContentEvents>) {
        *self.events.write().expect("content events lock") = Some(events);
    }

    fn listener(&self) -> Option<Arc<dyn ContentEvents>> {
        self.events.read().expect("content events lock").clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("content state lock")
    }

    pub fn item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn media_count(&self) -> usize {
        self.lock().media.len()
    }

    /// Insert a media object directly, bypassing upload validation. Intended
    /// for seeding fixtures.
    pub fn insert_media(&self, file_name: &str) -> MediaRef {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        let media = MediaRef {
            id,
            url: format!("{}/media/{file_name}", self.base_url),
            edit_url: format!("{}/admin/media/{id}", self.base_url),
        };
        state.media.insert(id, media.clone());
        media
    }

    /// Transition an item to "publish" and raise the status-change event,
    /// the way a host's save pipeline would.
    pub async fn publish_item(&self, id: u64) -> Result<Item> {
        let (old_status, item) = {
            let mut state = self.lock();
            let item = state
                .items
                .get_mut(&id)
                .ok_or_else(|| anyhow!("No item with id {id}"))?;
            let old_status = std::mem::replace(&mut item.status, "publish".to_string());
            (old_status, item.clone())
        };

        if let Some(events) = self.listener() {
            events.post_published("publish", &old_status, &item).await;
        }

        Ok(item)
    }

    /// Add a comment to an item and raise the comment event.
    pub async fn add_comment(&self, item_id: u64, author_name: &str, content: &str) -> Result<Comment> {
        let comment = {
            let mut state = self.lock();
            if !state.items.contains_key(&item_id) {
                return Err(anyhow!("No item with id {item_id}"));
            }
            state.next_id += 1;
            let comment = Comment {
                id: state.next_id,
                item_id,
                author_name: author_name.to_string(),
                content: content.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            };
            state.comments.insert(comment.id, comment.clone());
            comment
        };

        if let Some(events) = self.listener() {
            events.new_comment(&comment).await;
        }

        Ok(comment)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store_local_file(&self, file: &UploadedFile) -> Result<MediaRef> {
        if file.data.is_empty() {
            return Err(anyhow!("Uploaded file {} is empty", file.file_name));
        }
        Ok(self.insert_media(&file.file_name))
    }

    async fn store_remote_file(&self, url: &str) -> Result<MediaRef> {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("Cannot derive a file name from {url}"))?;

        // Reject names that do not look like a file the host could type.
        if mime_guess::from_path(file_name).first().is_none() {
            return Err(anyhow!("Cannot determine file type for {url}"));
        }

        Ok(self.insert_media(file_name))
    }

    async fn create_item(&self, fields: NewItem) -> Result<ItemRef> {
        let item = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            let item = Item {
                id,
                title: fields.title,
                content: fields.content,
                author: fields.author,
                status: fields.status,
                kind: ItemKind::Post,
                url: format!("{}/posts/{id}", self.base_url),
                edit_url: format!("{}/admin/posts/{id}/edit", self.base_url),
                thumbnail: None,
                categories: fields.categories,
                tags: fields.tags,
                created_at: chrono::Utc::now().timestamp(),
            };
            state.items.insert(id, item.clone());
            item
        };

        if let Some(events) = self.listener() {
            events.post_created(&item, false).await;
            // A directly-published item also transitions out of "new".
            events.post_published(&item.status, "new", &item).await;
        }

        Ok(ItemRef {
            id: item.id,
            url: item.url,
            edit_url: item.edit_url,
        })
    }

    async fn get_item(&self, id: u64) -> Result<Option<Item>> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn resolve_or_create_term(&self, name: &str, taxonomy: Taxonomy) -> Result<u64> {
        let mut state = self.lock();
        let key = (taxonomy, name.to_lowercase());
        if let Some(id) = state.terms.get(&key) {
            return Ok(*id);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.terms.insert(key, id);
        Ok(id)
    }

    async fn set_thumbnail(&self, item_id: u64, media_id: u64) -> Result<()> {
        let mut state = self.lock();
        if !state.media.contains_key(&media_id) {
            return Err(anyhow!("No media with id {media_id}"));
        }
        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| anyhow!("No item with id {item_id}"))?;
        item.thumbnail = Some(media_id);
        Ok(())
    }

    async fn media_exists(&self, media_id: u64) -> Result<bool> {
        Ok(self.lock().media.contains_key(&media_id))
    }

    async fn remove_media(&self, media_id: u64) -> Result<()> {
        self.lock().media.remove(&media_id);
        Ok(())
    }
}
