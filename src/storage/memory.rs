use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Displaced, Replaced, StoreResult, Thumbnail, ThumbnailStore};
use crate::media::MediaType;
use crate::videos::VideoId;

/// Thumbnails kept in process memory. Everything is lost on restart.
pub struct MemoryStore {
    entries: RwLock<HashMap<VideoId, Thumbnail>>,
    base_url: String,
}

impl MemoryStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ThumbnailStore for MemoryStore {
    async fn put(&self, video_id: &VideoId, thumbnail: Thumbnail) -> StoreResult<Replaced> {
        let previous = self.entries.write().await.insert(video_id.clone(), thumbnail);
        Ok(Replaced(match previous {
            Some(entry) => Displaced::Entry(entry),
            None => Displaced::Nothing,
        }))
    }

    async fn get(&self, video_id: &VideoId) -> StoreResult<Option<Thumbnail>> {
        Ok(self.entries.read().await.get(video_id).cloned())
    }

    async fn revert(&self, video_id: &VideoId, replaced: Replaced) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        match replaced.0 {
            Displaced::Entry(entry) => {
                entries.insert(video_id.clone(), entry);
            }
            Displaced::Nothing | Displaced::Files(_) => {
                entries.remove(video_id);
            }
        }
        Ok(())
    }

    async fn commit(&self, _video_id: &VideoId, _replaced: Replaced) -> StoreResult<()> {
        Ok(())
    }

    fn url_for(&self, video_id: &VideoId, _media_type: MediaType) -> String {
        format!("{}/api/thumbnails/{}", self.base_url, video_id)
    }
}
