//! Thumbnail storage.
//!
//! Two interchangeable strategies sit behind [`ThumbnailStore`]: an in-process
//! map ([`MemoryStore`]) and files under an asset root ([`FilesystemStore`]).
//! Either way a `put` replaces the whole entry at once, so readers never see
//! bytes from one upload paired with the media type of another.

mod filesystem;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreKind};
use crate::media::MediaType;
use crate::videos::VideoId;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub data: Bytes,
    pub media_type: MediaType,
}

impl Thumbnail {
    pub fn new(data: impl Into<Bytes>, media_type: MediaType) -> Self {
        Self {
            data: data.into(),
            media_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid thumbnail key: {0}")]
    InvalidKey(String),

    #[error("Failed to write thumbnail for {video_id}: {source}")]
    WriteFailed {
        video_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read thumbnail for {video_id}: {source}")]
    ReadFailed {
        video_id: String,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a `put` displaced. Hand it back to [`ThumbnailStore::revert`] to undo
/// the write, or to [`ThumbnailStore::commit`] once the write is final.
#[derive(Debug)]
pub struct Replaced(Displaced);

#[derive(Debug)]
enum Displaced {
    Nothing,
    Entry(Thumbnail),
    // (moved-aside copy, original location)
    Files(Vec<(PathBuf, PathBuf)>),
}

impl Replaced {
    /// True when the put created the first thumbnail for its video.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Displaced::Nothing => true,
            Displaced::Entry(_) => false,
            Displaced::Files(files) => files.is_empty(),
        }
    }
}

/// Callers that need a put and its follow-up to be atomic per video must
/// serialize them themselves; the store only guarantees each call is.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Stores `thumbnail` under `video_id`, replacing any existing entry.
    async fn put(&self, video_id: &VideoId, thumbnail: Thumbnail) -> StoreResult<Replaced>;

    async fn get(&self, video_id: &VideoId) -> StoreResult<Option<Thumbnail>>;

    /// Puts back what `put` replaced, or removes the entry if it replaced nothing.
    async fn revert(&self, video_id: &VideoId, replaced: Replaced) -> StoreResult<()>;

    /// Releases whatever `put` kept around for a revert.
    async fn commit(&self, video_id: &VideoId, replaced: Replaced) -> StoreResult<()>;

    /// Public URL the stored thumbnail can be fetched from.
    fn url_for(&self, video_id: &VideoId, media_type: MediaType) -> String;
}

pub async fn build_store(config: &Config) -> Result<Arc<dyn ThumbnailStore>> {
    let store: Arc<dyn ThumbnailStore> = match config.thumbnail_store {
        StoreKind::Memory => Arc::new(MemoryStore::new(&config.public_url)),
        StoreKind::Filesystem => Arc::new(
            FilesystemStore::new(&config.assets_root, &config.public_url)
                .await
                .with_context(|| {
                    format!("Failed to create asset root {}", config.assets_root.display())
                })?,
        ),
    };

    info!(kind = ?config.thumbnail_store, "Thumbnail store ready");
    Ok(store)
}
