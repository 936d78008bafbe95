use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::locks::StripedLocks;
use crate::storage::ThumbnailStore;
use crate::videos::VideoRepository;

const UPLOAD_LOCK_STRIPES: usize = 64;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub videos: Arc<dyn VideoRepository>,
    pub thumbnails: Arc<dyn ThumbnailStore>,
    pub jwt_secret: String,
    // Held per video from the store write until the record points at it.
    pub upload_locks: StripedLocks,
}

impl AppState {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        thumbnails: Arc<dyn ThumbnailStore>,
        jwt_secret: impl Into<String>,
    ) -> Self {
        Self {
            videos,
            thumbnails,
            jwt_secret: jwt_secret.into(),
            upload_locks: StripedLocks::new(UPLOAD_LOCK_STRIPES),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}
