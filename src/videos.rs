use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

lazy_static! {
    // One path component, no dots: safe as a map key and as a file stem.
    static ref VIDEO_ID_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,127}$").expect("video id pattern must compile");
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid video id: {0:?}")]
pub struct InvalidVideoId(pub String);

/// Identifier of a video, checked to be safe for use as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = InvalidVideoId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if VIDEO_ID_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidVideoId(value.to_string()))
        }
    }
}

impl TryFrom<String> for VideoId {
    type Error = InvalidVideoId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    #[serde(rename = "thumbnailURL", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "videoURL", default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: String,
}

impl Video {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::generate(),
            created_at: now,
            updated_at: now,
            title: title.into(),
            description: description.into(),
            thumbnail_url: None,
            video_url: None,
            user_id: user_id.into(),
        }
    }

    pub fn with_thumbnail_url(mut self, url: String) -> Self {
        self.thumbnail_url = Some(url);
        self.updated_at = Utc::now();
        self
    }
}

/// Video metadata persistence, consumed by the thumbnail handlers.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: &VideoId) -> Result<Option<Video>>;

    async fn create(&self, video: Video) -> Result<Video>;

    /// Replaces the stored record. Fails if the video does not exist.
    async fn update(&self, video: &Video) -> Result<()>;
}

/// Process-local video records. Lost on restart.
#[derive(Default)]
pub struct InMemoryVideos {
    videos: RwLock<HashMap<VideoId, Video>>,
}

impl InMemoryVideos {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideos {
    async fn get(&self, id: &VideoId) -> Result<Option<Video>> {
        Ok(self.videos.read().await.get(id).cloned())
    }

    async fn create(&self, video: Video) -> Result<Video> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            bail!("video {} already exists", video.id);
        }
        videos.insert(video.id.clone(), video.clone());
        Ok(video)
    }

    async fn update(&self, video: &Video) -> Result<()> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => bail!("video {} does not exist", video.id),
        }
    }
}
