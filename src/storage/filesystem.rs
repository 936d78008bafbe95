use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::{Displaced, Replaced, StoreError, StoreResult, Thumbnail, ThumbnailStore};
use crate::locks::StripedLocks;
use crate::media::MediaType;
use crate::videos::VideoId;

const LOCK_STRIPES: usize = 16;

/// Thumbnails stored as `{root}/{video_id}.{ext}` and served statically under `/assets`.
///
/// A put moves the current file aside instead of deleting it, so the write can
/// be reverted until it is committed. Moved-aside and temporary files are
/// dot-files, which the static file service does not serve.
pub struct FilesystemStore {
    root: PathBuf,
    base_url: String,
    locks: StripedLocks,
    serial: AtomicU64,
}

impl FilesystemStore {
    pub async fn new(root: impl Into<PathBuf>, base_url: &str) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            locks: StripedLocks::new(LOCK_STRIPES),
            serial: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(video_id: &VideoId, media_type: MediaType) -> StoreResult<String> {
        let stem = video_id.as_str();
        let mut components = Path::new(stem).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !stem.contains('.') => {
                Ok(format!("{stem}.{}", media_type.extension()))
            }
            _ => Err(StoreError::InvalidKey(stem.to_string())),
        }
    }

    fn path_for(&self, video_id: &VideoId, media_type: MediaType) -> StoreResult<PathBuf> {
        Ok(self.root.join(Self::file_name(video_id, media_type)?))
    }

    fn scratch_path(&self, video_id: &VideoId, suffix: &str) -> PathBuf {
        let serial = self.serial.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(".{video_id}.{serial}.{suffix}"))
    }

    async fn read_existing(&self, video_id: &VideoId) -> StoreResult<Option<Thumbnail>> {
        for media_type in MediaType::ALL {
            let path = self.path_for(video_id, media_type)?;
            match fs::read(&path).await {
                Ok(data) => return Ok(Some(Thumbnail::new(data, media_type))),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(StoreError::ReadFailed {
                        video_id: video_id.to_string(),
                        source,
                    })
                }
            }
        }
        Ok(None)
    }

    /// Moves every current file for `video_id` to a backup path.
    async fn move_aside(&self, video_id: &VideoId) -> StoreResult<Vec<(PathBuf, PathBuf)>> {
        let mut moved = Vec::new();
        for media_type in MediaType::ALL {
            let original = self.path_for(video_id, media_type)?;
            let backup = self.scratch_path(video_id, media_type.extension());
            match fs::rename(&original, &backup).await {
                Ok(()) => moved.push((backup, original)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    restore(&moved).await;
                    return Err(StoreError::WriteFailed {
                        video_id: video_id.to_string(),
                        source,
                    });
                }
            }
        }
        Ok(moved)
    }

    async fn remove_current(&self, video_id: &VideoId) -> StoreResult<()> {
        for media_type in MediaType::ALL {
            let path = self.path_for(video_id, media_type)?;
            remove_if_present(&path)
                .await
                .map_err(|source| StoreError::WriteFailed {
                    video_id: video_id.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

async fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

async fn restore(moved: &[(PathBuf, PathBuf)]) {
    for (backup, original) in moved {
        if let Err(e) = fs::rename(backup, original).await {
            warn!(path = %original.display(), "Failed to restore thumbnail: {}", e);
        }
    }
}

async fn write_atomically(temp: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, target).await
}

#[async_trait]
impl ThumbnailStore for FilesystemStore {
    async fn put(&self, video_id: &VideoId, thumbnail: Thumbnail) -> StoreResult<Replaced> {
        let target = self.path_for(video_id, thumbnail.media_type)?;
        let _guard = self.locks.lock(video_id).await;

        let moved = self.move_aside(video_id).await?;

        let temp = self.scratch_path(video_id, "tmp");
        if let Err(source) = write_atomically(&temp, &target, &thumbnail.data).await {
            if let Err(e) = remove_if_present(&temp).await {
                warn!(path = %temp.display(), "Failed to clean up temporary thumbnail: {}", e);
            }
            restore(&moved).await;
            return Err(StoreError::WriteFailed {
                video_id: video_id.to_string(),
                source,
            });
        }

        info!(
            path = %target.display(),
            video_id = %video_id,
            size_bytes = thumbnail.data.len(),
            "Thumbnail written"
        );

        Ok(Replaced(Displaced::Files(moved)))
    }

    async fn get(&self, video_id: &VideoId) -> StoreResult<Option<Thumbnail>> {
        let _guard = self.locks.lock(video_id).await;
        self.read_existing(video_id).await
    }

    async fn revert(&self, video_id: &VideoId, replaced: Replaced) -> StoreResult<()> {
        let _guard = self.locks.lock(video_id).await;
        self.remove_current(video_id).await?;
        if let Displaced::Files(moved) = replaced.0 {
            for (backup, original) in moved {
                fs::rename(&backup, &original)
                    .await
                    .map_err(|source| StoreError::WriteFailed {
                        video_id: video_id.to_string(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    async fn commit(&self, video_id: &VideoId, replaced: Replaced) -> StoreResult<()> {
        if let Displaced::Files(moved) = replaced.0 {
            for (backup, _) in moved {
                remove_if_present(&backup)
                    .await
                    .map_err(|source| StoreError::WriteFailed {
                        video_id: video_id.to_string(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    fn url_for(&self, video_id: &VideoId, media_type: MediaType) -> String {
        format!(
            "{}/assets/{}.{}",
            self.base_url,
            video_id,
            media_type.extension()
        )
    }
}
