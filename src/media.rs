use std::fmt;

use thiserror::Error;

/// Largest accepted thumbnail, in bytes (10 MiB). Uploads of exactly this size pass.
pub const MAX_UPLOAD_SIZE: usize = 10 << 20;

/// Image formats accepted for thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    pub const ALL: [MediaType; 2] = [MediaType::Png, MediaType::Jpeg];

    /// Matches the MIME essence exactly; anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" => Some(MediaType::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
        }
    }

    /// File extension used by the filesystem store. Never derived from client input.
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Png => "png",
            MediaType::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the validator needs to know about an uploaded file.
#[derive(Debug, Clone, Copy)]
pub struct UploadDescriptor<'a> {
    pub size: usize,
    pub media_type: Option<&'a str>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Thumbnail file missing")]
    MissingFile,

    #[error("Thumbnail size should be at most 10MB (got {size} bytes)")]
    PayloadTooLarge { size: usize },

    #[error("Unsupported file type: {}", .0.as_deref().unwrap_or("none"))]
    UnsupportedMediaType(Option<String>),
}

/// Checks presence, then size, then media type.
pub fn validate(file: Option<&UploadDescriptor<'_>>) -> Result<MediaType, ValidationError> {
    let file = file.ok_or(ValidationError::MissingFile)?;

    if file.size > MAX_UPLOAD_SIZE {
        return Err(ValidationError::PayloadTooLarge { size: file.size });
    }

    file.media_type
        .and_then(MediaType::parse)
        .ok_or_else(|| ValidationError::UnsupportedMediaType(file.media_type.map(str::to_owned)))
}
