use actix_multipart::{Field, Multipart, MultipartError};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use crate::media::{UploadDescriptor, ValidationError, MAX_UPLOAD_SIZE};
use crate::web::ApiError;

/// Form field the thumbnail is uploaded under.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// A file part pulled out of the upload form.
#[derive(Debug)]
pub struct UploadedFile {
    pub media_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn descriptor(&self) -> UploadDescriptor<'_> {
        UploadDescriptor {
            size: self.data.len(),
            media_type: self.media_type.as_deref(),
        }
    }
}

fn is_thumbnail_file(field: &Field) -> bool {
    // Plain text parts carry no filename and do not count as a file.
    field.name() == Some(THUMBNAIL_FIELD)
        && field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some()
}

/// Reads the `thumbnail` file from a multipart form. Other parts are skipped.
///
/// Reading stops as soon as the part grows past [`MAX_UPLOAD_SIZE`], so oversize
/// uploads are never fully buffered.
pub async fn read_thumbnail_field(mut form: Multipart) -> Result<Option<UploadedFile>, ApiError> {
    let mut parts_seen = 0usize;
    while let Some(field) = form.next().await {
        let mut field = match field {
            Ok(field) => field,
            // A form with no parts at all ends up here; it simply has no file.
            Err(MultipartError::Incomplete) if parts_seen == 0 => return Ok(None),
            Err(e) => return Err(ApiError::BadRequest(format!("Couldn't parse form: {e}"))),
        };
        parts_seen += 1;

        if !is_thumbnail_file(&field) {
            continue;
        }

        let media_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string());

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ApiError::BadRequest(format!("Couldn't read thumbnail: {e}")))?;
            let size = data.len() + chunk.len();
            if size > MAX_UPLOAD_SIZE {
                return Err(ValidationError::PayloadTooLarge { size }.into());
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Some(UploadedFile {
            media_type,
            data: data.freeze(),
        }));
    }

    Ok(None)
}
