use actix_multipart::Multipart;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use tracing::{error, info, warn};

use crate::auth::{authorize, get_bearer_token, verify_token, Access};
use crate::media::validate;
use crate::storage::Thumbnail;
use crate::videos::{Video, VideoId};
use crate::web::models::{AppState, CreateVideoRequest};
use crate::web::thumbnails::{read_thumbnail_field, UploadedFile};
use crate::web::ApiError;

fn authenticate(req: &HttpRequest, state: &AppState) -> Result<String, ApiError> {
    let token = get_bearer_token(req.headers())?;
    Ok(verify_token(token, &state.jwt_secret)?)
}

// Upload a thumbnail for a video the caller owns
#[post("/api/videos/{video_id}/thumbnail")]
pub async fn upload_thumbnail(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    form: Multipart,
) -> Result<HttpResponse, ApiError> {
    let video_id: VideoId = path
        .into_inner()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid video ID".to_string()))?;

    let video = state
        .videos
        .get(&video_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::BadRequest("Couldn't find video".to_string()))?;

    let user_id = authenticate(&req, &state)?;

    // Ownership is settled before anything is written.
    if authorize(&video, &user_id) == Access::Forbidden {
        warn!(video_id = %video_id, user_id = %user_id, "Rejected thumbnail upload from non-owner");
        return Err(ApiError::Forbidden(
            "Authorized user has no access to this video".to_string(),
        ));
    }

    info!(video_id = %video_id, user_id = %user_id, "Uploading thumbnail");

    let upload = read_thumbnail_field(form).await?;
    let media_type = validate(upload.as_ref().map(UploadedFile::descriptor).as_ref())?;
    let data = upload.map(|file| file.data).unwrap_or_default();
    let size = data.len();

    // The write, the record update and any revert happen as one unit per video.
    let _upload = state.upload_locks.lock(&video_id).await;

    let current = state
        .videos
        .get(&video_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::BadRequest("Couldn't find video".to_string()))?;

    let replaced = state
        .thumbnails
        .put(&video_id, Thumbnail::new(data, media_type))
        .await?;

    let thumbnail_url = state.thumbnails.url_for(&video_id, media_type);
    let updated = current.with_thumbnail_url(thumbnail_url);

    if let Err(e) = state.videos.update(&updated).await {
        error!(video_id = %video_id, "Failed to update video, reverting thumbnail: {:#}", e);
        if let Err(revert_error) = state.thumbnails.revert(&video_id, replaced).await {
            error!(video_id = %video_id, "Thumbnail revert failed: {}", revert_error);
        }
        return Err(ApiError::Internal(e));
    }

    if let Err(e) = state.thumbnails.commit(&video_id, replaced).await {
        warn!(video_id = %video_id, "Failed to discard replaced thumbnail: {}", e);
    }

    info!(
        video_id = %video_id,
        media_type = %media_type,
        size_bytes = size,
        "Thumbnail saved"
    );

    Ok(HttpResponse::Ok().json(updated))
}

// Serve a stored thumbnail
#[get("/api/thumbnails/{video_id}")]
pub async fn get_thumbnail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id: VideoId = path
        .into_inner()
        .parse()
        .map_err(|_| ApiError::NotFound("Couldn't find video".to_string()))?;

    if state
        .videos
        .get(&video_id)
        .await
        .map_err(ApiError::internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Couldn't find video".to_string()));
    }

    let thumbnail = state
        .thumbnails
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Thumbnail not found".to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type(thumbnail.media_type.as_str())
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .body(thumbnail.data))
}

#[post("/api/videos")]
pub async fn create_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateVideoRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = authenticate(&req, &state)?;
    let body = body.into_inner();

    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let video = state
        .videos
        .create(Video::new(user_id, body.title, body.description))
        .await
        .map_err(ApiError::internal)?;

    info!(video_id = %video.id, user_id = %video.user_id, "Video created");
    Ok(HttpResponse::Created().json(video))
}

#[get("/api/videos/{video_id}")]
pub async fn get_video(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Couldn't find video".to_string());
    let video_id: VideoId = path.into_inner().parse().map_err(|_| not_found())?;

    let video = state
        .videos
        .get(&video_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(video))
}
