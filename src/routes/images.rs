use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt as _;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;
use crate::app_config::ImageUrlMode;
use crate::error::ApiError;
use crate::rate_limit::Action;
use crate::telemetry;
use crate::text::decode_image_id;

pub const IMAGE_SIZE_LIMIT: usize = 10 * 1024 * 1024;
const ALLOWED_MIME: &[&str] = &["image/png", "image/jpeg", "image/jpg"];
const UPLOAD_FIELD: &str = "image";
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    /// Direct storage URL, or the proxy URL when the server runs in proxy mode.
    pub url: String,
    pub file_name: String,
    pub file_size: usize,
    pub proxy_url: String,
}

/// Sniffed type wins when recognisable; it must still be PNG or JPEG.
fn effective_mime(declared: &str, bytes: &[u8]) -> Result<String, ApiError> {
    match infer::get(bytes).map(|t| t.mime_type()) {
        Some(m @ ("image/png" | "image/jpeg")) => Ok(m.to_string()),
        Some(other) => {
            log::warn!("upload rejected: declared {declared} but content is {other}");
            Err(ApiError::bad_request("Only PNG and JPG images are allowed"))
        }
        None if declared == "image/jpg" => Ok("image/jpeg".into()),
        None => Ok(declared.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/api/upload-image",
    request_body(content = String, content_type = "multipart/form-data", description = "PNG or JPEG in field `image`, at most 10 MiB"),
    responses(
        (status = 200, description = "Stored", body = ImageUploadResponse),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn upload_image(
    req: HttpRequest,
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::warn!("multipart error: {e}");
        ApiError::bad_request("Malformed multipart body")
    })? {
        if field.content_disposition().get_name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "image".into());
        let declared = field.content_type().map(|m| m.essence_str().to_string()).unwrap_or_default();
        if !ALLOWED_MIME.contains(&declared.as_str()) {
            telemetry::upload("rejected");
            return Err(ApiError::bad_request("Only PNG and JPG images are allowed"));
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| {
            log::warn!("upload stream error: {e}");
            ApiError::bad_request("Malformed multipart body")
        })? {
            if bytes.len() + chunk.len() > IMAGE_SIZE_LIMIT {
                telemetry::upload("rejected");
                return Err(ApiError::bad_request("File size exceeds 10MB limit"));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            telemetry::upload("rejected");
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }
        let mime = effective_mime(&declared, &bytes)?;
        let file_size = bytes.len();
        data.check_rate(&req, Action::Upload)?;

        let stored = data.image_store.put(&file_name, &mime, bytes).await.map_err(|e| {
            log::error!("image store put failed name={file_name}: {e}");
            telemetry::upload("error");
            ApiError::Upstream("Failed to upload image")
        })?;
        telemetry::upload("ok");
        log::info!("stored upload key={} size={file_size}", stored.key);

        let proxy_url = data.config.proxy_url_for(&stored.url);
        let url = match data.config.image_url_mode {
            ImageUrlMode::Direct => stored.url,
            ImageUrlMode::Proxy => proxy_url.clone(),
        };
        return Ok(HttpResponse::Ok().json(ImageUploadResponse { url, file_name, file_size, proxy_url }));
    }
    Err(ApiError::bad_request("No file uploaded"))
}

#[utoipa::path(
    get,
    path = "/api/image/{id}",
    params(("id" = String, Path, description = "base64url of the backing image URL")),
    responses(
        (status = 200, description = "Image bytes with a long-lived cache header"),
        (status = 400, description = "Bad id, upstream is not an image or is over 10 MiB"),
        (status = 404, description = "Upstream did not return the image"),
        (status = 500, description = "Upstream unreachable")
    )
)]
pub async fn image_proxy(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let url = decode_image_id(&id).map_err(|e| {
        log::warn!("image proxy: bad id {id}: {e}");
        ApiError::bad_request("Invalid image id")
    })?;

    let mut resp = data.http.get(url.clone()).send().await.map_err(|e| {
        log::error!("image proxy fetch failed url={url}: {e}");
        telemetry::proxy_fetch("error");
        ApiError::Upstream("Failed to load image")
    })?;
    if !resp.status().is_success() {
        log::warn!("image proxy upstream {} for {url}", resp.status());
        telemetry::proxy_fetch("not_found");
        return Err(ApiError::NotFound("Image not found".into()));
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();
    if !content_type.starts_with("image/") {
        telemetry::proxy_fetch("not_image");
        return Err(ApiError::bad_request("Upstream content is not an image"));
    }
    if resp.content_length().is_some_and(|n| n > IMAGE_SIZE_LIMIT as u64) {
        log::warn!("image proxy: upstream declares {:?} bytes for {url}", resp.content_length());
        telemetry::proxy_fetch("too_large");
        return Err(ApiError::bad_request("Image exceeds 10MB limit"));
    }
    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(|e| {
        log::error!("image proxy body read failed url={url}: {e}");
        telemetry::proxy_fetch("error");
        ApiError::Upstream("Failed to load image")
    })? {
        if body.len() + chunk.len() > IMAGE_SIZE_LIMIT {
            log::warn!("image proxy: body from {url} passed the size limit");
            telemetry::proxy_fetch("too_large");
            return Err(ApiError::bad_request("Image exceeds 10MB limit"));
        }
        body.extend_from_slice(&chunk);
    }
    telemetry::proxy_fetch("ok");

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type))
        .insert_header((header::CACHE_CONTROL, IMMUTABLE_CACHE))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn sniffed_type_overrides_declared() {
        assert_eq!(effective_mime("image/jpeg", PNG_MAGIC).unwrap(), "image/png");
    }

    #[test]
    fn unknown_bytes_keep_declared_type() {
        assert_eq!(effective_mime("image/jpg", b"not sniffable").unwrap(), "image/jpeg");
        assert_eq!(effective_mime("image/png", b"not sniffable").unwrap(), "image/png");
    }

    #[test]
    fn non_image_content_is_rejected() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
        assert!(effective_mime("image/png", gif).is_err());
    }
}
