use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::app_config::StorageConfig;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("other: {0}")]
    Other(String),
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    /// Publicly fetchable URL of the object.
    pub url: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<StoredImage, ImageStoreError>;
}

/// Keeps the user's file name readable in the key while making it unique.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() || c.is_whitespace() { '-' } else { c })
        .collect();
    let cleaned = if cleaned.is_empty() { "image".to_string() } else { cleaned };
    format!("{prefix}/{}-{cleaned}", uuid::Uuid::new_v4())
}

/// Percent-encodes each path segment of an object key.
pub fn public_url(base: &str, key: &str) -> String {
    let path = key.split('/').map(|seg| urlencoding::encode(seg).into_owned()).collect::<Vec<_>>().join("/");
    format!("{}/{}", base.trim_end_matches('/'), path)
}

// ---------------- S3 Implementation (AWS or MinIO-compatible) ----------------
pub struct S3ImageStore {
    bucket: String,
    client: aws_sdk_s3::Client,
    prefix: String,
    public_base: String,
}

impl S3ImageStore {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        use aws_credential_types::provider::SharedCredentialsProvider;
        use aws_credential_types::Credentials;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(cfg.region.clone()));
        if let Some(endpoint) = &cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if !cfg.access_key.is_empty() && !cfg.secret_key.is_empty() {
            let creds = Credentials::new(cfg.access_key.clone(), cfg.secret_key.clone(), None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(creds));
        }
        let conf = loader.load().await;
        // Path-style addressing for custom endpoints (MinIO has no wildcard DNS)
        let s3_conf = aws_sdk_s3::config::Builder::from(&conf)
            .force_path_style(cfg.endpoint.is_some())
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_conf);

        let public_base = match (&cfg.public_url, &cfg.endpoint) {
            (Some(url), _) => url.clone(),
            (None, Some(endpoint)) => format!("{}/{}", endpoint.trim_end_matches('/'), cfg.bucket),
            (None, None) => format!("https://{}.s3.{}.amazonaws.com", cfg.bucket, cfg.region),
        };
        info!("Initialized S3 image store bucket='{}' public_base='{public_base}'", cfg.bucket);

        if let Err(e) = client.head_bucket().bucket(&cfg.bucket).send().await {
            // uploads will fail loudly later; the server can still answer non-image routes
            warn!("head_bucket failed for '{}': {e:?}", cfg.bucket);
        }

        Ok(Self {
            bucket: cfg.bucket.clone(),
            client,
            prefix: "uploads".into(),
            public_base,
        })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<StoredImage, ImageStoreError> {
        use aws_sdk_s3::primitives::ByteStream;
        let key = object_key(&self.prefix, file_name);
        let put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(mime)
            .cache_control("public, max-age=31536000, immutable");
        if let Err(e) = put.send().await {
            error!("put_object failed key={key} bucket={} err={:?}", self.bucket, e);
            let hint = if e.to_string().contains("NoSuchBucket") {
                " (bucket missing)"
            } else if e.to_string().contains("AccessDenied") {
                " (check S3_ACCESS_KEY/S3_SECRET_KEY permissions)"
            } else {
                ""
            };
            return Err(ImageStoreError::Other(format!("{e}{hint}")));
        }
        Ok(StoredImage { url: public_url(&self.public_base, &key), key })
    }
}

pub async fn build_image_store(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn ImageStore>> {
    Ok(Arc::new(S3ImageStore::new(cfg).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_unique_and_flat() {
        let a = object_key("uploads", "my cat/pic.png");
        let b = object_key("uploads", "my cat/pic.png");
        assert_ne!(a, b);
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("-my-cat-pic.png"));
        assert_eq!(a.matches('/').count(), 1);
    }

    #[test]
    fn blank_name_gets_placeholder() {
        assert!(object_key("uploads", "  ").ends_with("-image"));
    }

    #[test]
    fn url_encodes_segments_only() {
        let url = public_url("https://cdn.example/", "uploads/사진.png");
        assert_eq!(url, "https://cdn.example/uploads/%EC%82%AC%EC%A7%84.png");
    }
}
