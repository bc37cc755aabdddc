#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use polycast::llm::FlockClient;
use polycast::repo::inmem::InMemRepo;
use polycast::storage::{ImageStore, ImageStoreError, StoredImage};
use polycast::{AppConfig, AppState};
use serde_json::{json, Value};

pub const UNUSED_LLM: &str = "http://127.0.0.1:9/v1/chat/completions";

// ---------------- In-memory Mock ImageStore (tests only) ----------------
#[derive(Default)]
pub struct MockImageStore {
    pub puts: Mutex<Vec<(String, String, usize)>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl ImageStore for MockImageStore {
    async fn put(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<StoredImage, ImageStoreError> {
        if self.fail {
            return Err(ImageStoreError::Other("NoSuchBucket (bucket missing)".into()));
        }
        let key = format!("uploads/{file_name}");
        self.puts.lock().unwrap().push((key.clone(), mime.to_string(), bytes.len()));
        Ok(StoredImage { url: format!("https://blob.test/{key}"), key })
    }
}

pub fn test_config(llm_endpoint: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.llm.endpoint = llm_endpoint.to_string();
    cfg.llm.api_key = "test-key".into();
    cfg.llm.timeout = Duration::from_secs(5);
    cfg.public_base_url = "https://polycast.test".into();
    cfg
}

pub struct TestCtx {
    pub repo: InMemRepo,
    pub images: Arc<MockImageStore>,
    pub state: AppState,
}

pub fn ctx_with(cfg: AppConfig, images: MockImageStore) -> TestCtx {
    let repo = InMemRepo::new();
    let images = Arc::new(images);
    let state = AppState {
        repo: Arc::new(repo.clone()),
        image_store: images.clone(),
        llm: Arc::new(FlockClient::new(&cfg.llm).unwrap()),
        http: reqwest::Client::new(),
        config: Arc::new(cfg),
        rate_limiter: None,
        metrics: None,
    };
    TestCtx { repo, images, state }
}

pub fn ctx(llm_endpoint: &str) -> TestCtx {
    ctx_with(test_config(llm_endpoint), MockImageStore::default())
}

/// Body of an OpenAI-style chat completion answer.
pub fn completion(content: &str) -> Value {
    json!({ "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }] })
}

// Helper to build a multipart body with provided bytes and filename
pub fn build_multipart(field: &str, file_name: &str, content_type: &str, bytes: &[u8], boundary: &str) -> (String, Vec<u8>) {
    let mut body: Vec<u8> = Vec::new();
    let disp = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    );
    body.extend_from_slice(disp.as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

// Minimal 1x1 PNG (transparent)
pub fn sample_png() -> Vec<u8> {
    vec![
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, // signature
        0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R', 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, b'I',
        b'D', b'A', b'T', 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A,
        0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82,
    ]
}
