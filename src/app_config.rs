use std::time::Duration;

use crate::rate_limit::{Limit, RateLimitConfig};

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.flock.io/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "qwen3-235b-a22b-instruct-2507";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct StorageConfig {
    pub bucket: String,
    /// None means plain AWS S3; set for MinIO and other S3-compatible hosts.
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    /// Public base that object keys are appended to when building direct URLs.
    pub public_url: Option<String>,
}

/// What `upload-image` hands back as `url`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImageUrlMode {
    #[default]
    Direct,
    Proxy,
}

#[derive(Clone, Debug, Default)]
pub struct ManifestConfig {
    pub account_header: String,
    pub account_payload: String,
    pub account_signature: String,
}

#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    pub enable_hsts: bool,
    /// Origins allowed to frame the app; empty means no framing at all.
    pub frame_ancestors: Vec<String>,
}

/// Everything read from the process environment, resolved once at start and
/// handed to handlers through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub storage: StorageConfig,
    pub image_url_mode: ImageUrlMode,
    pub proxy_timeout: Duration,
    pub metrics_enabled: bool,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
    pub manifest: ManifestConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            public_base_url: "http://localhost:8080".into(),
            cors_origins: vec!["http://localhost:3000".into(), "http://127.0.0.1:3000".into()],
            llm: LlmConfig {
                endpoint: DEFAULT_LLM_ENDPOINT.into(),
                api_key: String::new(),
                model: DEFAULT_LLM_MODEL.into(),
                timeout: Duration::from_secs(60),
            },
            database_url: None,
            db_max_connections: 5,
            run_migrations: false,
            storage: StorageConfig {
                bucket: "polycast-images".into(),
                region: "us-east-1".into(),
                ..StorageConfig::default()
            },
            image_url_mode: ImageUrlMode::Direct,
            proxy_timeout: Duration::from_secs(15),
            metrics_enabled: true,
            rate_limit: RateLimitConfig::default(),
            security: SecurityConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn flag(name: &str, default: bool) -> bool {
    var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(default)
}

fn list(name: &str) -> Vec<String> {
    var(name)
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        None => Ok(default),
    }
}

fn limit(max_var: &'static str, window_var: &'static str, default: Limit) -> Result<Limit, ConfigError> {
    let max = parsed(max_var, default.max)?;
    let window = Duration::from_secs(parsed(window_var, default.window.as_secs())?);
    if max == 0 || window.is_zero() {
        let name = if max == 0 { max_var } else { window_var };
        return Err(ConfigError::Invalid { name, value: var(name).unwrap_or_default() });
    }
    Ok(Limit { max, window })
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or(d.public_base_url)
            .trim_end_matches('/')
            .to_string();

        let mut cors_origins = d.cors_origins;
        if let Some(front) = var("FRONTEND_URL") {
            cors_origins.push(front);
        }
        cors_origins.extend(list("CORS_ORIGINS"));

        let llm = LlmConfig {
            endpoint: var("FLOCK_API_URL").unwrap_or(d.llm.endpoint),
            api_key: var("FLOCK_API_KEY").ok_or(ConfigError::Missing("FLOCK_API_KEY"))?,
            model: var("FLOCK_MODEL").unwrap_or(d.llm.model),
            timeout: Duration::from_secs(parsed("LLM_TIMEOUT_SECS", 60u64)?),
        };

        let storage = StorageConfig {
            bucket: var("S3_BUCKET").unwrap_or(d.storage.bucket),
            endpoint: var("S3_ENDPOINT"),
            region: var("S3_REGION").unwrap_or(d.storage.region),
            access_key: var("S3_ACCESS_KEY").unwrap_or_default(),
            secret_key: var("S3_SECRET_KEY").unwrap_or_default(),
            public_url: var("S3_PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string()),
        };

        let image_url_mode = match var("IMAGE_URL_MODE").as_deref() {
            None | Some("direct") => ImageUrlMode::Direct,
            Some("proxy") => ImageUrlMode::Proxy,
            Some(other) => {
                return Err(ConfigError::Invalid { name: "IMAGE_URL_MODE", value: other.to_string() })
            }
        };

        let rl = d.rate_limit;
        let rate_limit = RateLimitConfig {
            enabled: flag("RATE_LIMIT_ENABLED", rl.enabled),
            generate: limit("RL_GENERATE_LIMIT", "RL_GENERATE_WINDOW", rl.generate)?,
            translate: limit("RL_TRANSLATE_LIMIT", "RL_TRANSLATE_WINDOW", rl.translate)?,
            upload: limit("RL_UPLOAD_LIMIT", "RL_UPLOAD_WINDOW", rl.upload)?,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(d.bind_addr),
            public_base_url,
            cors_origins,
            llm,
            database_url: var("DATABASE_URL"),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", d.db_max_connections)?,
            run_migrations: flag("RUN_MIGRATIONS", false),
            storage,
            image_url_mode,
            proxy_timeout: Duration::from_secs(parsed("IMAGE_PROXY_TIMEOUT_SECS", 15u64)?),
            metrics_enabled: flag("METRICS_ENABLED", true),
            rate_limit,
            security: SecurityConfig {
                enable_hsts: flag("ENABLE_HSTS", false),
                frame_ancestors: list("FRAME_ANCESTORS"),
            },
            manifest: ManifestConfig {
                account_header: var("FARCASTER_HEADER").unwrap_or_default(),
                account_payload: var("FARCASTER_PAYLOAD").unwrap_or_default(),
                account_signature: var("FARCASTER_SIGNATURE").unwrap_or_default(),
            },
        })
    }

    /// Path under which `GET /api/image/{id}` serves `blob_url`.
    pub fn proxy_url_for(&self, blob_url: &str) -> String {
        format!("{}/api/image/{}", self.public_base_url, crate::text::encode_image_id(blob_url))
    }
}
