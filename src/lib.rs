pub mod app_config;
pub mod error;
pub mod lang;
pub mod leaderboard;
pub mod llm;
pub mod models;
pub mod openapi;
pub mod prompts;
pub mod rate_limit;
pub mod repo;
pub mod routes;
pub mod security;
pub mod storage; // S3-compatible object storage for uploads
pub mod telemetry;
pub mod text;

// Re-export commonly used items for tests / external users
pub use app_config::AppConfig;
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
