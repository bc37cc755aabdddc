use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::lang::Language;

pub type Id = i64;
/// Farcaster user id.
pub type Fid = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Manual,
    Ai,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Ai => "ai",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Uploaded,
    Generated,
}

impl ImageType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Uploaded => "uploaded",
            ImageType::Generated => "generated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CastStatus {
    Success,
    Failed,
}

impl CastStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CastStatus::Success => "success",
            CastStatus::Failed => "failed",
        }
    }
}

pub const SESSION_ACTIVE: &str = "active";
pub const TRANSLATION_DRAFT: &str = "draft";
pub const TRANSLATION_POSTED: &str = "posted";

// ---------------- stored rows ----------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub fid: Fid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub wallet: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub fid: Fid,
    pub preferred_lang: Option<String>,
    pub favorite_langs: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Id,
    pub fid: Fid,
    pub source_type: String,
    pub original_lang: Option<String>,
    pub original_text: String,
    pub ai_keywords: Option<String>,
    pub llm_request_id: Option<String>,
    pub image_type: Option<String>,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub image_metadata: Option<Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: Id,
    pub session_id: Id,
    pub target_lang: String,
    pub translated_text: Option<String>,
    pub edited_text: Option<String>,
    pub is_edited: bool,
    pub order_index: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CastLog {
    pub id: Id,
    pub fid: Fid,
    pub session_id: Option<Id>,
    pub translation_id: Option<Id>,
    pub target_lang: String,
    pub cast_hash: Option<String>,
    pub cast_url: Option<String>,
    pub client: String,
    pub status: String,
    pub error_message: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Cast log joined with its session and translation, newest first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: Id,
    pub target_lang: String,
    pub cast_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub original_text: Option<String>,
    pub image_url: Option<String>,
    pub translated_text: Option<String>,
    pub edited_text: Option<String>,
}

// ---------------- writes ----------------

#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    pub fid: Fid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub wallet: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsUpsert {
    pub fid: Fid,
    pub preferred_lang: Option<Language>,
    pub favorite_langs: Option<Vec<Language>>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub fid: Fid,
    pub source_type: SourceType,
    pub original_lang: Option<Language>,
    pub original_text: String,
    pub ai_keywords: Option<String>,
    pub llm_request_id: Option<String>,
    pub image_type: Option<ImageType>,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub image_metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct TranslationUpsert {
    pub target_lang: Language,
    pub translated_text: Option<String>,
    pub edited_text: Option<String>,
    pub is_edited: bool,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewCastLog {
    pub fid: Fid,
    pub session_id: Option<Id>,
    pub translation_id: Option<Id>,
    pub target_lang: Language,
    pub cast_hash: Option<String>,
    pub cast_url: Option<String>,
    pub client: String,
    pub status: CastStatus,
    pub error_message: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

// ---------------- request bodies ----------------
// Required fields are Options so handlers can answer with a precise 400.

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub topic: Option<String>,
    #[serde(alias = "tone")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TranslateMode {
    #[default]
    Batch,
    PerLanguage,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub target_languages: Option<Value>,
    pub style: Option<String>,
    #[serde(default)]
    pub mode: TranslateMode,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub fid: Option<Fid>,
    pub source_type: Option<String>,
    pub original_lang: Option<String>,
    pub original_text: Option<String>,
    pub ai_keywords: Option<String>,
    #[serde(alias = "flockRequestId")]
    pub llm_request_id: Option<String>,
    pub image_type: Option<ImageType>,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub image_metadata: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslationInput {
    pub target_lang: Option<String>,
    pub translated_text: Option<String>,
    pub edited_text: Option<String>,
    pub is_edited: Option<bool>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveTranslationsRequest {
    pub session_id: Option<Id>,
    pub translations: Option<Vec<TranslationInput>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogCastRequest {
    pub fid: Option<Fid>,
    pub session_id: Option<Id>,
    pub translation_id: Option<Id>,
    pub target_lang: Option<String>,
    pub cast_hash: Option<String>,
    pub cast_url: Option<String>,
    pub client: Option<String>,
    pub status: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitUserRequest {
    pub fid: Option<Fid>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub wallet: Option<String>,
    pub preferred_lang: Option<String>,
    pub favorite_langs: Option<Vec<String>>,
}
