use std::collections::BTreeMap;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{non_blank, AppState};
use crate::error::ApiError;
use crate::lang::{Language, Style};
use crate::models::{GenerateRequest, TranslateMode, TranslateRequest};
use crate::prompts;
use crate::rate_limit::Action;
use crate::telemetry;
use crate::text::{char_count, preview, strip_json_fence};

/// Upper bound on languages per translate request.
pub const MAX_TARGET_LANGUAGES: usize = 5;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub original_text: String,
    pub preview_text: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedText {
    pub text: String,
    pub preview_text: String,
    pub char_count: usize,
}

impl TranslatedText {
    fn new(text: &str) -> Self {
        let text = text.trim().to_string();
        Self { preview_text: preview(&text), char_count: char_count(&text), text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// One language's result in `per-language` mode.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOutcome {
    pub target_lang: Language,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslatedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranslateResponse {
    /// Keyed by language code.
    pub translations: BTreeMap<String, TranslatedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<LanguageOutcome>>,
}

#[utoipa::path(
    post,
    path = "/api/generate-original",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated cast", body = GenerateResponse),
        (status = 400, description = "Missing topic or unknown style"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Model call failed")
    )
)]
pub async fn generate_original(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ApiError> {
    let GenerateRequest { topic, style } = payload.into_inner();
    let (Some(topic), Some(style)) = (non_blank(topic), non_blank(style)) else {
        return Err(ApiError::bad_request("Topic and style are required"));
    };
    let style: Style = style.parse().map_err(|e: crate::lang::UnknownStyle| ApiError::bad_request(e.to_string()))?;
    data.check_rate(&req, Action::Generate)?;

    let text = data.llm.complete(prompts::generate_original(&topic, style)).await.map_err(|e| {
        log::error!("generate-original upstream error: {e}");
        telemetry::llm_call("generate", "error");
        ApiError::Upstream("Failed to generate original text")
    })?;
    telemetry::llm_call("generate", "ok");

    let original_text = text.trim().to_string();
    Ok(HttpResponse::Ok().json(GenerateResponse { preview_text: preview(&original_text), original_text }))
}

/// Validates `targetLanguages`; duplicates collapse onto their first position.
fn parse_targets(raw: Option<Value>) -> Result<Vec<Language>, ApiError> {
    let Some(Value::Array(items)) = raw else {
        return Err(ApiError::bad_request("targetLanguages must be a non-empty array of language codes"));
    };
    let mut targets = Vec::with_capacity(items.len());
    for item in items {
        let code = item
            .as_str()
            .ok_or_else(|| ApiError::bad_request("targetLanguages must contain language codes"))?;
        let lang: Language = code.parse().map_err(|e: crate::lang::UnknownLanguage| ApiError::bad_request(e.to_string()))?;
        if !targets.contains(&lang) {
            targets.push(lang);
        }
    }
    if targets.is_empty() {
        return Err(ApiError::bad_request("targetLanguages must be a non-empty array of language codes"));
    }
    if targets.len() > MAX_TARGET_LANGUAGES {
        return Err(ApiError::bad_request(format!("At most {MAX_TARGET_LANGUAGES} target languages per request")));
    }
    Ok(targets)
}

/// Parses the model's JSON object; keys are lower-cased so `"JA"` still matches.
fn parse_translation_object(raw: &str) -> Result<Map<String, Value>, serde_json::Error> {
    let obj: Map<String, Value> = serde_json::from_str(strip_json_fence(raw))?;
    Ok(obj.into_iter().map(|(k, v)| (k.trim().to_ascii_lowercase(), v)).collect())
}

#[utoipa::path(
    post,
    path = "/api/translate",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translations keyed by lower-case language code; `KO` comes back as `ko`", body = TranslateResponse),
        (status = 400, description = "Missing text or invalid targetLanguages"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Model call failed or returned unparseable JSON")
    )
)]
/// Target codes are matched case-insensitively and the response is keyed by
/// their canonical lower-case form.
pub async fn translate(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<TranslateRequest>,
) -> Result<HttpResponse, ApiError> {
    let TranslateRequest { text, target_languages, style, mode } = payload.into_inner();
    let text = non_blank(text).ok_or_else(|| ApiError::bad_request("Text is required"))?;
    let targets = parse_targets(target_languages)?;
    let style = style.and_then(|s| s.parse::<Style>().ok()).unwrap_or_default();
    data.check_rate(&req, Action::Translate)?;

    let body = match mode {
        TranslateMode::Batch => translate_batch(&data, &text, &targets, style).await?,
        TranslateMode::PerLanguage => translate_each(&data, &text, &targets, style).await,
    };
    Ok(HttpResponse::Ok().json(body))
}

async fn translate_batch(
    data: &AppState,
    text: &str,
    targets: &[Language],
    style: Style,
) -> Result<TranslateResponse, ApiError> {
    let raw = data.llm.complete(prompts::translate_batch(text, targets, style)).await.map_err(|e| {
        log::error!("translate upstream error: {e}");
        telemetry::llm_call("translate", "error");
        ApiError::Upstream("Translation request failed")
    })?;
    let parsed = parse_translation_object(&raw).map_err(|e| {
        log::error!("translate: model output is not a JSON object: {e}; raw={raw}");
        telemetry::llm_call("translate", "bad_json");
        ApiError::Upstream("Failed to parse translation result")
    })?;
    telemetry::llm_call("translate", "ok");

    let translations = targets
        .iter()
        .map(|lang| {
            let value = parsed.get(lang.code()).and_then(Value::as_str).unwrap_or("");
            if value.is_empty() {
                log::warn!("translate: model omitted {lang}");
            }
            (lang.code().to_string(), TranslatedText::new(value))
        })
        .collect();
    Ok(TranslateResponse { translations, results: None })
}

async fn translate_each(data: &AppState, text: &str, targets: &[Language], style: Style) -> TranslateResponse {
    let mut translations = BTreeMap::new();
    let mut results = Vec::with_capacity(targets.len());
    for &lang in targets {
        let outcome = match data.llm.complete(prompts::translate_single(text, lang, style)).await {
            Ok(out) if !out.trim().is_empty() => {
                telemetry::llm_call("translate_single", "ok");
                let translation = TranslatedText::new(&out);
                translations.insert(lang.code().to_string(), translation.clone());
                LanguageOutcome { target_lang: lang, status: OutcomeStatus::Success, translation: Some(translation), error: None }
            }
            Ok(_) => {
                log::warn!("translate {lang}: model returned no text");
                telemetry::llm_call("translate_single", "empty");
                LanguageOutcome {
                    target_lang: lang,
                    status: OutcomeStatus::Failed,
                    translation: None,
                    error: Some("Model returned no text".into()),
                }
            }
            Err(e) => {
                log::error!("translate {lang} upstream error: {e}");
                telemetry::llm_call("translate_single", "error");
                LanguageOutcome {
                    target_lang: lang,
                    status: OutcomeStatus::Failed,
                    translation: None,
                    error: Some("Translation request failed".into()),
                }
            }
        };
        results.push(outcome);
    }
    TranslateResponse { translations, results: Some(results) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn targets_must_be_an_array() {
        assert!(parse_targets(None).is_err());
        assert!(parse_targets(Some(json!("ja"))).is_err());
        assert!(parse_targets(Some(json!([]))).is_err());
        assert!(parse_targets(Some(json!([1]))).is_err());
    }

    #[test]
    fn targets_dedupe_and_cap() {
        let t = parse_targets(Some(json!(["ja", "KO", "ja"]))).unwrap();
        assert_eq!(t, vec![Language::Ja, Language::Ko]);
        assert!(parse_targets(Some(json!(["en", "ja", "ko", "zh", "es", "fr"]))).is_err());
        assert!(parse_targets(Some(json!(["xx"]))).is_err());
    }

    #[test]
    fn object_keys_are_normalised() {
        let m = parse_translation_object("```json\n{\"JA\": \"こんにちは\"}\n```").unwrap();
        assert_eq!(m["ja"], "こんにちは");
        assert!(parse_translation_object("[\"ja\"]").is_err());
    }
}
