use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::{non_blank, ok, positive_id, AppState};
use crate::error::ApiError;
use crate::lang::{detect_language, Language, UnknownLanguage};
use crate::models::*;
use crate::repo::{CastLogRepo, RepoError, SessionRepo, TranslationRepo, UserRepo};
use crate::telemetry;

fn language(code: &str) -> Result<Language, ApiError> {
    code.parse().map_err(|e: UnknownLanguage| ApiError::bad_request(e.to_string()))
}

fn optional_language(code: Option<String>) -> Result<Option<Language>, ApiError> {
    non_blank(code).map(|c| language(&c)).transpose()
}

fn source_type(v: Option<String>) -> Result<SourceType, ApiError> {
    match non_blank(v).as_deref() {
        Some("manual") => Ok(SourceType::Manual),
        Some("ai") => Ok(SourceType::Ai),
        _ => Err(ApiError::bad_request("sourceType must be 'manual' or 'ai'")),
    }
}

fn cast_status(v: Option<String>) -> Result<CastStatus, ApiError> {
    match non_blank(v).as_deref() {
        Some("success") => Ok(CastStatus::Success),
        Some("failed") => Ok(CastStatus::Failed),
        _ => Err(ApiError::bad_request("status must be 'success' or 'failed'")),
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub ok: bool,
    pub session_id: Id,
}

#[utoipa::path(
    post,
    path = "/api/sessions/create",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session stored", body = SessionCreated),
        (status = 400, description = "Invalid fid, sourceType or originalText")
    )
)]
pub async fn create_session(
    data: web::Data<AppState>,
    payload: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    let p = payload.into_inner();
    let fid = positive_id(p.fid, "fid")?;
    let source_type = source_type(p.source_type)?;
    let original_text = non_blank(p.original_text).ok_or_else(|| ApiError::bad_request("originalText is required"))?;
    let original_lang = match optional_language(p.original_lang)? {
        Some(lang) => Some(lang),
        None => detect_language(&original_text),
    };

    let session = data
        .repo
        .create_session(NewSession {
            fid,
            source_type,
            original_lang,
            original_text,
            ai_keywords: non_blank(p.ai_keywords),
            llm_request_id: non_blank(p.llm_request_id),
            image_type: p.image_type,
            image_url: non_blank(p.image_url),
            image_prompt: non_blank(p.image_prompt),
            image_metadata: p.image_metadata,
        })
        .await?;
    log::info!("session created id={} fid={fid} lang={:?}", session.id, session.original_lang);
    Ok(HttpResponse::Ok().json(SessionCreated { ok: true, session_id: session.id }))
}

#[utoipa::path(
    post,
    path = "/api/translations/save",
    request_body = SaveTranslationsRequest,
    responses(
        (status = 200, description = "Translations upserted"),
        (status = 400, description = "Invalid sessionId, empty list or unknown language"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn save_translations(
    data: web::Data<AppState>,
    payload: web::Json<SaveTranslationsRequest>,
) -> Result<HttpResponse, ApiError> {
    let p = payload.into_inner();
    let session_id = positive_id(p.session_id, "sessionId")?;
    let inputs = p.translations.unwrap_or_default();
    if inputs.is_empty() {
        return Err(ApiError::bad_request("translations must be a non-empty array"));
    }

    let mut rows = Vec::with_capacity(inputs.len());
    for t in inputs {
        let code = non_blank(t.target_lang).ok_or_else(|| ApiError::bad_request("targetLang is required"))?;
        let edited_text = t.edited_text;
        rows.push(TranslationUpsert {
            target_lang: language(&code)?,
            translated_text: t.translated_text,
            is_edited: t.is_edited.unwrap_or(edited_text.is_some()),
            edited_text,
            order_index: t.order_index,
        });
    }

    let saved = data.repo.upsert_translations(session_id, rows).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound("Session not found".into()),
        other => other.into(),
    })?;
    log::info!("saved {} translations for session {session_id}", saved.len());
    Ok(ok())
}

#[utoipa::path(
    post,
    path = "/api/log-cast",
    request_body = LogCastRequest,
    responses(
        (status = 200, description = "Cast attempt recorded"),
        (status = 400, description = "Invalid fid, targetLang, client or status")
    )
)]
pub async fn log_cast(data: web::Data<AppState>, payload: web::Json<LogCastRequest>) -> Result<HttpResponse, ApiError> {
    let p = payload.into_inner();
    let fid = positive_id(p.fid, "fid")?;
    let code = non_blank(p.target_lang).ok_or_else(|| ApiError::bad_request("targetLang is required"))?;
    let target_lang = language(&code)?;
    let client = non_blank(p.client).ok_or_else(|| ApiError::bad_request("client is required"))?;
    let status = cast_status(p.status)?;
    let posted_at = (status == CastStatus::Success).then(Utc::now);

    let entry = data
        .repo
        .insert_cast_log(NewCastLog {
            fid,
            session_id: p.session_id,
            translation_id: p.translation_id,
            target_lang,
            cast_hash: non_blank(p.cast_hash),
            cast_url: non_blank(p.cast_url),
            client,
            status,
            error_message: non_blank(p.error_message),
            posted_at,
        })
        .await?;
    telemetry::cast_logged(status.as_str());

    if let (CastStatus::Success, Some(translation_id)) = (status, p.translation_id) {
        if let Err(e) = data.repo.mark_translation_posted(translation_id).await {
            log::warn!("cast log {} saved but translation {translation_id} not marked posted: {e}", entry.id);
        }
    }
    Ok(ok())
}

#[utoipa::path(
    post,
    path = "/api/user/init",
    request_body = InitUserRequest,
    responses(
        (status = 200, description = "User upserted"),
        (status = 400, description = "Invalid fid or language code")
    )
)]
pub async fn init_user(data: web::Data<AppState>, payload: web::Json<InitUserRequest>) -> Result<HttpResponse, ApiError> {
    let p = payload.into_inner();
    let fid = positive_id(p.fid, "fid")?;
    let preferred_lang = optional_language(p.preferred_lang)?;
    let favorite_langs = p
        .favorite_langs
        .filter(|v| !v.is_empty())
        .map(|codes| codes.iter().map(|c| language(c)).collect::<Result<Vec<_>, _>>())
        .transpose()?;

    data.repo
        .upsert_user(UserUpsert {
            fid,
            username: non_blank(p.username),
            display_name: non_blank(p.display_name),
            pfp_url: non_blank(p.pfp_url),
            wallet: non_blank(p.wallet),
        })
        .await?;
    if preferred_lang.is_some() || favorite_langs.is_some() {
        data.repo.upsert_settings(SettingsUpsert { fid, preferred_lang, favorite_langs }).await?;
    }
    Ok(ok())
}

#[utoipa::path(
    get,
    path = "/api/user/{fid}",
    params(("fid" = i64, Path, description = "Farcaster id")),
    responses(
        (status = 200, description = "User and settings"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(data: web::Data<AppState>, path: web::Path<Fid>) -> Result<HttpResponse, ApiError> {
    let fid = positive_id(Some(path.into_inner()), "fid")?;
    let user = data.repo.get_user(fid).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound("User not found".into()),
        other => other.into(),
    })?;
    let settings = data.repo.get_settings(fid).await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "data": { "user": user, "settings": settings } })))
}
