use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{positive_id, AppState};
use crate::error::ApiError;
use crate::leaderboard::{self, LeaderboardEntry};
use crate::models::{ActivityRow, CastStatus, Fid, Id};
use crate::repo::{CastLogRepo, UserRepo};

pub const RECENT_DEFAULT_LIMIT: usize = 20;
pub const RECENT_MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub fid: Option<Fid>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Id,
    pub target_lang: String,
    pub cast_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub original_text: Option<String>,
    pub image_url: Option<String>,
    /// Edited text when the user changed the translation before posting.
    pub translated_text: Option<String>,
}

impl From<ActivityRow> for Activity {
    fn from(r: ActivityRow) -> Self {
        Self {
            id: r.id,
            target_lang: r.target_lang,
            cast_url: r.cast_url,
            posted_at: r.posted_at,
            status: r.status,
            original_text: r.original_text,
            image_url: r.image_url,
            translated_text: r.edited_text.or(r.translated_text),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    params(("limit" = Option<usize>, Query, description = "Entries to return (default 50, max 100)")),
    responses(
        (status = 200, description = "Ranked users", body = [LeaderboardEntry])
    )
)]
pub async fn leaderboard(data: web::Data<AppState>, query: web::Query<LeaderboardQuery>) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(leaderboard::DEFAULT_LIMIT).min(leaderboard::MAX_LIMIT);
    let logs = data.repo.cast_logs_with_status(CastStatus::Success).await?;
    let tallies = leaderboard::tally(&logs);
    let fids: Vec<Fid> = tallies.keys().copied().collect();
    let users = if fids.is_empty() { Vec::new() } else { data.repo.users_by_fids(&fids).await? };
    let entries = leaderboard::rank(tallies, &users, limit);
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "data": entries })))
}

#[utoipa::path(
    get,
    path = "/api/recent-activities",
    params(
        ("fid" = i64, Query, description = "Farcaster id"),
        ("limit" = Option<usize>, Query, description = "Entries to return (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Newest cast logs first", body = [Activity]),
        (status = 400, description = "Missing fid")
    )
)]
pub async fn recent_activities(data: web::Data<AppState>, query: web::Query<RecentQuery>) -> Result<HttpResponse, ApiError> {
    let fid = positive_id(query.fid, "fid")?;
    let limit = query.limit.unwrap_or(RECENT_DEFAULT_LIMIT).min(RECENT_MAX_LIMIT);
    let rows = data.repo.recent_activities(fid, limit as i64).await?;
    let activities: Vec<Activity> = rows.into_iter().map(Activity::from).collect();
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "data": activities })))
}
