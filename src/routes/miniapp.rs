use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::{ok, AppState};
use crate::error::ApiError;

const APP_NAME: &str = "PolyCast";
const TAGLINE: &str = "One Cast, Many Languages";
const DESCRIPTION: &str =
    "Write once, cast to the world. Translate your Farcaster posts into many languages in one click.";

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountAssociation {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppSection {
    pub version: String,
    pub name: String,
    pub home_url: String,
    pub icon_url: String,
    pub splash_image_url: String,
    pub splash_background_color: String,
    pub webhook_url: String,
    pub subtitle: String,
    pub description: String,
    pub primary_category: String,
    pub tags: Vec<String>,
    pub hero_image_url: String,
    pub tagline: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub account_association: AccountAssociation,
    pub miniapp: MiniAppSection,
}

impl Manifest {
    /// Asset and webhook URLs hang off the public base URL.
    pub fn for_base(base: &str, association: AccountAssociation) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            account_association: association,
            miniapp: MiniAppSection {
                version: "1".into(),
                name: APP_NAME.into(),
                home_url: format!("{base}/"),
                icon_url: format!("{base}/icon.png"),
                splash_image_url: format!("{base}/splash.png"),
                splash_background_color: "#0F172A".into(),
                webhook_url: format!("{base}/api/webhook"),
                subtitle: TAGLINE.into(),
                description: DESCRIPTION.into(),
                primary_category: "social".into(),
                tags: ["polycast", "miniapp", "translation", "base"].map(String::from).to_vec(),
                hero_image_url: format!("{base}/og.png"),
                tagline: TAGLINE.into(),
                og_title: format!("{APP_NAME} - Global Farcaster Casting"),
                og_description: "Translate and cast in many languages with one click.".into(),
                og_image_url: format!("{base}/og.png"),
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/webhook",
    responses((status = 200, description = "Liveness probe for the Mini App host"))
)]
pub async fn webhook_alive() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true, "message": "Webhook alive" }))
}

#[utoipa::path(
    post,
    path = "/api/webhook",
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Body is not JSON")
    )
)]
pub async fn webhook_event(body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let event: Value = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("webhook: unparseable body: {e}");
        ApiError::bad_request("Invalid webhook payload")
    })?;
    let kind = event.get("event").and_then(Value::as_str).unwrap_or("unknown");
    log::info!("webhook event={kind} body={event}");
    Ok(ok())
}

#[utoipa::path(
    get,
    path = "/.well-known/farcaster.json",
    responses((status = 200, description = "Mini App manifest", body = Manifest))
)]
pub async fn manifest(data: web::Data<AppState>) -> HttpResponse {
    let m = &data.config.manifest;
    let association = AccountAssociation {
        header: m.account_header.clone(),
        payload: m.account_payload.clone(),
        signature: m.account_signature.clone(),
    };
    HttpResponse::Ok().json(Manifest::for_base(&data.config.public_base_url, association))
}

pub async fn metrics(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let handle = data.metrics.as_ref().ok_or_else(|| ApiError::NotFound("metrics disabled".into()))?;
    Ok(HttpResponse::Ok().content_type("text/plain; version=0.0.4").body(handle.render()))
}
