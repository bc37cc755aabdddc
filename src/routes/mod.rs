use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

use crate::app_config::AppConfig;
use crate::error::ApiError;
use crate::llm::ChatCompletion;
use crate::rate_limit::{Action, RateLimiterFacade};
use crate::repo::Repo;
use crate::storage::ImageStore;

pub mod compose;
pub mod images;
pub mod miniapp;
pub mod records;
pub mod stats;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(256 * 1024).error_handler(|err, _| {
        ApiError::bad_request(format!("Invalid JSON body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        ApiError::bad_request(format!("Invalid query string: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        ApiError::bad_request(format!("Invalid path parameter: {err}")).into()
    }));

    cfg.service(
        web::scope("/api")
            .service(web::resource("/generate-original").route(web::post().to(compose::generate_original)))
            .service(web::resource("/translate").route(web::post().to(compose::translate)))
            .service(web::resource("/upload-image").route(web::post().to(images::upload_image)))
            .service(web::resource("/image/{id}").route(web::get().to(images::image_proxy)))
            .service(web::resource("/sessions/create").route(web::post().to(records::create_session)))
            .service(web::resource("/translations/save").route(web::post().to(records::save_translations)))
            .service(web::resource("/log-cast").route(web::post().to(records::log_cast)))
            .service(web::resource("/user/init").route(web::post().to(records::init_user)))
            .service(web::resource("/user/{fid}").route(web::get().to(records::get_user)))
            .service(web::resource("/leaderboard").route(web::get().to(stats::leaderboard)))
            .service(web::resource("/recent-activities").route(web::get().to(stats::recent_activities)))
            .service(
                web::resource("/webhook")
                    .route(web::get().to(miniapp::webhook_alive))
                    .route(web::post().to(miniapp::webhook_event)),
            ),
    );
    // Mini App hosts look for the manifest at the domain root
    cfg.route("/.well-known/farcaster.json", web::get().to(miniapp::manifest));
    cfg.route("/metrics", web::get().to(miniapp::metrics));
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub image_store: Arc<dyn ImageStore>,
    pub llm: Arc<dyn ChatCompletion>,
    /// Shared client for the image proxy.
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
    pub rate_limiter: Option<RateLimiterFacade>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Counts a hit against the caller's bucket for `action`.
    pub fn check_rate(&self, req: &HttpRequest, action: Action) -> Result<(), ApiError> {
        let Some(limiter) = &self.rate_limiter else { return Ok(()) };
        let info = req.connection_info();
        let client = info.realip_remote_addr().unwrap_or("unknown");
        if limiter.allow(action, client) {
            Ok(())
        } else {
            log::warn!("rate limited action={action:?} client={client}");
            Err(ApiError::TooManyRequests)
        }
    }
}

/// `{ "ok": true }`
pub(crate) fn ok() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

/// Trims and drops blank strings.
pub(crate) fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(crate) fn positive_id(v: Option<i64>, field: &str) -> Result<i64, ApiError> {
    match v {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("{field} must be a positive integer"))),
    }
}
