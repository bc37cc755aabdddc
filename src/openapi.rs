use crate::lang::{Language, Style};
use crate::leaderboard::LeaderboardEntry;
use crate::models::{
    CastLog, CreateSessionRequest, GenerateRequest, ImageType, InitUserRequest, LogCastRequest,
    SaveTranslationsRequest, Session, TranslateMode, TranslateRequest, Translation, TranslationInput, User,
    UserSettings,
};
use crate::routes::{compose, images, miniapp, records, stats};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::compose::generate_original,
        crate::routes::compose::translate,
        crate::routes::images::upload_image,
        crate::routes::images::image_proxy,
        crate::routes::records::create_session,
        crate::routes::records::save_translations,
        crate::routes::records::log_cast,
        crate::routes::records::init_user,
        crate::routes::records::get_user,
        crate::routes::stats::leaderboard,
        crate::routes::stats::recent_activities,
        crate::routes::miniapp::webhook_alive,
        crate::routes::miniapp::webhook_event,
        crate::routes::miniapp::manifest,
    ),
    components(schemas(
        Language, Style, TranslateMode, ImageType,
        GenerateRequest, TranslateRequest, CreateSessionRequest, TranslationInput,
        SaveTranslationsRequest, LogCastRequest, InitUserRequest,
        User, UserSettings, Session, Translation, CastLog, LeaderboardEntry,
        compose::GenerateResponse, compose::TranslateResponse, compose::TranslatedText,
        compose::LanguageOutcome, compose::OutcomeStatus,
        images::ImageUploadResponse, records::SessionCreated, stats::Activity,
        miniapp::Manifest, miniapp::MiniAppSection, miniapp::AccountAssociation,
    )),
    tags(
        (name = "compose", description = "Cast generation and translation"),
        (name = "images", description = "Image upload and proxy"),
        (name = "records", description = "Sessions, translations and cast logs"),
    )
)]
pub struct ApiDoc;
