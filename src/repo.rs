use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation
                Some("23505") => RepoError::Conflict,
                // foreign_key_violation: the referenced session/user does not exist
                Some("23503") => RepoError::NotFound,
                _ => RepoError::Internal(e.to_string()),
            },
            _ => RepoError::Internal(e.to_string()),
        }
    }
}

use async_trait::async_trait;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert or update by fid; absent fields keep their stored value.
    async fn upsert_user(&self, user: UserUpsert) -> RepoResult<User>;
    async fn upsert_settings(&self, settings: SettingsUpsert) -> RepoResult<UserSettings>;
    async fn get_user(&self, fid: Fid) -> RepoResult<User>;
    async fn get_settings(&self, fid: Fid) -> RepoResult<Option<UserSettings>>;
    async fn users_by_fids(&self, fids: &[Fid]) -> RepoResult<Vec<User>>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn create_session(&self, new: NewSession) -> RepoResult<Session>;
}

#[async_trait]
pub trait TranslationRepo: Send + Sync {
    /// Upsert keyed by (session, target language).
    async fn upsert_translations(&self, session_id: Id, rows: Vec<TranslationUpsert>) -> RepoResult<Vec<Translation>>;
    async fn mark_translation_posted(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait CastLogRepo: Send + Sync {
    async fn insert_cast_log(&self, new: NewCastLog) -> RepoResult<CastLog>;
    async fn cast_logs_with_status(&self, status: CastStatus) -> RepoResult<Vec<CastLog>>;
    async fn recent_activities(&self, fid: Fid, limit: i64) -> RepoResult<Vec<ActivityRow>>;
}

pub trait Repo: UserRepo + SessionRepo + TranslationRepo + CastLogRepo {}

impl<T> Repo for T where T: UserRepo + SessionRepo + TranslationRepo + CastLogRepo {}

/// Map-backed store used by tests and by local runs without DATABASE_URL.
pub mod inmem {
    use super::*;

    #[derive(Default)]
    struct State {
        users: HashMap<Fid, User>,
        settings: HashMap<Fid, UserSettings>,
        sessions: HashMap<Id, Session>,
        translations: HashMap<Id, Translation>,
        cast_logs: Vec<CastLog>,
        next_id: Id,
    }

    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        // a panicked writer leaves plain maps behind, still safe to read
        fn read(&self) -> RwLockReadGuard<'_, State> {
            self.state.read().unwrap_or_else(|e| e.into_inner())
        }

        fn write(&self) -> RwLockWriteGuard<'_, State> {
            self.state.write().unwrap_or_else(|e| e.into_inner())
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }

        /// Every stored translation of a session, ordered by id.
        pub fn translations_for(&self, session_id: Id) -> Vec<Translation> {
            let s = self.read();
            let mut v: Vec<_> = s.translations.values().filter(|t| t.session_id == session_id).cloned().collect();
            v.sort_by_key(|t| t.id);
            v
        }

        pub fn cast_logs(&self) -> Vec<CastLog> {
            self.read().cast_logs.clone()
        }

        pub fn session(&self, id: Id) -> Option<Session> {
            self.read().sessions.get(&id).cloned()
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn upsert_user(&self, u: UserUpsert) -> RepoResult<User> {
            let mut s = self.write();
            let now = Utc::now();
            let user = s.users.entry(u.fid).or_insert_with(|| User {
                fid: u.fid,
                username: None,
                display_name: None,
                pfp_url: None,
                wallet: None,
                created_at: now,
                updated_at: now,
            });
            if u.username.is_some() { user.username = u.username; }
            if u.display_name.is_some() { user.display_name = u.display_name; }
            if u.pfp_url.is_some() { user.pfp_url = u.pfp_url; }
            if u.wallet.is_some() { user.wallet = u.wallet; }
            user.updated_at = now;
            Ok(user.clone())
        }

        async fn upsert_settings(&self, new: SettingsUpsert) -> RepoResult<UserSettings> {
            let mut s = self.write();
            if !s.users.contains_key(&new.fid) {
                return Err(RepoError::NotFound);
            }
            let settings = UserSettings {
                fid: new.fid,
                preferred_lang: new.preferred_lang.map(|l| l.code().to_string()),
                favorite_langs: new.favorite_langs.map(|v| v.iter().map(|l| l.code().to_string()).collect()),
                updated_at: Utc::now(),
            };
            s.settings.insert(new.fid, settings.clone());
            Ok(settings)
        }

        async fn get_user(&self, fid: Fid) -> RepoResult<User> {
            self.read().users.get(&fid).cloned().ok_or(RepoError::NotFound)
        }

        async fn get_settings(&self, fid: Fid) -> RepoResult<Option<UserSettings>> {
            Ok(self.read().settings.get(&fid).cloned())
        }

        async fn users_by_fids(&self, fids: &[Fid]) -> RepoResult<Vec<User>> {
            let s = self.read();
            Ok(fids.iter().filter_map(|f| s.users.get(f).cloned()).collect())
        }
    }

    #[async_trait]
    impl SessionRepo for InMemRepo {
        async fn create_session(&self, new: NewSession) -> RepoResult<Session> {
            let mut s = self.write();
            let id = Self::next_id(&mut s);
            let session = Session {
                id,
                fid: new.fid,
                source_type: new.source_type.as_str().to_string(),
                original_lang: new.original_lang.map(|l| l.code().to_string()),
                original_text: new.original_text,
                ai_keywords: new.ai_keywords,
                llm_request_id: new.llm_request_id,
                image_type: new.image_type.map(|t| t.as_str().to_string()),
                image_url: new.image_url,
                image_prompt: new.image_prompt,
                image_metadata: new.image_metadata,
                status: SESSION_ACTIVE.to_string(),
                created_at: Utc::now(),
            };
            s.sessions.insert(id, session.clone());
            Ok(session)
        }
    }

    #[async_trait]
    impl TranslationRepo for InMemRepo {
        async fn upsert_translations(&self, session_id: Id, rows: Vec<TranslationUpsert>) -> RepoResult<Vec<Translation>> {
            let mut s = self.write();
            if !s.sessions.contains_key(&session_id) {
                return Err(RepoError::NotFound);
            }
            let now = Utc::now();
            let mut saved = Vec::with_capacity(rows.len());
            for row in rows {
                let code = row.target_lang.code();
                let existing = s
                    .translations
                    .values()
                    .find(|t| t.session_id == session_id && t.target_lang == code)
                    .map(|t| t.id);
                let t = match existing {
                    Some(id) => {
                        // only the row we just located; cannot be missing under the write lock
                        let Some(t) = s.translations.get_mut(&id) else { continue };
                        t.translated_text = row.translated_text;
                        t.edited_text = row.edited_text;
                        t.is_edited = row.is_edited;
                        t.order_index = row.order_index;
                        t.updated_at = now;
                        t.clone()
                    }
                    None => {
                        let id = Self::next_id(&mut s);
                        let t = Translation {
                            id,
                            session_id,
                            target_lang: code.to_string(),
                            translated_text: row.translated_text,
                            edited_text: row.edited_text,
                            is_edited: row.is_edited,
                            order_index: row.order_index,
                            status: TRANSLATION_DRAFT.to_string(),
                            created_at: now,
                            updated_at: now,
                        };
                        s.translations.insert(id, t.clone());
                        t
                    }
                };
                saved.push(t);
            }
            Ok(saved)
        }

        async fn mark_translation_posted(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write();
            let t = s.translations.get_mut(&id).ok_or(RepoError::NotFound)?;
            t.status = TRANSLATION_POSTED.to_string();
            t.updated_at = Utc::now();
            Ok(())
        }
    }

    #[async_trait]
    impl CastLogRepo for InMemRepo {
        async fn insert_cast_log(&self, new: NewCastLog) -> RepoResult<CastLog> {
            let mut s = self.write();
            let id = Self::next_id(&mut s);
            let log = CastLog {
                id,
                fid: new.fid,
                session_id: new.session_id,
                translation_id: new.translation_id,
                target_lang: new.target_lang.code().to_string(),
                cast_hash: new.cast_hash,
                cast_url: new.cast_url,
                client: new.client,
                status: new.status.as_str().to_string(),
                error_message: new.error_message,
                posted_at: new.posted_at,
                created_at: Utc::now(),
            };
            s.cast_logs.push(log.clone());
            Ok(log)
        }

        async fn cast_logs_with_status(&self, status: CastStatus) -> RepoResult<Vec<CastLog>> {
            let s = self.read();
            Ok(s.cast_logs.iter().filter(|l| l.status == status.as_str()).cloned().collect())
        }

        async fn recent_activities(&self, fid: Fid, limit: i64) -> RepoResult<Vec<ActivityRow>> {
            let s = self.read();
            let mut logs: Vec<&CastLog> = s.cast_logs.iter().filter(|l| l.fid == fid).collect();
            // posted_at DESC NULLS LAST, then newest id first
            logs.sort_by(|a, b| match (a.posted_at, b.posted_at) {
                (Some(x), Some(y)) => y.cmp(&x).then(b.id.cmp(&a.id)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => b.id.cmp(&a.id),
            });
            let rows = logs
                .into_iter()
                .take(limit.max(0) as usize)
                .map(|l| {
                    let session = l.session_id.and_then(|id| s.sessions.get(&id));
                    let translation = l.translation_id.and_then(|id| s.translations.get(&id));
                    ActivityRow {
                        id: l.id,
                        target_lang: l.target_lang.clone(),
                        cast_url: l.cast_url.clone(),
                        posted_at: l.posted_at,
                        status: l.status.clone(),
                        original_text: session.map(|x| x.original_text.clone()),
                        image_url: session.and_then(|x| x.image_url.clone()),
                        translated_text: translation.and_then(|t| t.translated_text.clone()),
                        edited_text: translation.and_then(|t| t.edited_text.clone()),
                    }
                })
                .collect();
            Ok(rows)
        }
    }
}

pub mod pg {
    use super::*;
    use sqlx::PgPool;

    const USER_COLS: &str = "fid, username, display_name, pfp_url, wallet, created_at, updated_at";
    const SESSION_COLS: &str = "id, fid, source_type, original_lang, original_text, ai_keywords, llm_request_id, \
        image_type, image_url, image_prompt, image_metadata, status, created_at";
    const TRANSLATION_COLS: &str = "id, session_id, target_lang, translated_text, edited_text, is_edited, \
        order_index, status, created_at, updated_at";
    const CAST_LOG_COLS: &str = "id, fid, session_id, translation_id, target_lang, cast_hash, cast_url, client, \
        status, error_message, posted_at, created_at";

    #[derive(Clone)]
    pub struct PgRepo {
        pool: PgPool,
    }

    impl PgRepo {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
            sqlx::migrate!("./migrations").run(&self.pool).await
        }
    }

    #[async_trait]
    impl UserRepo for PgRepo {
        async fn upsert_user(&self, u: UserUpsert) -> RepoResult<User> {
            let sql = format!(
                "INSERT INTO users (fid, username, display_name, pfp_url, wallet) VALUES ($1,$2,$3,$4,$5) \
                 ON CONFLICT (fid) DO UPDATE SET \
                   username = COALESCE(EXCLUDED.username, users.username), \
                   display_name = COALESCE(EXCLUDED.display_name, users.display_name), \
                   pfp_url = COALESCE(EXCLUDED.pfp_url, users.pfp_url), \
                   wallet = COALESCE(EXCLUDED.wallet, users.wallet), \
                   updated_at = now() \
                 RETURNING {USER_COLS}"
            );
            let user = sqlx::query_as::<_, User>(&sql)
                .bind(u.fid)
                .bind(u.username)
                .bind(u.display_name)
                .bind(u.pfp_url)
                .bind(u.wallet)
                .fetch_one(&self.pool)
                .await?;
            Ok(user)
        }

        async fn upsert_settings(&self, new: SettingsUpsert) -> RepoResult<UserSettings> {
            let preferred = new.preferred_lang.map(|l| l.code().to_string());
            let favorites: Option<Vec<String>> =
                new.favorite_langs.map(|v| v.iter().map(|l| l.code().to_string()).collect());
            let settings = sqlx::query_as::<_, UserSettings>(
                "INSERT INTO user_settings (fid, preferred_lang, favorite_langs) VALUES ($1,$2,$3) \
                 ON CONFLICT (fid) DO UPDATE SET \
                   preferred_lang = EXCLUDED.preferred_lang, \
                   favorite_langs = EXCLUDED.favorite_langs, \
                   updated_at = now() \
                 RETURNING fid, preferred_lang, favorite_langs, updated_at",
            )
            .bind(new.fid)
            .bind(preferred)
            .bind(favorites)
            .fetch_one(&self.pool)
            .await?;
            Ok(settings)
        }

        async fn get_user(&self, fid: Fid) -> RepoResult<User> {
            let sql = format!("SELECT {USER_COLS} FROM users WHERE fid = $1");
            Ok(sqlx::query_as::<_, User>(&sql).bind(fid).fetch_one(&self.pool).await?)
        }

        async fn get_settings(&self, fid: Fid) -> RepoResult<Option<UserSettings>> {
            let settings = sqlx::query_as::<_, UserSettings>(
                "SELECT fid, preferred_lang, favorite_langs, updated_at FROM user_settings WHERE fid = $1",
            )
            .bind(fid)
            .fetch_optional(&self.pool)
            .await?;
            Ok(settings)
        }

        async fn users_by_fids(&self, fids: &[Fid]) -> RepoResult<Vec<User>> {
            if fids.is_empty() {
                return Ok(Vec::new());
            }
            let sql = format!("SELECT {USER_COLS} FROM users WHERE fid = ANY($1)");
            let users = sqlx::query_as::<_, User>(&sql)
                .bind(fids.to_vec())
                .fetch_all(&self.pool)
                .await?;
            Ok(users)
        }
    }

    #[async_trait]
    impl SessionRepo for PgRepo {
        async fn create_session(&self, new: NewSession) -> RepoResult<Session> {
            let sql = format!(
                "INSERT INTO polycast_sessions \
                   (fid, source_type, original_lang, original_text, ai_keywords, llm_request_id, \
                    image_type, image_url, image_prompt, image_metadata, status) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) \
                 RETURNING {SESSION_COLS}"
            );
            let session = sqlx::query_as::<_, Session>(&sql)
                .bind(new.fid)
                .bind(new.source_type.as_str())
                .bind(new.original_lang.map(|l| l.code()))
                .bind(new.original_text)
                .bind(new.ai_keywords)
                .bind(new.llm_request_id)
                .bind(new.image_type.map(|t| t.as_str()))
                .bind(new.image_url)
                .bind(new.image_prompt)
                .bind(new.image_metadata)
                .bind(SESSION_ACTIVE)
                .fetch_one(&self.pool)
                .await?;
            Ok(session)
        }
    }

    #[async_trait]
    impl TranslationRepo for PgRepo {
        async fn upsert_translations(&self, session_id: Id, rows: Vec<TranslationUpsert>) -> RepoResult<Vec<Translation>> {
            let sql = format!(
                "INSERT INTO polycast_translations \
                   (session_id, target_lang, translated_text, edited_text, is_edited, order_index, status) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7) \
                 ON CONFLICT (session_id, target_lang) DO UPDATE SET \
                   translated_text = EXCLUDED.translated_text, \
                   edited_text = EXCLUDED.edited_text, \
                   is_edited = EXCLUDED.is_edited, \
                   order_index = EXCLUDED.order_index, \
                   updated_at = now() \
                 RETURNING {TRANSLATION_COLS}"
            );
            let mut tx = self.pool.begin().await?;
            let mut saved = Vec::with_capacity(rows.len());
            for row in rows {
                let t = sqlx::query_as::<_, Translation>(&sql)
                    .bind(session_id)
                    .bind(row.target_lang.code())
                    .bind(row.translated_text)
                    .bind(row.edited_text)
                    .bind(row.is_edited)
                    .bind(row.order_index)
                    .bind(TRANSLATION_DRAFT)
                    .fetch_one(&mut *tx)
                    .await?;
                saved.push(t);
            }
            tx.commit().await?;
            Ok(saved)
        }

        async fn mark_translation_posted(&self, id: Id) -> RepoResult<()> {
            let res = sqlx::query("UPDATE polycast_translations SET status = $1, updated_at = now() WHERE id = $2")
                .bind(TRANSLATION_POSTED)
                .bind(id)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 0 {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CastLogRepo for PgRepo {
        async fn insert_cast_log(&self, new: NewCastLog) -> RepoResult<CastLog> {
            let sql = format!(
                "INSERT INTO cast_logs \
                   (fid, session_id, translation_id, target_lang, cast_hash, cast_url, client, status, error_message, posted_at) \
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10) \
                 RETURNING {CAST_LOG_COLS}"
            );
            let log = sqlx::query_as::<_, CastLog>(&sql)
                .bind(new.fid)
                .bind(new.session_id)
                .bind(new.translation_id)
                .bind(new.target_lang.code())
                .bind(new.cast_hash)
                .bind(new.cast_url)
                .bind(new.client)
                .bind(new.status.as_str())
                .bind(new.error_message)
                .bind(new.posted_at)
                .fetch_one(&self.pool)
                .await?;
            Ok(log)
        }

        async fn cast_logs_with_status(&self, status: CastStatus) -> RepoResult<Vec<CastLog>> {
            let sql = format!("SELECT {CAST_LOG_COLS} FROM cast_logs WHERE status = $1");
            let logs = sqlx::query_as::<_, CastLog>(&sql)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?;
            Ok(logs)
        }

        async fn recent_activities(&self, fid: Fid, limit: i64) -> RepoResult<Vec<ActivityRow>> {
            let rows = sqlx::query_as::<_, ActivityRow>(
                r#"
                SELECT c.id, c.target_lang, c.cast_url, c.posted_at, c.status,
                       s.original_text, s.image_url,
                       t.translated_text, t.edited_text
                FROM cast_logs c
                LEFT JOIN polycast_sessions s ON s.id = c.session_id
                LEFT JOIN polycast_translations t ON t.id = c.translation_id
                WHERE c.fid = $1
                ORDER BY c.posted_at DESC NULLS LAST, c.id DESC
                LIMIT $2
            "#,
            )
            .bind(fid)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}
