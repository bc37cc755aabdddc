use actix_cors::Cors;
use actix_web::{middleware::Compress, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use polycast::app_config::AppConfig;
use polycast::llm::FlockClient;
use polycast::openapi::ApiDoc;
use polycast::rate_limit::RateLimiterFacade;
use polycast::repo::{inmem::InMemRepo, pg::PgRepo, Repo};
use polycast::storage::build_image_store;
use polycast::{config, telemetry, AppState, SecurityHeaders};

fn io_err(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env automatically only in debug builds; deployments set the environment themselves.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("Please copy .env.example to .env and configure it");
            std::process::exit(1);
        }
    };
    info!("Bootstrapping PolyCast server model={} image_url_mode={:?}", cfg.llm.model, cfg.image_url_mode);

    let repo: Arc<dyn Repo> = match &cfg.database_url {
        Some(db_url) => {
            use sqlx::postgres::PgPoolOptions;
            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_max_connections)
                .connect_lazy(db_url)
                .map_err(io_err)?;
            let repo = PgRepo::new(pool);
            if cfg.run_migrations {
                repo.migrate().await.map_err(io_err)?;
                info!("Database migrations applied");
            }
            info!("Using Postgres repository backend");
            Arc::new(repo)
        }
        None => {
            warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
            Arc::new(InMemRepo::new())
        }
    };

    let image_store = build_image_store(&cfg.storage).await.map_err(io_err)?;
    let llm = Arc::new(FlockClient::new(&cfg.llm).map_err(io_err)?);
    let http = reqwest::Client::builder().timeout(cfg.proxy_timeout).build().map_err(io_err)?;
    let metrics = if cfg.metrics_enabled { telemetry::install_recorder() } else { None };

    let rate_limiter = RateLimiterFacade::from_config(&cfg.rate_limit);
    if rate_limiter.limiter.enabled {
        let pruner = rate_limiter.clone();
        let window = pruner.cfg.longest_window();
        actix_web::rt::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            loop {
                tick.tick().await;
                pruner.limiter.prune(window);
            }
        });
    }

    let state = AppState {
        repo,
        image_store,
        llm,
        http,
        config: cfg.clone(),
        rate_limiter: Some(rate_limiter),
        metrics,
    };
    let openapi = ApiDoc::openapi();
    info!("OpenAPI spec generated");

    let security = SecurityHeaders::from_config(&cfg.security);
    let bind_addr = cfg.bind_addr.clone();
    let server = HttpServer::new(move || {
        let cors = cfg
            .cors_origins
            .iter()
            .fold(Cors::default(), |c, origin| c.allowed_origin(origin))
            .allow_any_header()
            .allowed_methods(["GET", "POST", "OPTIONS"])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(security.clone())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(&bind_addr)?;

    info!("Listening on http://{bind_addr}");
    server.run().await
}
