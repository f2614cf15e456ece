//! Hasker server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use hasker_api::{MAX_FORM_BYTES, middleware::AppState, router as api_router};
use hasker_common::{Config, LocalStorage, StorageBackend};
use hasker_core::{AnswerService, QuestionService, UserService, VoteService, mailer_from_config};
use hasker_db::repositories::{
    AnswerRepository, QuestionRepository, TagRepository, UserProfileRepository, UserRepository,
    VoteRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hasker=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting hasker server...");

    let config = Config::load()?;

    let db = hasker_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    hasker_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let user_profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let question_repo = QuestionRepository::new(Arc::clone(&db));
    let answer_repo = AnswerRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_config(&config.storage));
    let mailer = mailer_from_config(&config.mail)?;
    if config.mail.smtp_url.is_none() {
        info!("No SMTP server configured, answer notifications will be logged");
    }

    let state = AppState {
        user_service: UserService::new(user_repo.clone(), user_profile_repo, storage),
        question_service: QuestionService::new(
            question_repo.clone(),
            answer_repo.clone(),
            tag_repo,
            &config.hasker,
        ),
        answer_service: AnswerService::new(
            answer_repo.clone(),
            question_repo.clone(),
            user_repo,
            mailer,
            &config.server.url,
        ),
        vote_service: VoteService::new(vote_repo, question_repo, answer_repo),
    };

    let media_url = format!("/{}", config.storage.media_url.trim_matches('/'));

    let app = Router::new()
        .merge(api_router())
        .nest_service(&media_url, ServeDir::new(&config.storage.media_root))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            hasker_api::middleware::auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}
