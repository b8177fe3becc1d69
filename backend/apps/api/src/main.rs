//! API Server Entry Point
//!
//! Wires configuration, the database pool, the mail worker and the two
//! feature routers. Uses `anyhow` for startup errors; request-level errors
//! go through `kernel::error::AppError`.

use std::net::SocketAddr;

use auth::{AuthAppState, AuthConfig, PgAccountRepository, auth_router};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use journal::posts_router;
use platform::config::Env;
use platform::mail::{MailQueue, MailQueueConfig, OutboxEmailSender, SmtpConfig, SmtpEmailSender};
use platform::scope::PgScopeBinder;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,journal=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = Env::process();

    // Database
    let pool = PgPoolOptions::new()
        .max_connections(env.parse_or("DATABASE_MAX_CONNECTIONS", 5)?)
        .connect(&env.require("DATABASE_URL")?)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;
    tracing::info!("Migrations completed");

    // Mail
    let auth_config = AuthConfig::from_env(&env)?;
    let (mail_queue, _mail_worker) = match SmtpConfig::from_env(&env)? {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "SMTP delivery enabled");
            MailQueue::start(SmtpEmailSender::new(&smtp)?, MailQueueConfig::default())
        }
        None => {
            tracing::warn!("SMTP is not configured; outgoing email is kept in memory only");
            MailQueue::start(OutboxEmailSender::new(), MailQueueConfig::default())
        }
    };

    let auth_state = AuthAppState::new(PgAccountRepository::new(pool.clone()), auth_config, mail_queue);
    let posts = posts_router(auth_state.middleware_state(), PgScopeBinder::new(pool));

    // CORS
    let mut origins = env.list("FRONTEND_ORIGINS");
    if origins.is_empty() {
        origins = DEFAULT_ORIGINS.split(',').map(str::to_string).collect();
    }
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", auth_router(auth_state).merge(posts))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    let port: u16 = env.parse_or("PORT", 3000)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
