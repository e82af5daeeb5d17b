use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::cache;
use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::database::manager::redact_url;
use crate::database::{DatabaseManager, Stores};
use crate::handlers::{protected, public};
use crate::middleware::require_principal;
use crate::services::{RequestContext, Services};
use crate::state::AppState;

/// Wires stores, cache and services for the configured backend, and creates
/// the bootstrap administrator when one is configured.
pub async fn build_state(config: Arc<AppConfig>) -> anyhow::Result<AppState> {
    let (stores, database) = match config.database.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            (Stores::memory(), None)
        }
        StoreBackend::Postgres => {
            let database = DatabaseManager::connect(&config.database)
                .await
                .with_context(|| format!("connecting to {}", redact_url(&config.database.url)))?;
            if config.database.run_migrations {
                database.migrate().await?;
            }
            (Stores::postgres(&database), Some(database))
        }
    };

    let cache = cache::from_config(&config.cache, config.request_timeout()).await;

    let services = Services::new(stores, cache, &config)?;

    if let (Some(email), Some(password)) = (&config.bootstrap.admin_email, &config.bootstrap.admin_password) {
        let ctx = RequestContext::new(config.request_timeout());
        let (admin, created) = services
            .auth
            .ensure_admin(&ctx, email, password)
            .await
            .context("creating bootstrap administrator")?;
        if !created {
            info!("Bootstrap administrator {} already present", admin.email);
        }
    }

    Ok(AppState::new(config, services, database))
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let public_api = Router::new()
        .route("/auth/register", post(public::register))
        .route("/auth/login", post(public::login));

    let protected_api = Router::new()
        .route("/auth/me", get(protected::auth::me))
        .route("/auth/refresh", post(protected::auth::refresh))
        .merge(resource_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_principal));

    Router::new()
        .route("/health", get(public::health))
        .nest("/api/v1", public_api.merge(protected_api))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn resource_routes() -> Router<AppState> {
    use protected::{appointments, cars, clients, employees, repairs, users};

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/cars", get(cars::list).post(cars::create))
        .route("/cars/:id", get(cars::get).put(cars::update).delete(cars::delete))
        .route("/cars/:id/repairs", get(cars::repairs))
        .route("/repairs", get(repairs::list).post(repairs::create))
        .route("/repairs/:id", get(repairs::get).put(repairs::update).delete(repairs::delete))
        .route("/appointments", get(appointments::list).post(appointments::create))
        .route(
            "/appointments/:id",
            get(appointments::get).put(appointments::update).delete(appointments::delete),
        )
        .route("/employees", get(employees::list).post(employees::create))
        .route(
            "/employees/:id",
            get(employees::get).put(employees::update).delete(employees::delete),
        )
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:id", get(clients::get).put(clients::update).delete(clients::delete))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Binds the configured port and serves until Ctrl-C.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let port = state.config.server.port;
    let database = state.database.clone();

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Garage API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
