use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;

use std::sync::Arc;

use crate::{ServerError, cron};
use api_types::health::Health;
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub cron_secret: Arc<str>,
}

/// Shared-secret check for the cron routes. Runs before any handler, so a bad
/// token never touches the database.
async fn auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(bearer)) = bearer else {
        tracing::warn!("cron trigger without authorization header");
        return Err(ServerError::Unauthorized);
    };
    if bearer.token() != state.cron_secret.as_ref() {
        tracing::warn!("cron trigger with invalid secret");
        return Err(ServerError::Unauthorized);
    }

    Ok(next.run(request).await)
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

pub fn router(state: ServerState) -> Router {
    let cron_routes = Router::new()
        .route("/cron/check-payment-status", get(cron::check_payment_status))
        .route("/cron/repair-activations", get(cron::repair_activations))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .merge(cron_routes)
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    cron_secret: String,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        cron_secret: cron_secret.into(),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    cron_secret: String,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, cron_secret, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
