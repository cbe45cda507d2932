//! Run with
//!
//! ```not_rust
//! JWKGUARD_PROJECT_NUMBER=123456789 cargo run --example axum
//! ```
//!
//! Requests carry the App Check token in the `act` query parameter:
//! missing token is 428, a rejected token 403.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use jwkguard::appcheck::AppCheckVerifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    app_check: AppCheckVerifier,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,jwkguard=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let project_number =
        std::env::var("JWKGUARD_PROJECT_NUMBER").expect("JWKGUARD_PROJECT_NUMBER must be set");
    let app_check = AppCheckVerifier::new(&project_number).expect("invalid App Check config");

    let app = Router::new()
        .route("/", get(handler))
        .with_state(AppState { app_check });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:4000")
        .await
        .unwrap();
    tracing::debug!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(token) = params.get("act") else {
        return (
            StatusCode::PRECONDITION_REQUIRED,
            "No 'act' parameter in URL",
        );
    };

    if !state.app_check.verify(token).await {
        return (StatusCode::FORBIDDEN, "App check verification failed");
    }

    (StatusCode::OK, "Hello checked client!")
}
