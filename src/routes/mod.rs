// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod user;

use crate::error::AppError;
use crate::middleware::{require_admin, require_session};
use crate::AppState;
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Flat success envelope shared by handlers with nothing else to return.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Unmatched paths get the standard JSON error envelope, not bare text.
async fn not_found() -> impl IntoResponse {
    AppError::NotFound("Route".to_string()).into_response()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Routes behind the session gate
    let session_routes = auth::session_routes()
        .merge(user::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Admin routes stack both layers; the gate is added last so it runs
    // first and require_admin sees the attached AuthSession.
    let admin_routes = admin::routes()
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
