use std::net::SocketAddr;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, extractors::require_session};
use crate::state::AppState;
use crate::tasks;

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref())?;

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(tasks::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let app = Router::new()
        .route("/api", get(api_index))
        .route("/api/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        );
    Ok(app)
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "message": "TaskFlow API is running",
        "endpoints": {
            "auth": "/api/auth/*",
            "tasks": "/api/tasks",
        }
    }))
}

/// A configured origin gets a credentialed policy; without one the API is
/// open for local development and cookies will not cross origins.
fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let Some(origin) = allowed_origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin: HeaderValue = origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ]))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
