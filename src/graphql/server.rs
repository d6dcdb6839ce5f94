//! HTTP surface
//!
//! - `POST /graphql` executes a GraphQL request
//! - `GET /graphql` serves GraphiQL when enabled
//! - `GET /health` reports liveness

use std::net::SocketAddr;

use async_graphql::dynamic::Schema;
use async_graphql::http::GraphiQLSource;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observability::{log_event_with_fields, Event};

/// GraphQL endpoint path
pub const GRAPHQL_PATH: &str = "/graphql";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// HTTP server around an executable schema
pub struct GraphqlServer {
    addr: SocketAddr,
    router: Router,
}

impl GraphqlServer {
    pub fn new(addr: SocketAddr, schema: Schema, enable_graphiql: bool) -> Self {
        Self {
            addr,
            router: build_router(schema, enable_graphiql),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until the process is stopped
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let addr = self.addr.to_string();
        log_event_with_fields(Event::Serving, &[("addr", addr.as_str()), ("path", GRAPHQL_PATH)]);
        axum::serve(listener, self.router).await
    }
}

/// Build the router with permissive CORS
pub fn build_router(schema: Schema, enable_graphiql: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let graphql = if enable_graphiql {
        post(graphql_handler).get(graphiql_handler)
    } else {
        post(graphql_handler)
    };

    Router::new()
        .route(GRAPHQL_PATH, graphql)
        .route("/health", get(health_handler))
        .with_state(schema)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn graphql_handler(
    State(schema): State<Schema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

async fn graphiql_handler() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
