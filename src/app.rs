//! Router assembly and OpenAPI document.

use crate::handlers::{self, AppState};
use crate::models::Credito;
use crate::page::PaginatedCreditoResponse;
use crate::store::CreditoStore;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Upper bound for a single request, store round-trips included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(OpenApi)]
#[openapi(
    info(title = "Créditos API", description = "Read-only lookup of constituted ISSQN credits by NFS-e"),
    paths(
        handlers::health,
        handlers::get_creditos_by_nfse,
        handlers::get_creditos_paginated,
        handlers::get_creditos_filtered
    ),
    components(schemas(Credito, PaginatedCreditoResponse)),
    tags(
        (name = "creditos", description = "Credit lookups"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Builds the full application router over the given store.
pub fn build_router<S: CreditoStore>(state: Arc<AppState<S>>) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/creditos",
            get(handlers::get_creditos_filtered::<S>),
        )
        .route(
            "/api/creditos/:numero_nfse",
            get(handlers::get_creditos_by_nfse::<S>),
        )
        .route(
            "/api/creditos/paginated/:numero_nfse",
            get(handlers::get_creditos_paginated::<S>),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
