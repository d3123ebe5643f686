use crate::audit::{AuditEvent, AuditPublisher};
use crate::errors::AppError;
use crate::filter::CreditoFilter;
use crate::models::{Credito, CreditoFilterParams, PaginationParams};
use crate::page::PaginatedResponse;
use crate::pagination::PageRequest;
use crate::services::CreditoService;
use crate::store::CreditoStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const CREDITOS_BY_NFSE_ENDPOINT: &str = "/api/creditos/{numeroNfse}";
pub const CREDITOS_PAGINATED_ENDPOINT: &str = "/api/creditos/paginated/{numeroNfse}";
pub const CREDITOS_FILTERED_ENDPOINT: &str = "/api/creditos";

/// Shared application state injected into handlers.
pub struct AppState<S> {
    /// Credit lookups over the configured store.
    pub service: CreditoService<S>,
    /// Fire-and-forget audit hand-off.
    pub audit: AuditPublisher,
}

impl<S: CreditoStore> AppState<S> {
    pub fn new(store: Arc<S>, audit: AuditPublisher) -> Self {
        Self {
            service: CreditoService::new(store),
            audit,
        }
    }

    /// Same as [`AppState::new`] with an explicit deadline per store call.
    pub fn with_store_timeout(
        store: Arc<S>,
        audit: AuditPublisher,
        store_timeout: Duration,
    ) -> Self {
        Self {
            service: CreditoService::with_store_timeout(store, store_timeout),
            audit,
        }
    }
}

/// Publishes the audit summary of a finished request. Never fails.
fn audit_request<T>(
    audit: &AuditPublisher,
    endpoint: &str,
    request_params: serde_json::Value,
    started: Instant,
    result: &Result<T, AppError>,
    result_count: impl FnOnce(&T) -> usize,
) {
    let outcome = result.as_ref().map(result_count);
    audit.publish(AuditEvent::from_outcome(
        endpoint,
        "GET",
        request_params,
        started.elapsed(),
        outcome,
    ));
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/creditos/:numero_nfse
///
/// Every credit for the NFS-e, unpaginated. The list is not sorted.
#[utoipa::path(
    get,
    path = "/api/creditos/{numeroNfse}",
    tag = "creditos",
    params(("numeroNfse" = String, Path, description = "NFS-e number")),
    responses(
        (status = 200, description = "Credits found", body = [Credito]),
        (status = 404, description = "No credit for this NFS-e"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn get_creditos_by_nfse<S: CreditoStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(numero_nfse): Path<String>,
) -> Result<Json<Vec<Credito>>, AppError> {
    tracing::info!("GET /creditos/{}", numero_nfse);
    let started = Instant::now();

    let result = state
        .service
        .find_by_numero_nfse(&numero_nfse)
        .await
        .and_then(|creditos| {
            if creditos.is_empty() {
                Err(AppError::NotFound(format!(
                    "No creditos found for NFS-e {}",
                    numero_nfse
                )))
            } else {
                Ok(creditos)
            }
        });

    audit_request(
        &state.audit,
        CREDITOS_BY_NFSE_ENDPOINT,
        json!({ "numeroNfse": numero_nfse }),
        started,
        &result,
        Vec::len,
    );

    result.map(Json)
}

/// GET /api/creditos/paginated/:numero_nfse?page=&size=
///
/// One page of credits for the NFS-e, most recent constitution date first.
#[utoipa::path(
    get,
    path = "/api/creditos/paginated/{numeroNfse}",
    tag = "creditos",
    params(("numeroNfse" = String, Path, description = "NFS-e number"), PaginationParams),
    responses(
        (status = 200, description = "Page of credits", body = crate::page::PaginatedCreditoResponse),
        (status = 404, description = "Page has no credits"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn get_creditos_paginated<S: CreditoStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(numero_nfse): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<Credito>>, AppError> {
    tracing::info!(
        "GET /creditos/paginated/{} - page: {:?}, size: {:?}",
        numero_nfse,
        params.page,
        params.size
    );
    let started = Instant::now();
    let request = PageRequest::from_optional(params.page, params.size);

    let result = state
        .service
        .find_by_numero_nfse_paginated(&numero_nfse, request)
        .await
        .and_then(|response| non_empty_page(response, || format!("NFS-e {}", numero_nfse)));

    audit_request(
        &state.audit,
        CREDITOS_PAGINATED_ENDPOINT,
        json!({
            "numeroNfse": numero_nfse,
            "page": request.page(),
            "size": request.size(),
        }),
        started,
        &result,
        |response| response.content.len(),
    );

    result.map(Json)
}

/// GET /api/creditos?numeroNfse=&tipoCredito=&simplesNacional=&page=&size=
///
/// One page of credits matching every supplied filter, most recent first.
#[utoipa::path(
    get,
    path = "/api/creditos",
    tag = "creditos",
    params(CreditoFilterParams),
    responses(
        (status = 200, description = "Page of credits", body = crate::page::PaginatedCreditoResponse),
        (status = 404, description = "Page has no credits"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn get_creditos_filtered<S: CreditoStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<CreditoFilterParams>,
) -> Result<Json<PaginatedResponse<Credito>>, AppError> {
    tracing::info!("GET /creditos - params: {:?}", params);
    let started = Instant::now();
    let filter = CreditoFilter::from(&params);
    let request = PageRequest::from_optional(params.page, params.size);

    let result = state
        .service
        .find_filtered(&filter, request)
        .await
        .and_then(|response| non_empty_page(response, || format!("filter {:?}", filter)));

    audit_request(
        &state.audit,
        CREDITOS_FILTERED_ENDPOINT,
        json!({
            "numeroNfse": filter.numero_nfse,
            "tipoCredito": filter.tipo_credito,
            "simplesNacional": filter.simples_nacional,
            "page": request.page(),
            "size": request.size(),
        }),
        started,
        &result,
        |response| response.content.len(),
    );

    result.map(Json)
}

/// Turns an empty page into `NotFound`.
fn non_empty_page<T>(
    response: PaginatedResponse<T>,
    describe: impl FnOnce() -> String,
) -> Result<PaginatedResponse<T>, AppError> {
    if response.is_empty() {
        Err(AppError::NotFound(format!(
            "No creditos found for {} on page {}",
            describe(),
            response.page
        )))
    } else {
        Ok(response)
    }
}
