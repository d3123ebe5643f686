/// End-to-end tests of the HTTP surface over an in-memory store
/// Covers NotFound translation, clamping, sort order, filters and audit events
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use creditos_api::app::build_router;
use creditos_api::audit::{AuditEvent, AuditPublisher};
use creditos_api::errors::AppError;
use creditos_api::filter::CreditoFilter;
use creditos_api::handlers::AppState;
use creditos_api::models::Credito;
use creditos_api::page::Page;
use creditos_api::pagination::PageRequest;
use creditos_api::store::{CreditoStore, InMemoryCreditoStore};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt as _;

fn credito(id: i64, numero_nfse: &str, data_constituicao: &str) -> Credito {
    Credito {
        id,
        numero_credito: format!("{:06}", 100000 + id),
        numero_nfse: numero_nfse.to_string(),
        data_constituicao: NaiveDate::from_str(data_constituicao).unwrap(),
        valor_issqn: BigDecimal::from_str("1500.75").unwrap(),
        tipo_credito: "ISSQN".to_string(),
        simples_nacional: Some(true),
        aliquota: BigDecimal::from_str("5.0").unwrap(),
        valor_faturado: BigDecimal::from_str("30000.00").unwrap(),
        valor_deducao: BigDecimal::from_str("5000.00").unwrap(),
        base_calculo: BigDecimal::from_str("25000.00").unwrap(),
    }
}

/// 15 credits on NFS-e 7891011, dated 2024-01-01..=2024-01-15
fn fifteen_creditos() -> Vec<Credito> {
    (1..=15)
        .map(|i| credito(i, "7891011", &format!("2024-01-{:02}", i)))
        .collect()
}

fn setup<S: CreditoStore>(store: S) -> (Arc<AppState<S>>, mpsc::Receiver<AuditEvent>) {
    let (audit, rx) = AuditPublisher::channel(64);
    (Arc::new(AppState::new(Arc::new(store), audit)), rx)
}

async fn get<S: CreditoStore>(state: Arc<AppState<S>>, uri: &str) -> Response {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    build_router(state).oneshot(req).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn dates(body: &Value) -> Vec<String> {
    body["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["dataConstituicao"].as_str().unwrap().to_string())
        .collect()
}

/// Store whose every query fails at the storage layer.
struct FailingStore;

impl CreditoStore for FailingStore {
    async fn find_by_numero_nfse(&self, _numero_nfse: &str) -> Result<Vec<Credito>, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn find_page(
        &self,
        _filter: &CreditoFilter,
        _request: PageRequest,
    ) -> Result<Page<Credito>, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }
}

/// Store whose queries never complete, like a connection stuck on a lock.
struct HangingStore;

impl CreditoStore for HangingStore {
    async fn find_by_numero_nfse(&self, _numero_nfse: &str) -> Result<Vec<Credito>, AppError> {
        std::future::pending().await
    }

    async fn find_page(
        &self,
        _filter: &CreditoFilter,
        _request: PageRequest,
    ) -> Result<Page<Credito>, AppError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_unpaginated_lookup_returns_all_matches() {
    let mut creditos = fifteen_creditos();
    creditos.push(credito(99, "0000001", "2024-06-01"));
    let (state, _rx) = setup(InMemoryCreditoStore::new(creditos));

    let response = get(state, "/api/creditos/7891011").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 15);
    assert!(list.iter().all(|c| c["numeroNfse"] == "7891011"));
    assert_eq!(list[0]["valorIssqn"], "1500.75");
}

#[tokio::test]
async fn test_unpaginated_lookup_keeps_store_order() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(vec![
        credito(1, "123", "2024-01-01"),
        credito(2, "123", "2024-03-01"),
        credito(3, "123", "2024-02-01"),
    ]));

    let body = body_json(get(state, "/api/creditos/123").await).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unknown_nfse_is_not_found_on_both_endpoints() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let response = get(state.clone(), "/api/creditos/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("999999"));

    let response = get(state, "/api/creditos/paginated/999999?page=0&size=10").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_page_of_fifteen() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let response = get(state, "/api/creditos/paginated/7891011?page=1&size=10").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["content"].as_array().unwrap().len(), 5);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["totalElements"], 15);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["first"], false);
    assert_eq!(body["last"], true);
    assert_eq!(body["hasNext"], false);
    assert_eq!(body["hasPrevious"], true);
    // Oldest five, still most recent first
    assert_eq!(
        dates(&body),
        vec!["2024-01-05", "2024-01-04", "2024-01-03", "2024-01-02", "2024-01-01"]
    );
}

#[tokio::test]
async fn test_out_of_range_params_are_clamped() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let clamped = body_json(get(state.clone(), "/api/creditos/paginated/7891011?page=-3&size=0").await).await;
    let defaults = body_json(get(state.clone(), "/api/creditos/paginated/7891011?page=0&size=10").await).await;
    let absent = body_json(get(state.clone(), "/api/creditos/paginated/7891011").await).await;

    assert_eq!(clamped, defaults);
    assert_eq!(absent, defaults);
    assert_eq!(defaults["size"], 10);
    assert_eq!(defaults["page"], 0);

    let capped = body_json(get(state, "/api/creditos/paginated/7891011?size=1000").await).await;
    assert_eq!(capped["size"], 100);
    assert_eq!(capped["content"].as_array().unwrap().len(), 15);
    assert_eq!(capped["totalPages"], 1);
}

#[tokio::test]
async fn test_paginated_lookup_sorts_by_date_descending() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(vec![
        credito(1, "555", "2024-01-01"),
        credito(2, "555", "2024-03-01"),
        credito(3, "555", "2024-02-01"),
    ]));

    let body = body_json(get(state, "/api/creditos/paginated/555").await).await;
    assert_eq!(dates(&body), vec!["2024-03-01", "2024-02-01", "2024-01-01"]);
    assert_eq!(body["first"], true);
    assert_eq!(body["last"], true);
}

#[tokio::test]
async fn test_page_past_the_end_is_not_found() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let response = get(state, "/api/creditos/paginated/7891011?page=5&size=10").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filtered_endpoint_combines_present_filters() {
    let mut other_type = credito(20, "7891011", "2024-02-01");
    other_type.tipo_credito = "OUTRO".to_string();
    let mut not_simples = credito(21, "7891011", "2024-02-02");
    not_simples.simples_nacional = Some(false);
    let mut unknown_regime = credito(22, "7891011", "2024-02-03");
    unknown_regime.simples_nacional = None;

    let mut creditos = fifteen_creditos();
    creditos.extend([other_type, not_simples, unknown_regime, credito(23, "42", "2024-02-04")]);
    let (state, _rx) = setup(InMemoryCreditoStore::new(creditos));

    let all = body_json(get(state.clone(), "/api/creditos?size=100").await).await;
    assert_eq!(all["totalElements"], 19);

    let by_nfse = body_json(get(state.clone(), "/api/creditos?numeroNfse=7891011&size=100").await).await;
    assert_eq!(by_nfse["totalElements"], 18);

    let by_type = body_json(get(state.clone(), "/api/creditos?tipoCredito=OUTRO").await).await;
    assert_eq!(by_type["totalElements"], 1);
    assert_eq!(by_type["content"][0]["id"], 20);

    let not_simples = body_json(
        get(state.clone(), "/api/creditos?numeroNfse=7891011&simplesNacional=false").await,
    )
    .await;
    assert_eq!(not_simples["totalElements"], 1);
    assert_eq!(not_simples["content"][0]["id"], 21);

    let all_three = body_json(
        get(
            state.clone(),
            "/api/creditos?numeroNfse=7891011&tipoCredito=ISSQN&simplesNacional=true&page=1&size=10",
        )
        .await,
    )
    .await;
    assert_eq!(all_three["totalElements"], 15);
    assert_eq!(all_three["content"].as_array().unwrap().len(), 5);

    let none = get(state, "/api/creditos?numeroNfse=42&tipoCredito=OUTRO").await;
    assert_eq!(none.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filtered_endpoint_matches_paginated_lookup() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let filtered = body_json(get(state.clone(), "/api/creditos?numeroNfse=7891011&page=1&size=4").await).await;
    let paginated = body_json(get(state, "/api/creditos/paginated/7891011?page=1&size=4").await).await;
    assert_eq!(filtered, paginated);
}

#[tokio::test]
async fn test_store_failure_is_server_error_and_audited() {
    let (state, mut rx) = setup(FailingStore);

    let response = get(state.clone(), "/api/creditos/7891011").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Database error");

    let response = get(state, "/api/creditos/paginated/7891011").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    for _ in 0..2 {
        let event = rx.recv().await.unwrap();
        assert!(!event.success);
        assert_eq!(event.result_count, 0);
        assert!(event.error_message.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_store_is_server_error_and_audited() {
    let (state, mut rx) = setup(HangingStore);

    for uri in [
        "/api/creditos/7891011",
        "/api/creditos/paginated/7891011?page=0&size=10",
        "/api/creditos?tipoCredito=ISSQN",
    ] {
        let response = get(state.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Database error");
    }

    let endpoints = [
        "/api/creditos/{numeroNfse}",
        "/api/creditos/paginated/{numeroNfse}",
        "/api/creditos",
    ];
    for endpoint in endpoints {
        let event = rx.recv().await.unwrap();
        assert_eq!(event.endpoint, endpoint);
        assert_eq!(event.http_method, "GET");
        assert!(!event.success);
        assert_eq!(event.result_count, 0);
        let message = event.error_message.unwrap();
        assert!(message.contains("did not answer"), "{}", message);
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_every_request_emits_one_audit_event() {
    let (state, mut rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    get(state.clone(), "/api/creditos/7891011").await;
    get(state.clone(), "/api/creditos/paginated/7891011?page=1&size=10").await;
    get(state, "/api/creditos/paginated/999999").await;

    let found = rx.recv().await.unwrap();
    assert_eq!(found.endpoint, "/api/creditos/{numeroNfse}");
    assert_eq!(found.http_method, "GET");
    assert_eq!(found.request_params["numeroNfse"], "7891011");
    assert_eq!(found.result_count, 15);
    assert!(found.success);

    let paged = rx.recv().await.unwrap();
    assert_eq!(paged.endpoint, "/api/creditos/paginated/{numeroNfse}");
    assert_eq!(paged.request_params["page"], 1);
    assert_eq!(paged.request_params["size"], 10);
    assert_eq!(paged.result_count, 5);

    let not_found = rx.recv().await.unwrap();
    assert!(not_found.success);
    assert_eq!(not_found.result_count, 0);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_dropped_audit_consumer_does_not_affect_responses() {
    let (state, rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));
    drop(rx);

    let response = get(state, "/api/creditos/paginated/7891011").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_size_is_rejected_by_extractor() {
    let (state, _rx) = setup(InMemoryCreditoStore::new(fifteen_creditos()));

    let response = get(state, "/api/creditos/paginated/7891011?size=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let (state, _rx) = setup(InMemoryCreditoStore::default());

    let response = get(state.clone(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = get(state, "/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/creditos/paginated/{numeroNfse}"].is_object());
    assert!(doc["components"]["schemas"]["Credito"].is_object());
}
