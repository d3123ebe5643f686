//! Créditos Query API Library
//!
//! Read-only lookup of constituted tax credits ("créditos") by NFS-e number,
//! with clamped pagination, optional filters and a fire-and-forget audit
//! trail.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core query logic.
//! - `data`: Data access layer.
//! - `obs`: Observability (audit hand-off).
//! - `app`: Router assembly and OpenAPI document.
//! - `audit`: Audit events and their publisher.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: PostgreSQL credit store.
//! - `errors`: Error handling types.
//! - `filter`: Optional-filter composition.
//! - `handlers`: HTTP request handlers.
//! - `models`: Credit record and request parameter models.
//! - `page`: Fetched pages and the paginated response shape.
//! - `pagination`: Page request normalization.
//! - `services`: Credit lookup service.
//! - `store`: Store abstraction and in-memory store.

pub mod api;
pub mod core;
pub mod data;
pub mod obs;

pub mod app;
pub mod audit;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod page;
pub mod pagination;
pub mod services;
pub mod store;
