//! The `CreditoStore` trait and an in-memory implementation.
//!
//! Handlers and services depend on this abstraction; the PostgreSQL backend
//! lives in [`crate::db_storage`].

use std::future::Future;

use crate::errors::AppError;
use crate::filter::CreditoFilter;
use crate::models::Credito;
use crate::page::Page;
use crate::pagination::{PageRequest, Sort};

/// Read-only access to credit records.
///
/// All methods return `Send` futures so implementations can be shared across
/// axum handlers on a multi-threaded runtime.
pub trait CreditoStore: Send + Sync + 'static {
    /// Every record with the given NFS-e number, in store order.
    ///
    /// No sort is applied: callers get whatever order the store yields.
    fn find_by_numero_nfse(
        &self,
        numero_nfse: &str,
    ) -> impl Future<Output = Result<Vec<Credito>, AppError>> + Send;

    /// One page of the records matching `filter`, ordered by `request.sort()`,
    /// together with the total number of matches.
    fn find_page(
        &self,
        filter: &CreditoFilter,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page<Credito>, AppError>> + Send;
}

/// Store backed by a vector held in insertion order.
///
/// Used by the test suites and for running the API without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCreditoStore {
    creditos: Vec<Credito>,
}

impl InMemoryCreditoStore {
    pub fn new(creditos: Vec<Credito>) -> Self {
        Self { creditos }
    }

    pub fn len(&self) -> usize {
        self.creditos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creditos.is_empty()
    }
}

impl FromIterator<Credito> for InMemoryCreditoStore {
    fn from_iter<I: IntoIterator<Item = Credito>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl CreditoStore for InMemoryCreditoStore {
    async fn find_by_numero_nfse(&self, numero_nfse: &str) -> Result<Vec<Credito>, AppError> {
        Ok(self
            .creditos
            .iter()
            .filter(|c| c.numero_nfse == numero_nfse)
            .cloned()
            .collect())
    }

    async fn find_page(
        &self,
        filter: &CreditoFilter,
        request: PageRequest,
    ) -> Result<Page<Credito>, AppError> {
        let mut matching: Vec<&Credito> =
            self.creditos.iter().filter(|c| filter.matches(c)).collect();

        // Stable sort: equal dates keep insertion order
        match request.sort() {
            Sort::DataConstituicaoDesc => {
                matching.sort_by(|a, b| b.data_constituicao.cmp(&a.data_constituicao))
            }
        }

        let total_elements = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = matching
            .into_iter()
            .skip(offset)
            .take(request.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, request, total_elements))
    }
}
