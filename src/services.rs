use crate::errors::AppError;
use crate::filter::CreditoFilter;
use crate::models::Credito;
use crate::page::PaginatedResponse;
use crate::pagination::PageRequest;
use crate::store::CreditoStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for a single store call. Kept well below
/// [`crate::app::REQUEST_TIMEOUT`] so a stalled store is reported by the
/// handler (500 plus a failed audit event) before the request is cut off.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Credit lookups: composes filters and pagination over a [`CreditoStore`].
///
/// Empty results are returned as-is; turning them into `NotFound` is the
/// HTTP layer's job.
pub struct CreditoService<S> {
    store: Arc<S>,
    store_timeout: Duration,
}

impl<S> Clone for CreditoService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            store_timeout: self.store_timeout,
        }
    }
}

impl<S: CreditoStore> CreditoService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_store_timeout(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_store_timeout(store: Arc<S>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Runs a store call under the store deadline.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::StoreTimeout(self.store_timeout)),
        }
    }

    /// All credits for an NFS-e, unpaginated and in store order.
    pub async fn find_by_numero_nfse(&self, numero_nfse: &str) -> Result<Vec<Credito>, AppError> {
        let creditos = self
            .bounded(self.store.find_by_numero_nfse(numero_nfse))
            .await?;
        tracing::debug!("Found {} creditos for NFS-e {}", creditos.len(), numero_nfse);
        Ok(creditos)
    }

    /// One page of credits for an NFS-e, most recent first.
    pub async fn find_by_numero_nfse_paginated(
        &self,
        numero_nfse: &str,
        request: PageRequest,
    ) -> Result<PaginatedResponse<Credito>, AppError> {
        self.find_filtered(&CreditoFilter::by_numero_nfse(numero_nfse), request)
            .await
    }

    /// One page of credits matching every present filter, most recent first.
    pub async fn find_filtered(
        &self,
        filter: &CreditoFilter,
        request: PageRequest,
    ) -> Result<PaginatedResponse<Credito>, AppError> {
        let page = self.bounded(self.store.find_page(filter, request)).await?;
        tracing::debug!(
            "Page {} (size {}) of creditos: {} of {} total, filter: {:?}",
            request.page(),
            request.size(),
            page.content().len(),
            page.total_elements(),
            filter
        );
        Ok(PaginatedResponse::from(page))
    }
}
