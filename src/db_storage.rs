use crate::errors::{AppError, ResultExt};
use crate::filter::{CreditoFilter, FilterPredicate};
use crate::models::Credito;
use crate::page::Page;
use crate::pagination::PageRequest;
use crate::store::CreditoStore;
use sqlx::{PgPool, Postgres, QueryBuilder};

const CREDITO_COLUMNS: &str = "id, numero_credito, numero_nfse, data_constituicao, valor_issqn, \
     tipo_credito, simples_nacional, aliquota, valor_faturado, valor_deducao, base_calculo";

/// PostgreSQL-backed credit store.
#[derive(Clone)]
pub struct PgCreditoStore {
    pool: PgPool,
}

impl PgCreditoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends `WHERE col = $n AND ...` for the present filters only.
fn push_filter_predicates(builder: &mut QueryBuilder<'_, Postgres>, filter: &CreditoFilter) {
    for (i, predicate) in filter.predicates().into_iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column()).push(" = ");
        match predicate {
            FilterPredicate::NumeroNfse(value) | FilterPredicate::TipoCredito(value) => {
                builder.push_bind(value.to_owned());
            }
            FilterPredicate::SimplesNacional(value) => {
                builder.push_bind(value);
            }
        }
    }
}

/// Builds the `COUNT(*)` query for a filter.
pub fn count_query(filter: &CreditoFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM credito");
    push_filter_predicates(&mut builder, filter);
    builder
}

/// Builds the page query for a filter: fixed sort, `LIMIT`/`OFFSET` bound.
pub fn page_query(filter: &CreditoFilter, request: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM credito", CREDITO_COLUMNS));
    push_filter_predicates(&mut builder, filter);
    builder
        .push(" ORDER BY ")
        .push(request.sort().order_by_clause())
        .push(" LIMIT ")
        .push_bind(i64::from(request.size()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(request.offset()).unwrap_or(i64::MAX));
    builder
}

impl CreditoStore for PgCreditoStore {
    async fn find_by_numero_nfse(&self, numero_nfse: &str) -> Result<Vec<Credito>, AppError> {
        sqlx::query_as::<_, Credito>(&format!(
            "SELECT {} FROM credito WHERE numero_nfse = $1",
            CREDITO_COLUMNS
        ))
        .bind(numero_nfse)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch creditos for NFS-e {}", numero_nfse))
    }

    async fn find_page(
        &self,
        filter: &CreditoFilter,
        request: PageRequest,
    ) -> Result<Page<Credito>, AppError> {
        let mut count = count_query(filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count creditos")?;

        let total_elements = u64::try_from(total)
            .map_err(|_| AppError::InternalError(format!("Negative credito count: {}", total)))?;

        // Nothing to fetch past the last match
        if request.offset() >= total_elements {
            return Ok(Page::new(Vec::new(), request, total_elements));
        }

        let mut select = page_query(filter, request);
        let content = select
            .build_query_as::<Credito>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch credito page")?;

        tracing::debug!(
            "Fetched {} of {} creditos (page={}, size={})",
            content.len(),
            total_elements,
            request.page(),
            request.size()
        );

        Ok(Page::new(content, request, total_elements))
    }
}
