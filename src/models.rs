use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::hash::{Hash, Hasher};
use utoipa::{IntoParams, ToSchema};

// ============ Database Models ============

/// A constituted tax credit linked to an NFS-e.
///
/// Monetary values and rates are kept as `BigDecimal` and serialized as JSON
/// strings, so amounts never pass through binary floating point.
///
/// Equality and hashing are structural over the business fields: `id` is the
/// storage surrogate key and takes no part in them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credito {
    /// Surrogate key assigned by the store.
    pub id: i64,
    /// Credit number (business identifier).
    pub numero_credito: String,
    /// NFS-e (service invoice) number the credit belongs to.
    pub numero_nfse: String,
    /// Date the credit was legally constituted.
    pub data_constituicao: NaiveDate,
    /// ISSQN amount.
    #[schema(value_type = String, example = "150.00")]
    pub valor_issqn: BigDecimal,
    /// Credit type (e.g. "ISSQN").
    pub tipo_credito: String,
    /// Whether the issuer is under the Simples Nacional regime.
    pub simples_nacional: Option<bool>,
    /// Tax rate.
    #[schema(value_type = String, example = "5.00")]
    pub aliquota: BigDecimal,
    /// Invoiced amount.
    #[schema(value_type = String, example = "3000.00")]
    pub valor_faturado: BigDecimal,
    /// Deduction amount.
    #[schema(value_type = String, example = "0.00")]
    pub valor_deducao: BigDecimal,
    /// Calculation base.
    #[schema(value_type = String, example = "3000.00")]
    pub base_calculo: BigDecimal,
}

impl PartialEq for Credito {
    fn eq(&self, other: &Self) -> bool {
        self.numero_credito == other.numero_credito
            && self.numero_nfse == other.numero_nfse
            && self.data_constituicao == other.data_constituicao
            && self.valor_issqn == other.valor_issqn
            && self.tipo_credito == other.tipo_credito
            && self.simples_nacional == other.simples_nacional
            && self.aliquota == other.aliquota
            && self.valor_faturado == other.valor_faturado
            && self.valor_deducao == other.valor_deducao
            && self.base_calculo == other.base_calculo
    }
}

impl Eq for Credito {}

impl Hash for Credito {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numero_credito.hash(state);
        self.numero_nfse.hash(state);
        self.data_constituicao.hash(state);
        self.valor_issqn.hash(state);
        self.tipo_credito.hash(state);
        self.simples_nacional.hash(state);
        self.aliquota.hash(state);
        self.valor_faturado.hash(state);
        self.valor_deducao.hash(state);
        self.base_calculo.hash(state);
    }
}

// ============ API Request Models ============

/// Query parameters for the paginated lookup by NFS-e.
///
/// Both values are optional and may be out of range; they are clamped by
/// [`crate::pagination::PageRequest::new`] rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Zero-based page index (default 0, negative values read as 0).
    pub page: Option<i64>,
    /// Page size (default 10, capped at 100).
    pub size: Option<i64>,
}

/// Query parameters for the filtered, paginated lookup.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct CreditoFilterParams {
    /// Exact NFS-e number.
    pub numero_nfse: Option<String>,
    /// Exact credit type.
    pub tipo_credito: Option<String>,
    /// Simples Nacional flag.
    pub simples_nacional: Option<bool>,
    /// Zero-based page index (default 0, negative values read as 0).
    pub page: Option<i64>,
    /// Page size (default 10, capped at 100).
    pub size: Option<i64>,
}
