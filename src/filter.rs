//! Optional-filter composition for credit lookups.
//!
//! A [`CreditoFilter`] expands into a list of [`FilterPredicate`]s holding only
//! the filters that were supplied. Both the in-memory match and the SQL
//! `WHERE` clause are generated from that list, so an absent filter never
//! constrains the result.

use crate::models::{Credito, CreditoFilterParams};

/// Optional filter values; `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditoFilter {
    pub numero_nfse: Option<String>,
    pub tipo_credito: Option<String>,
    pub simples_nacional: Option<bool>,
}

/// A single equality constraint on one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPredicate<'a> {
    NumeroNfse(&'a str),
    TipoCredito(&'a str),
    SimplesNacional(bool),
}

impl FilterPredicate<'_> {
    /// Column the predicate compares against.
    pub fn column(&self) -> &'static str {
        match self {
            FilterPredicate::NumeroNfse(_) => "numero_nfse",
            FilterPredicate::TipoCredito(_) => "tipo_credito",
            FilterPredicate::SimplesNacional(_) => "simples_nacional",
        }
    }

    pub fn matches(&self, credito: &Credito) -> bool {
        match *self {
            FilterPredicate::NumeroNfse(value) => credito.numero_nfse == value,
            FilterPredicate::TipoCredito(value) => credito.tipo_credito == value,
            // NULL flags never equal a requested value
            FilterPredicate::SimplesNacional(value) => credito.simples_nacional == Some(value),
        }
    }
}

impl CreditoFilter {
    /// Filter on NFS-e number only.
    pub fn by_numero_nfse(numero_nfse: impl Into<String>) -> Self {
        Self {
            numero_nfse: Some(numero_nfse.into()),
            ..Self::default()
        }
    }

    /// Predicates for the filters that are present, in column order.
    pub fn predicates(&self) -> Vec<FilterPredicate<'_>> {
        let mut predicates = Vec::with_capacity(3);
        if let Some(ref numero_nfse) = self.numero_nfse {
            predicates.push(FilterPredicate::NumeroNfse(numero_nfse));
        }
        if let Some(ref tipo_credito) = self.tipo_credito {
            predicates.push(FilterPredicate::TipoCredito(tipo_credito));
        }
        if let Some(simples_nacional) = self.simples_nacional {
            predicates.push(FilterPredicate::SimplesNacional(simples_nacional));
        }
        predicates
    }

    /// True when no filter is present (the query is unfiltered).
    pub fn is_empty(&self) -> bool {
        self.numero_nfse.is_none() && self.tipo_credito.is_none() && self.simples_nacional.is_none()
    }

    /// Conjunction over the present filters.
    pub fn matches(&self, credito: &Credito) -> bool {
        self.predicates().iter().all(|p| p.matches(credito))
    }
}

impl From<&CreditoFilterParams> for CreditoFilter {
    fn from(params: &CreditoFilterParams) -> Self {
        Self {
            numero_nfse: params.numero_nfse.clone(),
            tipo_credito: params.tipo_credito.clone(),
            simples_nacional: params.simples_nacional,
        }
    }
}
