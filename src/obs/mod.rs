//! Observability.

pub mod audit {
    pub use crate::audit::*;
}
