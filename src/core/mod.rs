// Query-layer modules and shared errors/models
pub mod filter {
    pub use crate::filter::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod page {
    pub use crate::page::*;
}

pub mod pagination {
    pub use crate::pagination::*;
}

pub mod services {
    pub use crate::services::*;
}

pub mod errors {
    pub use crate::errors::*;
}
