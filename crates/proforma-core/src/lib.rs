pub mod debt;
pub mod error;
pub mod metrics;
pub mod noi;
pub mod returns;
pub mod time_value;
pub mod types;

pub use error::ProformaError;
pub use types::*;

/// Standard result type for all proforma operations
pub type ProformaResult<T> = Result<T, ProformaError>;
