use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Invalid principal: {0} (must be a positive amount)")]
    InvalidPrincipal(f64),

    #[error("Invalid annual rate: {0}% (must be zero or positive)")]
    InvalidRate(f64),

    #[error("Invalid tenure: {0} years (expected 1-100)")]
    InvalidTenure(u32),

    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Invalid EMI override: {0}")]
    InvalidEmiOverride(f64),

    #[error("Invalid part payment amount: {0} (must be positive)")]
    InvalidPartPayment(f64),

    #[error("Project '{0}' not found")]
    ProjectNotFound(Uuid),

    #[error("Part payment '{part_payment}' not found in project '{project}'")]
    PartPaymentNotFound { project: Uuid, part_payment: Uuid },

    #[error("Invalid import format: {0}")]
    InvalidImport(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LoanResult<T> = Result<T, LoanError>;
