use scopf_core::ValidationError;
use thiserror::Error;

/// Errors from building or solving a security-constrained model
#[derive(Error, Debug)]
pub enum ScopfError {
    /// Input rejected before any row was assembled
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Solver proved that no dispatch satisfies every scenario
    #[error("problem is infeasible: {0}")]
    Infeasible(String),

    /// Objective has no lower bound
    #[error("problem is unbounded")]
    Unbounded,

    /// Any other solver failure
    #[error("solver failed: {0}")]
    Solver(String),

    /// Requested configuration cannot be honoured
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScopfError {
    /// Whether the input itself was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, ScopfError::Validation(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, ScopfError::Infeasible(_))
    }
}

pub type ScopfResult<T> = Result<T, ScopfError>;
