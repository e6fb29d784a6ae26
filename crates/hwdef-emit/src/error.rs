use hwdef_core::LiteralError;
use thiserror::Error;

/// Errors from configuration validation and rendering.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("invalid configuration `{field}`: {reason}")]
    Config { field: &'static str, reason: String },

    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
