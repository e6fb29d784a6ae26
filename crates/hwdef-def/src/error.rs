//! Compilation errors.
//!
//! Every variant except `Invariant` is a user-input error: the definition
//! file is malformed or inconsistent and must be fixed before re-running.
//! `Invariant` marks a defect in the compiler itself. The first error
//! aborts the whole compile; no partial model is returned.

use hwdef_core::LiteralError;
use thiserror::Error;

/// Errors from compiling a definition file into an entity model.
#[derive(Debug, Error)]
pub enum DefError {
    #[error("definition file has no rows")]
    EmptyInput,

    #[error("missing declared column `{key}` in header row")]
    Schema { key: String },

    #[error("malformed row [{row}]: {reason}")]
    MalformedRow { row: String, reason: String },

    #[error("malformed define `{define}`: {reason}")]
    MalformedDefine { define: String, reason: String },

    #[error("invalid name `{name}`")]
    InvalidName { name: String },

    #[error("duplicate name `{name}`")]
    DuplicateName { name: String },

    #[error("duplicate value `{value}` in field `{field}`")]
    DuplicateValue { field: String, value: String },

    #[error("unresolved reference `{name}`")]
    UnresolvedReference { name: String },

    #[error("field `{field}` bits {bits} overlap an existing field")]
    OverlappingBits { field: String, bits: String },

    #[error("field `{field}` has no active offset to attach to")]
    DanglingField { field: String },

    #[error("enum `{name}` has no active field to attach to")]
    DanglingEnum { name: String },

    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error("internal invariant violated: {0}")]
    Invariant(String),
}
