//! Shared leaf utilities for the hwdef definition compiler.
//!
//! Validated literal wrappers, identifier rules, the deterministic table
//! emitter, and source-file content hashing. Everything here is pure text
//! and number handling; no I/O.

pub mod hash;
pub mod ident;
pub mod lit;
pub mod table;

pub use hash::content_hash;
pub use ident::is_identifier;
pub use lit::{parse_number, HexLit, IntLit, LiteralError};
pub use table::{Table, TextBlock};
