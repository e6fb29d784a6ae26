//! Renderers: compiled definition models in, aligned C header text out.
//!
//! Every renderer returns the whole artifact as one `String`; the CLI
//! writes it exactly once, so a failing render never leaves a partial
//! file behind.

pub mod config;
pub mod error;
pub mod frame;
pub mod mem_header;
pub mod pkt_header;
pub mod reg_header;

pub use config::{MemConfig, PktConfig, RegConfig};
pub use error::EmitError;
