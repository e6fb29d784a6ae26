//! Definition compiler: CSV rows in, validated entity models out.
//!
//! Each domain (memory map, register, packet) classifies rows against its
//! own kind vocabulary and folds them left to right into an owning model.
//! The first error aborts the compile.

pub mod csv;
pub mod error;
pub mod fields;
pub mod mem;
pub mod pkt;
pub mod reg;
pub mod stride;

pub use csv::CsvTable;
pub use error::DefError;
pub use fields::{Access, EnumDef, Field};
pub use mem::MemDef;
pub use pkt::PktDef;
pub use reg::RegDef;
pub use stride::Pattern;
