//! Optional `hwdef.toml` manifest.
//!
//! A project keeps its recurring renderer options here so invocations
//! stay short. Command-line arguments always win over manifest values,
//! which in turn win over the built-in defaults.
//!
//! ```toml
//! [mem]
//! prefix = "SOC_"
//! bits = 32
//!
//! [reg]
//! name = "UART"
//! notes = "See the UART datasheet, rev B."
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const MANIFEST_FILE: &str = "hwdef.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub mem: MemDefaults,
    pub reg: RegDefaults,
    pub pkt: PktDefaults,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemDefaults {
    pub guard: Option<String>,
    pub prefix: Option<String>,
    pub postfix: Option<String>,
    pub array: Option<String>,
    pub bits: Option<u32>,
    pub align: Option<usize>,
    pub annotation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegDefaults {
    pub name: Option<String>,
    pub register: Option<String>,
    pub offset: Option<String>,
    pub memory: Option<String>,
    pub bits: Option<u32>,
    pub align: Option<usize>,
    pub mask: Option<String>,
    pub shift: Option<String>,
    pub access: Option<String>,
    pub reset: Option<String>,
    pub raw: Option<String>,
    pub value: Option<String>,
    pub plural: Option<String>,
    pub array: Option<String>,
    pub number: Option<String>,
    pub guard: Option<String>,
    pub notes: Option<String>,
    pub annotation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PktDefaults {
    pub name: Option<String>,
    pub mask: Option<String>,
    pub shift: Option<String>,
    pub raw: Option<String>,
    pub value: Option<String>,
    pub guard: Option<String>,
    pub notes: Option<String>,
    pub annotation: Option<bool>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Manifest> {
        toml::from_str(text).context("parsing manifest")
    }
}

/// Load `hwdef.toml` from `dir` if present; a missing manifest just means
/// built-in defaults.
pub fn load_manifest_optional(dir: &Path) -> Result<Manifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(Manifest::default());
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Manifest::parse(&text).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_tables() {
        let manifest = Manifest::parse(
            "[mem]\nprefix = \"SOC_\"\nbits = 32\n\n[reg]\nname = \"UART\"\n",
        )
        .unwrap();
        assert_eq!(manifest.mem.prefix.as_deref(), Some("SOC_"));
        assert_eq!(manifest.mem.bits, Some(32));
        assert_eq!(manifest.reg.name.as_deref(), Some("UART"));
        assert!(manifest.pkt.guard.is_none());
    }

    #[test]
    fn empty_manifest_is_all_defaults() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.mem.guard.is_none());
        assert!(manifest.reg.annotation.is_none());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load_manifest_optional(dir.path()).unwrap();
        assert!(manifest.mem.prefix.is_none());
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[mem\n").unwrap();
        assert!(load_manifest_optional(dir.path()).is_err());
    }
}
