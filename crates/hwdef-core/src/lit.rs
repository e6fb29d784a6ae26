//! Validated numeric literal wrappers.
//!
//! Definition files carry addresses as `0x`-prefixed hexadecimal text and
//! counts/indices as plain decimal text. Both wrappers reject malformed
//! input at construction so later stages can assume well-formed literals.

use std::fmt;

use thiserror::Error;

/// Errors from literal construction and alignment.
#[derive(Debug, Error)]
pub enum LiteralError {
    #[error("invalid hexadecimal literal `{text}`")]
    InvalidHex { text: String },

    #[error("invalid integer literal `{text}`")]
    InvalidInt { text: String },

    #[error("`{text}` cannot be aligned to {align} hex digits without dropping nonzero digits")]
    Misaligned { text: String, align: usize },
}

/// A validated `0x`-prefixed hexadecimal literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexLit(String);

impl HexLit {
    /// Parse a hex literal. Requires `0x`/`0X` prefix, at least one digit,
    /// and at most 16 digits (the value must fit in a `u64`).
    pub fn parse(text: &str) -> Result<Self, LiteralError> {
        if !Self::is_hex(text) {
            return Err(LiteralError::InvalidHex { text: text.into() });
        }
        Ok(HexLit(text.to_string()))
    }

    /// Whether `text` is a well-formed hex literal.
    pub fn is_hex(text: &str) -> bool {
        let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) else {
            return false;
        };
        !digits.is_empty() && digits.len() <= 16 && digits.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Build a literal from a value, uppercase without leading zeros.
    pub fn from_value(value: u64) -> Self {
        HexLit(format!("0x{value:X}"))
    }

    /// The numeric value.
    pub fn value(&self) -> u64 {
        // Constructors guarantee at most 16 hex digits.
        u64::from_str_radix(&self.0[2..], 16).unwrap_or(0)
    }

    /// Re-render with exactly `align` digits: shorter literals are
    /// zero-padded, longer ones may only lose leading zeros.
    pub fn aligned(&self, align: usize) -> Result<Self, LiteralError> {
        let digits = &self.0[2..];
        if digits.len() > align && digits[..digits.len() - align].bytes().any(|b| b != b'0') {
            return Err(LiteralError::Misaligned {
                text: self.0.clone(),
                align,
            });
        }

        let trimmed = if digits.len() > align {
            &digits[digits.len() - align..]
        } else {
            digits
        };
        Ok(HexLit(format!("0x{trimmed:0>align$}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated decimal integer literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntLit(String);

impl IntLit {
    pub fn parse(text: &str) -> Result<Self, LiteralError> {
        if !Self::is_int(text) {
            return Err(LiteralError::InvalidInt { text: text.into() });
        }
        Ok(IntLit(text.to_string()))
    }

    /// Whether `text` is all decimal digits and fits in a `u64`.
    pub fn is_int(text: &str) -> bool {
        !text.is_empty()
            && text.bytes().all(|b| b.is_ascii_digit())
            && text.parse::<u64>().is_ok()
    }

    pub fn value(&self) -> u64 {
        self.0.parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a cell that may be either decimal or hexadecimal.
pub fn parse_number(text: &str) -> Result<u64, LiteralError> {
    if IntLit::is_int(text) {
        Ok(IntLit::parse(text)?.value())
    } else {
        Ok(HexLit::parse(text)?.value())
    }
}
