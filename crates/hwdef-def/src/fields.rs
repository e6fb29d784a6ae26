//! Bit-field and enumerant entities shared by the register and packet
//! domains.

use serde::Serialize;

use crate::error::DefError;

/// Field access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    Ro,
    Rw,
}

impl Access {
    pub fn parse(text: &str) -> Result<Self, DefError> {
        match text {
            "RO" => Ok(Access::Ro),
            "RW" => Ok(Access::Rw),
            _ => Err(DefError::MalformedRow {
                row: text.to_string(),
                reason: "access must be RO or RW".into(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Ro => "RO",
            Access::Rw => "RW",
        }
    }
}

/// A named constant attached to a field.
#[derive(Debug, Clone, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub value: u64,
}

/// A named bit range `[hi:lo]` within a 32-bit value.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub hi: u8,
    pub lo: u8,
    pub access: Option<Access>,
    pub reset: Option<u64>,
    pub enums: Vec<EnumDef>,
}

impl Field {
    pub fn width(&self) -> u32 {
        u32::from(self.hi - self.lo) + 1
    }

    /// The field's mask within the 32-bit register value.
    pub fn mask(&self) -> u64 {
        (((1u64 << self.width()) - 1) << self.lo) & 0xFFFF_FFFF
    }

    pub fn bits_text(&self) -> String {
        format!("[{}:{}]", self.hi, self.lo)
    }

    /// Register an enumerant; name and numeric value must both be unique
    /// within this field. Enums stay sorted by value.
    pub fn add_enum(&mut self, name: String, value: u64) -> Result<(), DefError> {
        if self.enums.iter().any(|e| e.name == name) {
            return Err(DefError::DuplicateName { name });
        }
        if self.enums.iter().any(|e| e.value == value) {
            return Err(DefError::DuplicateValue {
                field: self.name.clone(),
                value: format!("0x{value:X}"),
            });
        }
        self.enums.push(EnumDef { name, value });
        self.enums.sort_by_key(|e| e.value);
        Ok(())
    }
}

/// Parse a `[hi]` or `[hi:lo]` bits cell into a normalized `(hi, lo)` with
/// `hi >= lo` and both within 0..=31.
pub fn parse_bits(text: &str) -> Result<(u8, u8), DefError> {
    let malformed = |reason: &str| DefError::MalformedRow {
        row: text.to_string(),
        reason: reason.into(),
    };

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| malformed("bits must fit the format [hi] or [hi:lo]"))?;
    if inner.is_empty() {
        return Err(malformed("bits must fit the format [hi] or [hi:lo]"));
    }

    let tokens: Vec<&str> = inner.split(':').collect();
    if tokens.len() > 2 {
        return Err(malformed("bits must fit the format [hi] or [hi:lo]"));
    }

    let mut bounds = Vec::with_capacity(2);
    for token in &tokens {
        let bit: u8 = token
            .parse()
            .map_err(|_| malformed("bit bounds must be numbers"))?;
        if bit > 31 {
            return Err(malformed("bit bounds must be within 0 to 31"));
        }
        bounds.push(bit);
    }

    Ok(match bounds[..] {
        [only] => (only, only),
        [a, b] => (a.max(b), a.min(b)),
        _ => unreachable!(),
    })
}

/// Attach a new field to `fields`, enforcing unique names and disjoint bit
/// ranges. Fields stay sorted by low bit; returns the index of the new
/// field after sorting.
pub fn attach_field(fields: &mut Vec<Field>, field: Field) -> Result<usize, DefError> {
    if fields.iter().any(|f| f.name == field.name) {
        return Err(DefError::DuplicateName { name: field.name });
    }
    if fields
        .iter()
        .any(|f| field.lo <= f.hi && f.lo <= field.hi)
    {
        return Err(DefError::OverlappingBits {
            field: field.name.clone(),
            bits: field.bits_text(),
        });
    }

    let name = field.name.clone();
    fields.push(field);
    fields.sort_by_key(|f| f.lo);
    fields
        .iter()
        .position(|f| f.name == name)
        .ok_or_else(|| DefError::Invariant("field vanished after insertion".into()))
}
