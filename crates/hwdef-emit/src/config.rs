//! Renderer configuration.
//!
//! Each domain gets a plain struct plus a static rules table naming which
//! text fields may be empty and which letter case they must use. The CLI
//! fills the structs from arguments and the optional manifest; `validate`
//! runs before any renderer, so renderers never re-check options.

use crate::error::EmitError;

/// Letter-case convention for a text option.
#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// No lowercase ASCII letters (name-ish tokens spliced into macros).
    Upper,
    /// No uppercase ASCII letters (argument-ish tokens).
    Lower,
    Free,
}

/// One validation rule: the option's name, how to read it, whether it may
/// be empty, and its case convention.
pub struct Rule<C> {
    pub field: &'static str,
    pub get: for<'a> fn(&'a C) -> &'a str,
    pub allow_empty: bool,
    pub case: Case,
}

fn fits_case(value: &str, case: Case) -> bool {
    match case {
        Case::Upper => !value.chars().any(|c| c.is_ascii_lowercase()),
        Case::Lower => !value.chars().any(|c| c.is_ascii_uppercase()),
        Case::Free => true,
    }
}

fn check_rules<C>(config: &C, rules: &[Rule<C>]) -> Result<(), EmitError> {
    for rule in rules {
        let value = (rule.get)(config);
        if value.is_empty() {
            if !rule.allow_empty {
                return Err(EmitError::Config {
                    field: rule.field,
                    reason: "must not be empty".into(),
                });
            }
            continue;
        }
        if !fits_case(value, rule.case) {
            let expected = match rule.case {
                Case::Upper => "uppercase",
                Case::Lower => "lowercase",
                Case::Free => "free",
            };
            return Err(EmitError::Config {
                field: rule.field,
                reason: format!("`{value}` should be {expected}"),
            });
        }
    }
    Ok(())
}

/// Hex digit limit for a target width.
pub fn align_limit(bits: u32) -> usize {
    if bits == 64 {
        16
    } else {
        8
    }
}

fn check_bits_align(bits: u32, align: usize) -> Result<(), EmitError> {
    if bits != 32 && bits != 64 {
        return Err(EmitError::Config {
            field: "bits",
            reason: format!("{bits} should be 32 or 64"),
        });
    }
    let limit = align_limit(bits);
    if align == 0 || align > limit {
        return Err(EmitError::Config {
            field: "align",
            reason: format!("{align} should be between 1 and {limit}"),
        });
    }
    Ok(())
}

/// Memory C header options.
#[derive(Debug, Clone)]
pub struct MemConfig {
    pub guard: String,
    pub prefix: String,
    pub postfix: String,
    /// Macro argument token for array stride macros.
    pub array: String,
    pub bits: u32,
    pub align: usize,
    pub annotation: bool,
    pub debug: bool,
}

const MEM_RULES: &[Rule<MemConfig>] = &[
    Rule { field: "guard", get: |c| &c.guard, allow_empty: false, case: Case::Upper },
    Rule { field: "prefix", get: |c| &c.prefix, allow_empty: true, case: Case::Upper },
    Rule { field: "postfix", get: |c| &c.postfix, allow_empty: true, case: Case::Upper },
    Rule { field: "array", get: |c| &c.array, allow_empty: false, case: Case::Lower },
];

impl Default for MemConfig {
    fn default() -> Self {
        MemConfig {
            guard: String::new(),
            prefix: String::new(),
            postfix: String::new(),
            array: "i".into(),
            bits: 64,
            align: 16,
            annotation: true,
            debug: false,
        }
    }
}

impl MemConfig {
    pub fn validate(&self) -> Result<(), EmitError> {
        check_rules(self, MEM_RULES)?;
        check_bits_align(self.bits, self.align)
    }
}

/// Register C header options.
#[derive(Debug, Clone)]
pub struct RegConfig {
    /// Optional IP name, prefixed to every emitted macro when set.
    pub name: String,
    pub register: String,
    pub offset: String,
    /// Macro argument token for the memory base address.
    pub memory: String,
    pub bits: u32,
    pub align: usize,
    pub mask: String,
    pub shift: String,
    pub access: String,
    pub reset: String,
    pub raw: String,
    pub value: String,
    pub plural: String,
    /// Macro argument token for array stride macros.
    pub array: String,
    pub number: String,
    pub guard: String,
    pub notes: String,
    pub annotation: bool,
    pub debug: bool,
}

const REG_RULES: &[Rule<RegConfig>] = &[
    Rule { field: "name", get: |c| &c.name, allow_empty: true, case: Case::Upper },
    Rule { field: "register", get: |c| &c.register, allow_empty: false, case: Case::Upper },
    Rule { field: "offset", get: |c| &c.offset, allow_empty: false, case: Case::Upper },
    Rule { field: "memory", get: |c| &c.memory, allow_empty: false, case: Case::Lower },
    Rule { field: "mask", get: |c| &c.mask, allow_empty: false, case: Case::Upper },
    Rule { field: "shift", get: |c| &c.shift, allow_empty: false, case: Case::Upper },
    Rule { field: "access", get: |c| &c.access, allow_empty: false, case: Case::Upper },
    Rule { field: "reset", get: |c| &c.reset, allow_empty: false, case: Case::Upper },
    Rule { field: "raw", get: |c| &c.raw, allow_empty: false, case: Case::Upper },
    Rule { field: "value", get: |c| &c.value, allow_empty: false, case: Case::Upper },
    Rule { field: "plural", get: |c| &c.plural, allow_empty: false, case: Case::Upper },
    Rule { field: "array", get: |c| &c.array, allow_empty: false, case: Case::Lower },
    Rule { field: "number", get: |c| &c.number, allow_empty: false, case: Case::Upper },
    Rule { field: "guard", get: |c| &c.guard, allow_empty: false, case: Case::Upper },
    Rule { field: "notes", get: |c| &c.notes, allow_empty: true, case: Case::Free },
];

impl Default for RegConfig {
    fn default() -> Self {
        RegConfig {
            name: String::new(),
            register: "REG".into(),
            offset: "OFS".into(),
            memory: "mem".into(),
            bits: 64,
            align: 16,
            mask: "MASK".into(),
            shift: "SHIFT".into(),
            access: "ACCESS".into(),
            reset: "RESET".into(),
            raw: "RAW".into(),
            value: "VAL".into(),
            plural: "S".into(),
            array: "ch".into(),
            number: "NUM".into(),
            guard: String::new(),
            notes: String::new(),
            annotation: true,
            debug: false,
        }
    }
}

impl RegConfig {
    pub fn validate(&self) -> Result<(), EmitError> {
        check_rules(self, REG_RULES)?;
        check_bits_align(self.bits, self.align)
    }
}

/// Packet C header options.
#[derive(Debug, Clone)]
pub struct PktConfig {
    /// Optional purpose name, prefixed to every emitted macro when set.
    pub name: String,
    pub mask: String,
    pub shift: String,
    /// Macro argument token for the raw packet word.
    pub raw: String,
    pub value: String,
    pub guard: String,
    pub notes: String,
    pub annotation: bool,
    pub debug: bool,
}

const PKT_RULES: &[Rule<PktConfig>] = &[
    Rule { field: "name", get: |c| &c.name, allow_empty: true, case: Case::Upper },
    Rule { field: "mask", get: |c| &c.mask, allow_empty: false, case: Case::Upper },
    Rule { field: "shift", get: |c| &c.shift, allow_empty: false, case: Case::Upper },
    Rule { field: "raw", get: |c| &c.raw, allow_empty: false, case: Case::Lower },
    Rule { field: "value", get: |c| &c.value, allow_empty: false, case: Case::Upper },
    Rule { field: "guard", get: |c| &c.guard, allow_empty: false, case: Case::Upper },
    Rule { field: "notes", get: |c| &c.notes, allow_empty: true, case: Case::Free },
];

impl Default for PktConfig {
    fn default() -> Self {
        PktConfig {
            name: String::new(),
            mask: "MASK".into(),
            shift: "SHIFT".into(),
            raw: "raw".into(),
            value: "VAL".into(),
            guard: String::new(),
            notes: String::new(),
            annotation: true,
            debug: false,
        }
    }
}

impl PktConfig {
    pub fn validate(&self) -> Result<(), EmitError> {
        check_rules(self, PKT_RULES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_need_only_a_guard() {
        let mut mem = MemConfig::default();
        assert!(mem.validate().is_err());
        mem.guard = "MEM_MAP".into();
        mem.validate().unwrap();

        let mut reg = RegConfig::default();
        reg.guard = "REGS".into();
        reg.validate().unwrap();

        let mut pkt = PktConfig::default();
        pkt.guard = "PKTS".into();
        pkt.validate().unwrap();
    }

    #[test]
    fn case_rules_are_enforced() {
        let mut mem = MemConfig {
            guard: "MEM_MAP".into(),
            ..MemConfig::default()
        };
        mem.prefix = "Soc".into();
        let err = mem.validate().unwrap_err();
        assert!(matches!(err, EmitError::Config { field: "prefix", .. }));

        let mut reg = RegConfig {
            guard: "REGS".into(),
            ..RegConfig::default()
        };
        reg.memory = "MEM".into();
        let err = reg.validate().unwrap_err();
        assert!(matches!(err, EmitError::Config { field: "memory", .. }));
    }

    #[test]
    fn required_fields_must_not_be_empty() {
        let reg = RegConfig {
            guard: "REGS".into(),
            offset: String::new(),
            ..RegConfig::default()
        };
        let err = reg.validate().unwrap_err();
        assert!(matches!(err, EmitError::Config { field: "offset", .. }));
    }

    #[test]
    fn align_is_bounded_by_bits() {
        let mut mem = MemConfig {
            guard: "MEM_MAP".into(),
            ..MemConfig::default()
        };
        mem.bits = 32;
        mem.align = 16;
        let err = mem.validate().unwrap_err();
        assert!(matches!(err, EmitError::Config { field: "align", .. }));

        mem.align = 8;
        mem.validate().unwrap();
    }

    #[test]
    fn bits_must_be_32_or_64() {
        let mem = MemConfig {
            guard: "MEM_MAP".into(),
            bits: 16,
            align: 4,
            ..MemConfig::default()
        };
        let err = mem.validate().unwrap_err();
        assert!(matches!(err, EmitError::Config { field: "bits", .. }));
    }
}
