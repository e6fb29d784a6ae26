//! Memory-map definition domain.
//!
//! Compiles `name,value,define` rows into scalars (addresses), arrays,
//! aliases, and bookmarks. One left-to-right fold; alias and bookmark
//! targets must be declared before they are referenced.

use serde::Serialize;

use hwdef_core::{is_identifier, HexLit, IntLit};

use crate::csv::CsvTable;
use crate::error::DefError;
use crate::stride::Pattern;

/// Declared CSV keys for the memory domain.
pub const MEM_KEYS: &[&str] = &["name", "value", "define"];

/// Row kinds of the memory domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemKind {
    Address,
    Array,
    Alias,
    Bookmark,
}

#[derive(Debug)]
struct MemRow {
    kind: MemKind,
    name: String,
    value: String,
    define: String,
}

fn classify(cells: &[String]) -> Result<MemRow, DefError> {
    let [name, value, define] = cells else {
        return Err(DefError::Invariant("memory row projection width".into()));
    };

    if name.is_empty() || value.is_empty() || define.is_empty() {
        return Err(DefError::MalformedRow {
            row: cells.join(","),
            reason: "every cell of a memory row must be present".into(),
        });
    }

    if !is_identifier(name) {
        return Err(DefError::InvalidName { name: name.clone() });
    }

    let marker = define.split(',').next().unwrap_or_default();
    let kind = match marker {
        "address" | "=" => MemKind::Address,
        "array" | "*" => MemKind::Array,
        "alias" | "~" => MemKind::Alias,
        "bookmark" | "#" => MemKind::Bookmark,
        _ => {
            return Err(DefError::MalformedRow {
                row: cells.join(","),
                reason: format!(
                    "kind `{marker}` must be one of address(=), array(*), alias(~), bookmark(#)"
                ),
            })
        }
    };

    Ok(MemRow {
        kind,
        name: name.clone(),
        value: value.clone(),
        define: define.clone(),
    })
}

/// A single named address.
#[derive(Debug, Clone, Serialize)]
pub struct Scalar {
    pub name: String,
    pub value: u64,
}

/// One element of an array; its name is always derived as
/// `{array}_{index}`.
#[derive(Debug, Clone, Serialize)]
pub struct ArrayElement {
    pub index: u64,
    pub value: u64,
}

/// An indexed, possibly sparse collection of addresses.
#[derive(Debug, Clone, Serialize)]
pub struct Array {
    pub name: String,
    pub elements: Vec<ArrayElement>,
}

impl Array {
    pub fn element_name(&self, index: u64) -> String {
        format!("{}_{index}", self.name)
    }

    /// Highest element index; `_NUM` is this plus one.
    pub fn max_index(&self) -> Option<u64> {
        self.elements.iter().map(|e| e.index).max()
    }

    pub fn element_at(&self, index: u64) -> Option<&ArrayElement> {
        self.elements.iter().find(|e| e.index == index)
    }

    /// Infer the closed-form addressing pattern over the elements.
    pub fn pattern(&self) -> Pattern {
        let pairs: Vec<(u64, u64)> = self.elements.iter().map(|e| (e.index, e.value)).collect();
        Pattern::infer(&pairs)
    }
}

/// Resolved alias target, name-keyed back into the owning model.
#[derive(Debug, Clone, Serialize)]
pub enum AliasTarget {
    Scalar(String),
    Array(String),
    Element { array: String, index: u64 },
}

/// A pure rename of an existing scalar, array, or array element.
#[derive(Debug, Clone, Serialize)]
pub struct Alias {
    pub name: String,
    pub target: AliasTarget,
}

/// An annotation tag attached to an existing scalar or array element;
/// never introduces new addressable storage.
#[derive(Debug, Clone, Serialize)]
pub struct Bookmark {
    pub name: String,
    /// The target's (possibly derived) definition name.
    pub target: String,
}

/// The compiled memory-map model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemDef {
    pub scalars: Vec<Scalar>,
    pub arrays: Vec<Array>,
    pub aliases: Vec<Alias>,
    pub bookmarks: Vec<Bookmark>,
}

impl MemDef {
    /// Compile a memory definition from CSV. The first error aborts the
    /// whole compile.
    pub fn compile(table: &CsvTable) -> Result<Self, DefError> {
        let mut def = MemDef::default();

        for cells in table.project(MEM_KEYS)? {
            let row = classify(&cells)?;
            match row.kind {
                MemKind::Address => def.add_address(row)?,
                MemKind::Array => def.add_array(row)?,
                MemKind::Alias => def.add_alias(row)?,
                MemKind::Bookmark => def.add_bookmark(row)?,
            }
        }

        // Deterministic, address-ordered output regardless of input order;
        // stable sorts keep discovery order for equal addresses.
        def.scalars.sort_by_key(|s| s.value);
        def.arrays
            .sort_by_key(|a| a.elements.first().map_or(0, |e| e.value));

        Ok(def)
    }

    /// Whether `name` is taken anywhere in the domain namespace.
    fn name_exists(&self, name: &str) -> bool {
        self.scalars.iter().any(|s| s.name == name)
            || self.aliases.iter().any(|a| a.name == name)
            || self.bookmarks.iter().any(|b| b.name == name)
            || self.arrays.iter().any(|array| {
                array.name == name
                    || array
                        .elements
                        .iter()
                        .any(|e| array.element_name(e.index) == name)
            })
    }

    /// Address of a scalar or derived element name.
    pub fn scalar_value(&self, name: &str) -> Option<u64> {
        if let Some(scalar) = self.scalars.iter().find(|s| s.name == name) {
            return Some(scalar.value);
        }
        for array in &self.arrays {
            for element in &array.elements {
                if array.element_name(element.index) == name {
                    return Some(element.value);
                }
            }
        }
        None
    }

    pub fn array(&self, name: &str) -> Option<&Array> {
        self.arrays.iter().find(|a| a.name == name)
    }

    fn add_address(&mut self, row: MemRow) -> Result<(), DefError> {
        if self.name_exists(&row.name) {
            return Err(DefError::DuplicateName { name: row.name });
        }
        let value = HexLit::parse(&row.value)?.value();
        self.scalars.push(Scalar {
            name: row.name,
            value,
        });
        Ok(())
    }

    fn add_array(&mut self, row: MemRow) -> Result<(), DefError> {
        let (start, count, step) = parse_array_define(&row.define)?;
        let base = HexLit::parse(&row.value)?.value();

        let existing = self.arrays.iter().position(|a| a.name == row.name);
        if existing.is_none() && self.name_exists(&row.name) {
            return Err(DefError::DuplicateName { name: row.name });
        }

        let end = start
            .checked_add(count)
            .ok_or_else(|| DefError::MalformedDefine {
                define: row.define.clone(),
                reason: "element index overflows".into(),
            })?;
        let mut elements = Vec::with_capacity(count as usize);
        for index in start..end {
            let value = step
                .checked_mul(index - start)
                .and_then(|offset| base.checked_add(offset))
                .ok_or_else(|| DefError::MalformedDefine {
                    define: row.define.clone(),
                    reason: "element address overflows".into(),
                })?;
            let name = format!("{}_{index}", row.name);
            if self.name_exists(&name) {
                return Err(DefError::DuplicateName { name });
            }
            elements.push(ArrayElement { index, value });
        }

        let array = match existing {
            Some(position) => &mut self.arrays[position],
            None => {
                self.arrays.push(Array {
                    name: row.name,
                    elements: Vec::new(),
                });
                self.arrays.last_mut().ok_or_else(|| {
                    DefError::Invariant("array vanished after insertion".into())
                })?
            }
        };
        array.elements.extend(elements);
        array.elements.sort_by_key(|e| e.value);
        Ok(())
    }

    fn add_alias(&mut self, row: MemRow) -> Result<(), DefError> {
        if self.name_exists(&row.name) {
            return Err(DefError::DuplicateName { name: row.name });
        }

        // Priority: scalar name, then array name, then element name.
        let target = if self.scalars.iter().any(|s| s.name == row.value) {
            AliasTarget::Scalar(row.value)
        } else if self.arrays.iter().any(|a| a.name == row.value) {
            AliasTarget::Array(row.value)
        } else if let Some((array, index)) = self.find_element(&row.value) {
            AliasTarget::Element { array, index }
        } else {
            return Err(DefError::UnresolvedReference { name: row.value });
        };

        self.aliases.push(Alias {
            name: row.name,
            target,
        });
        Ok(())
    }

    fn add_bookmark(&mut self, row: MemRow) -> Result<(), DefError> {
        if self.name_exists(&row.name) {
            return Err(DefError::DuplicateName { name: row.name });
        }

        let tokens: Vec<&str> = row.define.split(',').collect();
        let target = match tokens.len() {
            1 => {
                if self.scalars.iter().any(|s| s.name == row.value) {
                    row.value
                } else if let Some((array, index)) = self.find_element(&row.value) {
                    let array = self
                        .array(&array)
                        .ok_or_else(|| DefError::Invariant("element without array".into()))?;
                    array.element_name(index)
                } else if self.arrays.iter().any(|a| a.name == row.value) {
                    return Err(DefError::MalformedDefine {
                        define: row.define,
                        reason: format!(
                            "bookmark to array `{}` requires an element index",
                            row.value
                        ),
                    });
                } else {
                    return Err(DefError::UnresolvedReference { name: row.value });
                }
            }
            2 => {
                let index = IntLit::parse(tokens[1])?.value();
                let array = self
                    .array(&row.value)
                    .ok_or(DefError::UnresolvedReference { name: row.value })?;
                if array.element_at(index).is_none() {
                    return Err(DefError::UnresolvedReference {
                        name: array.element_name(index),
                    });
                }
                array.element_name(index)
            }
            _ => {
                return Err(DefError::MalformedDefine {
                    define: row.define,
                    reason: "expected 1 or 2 tokens".into(),
                })
            }
        };

        self.bookmarks.push(Bookmark {
            name: row.name,
            target,
        });
        Ok(())
    }

    fn find_element(&self, name: &str) -> Option<(String, u64)> {
        for array in &self.arrays {
            for element in &array.elements {
                if array.element_name(element.index) == name {
                    return Some((array.name.clone(), element.index));
                }
            }
        }
        None
    }
}

/// Parse `<kind>,start,count[,step]`; step is hex and defaults to zero.
pub(crate) fn parse_array_define(define: &str) -> Result<(u64, u64, u64), DefError> {
    let tokens: Vec<&str> = define.split(',').collect();
    if tokens.len() != 3 && tokens.len() != 4 {
        return Err(DefError::MalformedDefine {
            define: define.to_string(),
            reason: "expected 3 or 4 tokens".into(),
        });
    }

    let start = IntLit::parse(tokens[1])?.value();
    let count = IntLit::parse(tokens[2])?.value();
    let step = match tokens.get(3) {
        Some(token) => HexLit::parse(token)?.value(),
        None => 0,
    };

    if count > 1 && step == 0 {
        return Err(DefError::MalformedDefine {
            define: define.to_string(),
            reason: format!("step is zero, but count({count}) is greater than 1"),
        });
    }

    Ok((start, count, step))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(csv: &str) -> Result<MemDef, DefError> {
        MemDef::compile(&CsvTable::parse(csv).unwrap())
    }

    #[test]
    fn addresses_sort_by_value() {
        let def = compile(
            "name,value,define\n\
             HIGH,0x2000,=\n\
             LOW,0x1000,address\n",
        )
        .unwrap();
        assert_eq!(def.scalars[0].name, "LOW");
        assert_eq!(def.scalars[1].name, "HIGH");
    }

    #[test]
    fn duplicate_addresses_with_distinct_names_sort_adjacently() {
        let def = compile(
            "name,value,define\n\
             A,0x100,=\n\
             B,0x100,=\n",
        )
        .unwrap();
        assert_eq!(def.scalars.len(), 2);
        // Stable sort keeps discovery order for equal values.
        assert_eq!(def.scalars[0].name, "A");
        assert_eq!(def.scalars[1].name, "B");
    }

    #[test]
    fn duplicate_name_fails() {
        let err = compile(
            "name,value,define\n\
             A,0x100,=\n\
             A,0x200,=\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::DuplicateName { name } if name == "A"));
    }

    #[test]
    fn array_expands_elements() {
        let def = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0,4,0x4\"\n",
        )
        .unwrap();
        let array = &def.arrays[0];
        assert_eq!(array.elements.len(), 4);
        assert_eq!(array.elements[3].value, 0x100C);
        assert_eq!(array.element_name(3), "CH_3");
    }

    #[test]
    fn array_redeclaration_appends_sparse_elements() {
        let def = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0,2,0x10\"\n\
             CH,0x1040,\"array,4,1\"\n",
        )
        .unwrap();
        let array = &def.arrays[0];
        assert_eq!(array.elements.len(), 3);
        assert_eq!(array.max_index(), Some(4));
    }

    #[test]
    fn array_count_without_step_fails() {
        let err = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0,4\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::MalformedDefine { .. }));
    }

    #[test]
    fn array_wrong_token_count_fails() {
        let err = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::MalformedDefine { .. }));
    }

    #[test]
    fn alias_resolution_priority() {
        let def = compile(
            "name,value,define\n\
             BASE,0x100,=\n\
             CH,0x1000,\"array,0,2,0x4\"\n\
             A1,BASE,~\n\
             A2,CH,alias\n\
             A3,CH_1,~\n",
        )
        .unwrap();
        assert!(matches!(def.aliases[0].target, AliasTarget::Scalar(_)));
        assert!(matches!(def.aliases[1].target, AliasTarget::Array(_)));
        assert!(matches!(
            def.aliases[2].target,
            AliasTarget::Element { index: 1, .. }
        ));
    }

    #[test]
    fn alias_to_unknown_target_fails() {
        let err = compile(
            "name,value,define\n\
             A,0x100,=\n\
             AKA,MISSING,~\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::UnresolvedReference { name } if name == "MISSING"));
    }

    #[test]
    fn bookmark_to_scalar_and_element() {
        let def = compile(
            "name,value,define\n\
             BASE,0x100,=\n\
             CH,0x1000,\"array,0,2,0x4\"\n\
             MARK,BASE,#\n\
             SECOND,CH,\"bookmark,1\"\n",
        )
        .unwrap();
        assert_eq!(def.bookmarks[0].target, "BASE");
        assert_eq!(def.bookmarks[1].target, "CH_1");
    }

    #[test]
    fn bookmark_to_array_without_index_fails() {
        let err = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0,2,0x4\"\n\
             MARK,CH,#\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::MalformedDefine { .. }));
    }

    #[test]
    fn bookmark_to_missing_element_fails() {
        let err = compile(
            "name,value,define\n\
             CH,0x1000,\"array,0,2,0x4\"\n\
             MARK,CH,\"bookmark,7\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::UnresolvedReference { name } if name == "CH_7"));
    }

    #[test]
    fn empty_cell_fails() {
        let err = compile("name,value,define\nA,,=\n").unwrap_err();
        assert!(matches!(err, DefError::MalformedRow { .. }));
    }

    #[test]
    fn invalid_name_fails() {
        let err = compile("name,value,define\n1BAD,0x1,=\n").unwrap_err();
        assert!(matches!(err, DefError::InvalidName { .. }));
    }

    #[test]
    fn reserved_name_fails() {
        let err = compile("name,value,define\nint,0x1,=\n").unwrap_err();
        assert!(matches!(err, DefError::InvalidName { .. }));
    }

    #[test]
    fn unknown_kind_fails() {
        let err = compile("name,value,define\nA,0x1,widget\n").unwrap_err();
        assert!(matches!(err, DefError::MalformedRow { .. }));
    }

    #[test]
    fn missing_declared_key_fails() {
        let err = compile("name,value\nA,0x1\n").unwrap_err();
        assert!(matches!(err, DefError::Schema { key } if key == "define"));
    }

    #[test]
    fn generated_element_name_collision_fails() {
        let err = compile(
            "name,value,define\n\
             CH_0,0x100,=\n\
             CH,0x1000,\"array,0,2,0x4\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, DefError::DuplicateName { name } if name == "CH_0"));
    }

    #[test]
    fn arrays_order_by_lowest_element_address() {
        let def = compile(
            "name,value,define\n\
             LATE,0x2000,\"array,0,2,0x4\"\n\
             EARLY,0x1000,\"array,0,2,0x4\"\n",
        )
        .unwrap();
        assert_eq!(def.arrays[0].name, "EARLY");
    }
}
