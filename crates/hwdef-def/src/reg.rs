//! Register definition domain.
//!
//! Compiles `name,value,define,field,bits,access,reset,enum,val` rows into
//! offsets, arrays of indexed offsets, per-array groups, and the bit fields
//! and enumerants hanging off them. Attribute rows attach to the most
//! recent offset or group row; array rows never change that context.

use serde::Serialize;

use hwdef_core::{is_identifier, parse_number, HexLit};

use crate::csv::CsvTable;
use crate::error::DefError;
use crate::fields::{attach_field, parse_bits, Access, Field};
use crate::mem::parse_array_define;
use crate::stride::Pattern;

/// Declared CSV keys for the register domain.
pub const REG_KEYS: &[&str] = &[
    "name", "value", "define", "field", "bits", "access", "reset", "enum", "val",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegKind {
    Offset,
    Array,
    Group,
    Attribute,
}

/// A classified register row. Empty cells become `None`; downstream logic
/// distinguishes absent from empty.
#[derive(Debug)]
struct RegRow {
    kind: RegKind,
    name: Option<String>,
    value: Option<String>,
    define: String,
    width: Option<u32>,
    field: Option<String>,
    bits: Option<String>,
    access: Option<String>,
    reset: Option<String>,
    enum_name: Option<String>,
    val: Option<String>,
}

fn cell(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn classify(cells: &[String]) -> Result<RegRow, DefError> {
    let [name, value, define, field, bits, access, reset, enum_name, val] = cells else {
        return Err(DefError::Invariant("register row projection width".into()));
    };

    for ident in [name, field, enum_name] {
        if !ident.is_empty() && !is_identifier(ident) {
            return Err(DefError::InvalidName {
                name: ident.clone(),
            });
        }
    }

    // The define cell may carry space-separated width options after the
    // kind token, e.g. `= -64`.
    let mut tokens = define.split_whitespace();
    let core = tokens.next().unwrap_or_default().to_string();
    let mut width = None;
    for opt in tokens {
        width = Some(match opt {
            "-32" => 32,
            "-64" => 64,
            _ => {
                return Err(DefError::MalformedDefine {
                    define: define.clone(),
                    reason: format!("unknown option `{opt}`, expected -32 or -64"),
                })
            }
        });
    }

    let marker = core.split(',').next().unwrap_or_default();
    let kind = match marker {
        "offset" | "=" => RegKind::Offset,
        "array" | "*" => RegKind::Array,
        "group" | "@" => RegKind::Group,
        "attribute" | "^" => RegKind::Attribute,
        _ => {
            return Err(DefError::MalformedRow {
                row: cells.join(","),
                reason: format!(
                    "kind `{marker}` must be one of offset(=), array(*), group(@), attribute(^)"
                ),
            })
        }
    };

    let row = RegRow {
        kind,
        name: cell(name),
        value: cell(value),
        define: core,
        width,
        field: cell(field),
        bits: cell(bits),
        access: cell(access),
        reset: cell(reset),
        enum_name: cell(enum_name),
        val: cell(val),
    };

    match row.kind {
        RegKind::Offset | RegKind::Array | RegKind::Group => {
            if row.name.is_none() || row.value.is_none() {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "offset, array, and group rows need name, value, and define".into(),
                });
            }
        }
        RegKind::Attribute => {
            let has_field = row.field.is_some() || row.bits.is_some();
            let has_enum = row.enum_name.is_some() || row.val.is_some();
            if has_field && (row.field.is_none() || row.bits.is_none()) {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "a field attribute needs both field and bits".into(),
                });
            }
            if has_enum && (row.enum_name.is_none() || row.val.is_none()) {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "an enum attribute needs both enum and val".into(),
                });
            }
            if !has_field && !has_enum {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "an attribute row needs field+bits and/or enum+val".into(),
                });
            }
        }
    }

    Ok(row)
}

/// A named register offset; also used for the sub-offsets that groups
/// attach to an array.
#[derive(Debug, Clone, Serialize)]
pub struct Offset {
    pub name: String,
    pub value: u64,
    /// Per-row `-32`/`-64` override of the literal alignment width.
    pub width: Option<u32>,
    pub fields: Vec<Field>,
}

/// One indexed element of a register array, at its own base offset.
#[derive(Debug, Clone, Serialize)]
pub struct RegElement {
    pub index: u64,
    pub value: u64,
    pub width: Option<u32>,
}

/// An indexed collection of base offsets plus the named groups laid out
/// relative to each element.
#[derive(Debug, Clone, Serialize)]
pub struct RegArray {
    pub name: String,
    pub elements: Vec<RegElement>,
    pub groups: Vec<Offset>,
}

impl RegArray {
    pub fn element_name(&self, index: u64) -> String {
        format!("{}_{index}", self.name)
    }

    pub fn group_name(&self, group: &Offset) -> String {
        format!("{}_{}", self.name, group.name)
    }

    pub fn max_index(&self) -> Option<u64> {
        self.elements.iter().map(|e| e.index).max()
    }

    pub fn element_at(&self, index: u64) -> Option<&RegElement> {
        self.elements.iter().find(|e| e.index == index)
    }

    pub fn pattern(&self) -> Pattern {
        let pairs: Vec<(u64, u64)> = self.elements.iter().map(|e| (e.index, e.value)).collect();
        Pattern::infer(&pairs)
    }
}

/// A top-level offset or one element-group combination, flattened for
/// offset-ordered rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FlatOffset {
    pub name: String,
    pub value: u64,
    pub width: Option<u32>,
    /// `{array}_{group}` for combinations, the offset name otherwise.
    pub keyword: String,
    pub array: Option<String>,
    pub field_names: Vec<String>,
}

/// Which offset attribute rows currently attach to.
#[derive(Debug, Clone, Copy)]
enum Ctx {
    Offset(usize),
    Group { array: usize, group: usize },
}

#[derive(Debug, Default)]
struct Cursor {
    offset: Option<Ctx>,
    field: Option<usize>,
}

/// The compiled register model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegDef {
    pub offsets: Vec<Offset>,
    pub arrays: Vec<RegArray>,
}

impl RegDef {
    pub fn compile(table: &CsvTable) -> Result<Self, DefError> {
        let mut def = RegDef::default();
        let mut cursor = Cursor::default();

        for cells in table.project(REG_KEYS)? {
            let row = classify(&cells)?;
            match row.kind {
                RegKind::Offset => {
                    let index = def.add_offset(row)?;
                    cursor = Cursor {
                        offset: Some(Ctx::Offset(index)),
                        field: None,
                    };
                }
                RegKind::Array => def.add_array(row)?,
                RegKind::Group => {
                    let ctx = def.add_group(row)?;
                    cursor = Cursor {
                        offset: Some(ctx),
                        field: None,
                    };
                }
                RegKind::Attribute => def.add_attribute(row, &mut cursor)?,
            }
        }

        def.finish()?;
        Ok(def)
    }

    fn finish(&mut self) -> Result<(), DefError> {
        self.offsets.sort_by_key(|o| o.value);
        for array in &mut self.arrays {
            array.groups.sort_by_key(|g| g.value);
            for element in &array.elements {
                for group in &array.groups {
                    if element.value.checked_add(group.value).is_none() {
                        return Err(DefError::MalformedRow {
                            row: format!("{}_{} {}", array.name, element.index, group.name),
                            reason: "combined element and group offset overflows".into(),
                        });
                    }
                }
            }
        }
        self.arrays
            .sort_by_key(|a| a.elements.first().map_or(0, |e| e.value));
        Ok(())
    }

    fn name_exists(&self, name: &str) -> bool {
        self.offsets.iter().any(|o| o.name == name)
            || self.arrays.iter().any(|array| {
                array.name == name
                    || array
                        .elements
                        .iter()
                        .any(|e| array.element_name(e.index) == name)
                    || array.groups.iter().any(|g| array.group_name(g) == name)
            })
    }

    fn add_offset(&mut self, row: RegRow) -> Result<usize, DefError> {
        let (name, value) = named_value(row.name, row.value)?;
        if self.name_exists(&name) {
            return Err(DefError::DuplicateName { name });
        }
        let value = HexLit::parse(&value)?.value();
        self.offsets.push(Offset {
            name,
            value,
            width: row.width,
            fields: Vec::new(),
        });
        Ok(self.offsets.len() - 1)
    }

    fn add_array(&mut self, row: RegRow) -> Result<(), DefError> {
        let (name, value) = named_value(row.name, row.value)?;
        let (start, count, step) = parse_array_define(&row.define)?;
        let base = HexLit::parse(&value)?.value();

        let existing = self.arrays.iter().position(|a| a.name == name);
        if existing.is_none() && self.name_exists(&name) {
            return Err(DefError::DuplicateName { name });
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
                    reason: "element offset overflows".into(),
                })?;
            let element_name = format!("{name}_{index}");
            if self.name_exists(&element_name) {
                return Err(DefError::DuplicateName { name: element_name });
            }
            elements.push(RegElement {
                index,
                value,
                width: row.width,
            });
        }

        let array = match existing {
            Some(position) => &mut self.arrays[position],
            None => {
                self.arrays.push(RegArray {
                    name,
                    elements: Vec::new(),
                    groups: Vec::new(),
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

    fn add_group(&mut self, row: RegRow) -> Result<Ctx, DefError> {
        let (name, value) = named_value(row.name, row.value)?;

        let tokens: Vec<&str> = row.define.split(',').collect();
        if tokens.len() != 2 {
            return Err(DefError::MalformedDefine {
                define: row.define,
                reason: "expected 2 tokens".into(),
            });
        }

        let array_index = self
            .arrays
            .iter()
            .position(|a| a.name == tokens[1])
            .ok_or_else(|| DefError::UnresolvedReference {
                name: tokens[1].to_string(),
            })?;

        if self.arrays[array_index].groups.iter().any(|g| g.name == name) {
            return Err(DefError::DuplicateName { name });
        }
        let composite = format!("{}_{name}", self.arrays[array_index].name);
        if self.name_exists(&composite) {
            return Err(DefError::DuplicateName { name: composite });
        }

        let value = HexLit::parse(&value)?.value();
        let groups = &mut self.arrays[array_index].groups;
        groups.push(Offset {
            name,
            value,
            width: row.width,
            fields: Vec::new(),
        });
        Ok(Ctx::Group {
            array: array_index,
            group: groups.len() - 1,
        })
    }

    fn add_attribute(&mut self, row: RegRow, cursor: &mut Cursor) -> Result<(), DefError> {
        if let (Some(field_name), Some(bits)) = (&row.field, &row.bits) {
            let ctx = cursor.offset.ok_or_else(|| DefError::DanglingField {
                field: field_name.clone(),
            })?;
            let (hi, lo) = parse_bits(bits)?;
            let access = row.access.as_deref().map(Access::parse).transpose()?;
            let reset = row.reset.as_deref().map(parse_number).transpose()?;
            let field = Field {
                name: field_name.clone(),
                hi,
                lo,
                access,
                reset,
                enums: Vec::new(),
            };
            cursor.field = Some(attach_field(&mut self.offset_mut(ctx)?.fields, field)?);
        }

        if let (Some(enum_name), Some(val)) = (&row.enum_name, &row.val) {
            let ctx = cursor.offset.ok_or_else(|| DefError::DanglingEnum {
                name: enum_name.clone(),
            })?;
            let field_index = cursor.field.ok_or_else(|| DefError::DanglingEnum {
                name: enum_name.clone(),
            })?;
            let value = parse_number(val)?;
            let offset = self.offset_mut(ctx)?;
            let field = offset
                .fields
                .get_mut(field_index)
                .ok_or_else(|| DefError::Invariant("active field vanished".into()))?;
            field.add_enum(enum_name.clone(), value)?;
        }

        Ok(())
    }

    fn offset_mut(&mut self, ctx: Ctx) -> Result<&mut Offset, DefError> {
        match ctx {
            Ctx::Offset(index) => self.offsets.get_mut(index),
            Ctx::Group { array, group } => self
                .arrays
                .get_mut(array)
                .and_then(|a| a.groups.get_mut(group)),
        }
        .ok_or_else(|| DefError::Invariant("active offset vanished".into()))
    }

    /// Top-level offsets plus every element-group combination, sorted by
    /// combined offset for rendering.
    pub fn flattened_offsets(&self) -> Vec<FlatOffset> {
        let mut flat: Vec<(FlatOffset, &[Field])> = Vec::new();

        for offset in &self.offsets {
            flat.push((
                FlatOffset {
                    name: offset.name.clone(),
                    value: offset.value,
                    width: offset.width,
                    keyword: offset.name.clone(),
                    array: None,
                    field_names: Vec::new(),
                },
                &offset.fields,
            ));
        }

        for array in &self.arrays {
            for element in &array.elements {
                for group in &array.groups {
                    flat.push((
                        FlatOffset {
                            name: format!("{}_{}_{}", array.name, element.index, group.name),
                            value: element.value + group.value,
                            width: group.width.or(element.width),
                            keyword: array.group_name(group),
                            array: Some(array.name.clone()),
                            field_names: Vec::new(),
                        },
                        &group.fields,
                    ));
                }
            }
        }

        flat.sort_by_key(|(offset, _)| offset.value);
        flat.into_iter()
            .map(|(mut offset, fields)| {
                offset.field_names = fields.iter().map(|f| f.name.clone()).collect();
                offset
            })
            .collect()
    }

    pub fn array(&self, name: &str) -> Option<&RegArray> {
        self.arrays.iter().find(|a| a.name == name)
    }
}

fn named_value(
    name: Option<String>,
    value: Option<String>,
) -> Result<(String, String), DefError> {
    match (name, value) {
        (Some(name), Some(value)) => Ok((name, value)),
        _ => Err(DefError::Invariant("classified row lost name or value".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(csv: &str) -> Result<RegDef, DefError> {
        RegDef::compile(&CsvTable::parse(csv).unwrap())
    }

    const HEADER: &str = "name,value,define,field,bits,access,reset,enum,val\n";

    #[test]
    fn offsets_sort_by_value() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x8,=,,,,,,\n\
             STAT,0x0,offset,,,,,,\n"
        ))
        .unwrap();
        assert_eq!(def.offsets[0].name, "STAT");
        assert_eq!(def.offsets[1].name, "CTRL");
    }

    #[test]
    fn duplicate_offset_name_fails() {
        let err = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             CTRL,0x8,=,,,,,,\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::DuplicateName { name } if name == "CTRL"));
    }

    #[test]
    fn field_attaches_to_active_offset() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,EN,[0],RW,0x1,,\n\
             ,,^,MODE,[3:1],,,,\n"
        ))
        .unwrap();
        let fields = &def.offsets[0].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "EN");
        assert_eq!(fields[0].access, Some(Access::Rw));
        assert_eq!(fields[0].reset, Some(1));
        assert_eq!(fields[1].name, "MODE");
    }

    #[test]
    fn field_without_offset_dangles() {
        let err = compile(&format!("{HEADER},,^,EN,[0],,,,\n")).unwrap_err();
        assert!(matches!(err, DefError::DanglingField { field } if field == "EN"));
    }

    #[test]
    fn array_row_keeps_field_context() {
        // The array row between CTRL and its second field must not steal
        // the attachment context.
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,EN,[0],,,,\n\
             CH,0x100,\"array,0,2,0x40\",,,,,,\n\
             ,,^,MODE,[3:1],,,,\n"
        ))
        .unwrap();
        assert_eq!(def.offsets[0].fields.len(), 2);
    }

    #[test]
    fn enum_attaches_to_active_field() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,MODE,[1:0],,,OFF,0\n\
             ,,^,,,,,ON,0x1\n"
        ))
        .unwrap();
        let field = &def.offsets[0].fields[0];
        assert_eq!(field.enums.len(), 2);
        assert_eq!(field.enums[1].name, "ON");
    }

    #[test]
    fn enum_without_field_dangles() {
        let err = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,,,,,ON,1\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::DanglingEnum { name } if name == "ON"));
    }

    #[test]
    fn overlapping_fields_fail() {
        let err = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,A,[7:4],,,,\n\
             ,,^,B,[5:2],,,,\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::OverlappingBits { .. }));
    }

    #[test]
    fn group_attaches_to_array() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x1000,\"array,0,2,0x100\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n\
             ,,^,EN,[0],,,,\n"
        ))
        .unwrap();
        let array = &def.arrays[0];
        assert_eq!(array.elements.len(), 2);
        assert_eq!(array.groups.len(), 1);
        assert_eq!(array.groups[0].fields[0].name, "EN");
    }

    #[test]
    fn group_to_missing_array_fails() {
        let err = compile(&format!("{HEADER}CFG,0x0,\"group,CH\",,,,,,\n")).unwrap_err();
        assert!(matches!(err, DefError::UnresolvedReference { name } if name == "CH"));
    }

    #[test]
    fn duplicate_group_in_array_fails() {
        let err = compile(&format!(
            "{HEADER}\
             CH,0x1000,\"array,0,2,0x100\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n\
             CFG,0x8,\"group,CH\",,,,,,\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::DuplicateName { name } if name == "CFG"));
    }

    #[test]
    fn width_options_are_recorded() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,= -64,,,,,,\n\
             STAT,0x8,=,,,,,,\n"
        ))
        .unwrap();
        assert_eq!(def.offsets[0].width, Some(64));
        assert_eq!(def.offsets[1].width, None);
    }

    #[test]
    fn unknown_option_fails() {
        let err = compile(&format!("{HEADER}CTRL,0x0,= -16,,,,,,\n")).unwrap_err();
        assert!(matches!(err, DefError::MalformedDefine { .. }));
    }

    #[test]
    fn empty_attribute_row_fails() {
        let err = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,,,,,,\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::MalformedRow { .. }));
    }

    #[test]
    fn field_needs_bits() {
        let err = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,EN,,,,,\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DefError::MalformedRow { .. }));
    }

    #[test]
    fn flattened_offsets_interleave_combinations() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             CH,0x100,\"array,0,2,0x100\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n\
             IRQ,0x8,\"group,CH\",,,,,,\n"
        ))
        .unwrap();
        let flat = def.flattened_offsets();
        let names: Vec<&str> = flat.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["CTRL", "CH_0_CFG", "CH_0_IRQ", "CH_1_CFG", "CH_1_IRQ"]
        );
        assert_eq!(flat[1].keyword, "CH_CFG");
        assert_eq!(flat[1].array.as_deref(), Some("CH"));
        assert_eq!(flat[4].value, 0x208);
    }

    #[test]
    fn group_keyword_context_for_pattern() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x1000,\"array,0,4,0x100\",,,,,,\n"
        ))
        .unwrap();
        assert_eq!(
            def.arrays[0].pattern(),
            Pattern::Strided {
                base: 0x1000,
                step: 0x100,
                shift: Some(8),
            }
        );
    }
}
