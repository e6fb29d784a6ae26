//! Packet definition domain.
//!
//! Compiles `name,define,field,bits,enum,value` rows into packets and
//! packet groups. Packets carry bit fields like register offsets do, but
//! have no numeric offset of their own; declaration order is preserved
//! for rendering.

use serde::Serialize;

use hwdef_core::{is_identifier, parse_number};

use crate::csv::CsvTable;
use crate::error::DefError;
use crate::fields::{attach_field, parse_bits, Field};

/// Declared CSV keys for the packet domain.
pub const PKT_KEYS: &[&str] = &["name", "define", "field", "bits", "enum", "value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PktKind {
    Packet,
    Group,
    Attribute,
}

#[derive(Debug)]
struct PktRow {
    kind: PktKind,
    name: Option<String>,
    define: String,
    field: Option<String>,
    bits: Option<String>,
    enum_name: Option<String>,
    value: Option<String>,
}

fn cell(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn classify(cells: &[String]) -> Result<PktRow, DefError> {
    let [name, define, field, bits, enum_name, value] = cells else {
        return Err(DefError::Invariant("packet row projection width".into()));
    };

    for ident in [name, field, enum_name] {
        if !ident.is_empty() && !is_identifier(ident) {
            return Err(DefError::InvalidName {
                name: ident.clone(),
            });
        }
    }

    let marker = define.split(',').next().unwrap_or_default();
    let kind = match marker {
        "packet" | "=" => PktKind::Packet,
        "group" | "@" => PktKind::Group,
        "attribute" | "^" => PktKind::Attribute,
        _ => {
            return Err(DefError::MalformedRow {
                row: cells.join(","),
                reason: format!(
                    "kind `{marker}` must be one of packet(=), group(@), attribute(^)"
                ),
            })
        }
    };

    let row = PktRow {
        kind,
        name: cell(name),
        define: define.clone(),
        field: cell(field),
        bits: cell(bits),
        enum_name: cell(enum_name),
        value: cell(value),
    };

    match row.kind {
        PktKind::Packet | PktKind::Group => {
            if row.name.is_none() {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "packet and group rows need name and define".into(),
                });
            }
        }
        PktKind::Attribute => {
            let has_field = row.field.is_some() || row.bits.is_some();
            let has_enum = row.enum_name.is_some() || row.value.is_some();
            if has_field && (row.field.is_none() || row.bits.is_none()) {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "a field attribute needs both field and bits".into(),
                });
            }
            if has_enum && (row.enum_name.is_none() || row.value.is_none()) {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "an enum attribute needs both enum and value".into(),
                });
            }
            if !has_field && !has_enum {
                return Err(DefError::MalformedRow {
                    row: cells.join(","),
                    reason: "an attribute row needs field+bits and/or enum+value".into(),
                });
            }
        }
    }

    Ok(row)
}

/// A packet layout. Inside a group the name is the member name; the full
/// rendered name is `{group}_{member}`.
#[derive(Debug, Clone, Serialize)]
pub struct Packet {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A named family of related packets.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub name: String,
    pub packets: Vec<Packet>,
}

/// Top-level packet stream items, in declaration order.
#[derive(Debug, Clone, Serialize)]
pub enum PktItem {
    Packet(Packet),
    Group(Group),
}

#[derive(Debug, Clone, Copy)]
enum Ctx {
    Top(usize),
    Grouped { item: usize, packet: usize },
}

#[derive(Debug, Default)]
struct Cursor {
    packet: Option<Ctx>,
    field: Option<usize>,
}

/// The compiled packet model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PktDef {
    pub items: Vec<PktItem>,
}

impl PktDef {
    pub fn compile(table: &CsvTable) -> Result<Self, DefError> {
        let mut def = PktDef::default();
        let mut cursor = Cursor::default();

        for cells in table.project(PKT_KEYS)? {
            let row = classify(&cells)?;
            match row.kind {
                PktKind::Packet => {
                    let ctx = def.add_packet(row)?;
                    cursor = Cursor {
                        packet: Some(ctx),
                        field: None,
                    };
                }
                PktKind::Group => {
                    let ctx = def.add_grouped_packet(row)?;
                    cursor = Cursor {
                        packet: Some(ctx),
                        field: None,
                    };
                }
                PktKind::Attribute => def.add_attribute(row, &mut cursor)?,
            }
        }

        Ok(def)
    }

    /// Every packet with its full rendered name, in declaration order.
    pub fn full_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for item in &self.items {
            match item {
                PktItem::Packet(packet) => names.push(packet.name.clone()),
                PktItem::Group(group) => {
                    for packet in &group.packets {
                        names.push(format!("{}_{}", group.name, packet.name));
                    }
                }
            }
        }
        names
    }

    fn name_exists(&self, full: &str) -> bool {
        self.full_names().iter().any(|name| name == full)
    }

    fn add_packet(&mut self, row: PktRow) -> Result<Ctx, DefError> {
        let name = row
            .name
            .ok_or_else(|| DefError::Invariant("classified row lost name".into()))?;
        if self.name_exists(&name) {
            return Err(DefError::DuplicateName { name });
        }
        self.items.push(PktItem::Packet(Packet {
            name,
            fields: Vec::new(),
        }));
        Ok(Ctx::Top(self.items.len() - 1))
    }

    fn add_grouped_packet(&mut self, row: PktRow) -> Result<Ctx, DefError> {
        let group_name = row
            .name
            .ok_or_else(|| DefError::Invariant("classified row lost name".into()))?;

        let tokens: Vec<&str> = row.define.split(',').collect();
        if tokens.len() != 2 {
            return Err(DefError::MalformedDefine {
                define: row.define,
                reason: "expected 2 tokens".into(),
            });
        }
        let member = tokens[1];
        if !is_identifier(member) {
            return Err(DefError::InvalidName {
                name: member.to_string(),
            });
        }

        let full = format!("{group_name}_{member}");
        if self.name_exists(&full) {
            return Err(DefError::DuplicateName { name: full });
        }

        let item = self.items.iter().position(|item| {
            matches!(item, PktItem::Group(group) if group.name == group_name)
        });
        let item = match item {
            Some(index) => index,
            None => {
                if self.name_exists(&group_name) {
                    return Err(DefError::DuplicateName { name: group_name });
                }
                self.items.push(PktItem::Group(Group {
                    name: group_name,
                    packets: Vec::new(),
                }));
                self.items.len() - 1
            }
        };

        let PktItem::Group(group) = &mut self.items[item] else {
            return Err(DefError::Invariant("group vanished after insertion".into()));
        };
        group.packets.push(Packet {
            name: member.to_string(),
            fields: Vec::new(),
        });
        Ok(Ctx::Grouped {
            item,
            packet: group.packets.len() - 1,
        })
    }

    fn add_attribute(&mut self, row: PktRow, cursor: &mut Cursor) -> Result<(), DefError> {
        if let (Some(field_name), Some(bits)) = (&row.field, &row.bits) {
            let ctx = cursor.packet.ok_or_else(|| DefError::DanglingField {
                field: field_name.clone(),
            })?;
            let (hi, lo) = parse_bits(bits)?;
            let field = Field {
                name: field_name.clone(),
                hi,
                lo,
                access: None,
                reset: None,
                enums: Vec::new(),
            };
            cursor.field = Some(attach_field(&mut self.packet_mut(ctx)?.fields, field)?);
        }

        if let (Some(enum_name), Some(value)) = (&row.enum_name, &row.value) {
            let ctx = cursor.packet.ok_or_else(|| DefError::DanglingEnum {
                name: enum_name.clone(),
            })?;
            let field_index = cursor.field.ok_or_else(|| DefError::DanglingEnum {
                name: enum_name.clone(),
            })?;
            let value = parse_number(value)?;
            let packet = self.packet_mut(ctx)?;
            let field = packet
                .fields
                .get_mut(field_index)
                .ok_or_else(|| DefError::Invariant("active field vanished".into()))?;
            field.add_enum(enum_name.clone(), value)?;
        }

        Ok(())
    }

    fn packet_mut(&mut self, ctx: Ctx) -> Result<&mut Packet, DefError> {
        match ctx {
            Ctx::Top(index) => match self.items.get_mut(index) {
                Some(PktItem::Packet(packet)) => Some(packet),
                _ => None,
            },
            Ctx::Grouped { item, packet } => match self.items.get_mut(item) {
                Some(PktItem::Group(group)) => group.packets.get_mut(packet),
                _ => None,
            },
        }
        .ok_or_else(|| DefError::Invariant("active packet vanished".into()))
    }
}
