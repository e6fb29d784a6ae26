//! Packet C header renderer.
//!
//! Per packet: field mask and shift defines, an extractor macro over the
//! raw packet word, and enum value defines. Top-level packets share one
//! section; each packet group gets its own.

use hwdef_core::{HexLit, Table};
use hwdef_def::fields::Field;
use hwdef_def::pkt::{Packet, PktDef, PktItem};

use crate::config::PktConfig;
use crate::error::EmitError;
use crate::frame::Header;

fn qualified(config: &PktConfig, name: &str) -> String {
    if config.name.is_empty() {
        name.to_string()
    } else {
        format!("{}_{name}", config.name)
    }
}

pub fn render(def: &PktDef, hash: &str, config: &PktConfig) -> Result<String, EmitError> {
    let mut header = Header::new();
    header.provenance("PktDef", hash);
    header.notes(&config.notes);
    header.open_guard(&config.guard);
    header.line("");
    header.include("const.h");

    let top_packets: Vec<&Packet> = def
        .items
        .iter()
        .filter_map(|item| match item {
            PktItem::Packet(packet) => Some(packet),
            PktItem::Group(_) => None,
        })
        .collect();

    if !top_packets.is_empty() {
        header.section("Packet Section");
        for packet in top_packets {
            let block = packet_block(config, &qualified(config, &packet.name), &packet.fields)?;
            if !block.is_empty() {
                header.block(&block.render(" "));
            }
        }
    }

    for item in &def.items {
        let PktItem::Group(group) = item else {
            continue;
        };
        header.section(&format!("{} Section", group.name));
        for packet in &group.packets {
            let full = qualified(config, &format!("{}_{}", group.name, packet.name));
            let block = packet_block(config, &full, &packet.fields)?;
            if !block.is_empty() {
                header.block(&block.render(" "));
            }
        }
    }

    header.close_guard(&config.guard);
    Ok(header.finish())
}

fn packet_block(config: &PktConfig, base: &str, fields: &[Field]) -> Result<Table, EmitError> {
    let mut table = Table::new();
    for field in fields {
        let field_base = format!("{base}_{}", field.name);

        let mut mask_cells = vec![
            "#define".to_string(),
            format!("{field_base}_{}", config.mask),
            format!("( {} )", HexLit::from_value(field.mask()).aligned(8)?),
        ];
        if config.annotation {
            mask_cells.push(format!("// {}", field.bits_text()));
        }
        table.push(mask_cells);

        table.push(vec![
            "#define".to_string(),
            format!("{field_base}_{}", config.shift),
            format!("( {} )", field.lo),
        ]);

        table.push(vec![
            "#define".to_string(),
            format!("{field_base}({})", config.raw),
            format!(
                "( ( ({}) & {field_base}_{} ) >> {field_base}_{} )",
                config.raw, config.mask, config.shift
            ),
        ]);

        for enumerant in &field.enums {
            table.push(vec![
                "#define".to_string(),
                format!("{field_base}_{}_{}", enumerant.name, config.value),
                format!("( {} )", HexLit::from_value(enumerant.value)),
            ]);
        }
    }
    Ok(table)
}
