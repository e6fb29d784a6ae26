//! Register C header renderer.
//!
//! Sections: the offset table (with auto-collapsing Keyword/Array/Field
//! annotation columns), register accessor macros over a memory base
//! argument, array count/list/stride macros per group, and field mask,
//! shift, access, reset, and enum defines.

use hwdef_core::{HexLit, Table};
use hwdef_def::fields::Field;
use hwdef_def::reg::RegDef;
use hwdef_def::Pattern;

use crate::config::{align_limit, RegConfig};
use crate::error::EmitError;
use crate::frame::Header;

/// Annotation column pairs of the offset table: `| Array` and `| Field`.
const OFFSET_PAIRS: &[(usize, usize)] = &[(5, 6), (7, 8)];

fn qualified(config: &RegConfig, name: &str) -> String {
    if config.name.is_empty() {
        name.to_string()
    } else {
        format!("{}_{name}", config.name)
    }
}

fn address(config: &RegConfig, value: u64, width: Option<u32>) -> Result<String, EmitError> {
    let align = match width {
        Some(bits) => align_limit(bits),
        None => config.align,
    };
    Ok(HexLit::from_value(value).aligned(align)?.to_string())
}

pub fn render(def: &RegDef, hash: &str, config: &RegConfig) -> Result<String, EmitError> {
    let flat = def.flattened_offsets();

    // Offset and register tables walk the same flattened order.
    let mut offset_rows = Table::new();
    let mut register_rows = Table::new();
    for offset in &flat {
        let name = qualified(config, &offset.name);
        let mut cells = vec![
            "#define".to_string(),
            format!("{name}_{}", config.offset),
            format!("( {} )", address(config, offset.value, offset.width)?),
        ];
        if config.annotation {
            cells.extend([
                "//".to_string(),
                offset.keyword.clone(),
                "|".to_string(),
                offset.array.clone().unwrap_or_default(),
                "|".to_string(),
                offset.field_names.join(", "),
            ]);
        }
        offset_rows.push(cells);

        register_rows.push(vec![
            "#define".to_string(),
            format!("{name}_{}({})", config.register, config.memory),
            format!("( {} + {name}_{} )", config.memory, config.offset),
            "//".to_string(),
            offset.keyword.clone(),
        ]);
    }
    if config.annotation && !offset_rows.is_empty() {
        let mut rows = offset_rows.rows().to_vec();
        rows.insert(
            0,
            ["", "", "", "//", "Keyword", "|", "Array", "|", "Field"]
                .map(String::from)
                .to_vec(),
        );
        offset_rows = Table::from_rows(rows);
        offset_rows.collapse_empty_pairs(OFFSET_PAIRS);
    }

    // Array section.
    let mut num_rows = Table::new();
    let mut list_rows = Table::new();
    let mut step_rows = Table::new();
    for array in &def.arrays {
        let Some(max_index) = array.max_index() else {
            continue;
        };
        num_rows.push(vec![
            "#define".to_string(),
            format!(
                "{}_{}_{}",
                qualified(config, &array.name),
                config.array.to_uppercase(),
                config.number
            ),
            format!("( {} )", max_index + 1),
        ]);

        for group in &array.groups {
            let group_base = qualified(config, &array.group_name(group));
            let members: Vec<String> = (0..=max_index)
                .map(|index| match array.element_at(index) {
                    Some(_) => format!(
                        "{}_{}({})",
                        qualified(config, &format!("{}_{index}_{}", array.name, group.name)),
                        config.register,
                        config.memory
                    ),
                    None => "NULL".to_string(),
                })
                .collect();
            list_rows.push(vec![
                "#define".to_string(),
                format!(
                    "{group_base}_{}{}({})",
                    config.register, config.plural, config.memory
                ),
                format!("{{ {} }}", members.join(", ")),
            ]);

            let macro_name = format!(
                "{group_base}_{}({})",
                config.register, config.array
            );
            match array.pattern() {
                Pattern::Strided {
                    base,
                    shift: Some(shift),
                    ..
                } => step_rows.push(vec![
                    "#define".to_string(),
                    macro_name,
                    "(".to_string(),
                    format!(
                        "{} + ( {} << {shift}",
                        address(config, base + group.value, group.width)?,
                        config.array
                    ),
                    ") )".to_string(),
                ]),
                Pattern::Strided { base, step, .. } => step_rows.push(vec![
                    "#define".to_string(),
                    macro_name,
                    "(".to_string(),
                    format!(
                        "{} + ( {} * {}",
                        address(config, base + group.value, group.width)?,
                        config.array,
                        HexLit::from_value(step)
                    ),
                    ") )".to_string(),
                ]),
                Pattern::Single { base } => step_rows.push(vec![
                    "#define".to_string(),
                    macro_name,
                    "(".to_string(),
                    address(config, base + group.value, group.width)?,
                    ")".to_string(),
                    format!("// ONLY {}", array.name),
                ]),
                Pattern::Irregular => step_rows.push(vec![
                    "#define".to_string(),
                    macro_name,
                    String::new(),
                    String::new(),
                    String::new(),
                    "// IMPOSSIBLE".to_string(),
                ]),
            }
        }
    }

    // Field section: one aligned block per offset or group with fields.
    let mut field_blocks: Vec<Table> = Vec::new();
    for offset in &def.offsets {
        if !offset.fields.is_empty() {
            field_blocks.push(field_block(
                config,
                &qualified(config, &offset.name),
                &offset.fields,
            )?);
        }
    }
    for array in &def.arrays {
        for group in &array.groups {
            if !group.fields.is_empty() {
                field_blocks.push(field_block(
                    config,
                    &qualified(config, &array.group_name(group)),
                    &group.fields,
                )?);
            }
        }
    }

    // Assembly.
    let mut header = Header::new();
    header.provenance("RegDef", hash);
    header.notes(&config.notes);
    header.open_guard(&config.guard);
    header.line("");
    header.include("const.h");

    if !offset_rows.is_empty() {
        header.block(&offset_rows.render(" "));
    }
    if !register_rows.is_empty() {
        header.block(&register_rows.render(" "));
    }

    if !(num_rows.is_empty() && list_rows.is_empty() && step_rows.is_empty()) {
        header.section("Array Section");
        for table in [&num_rows, &list_rows, &step_rows] {
            if !table.is_empty() {
                header.block(&table.render(" "));
            }
        }
    }

    if !field_blocks.is_empty() {
        header.section("Field Section");
        for block in &field_blocks {
            header.block(&block.render(" "));
        }
    }

    header.close_guard(&config.guard);
    Ok(header.finish())
}

fn field_block(config: &RegConfig, base: &str, fields: &[Field]) -> Result<Table, EmitError> {
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

        if let Some(access) = field.access {
            table.push(vec![
                "#define".to_string(),
                format!("{field_base}_{}", config.access),
                format!("( {} )", access.as_str()),
            ]);
        }

        if let Some(reset) = field.reset {
            table.push(vec![
                "#define".to_string(),
                format!("{field_base}_{}", config.reset),
                format!("( {} )", HexLit::from_value(reset)),
            ]);
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use hwdef_def::CsvTable;

    fn compile(csv: &str) -> RegDef {
        RegDef::compile(&CsvTable::parse(csv).unwrap()).unwrap()
    }

    fn config() -> RegConfig {
        RegConfig {
            guard: "REGS".into(),
            bits: 32,
            align: 8,
            ..RegConfig::default()
        }
    }

    const HEADER: &str = "name,value,define,field,bits,access,reset,enum,val\n";

    #[test]
    fn offset_and_register_tables() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,EN,[0],RW,,,\n\
             STAT,0x8,=,,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("#define CTRL_OFS ( 0x00000000 )"));
        assert!(text.contains("#define CTRL_REG(mem) ( mem + CTRL_OFS )"));
        assert!(text.contains("#define STAT_REG(mem) ( mem + STAT_OFS )"));
        // Annotation header row plus the collapsed Array pair.
        assert!(text.contains("// Keyword | Field"));
        assert!(!text.contains("| Array |"));
        let ctrl_row = text
            .lines()
            .find(|line| line.starts_with("#define CTRL_OFS"))
            .unwrap();
        let tokens: Vec<&str> = ctrl_row.split_whitespace().collect();
        assert_eq!(
            tokens,
            vec!["#define", "CTRL_OFS", "(", "0x00000000", ")", "//", "CTRL", "|", "EN"]
        );
    }

    #[test]
    fn annotation_toggle_strips_offset_notes() {
        let def = compile(&format!("{HEADER}CTRL,0x0,=,,,,,,\n"));
        let mut config = config();
        config.annotation = false;
        let text = render(&def, "h", &config).unwrap();
        let row = text
            .lines()
            .find(|line| line.starts_with("#define CTRL_OFS"))
            .unwrap();
        assert_eq!(row, "#define CTRL_OFS ( 0x00000000 )");
        assert!(!text.contains("Keyword"));
    }

    #[test]
    fn array_groups_expand_combinations() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x100,\"array,0,2,0x100\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n\
             IRQ,0x8,\"group,CH\",,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("#define CH_0_CFG_OFS ( 0x00000100 )"));
        assert!(text.contains("#define CH_1_IRQ_OFS ( 0x00000208 )"));
        assert!(text.contains("#define CH_CH_NUM ( 2 )"));
        assert!(text.contains(
            "{ CH_0_CFG_REG(mem), CH_1_CFG_REG(mem) }"
        ));
        assert!(text.contains("#define CH_CFG_REGS(mem)"));
        assert!(text.contains("0x00000100 + ( ch << 8"));
        assert!(text.contains("0x00000108 + ( ch << 8"));
    }

    #[test]
    fn sparse_array_list_has_null_holes() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x100,\"array,0,1\",,,,,,\n\
             CH,0x300,\"array,2,1\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("{ CH_0_CFG_REG(mem), NULL, CH_2_CFG_REG(mem) }"));
        assert!(text.contains("#define CH_CH_NUM ( 3 )"));
    }

    #[test]
    fn irregular_array_step_is_annotated() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x100,\"array,0,1\",,,,,,\n\
             CH,0x104,\"array,1,1\",,,,,,\n\
             CH,0x10C,\"array,2,1\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("// IMPOSSIBLE"));
    }

    #[test]
    fn single_element_array_step_is_base_only() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x100,\"array,0,1\",,,,,,\n\
             CFG,0x8,\"group,CH\",,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("// ONLY CH"));
        assert!(text.contains("0x00000108"));
        assert!(!text.contains("<<"));
    }

    #[test]
    fn field_section_defines() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,=,,,,,,\n\
             ,,^,MODE,[3:1],RW,0x2,OFF,0\n\
             ,,^,,,,,FAST,0x3\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("// Field Section"));
        assert!(text.contains("#define CTRL_MODE_MASK"));
        assert!(text.contains("( 0x0000000E )"));
        assert!(text.contains("#define CTRL_MODE_SHIFT"));
        assert!(text.contains("( 1 )"));
        assert!(text.contains("#define CTRL_MODE_ACCESS"));
        assert!(text.contains("( RW )"));
        assert!(text.contains("#define CTRL_MODE_RESET"));
        assert!(text.contains("#define CTRL_MODE_OFF_VAL"));
        assert!(text.contains("#define CTRL_MODE_FAST_VAL"));
        let mask_row = text
            .lines()
            .find(|line| line.starts_with("#define CTRL_MODE_MASK"))
            .unwrap();
        assert!(mask_row.ends_with("// [3:1]"));
    }

    #[test]
    fn group_fields_render_once_per_group() {
        let def = compile(&format!(
            "{HEADER}\
             CH,0x100,\"array,0,2,0x100\",,,,,,\n\
             CFG,0x0,\"group,CH\",,,,,,\n\
             ,,^,EN,[0],,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("#define CH_CFG_EN_MASK"));
        assert_eq!(text.matches("CH_CFG_EN_MASK").count(), 1);
    }

    #[test]
    fn width_override_widens_one_offset() {
        let def = compile(&format!(
            "{HEADER}\
             CTRL,0x0,= -64,,,,,,\n\
             STAT,0x8,=,,,,,,\n"
        ));
        let text = render(&def, "h", &config()).unwrap();
        assert!(text.contains("( 0x0000000000000000 )"));
        assert!(text.contains("( 0x00000008 )"));
    }

    #[test]
    fn ip_name_prefixes_every_macro() {
        let def = compile(&format!("{HEADER}CTRL,0x0,=,,,,,,\n"));
        let mut config = config();
        config.name = "UART".into();
        let text = render(&def, "h", &config).unwrap();
        assert!(text.contains("#define UART_CTRL_OFS"));
        assert!(text.contains("#define UART_CTRL_REG(mem) ( mem + UART_CTRL_OFS )"));
    }

    #[test]
    fn notes_appear_in_the_frame() {
        let def = compile(&format!("{HEADER}CTRL,0x0,=,,,,,,\n"));
        let mut config = config();
        config.notes = "UART block registers".into();
        let text = render(&def, "h", &config).unwrap();
        assert!(text.contains("// UART block registers"));
        assert!(text.contains("// RegDef hash(h)"));
        assert!(text.ends_with("#endif // REGS_H\n"));
    }
}
