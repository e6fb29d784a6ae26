//! Memory-map C header renderer.
//!
//! Sections: every address (scalars and array elements interleaved by
//! address), array count/list/stride macros, aliases, bookmarks. Array
//! elements are annotated with their array name; bookmark names are
//! appended to their target's annotation.

use hwdef_core::{HexLit, Table};
use hwdef_def::mem::{AliasTarget, MemDef};
use hwdef_def::Pattern;

use crate::config::MemConfig;
use crate::error::EmitError;
use crate::frame::Header;

struct AddressEntry {
    name: String,
    value: u64,
    array_note: String,
    marks: String,
}

pub fn render(def: &MemDef, hash: &str, config: &MemConfig) -> Result<String, EmitError> {
    let decorated = |name: &str| format!("{}{}{}", config.prefix, name, config.postfix);
    let address = |value: u64| -> Result<String, EmitError> {
        let aligned = HexLit::from_value(value).aligned(config.align)?;
        Ok(if config.bits == 64 {
            format!("UL({aligned})")
        } else {
            aligned.to_string()
        })
    };

    // Address section, sorted by value with discovery order preserved.
    let mut entries: Vec<AddressEntry> = Vec::new();
    for scalar in &def.scalars {
        entries.push(AddressEntry {
            name: decorated(&scalar.name),
            value: scalar.value,
            array_note: String::new(),
            marks: String::new(),
        });
    }
    for array in &def.arrays {
        for element in &array.elements {
            entries.push(AddressEntry {
                name: decorated(&array.element_name(element.index)),
                value: element.value,
                array_note: format!("// {}", decorated(&array.name)),
                marks: String::new(),
            });
        }
    }
    entries.sort_by_key(|entry| entry.value);

    for bookmark in &def.bookmarks {
        let target = decorated(&bookmark.target);
        let entry = entries
            .iter_mut()
            .find(|entry| entry.name == target)
            .ok_or_else(|| {
                EmitError::Invariant(format!("bookmark target `{target}` has no address row"))
            })?;
        if entry.marks.is_empty() {
            entry.marks = format!("// {}", decorated(&bookmark.name));
        } else {
            entry.marks.push_str(&format!(", {}", decorated(&bookmark.name)));
        }
    }

    let mut address_rows = Table::new();
    for entry in &entries {
        let mut cells = vec![
            "#define".to_string(),
            entry.name.clone(),
            address(entry.value)?,
        ];
        if config.annotation {
            cells.push(entry.array_note.clone());
            cells.push(entry.marks.clone());
        }
        address_rows.push(cells);
    }

    // Array section.
    let mut num_rows = Table::new();
    let mut list_rows = Table::new();
    let mut step_rows = Table::new();
    for array in &def.arrays {
        if let Some(max_index) = array.max_index() {
            num_rows.push(vec![
                "#define".to_string(),
                format!("{}_NUM", decorated(&array.name)),
                format!("( {} )", max_index + 1),
            ]);

            let members: Vec<String> = (0..=max_index)
                .map(|index| match array.element_at(index) {
                    Some(_) => decorated(&array.element_name(index)),
                    None => "NULL".to_string(),
                })
                .collect();
            list_rows.push(vec![
                "#define".to_string(),
                format!("{}S", decorated(&array.name)),
                format!("{{ {} }}", members.join(", ")),
            ]);
        }

        let macro_name = format!("{}({})", decorated(&array.name), config.array);
        match array.pattern() {
            Pattern::Strided {
                base,
                shift: Some(shift),
                ..
            } => step_rows.push(vec![
                "#define".to_string(),
                macro_name,
                format!("( {} + ( {} << {shift} ) )", address(base)?, config.array),
            ]),
            Pattern::Strided { base, step, .. } => step_rows.push(vec![
                "#define".to_string(),
                macro_name,
                format!(
                    "( {} + ( {} * {} ) )",
                    address(base)?,
                    config.array,
                    HexLit::from_value(step)
                ),
            ]),
            Pattern::Single { base } => {
                let first = array
                    .elements
                    .first()
                    .ok_or_else(|| EmitError::Invariant("single pattern without element".into()))?;
                step_rows.push(vec![
                    "#define".to_string(),
                    macro_name,
                    format!("( {} )", address(base)?),
                    format!("// ONLY {}", decorated(&array.element_name(first.index))),
                ]);
            }
            Pattern::Irregular => step_rows.push(vec![
                "#define".to_string(),
                macro_name,
                String::new(),
                "// IMPOSSIBLE".to_string(),
            ]),
        }
    }

    // Alias section; scalar-shaped rows sort by target address.
    let mut alias_entries: Vec<(Vec<String>, u64)> = Vec::new();
    let mut alias_num_rows = Table::new();
    let mut alias_list_rows = Table::new();
    let mut alias_step_rows = Table::new();
    for alias in &def.aliases {
        match &alias.target {
            AliasTarget::Scalar(target) => {
                let value = def.scalar_value(target).ok_or_else(|| {
                    EmitError::Invariant(format!("alias target `{target}` has no address"))
                })?;
                alias_entries.push((
                    vec![
                        "#define".to_string(),
                        decorated(&alias.name),
                        format!("( {} )", decorated(target)),
                    ],
                    value,
                ));
            }
            AliasTarget::Element { array, index } => {
                let target = format!("{array}_{index}");
                let value = def.scalar_value(&target).ok_or_else(|| {
                    EmitError::Invariant(format!("alias target `{target}` has no address"))
                })?;
                alias_entries.push((
                    vec![
                        "#define".to_string(),
                        decorated(&alias.name),
                        format!("( {} )", decorated(&target)),
                    ],
                    value,
                ));
            }
            AliasTarget::Array(target) => {
                let array = def.array(target).ok_or_else(|| {
                    EmitError::Invariant(format!("alias target `{target}` is not an array"))
                })?;
                for element in &array.elements {
                    alias_entries.push((
                        vec![
                            "#define".to_string(),
                            decorated(&format!("{}_{}", alias.name, element.index)),
                            format!("( {} )", decorated(&array.element_name(element.index))),
                        ],
                        element.value,
                    ));
                }
                alias_num_rows.push(vec![
                    "#define".to_string(),
                    format!("{}_NUM", decorated(&alias.name)),
                    format!("( {}_NUM )", decorated(&array.name)),
                ]);
                alias_list_rows.push(vec![
                    "#define".to_string(),
                    format!("{}S", decorated(&alias.name)),
                    format!("( {}S )", decorated(&array.name)),
                ]);
                alias_step_rows.push(vec![
                    "#define".to_string(),
                    format!("{}({})", decorated(&alias.name), config.array),
                    format!("( {}({}) )", decorated(&array.name), config.array),
                ]);
            }
        }
    }
    alias_entries.sort_by_key(|(_, value)| *value);
    let mut alias_rows = Table::new();
    for (cells, _) in alias_entries {
        alias_rows.push(cells);
    }

    // Bookmark section, ordered by the target's address row.
    let mut bookmark_entries: Vec<(Vec<String>, usize)> = Vec::new();
    for bookmark in &def.bookmarks {
        let target = decorated(&bookmark.target);
        let position = entries
            .iter()
            .position(|entry| entry.name == target)
            .ok_or_else(|| {
                EmitError::Invariant(format!("bookmark target `{target}` has no address row"))
            })?;
        bookmark_entries.push((
            vec![
                "#define".to_string(),
                decorated(&bookmark.name),
                format!("( {target} )"),
            ],
            position,
        ));
    }
    bookmark_entries.sort_by_key(|(_, position)| *position);
    let mut bookmark_rows = Table::new();
    for (cells, _) in bookmark_entries {
        bookmark_rows.push(cells);
    }

    // Assembly.
    let mut header = Header::new();
    header.provenance("MemDef", hash);
    header.open_guard(&config.guard);
    header.line("");
    header.include("const.h");

    header.section("Address Section");
    if !address_rows.is_empty() {
        header.block(&address_rows.render(" "));
    }

    header.section("Array Section");
    for table in [&num_rows, &list_rows, &step_rows] {
        if !table.is_empty() {
            header.block(&table.render(" "));
        }
    }

    header.section("Alias Section");
    for table in [&alias_rows, &alias_num_rows, &alias_list_rows, &alias_step_rows] {
        if !table.is_empty() {
            header.block(&table.render(" "));
        }
    }

    header.section("Bookmark Section");
    if !bookmark_rows.is_empty() {
        header.block(&bookmark_rows.render(" "));
    }

    header.close_guard(&config.guard);
    Ok(header.finish())
}
