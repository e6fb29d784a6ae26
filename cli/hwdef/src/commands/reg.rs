use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hwdef_def::{CsvTable, RegDef};
use hwdef_emit::config::align_limit;
use hwdef_emit::{reg_header, reg_test, RegConfig};

use crate::commands::pick;
use crate::io::{check_extension, derive_guard, read_source, write_artifact};
use crate::manifest::RegDefaults;

#[derive(Args)]
pub struct RegArgs {
    /// Register definition CSV
    pub input: PathBuf,
    /// Output header path
    pub output: PathBuf,
    /// Also emit a register test table header at this path
    #[arg(long, value_name = "PATH")]
    pub test_header: Option<PathBuf>,
    /// Include guard token (defaults to the output file stem)
    #[arg(short, long)]
    pub guard: Option<String>,
    /// IP name prefixed to every emitted macro
    #[arg(short, long)]
    pub name: Option<String>,
    /// Register macro token
    #[arg(long)]
    pub register: Option<String>,
    /// Offset macro token
    #[arg(long)]
    pub offset: Option<String>,
    /// Argument token for the memory base address
    #[arg(long)]
    pub memory: Option<String>,
    /// Target address width, 32 or 64
    #[arg(short, long)]
    pub bits: Option<u32>,
    /// Hex digits to pad addresses to
    #[arg(short = 'l', long)]
    pub align: Option<usize>,
    /// Field mask macro token
    #[arg(long)]
    pub mask: Option<String>,
    /// Field shift macro token
    #[arg(long)]
    pub shift: Option<String>,
    /// Field access macro token
    #[arg(long)]
    pub access: Option<String>,
    /// Field reset macro token
    #[arg(long)]
    pub reset: Option<String>,
    /// Raw value token
    #[arg(long)]
    pub raw: Option<String>,
    /// Enum value macro token
    #[arg(long)]
    pub value: Option<String>,
    /// Plural suffix for register list macros
    #[arg(long)]
    pub plural: Option<String>,
    /// Argument token for array stride macros
    #[arg(long)]
    pub array: Option<String>,
    /// Array count macro token
    #[arg(long)]
    pub number: Option<String>,
    /// Free-form note lines for the header banner
    #[arg(long)]
    pub notes: Option<String>,
    /// Leave out the annotation comment columns
    #[arg(long)]
    pub no_annotation: bool,
    /// Print the compiled model as JSON
    #[arg(short, long)]
    pub debug: bool,
}

fn build_config(args: &RegArgs, defaults: &RegDefaults) -> RegConfig {
    let bits = pick(args.bits, defaults.bits, 64);
    RegConfig {
        name: pick(args.name.clone(), defaults.name.clone(), String::new()),
        register: pick(args.register.clone(), defaults.register.clone(), "REG".into()),
        offset: pick(args.offset.clone(), defaults.offset.clone(), "OFS".into()),
        memory: pick(args.memory.clone(), defaults.memory.clone(), "mem".into()),
        bits,
        align: pick(args.align, defaults.align, align_limit(bits)),
        mask: pick(args.mask.clone(), defaults.mask.clone(), "MASK".into()),
        shift: pick(args.shift.clone(), defaults.shift.clone(), "SHIFT".into()),
        access: pick(args.access.clone(), defaults.access.clone(), "ACCESS".into()),
        reset: pick(args.reset.clone(), defaults.reset.clone(), "RESET".into()),
        raw: pick(args.raw.clone(), defaults.raw.clone(), "RAW".into()),
        value: pick(args.value.clone(), defaults.value.clone(), "VAL".into()),
        plural: pick(args.plural.clone(), defaults.plural.clone(), "S".into()),
        array: pick(args.array.clone(), defaults.array.clone(), "ch".into()),
        number: pick(args.number.clone(), defaults.number.clone(), "NUM".into()),
        guard: pick(
            args.guard.clone(),
            defaults.guard.clone(),
            derive_guard(&args.output),
        ),
        notes: pick(args.notes.clone(), defaults.notes.clone(), String::new()),
        annotation: if args.no_annotation {
            false
        } else {
            defaults.annotation.unwrap_or(true)
        },
        debug: args.debug,
    }
}

pub fn run(args: &RegArgs, defaults: &RegDefaults) -> Result<()> {
    check_extension(&args.input, "csv")?;
    check_extension(&args.output, "h")?;
    if let Some(test_header) = &args.test_header {
        check_extension(test_header, "h")?;
    }

    let config = build_config(args, defaults);
    config.validate()?;

    let source = read_source(&args.input)?;
    let table = CsvTable::parse(&source.text)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    let def = RegDef::compile(&table)
        .with_context(|| format!("compiling {}", args.input.display()))?;
    if config.debug {
        println!("{}", serde_json::to_string_pretty(&def)?);
    }

    let text = reg_header::render(&def, &source.hash, &config)?;
    write_artifact(&args.output, &text)?;

    if let Some(test_header) = &args.test_header {
        let test_config = RegConfig {
            guard: derive_guard(test_header),
            ..config
        };
        let text = reg_test::render(&def, &source.hash, &test_config)?;
        write_artifact(test_header, &text)?;
    }
    Ok(())
}
