use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hwdef_def::{CsvTable, MemDef};
use hwdef_emit::config::align_limit;
use hwdef_emit::{mem_header, MemConfig};

use crate::commands::pick;
use crate::io::{check_extension, derive_guard, read_source, write_artifact};
use crate::manifest::MemDefaults;

#[derive(Args)]
pub struct MemArgs {
    /// Memory map definition CSV
    pub input: PathBuf,
    /// Output header path
    pub output: PathBuf,
    /// Include guard token (defaults to the output file stem)
    #[arg(short, long)]
    pub guard: Option<String>,
    /// Prefix spliced before every emitted name
    #[arg(long)]
    pub prefix: Option<String>,
    /// Postfix spliced after every emitted name
    #[arg(long)]
    pub postfix: Option<String>,
    /// Argument token for array stride macros
    #[arg(long)]
    pub array: Option<String>,
    /// Target address width, 32 or 64
    #[arg(short, long)]
    pub bits: Option<u32>,
    /// Hex digits to pad addresses to
    #[arg(short = 'l', long)]
    pub align: Option<usize>,
    /// Leave out the annotation comment columns
    #[arg(long)]
    pub no_annotation: bool,
    /// Print the compiled model as JSON
    #[arg(short, long)]
    pub debug: bool,
}

pub fn run(args: &MemArgs, defaults: &MemDefaults) -> Result<()> {
    check_extension(&args.input, "csv")?;
    check_extension(&args.output, "h")?;

    let bits = pick(args.bits, defaults.bits, 64);
    let config = MemConfig {
        guard: pick(
            args.guard.clone(),
            defaults.guard.clone(),
            derive_guard(&args.output),
        ),
        prefix: pick(args.prefix.clone(), defaults.prefix.clone(), String::new()),
        postfix: pick(args.postfix.clone(), defaults.postfix.clone(), String::new()),
        array: pick(args.array.clone(), defaults.array.clone(), "i".into()),
        bits,
        align: pick(args.align, defaults.align, align_limit(bits)),
        annotation: if args.no_annotation {
            false
        } else {
            defaults.annotation.unwrap_or(true)
        },
        debug: args.debug,
    };
    config.validate()?;

    let source = read_source(&args.input)?;
    let table = CsvTable::parse(&source.text)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    let def = MemDef::compile(&table)
        .with_context(|| format!("compiling {}", args.input.display()))?;
    if config.debug {
        println!("{}", serde_json::to_string_pretty(&def)?);
    }

    let text = mem_header::render(&def, &source.hash, &config)?;
    write_artifact(&args.output, &text)
}
