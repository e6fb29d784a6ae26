use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hwdef_def::{CsvTable, PktDef};
use hwdef_emit::{pkt_header, PktConfig};

use crate::commands::pick;
use crate::io::{check_extension, derive_guard, read_source, write_artifact};
use crate::manifest::PktDefaults;

#[derive(Args)]
pub struct PktArgs {
    /// Packet definition CSV
    pub input: PathBuf,
    /// Output header path
    pub output: PathBuf,
    /// Include guard token (defaults to the output file stem)
    #[arg(short, long)]
    pub guard: Option<String>,
    /// Purpose name prefixed to every emitted macro
    #[arg(short, long)]
    pub name: Option<String>,
    /// Field mask macro token
    #[arg(long)]
    pub mask: Option<String>,
    /// Field shift macro token
    #[arg(long)]
    pub shift: Option<String>,
    /// Argument token for the raw packet word
    #[arg(long)]
    pub raw: Option<String>,
    /// Enum value macro token
    #[arg(long)]
    pub value: Option<String>,
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

pub fn run(args: &PktArgs, defaults: &PktDefaults) -> Result<()> {
    check_extension(&args.input, "csv")?;
    check_extension(&args.output, "h")?;

    let config = PktConfig {
        name: pick(args.name.clone(), defaults.name.clone(), String::new()),
        mask: pick(args.mask.clone(), defaults.mask.clone(), "MASK".into()),
        shift: pick(args.shift.clone(), defaults.shift.clone(), "SHIFT".into()),
        raw: pick(args.raw.clone(), defaults.raw.clone(), "raw".into()),
        value: pick(args.value.clone(), defaults.value.clone(), "VAL".into()),
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
    };
    config.validate()?;

    let source = read_source(&args.input)?;
    let table = CsvTable::parse(&source.text)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    let def = PktDef::compile(&table)
        .with_context(|| format!("compiling {}", args.input.display()))?;
    if config.debug {
        println!("{}", serde_json::to_string_pretty(&def)?);
    }

    let text = pkt_header::render(&def, &source.hash, &config)?;
    write_artifact(&args.output, &text)
}
