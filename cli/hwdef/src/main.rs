mod commands;
mod io;
mod manifest;

use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hwdef",
    version,
    about = "Compile hardware definition CSVs into C headers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a memory map definition
    Mem(commands::mem::MemArgs),
    /// Compile a register definition
    Reg(commands::reg::RegArgs),
    /// Compile a packet definition
    Pkt(commands::pkt::PktArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let manifest = manifest::load_manifest_optional(&cwd)?;
    match cli.command {
        Commands::Mem(args) => commands::mem::run(&args, &manifest.mem),
        Commands::Reg(args) => commands::reg::run(&args, &manifest.reg),
        Commands::Pkt(args) => commands::pkt::run(&args, &manifest.pkt),
    }
}
