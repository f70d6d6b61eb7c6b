use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sicxe::{AsmError, Assembly, ObjectProgram};
use tracing::Level;

/// A SIC/XE assembler
#[derive(Parser, Debug)]
#[command(version, about = "A SIC/XE Assembler")]
struct Cli {
    /// The output file (with several inputs, each object goes next to its source as .obj)
    #[arg(short, default_value = "a.out")]
    output: PathBuf,

    /// Generate an assembly listing
    #[arg(long)]
    listing: Option<PathBuf>,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,

    /// The source assembly file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

/// Where the object and listing of one input go.
struct Outputs {
    object: PathBuf,
    listing: Option<PathBuf>,
}

fn outputs_for(cli: &Cli, input: &Path) -> Outputs {
    if cli.input.len() == 1 {
        return Outputs {
            object: cli.output.clone(),
            listing: cli.listing.clone(),
        };
    }
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    Outputs {
        object: input.with_extension("obj"),
        listing: cli
            .listing
            .as_ref()
            .map(|l| l.with_file_name(format!("{}.lst", stem))),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    println!("SIC/XE Assembler");

    let mut failed = 0usize;
    for input in &cli.input {
        println!("\nStarting assemble {} ...", input.display());
        match assemble_file(input, &outputs_for(&cli, input)) {
            Ok(assembly) => {
                println!("Done.");
                for (name, addr) in assembly.symbols() {
                    println!("{:<8}\t: 0x{:05X}", name, addr);
                }
            }
            Err(e) => {
                failed += 1;
                report(input, &e);
                println!("Assemble failed.");
            }
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(input: &Path, e: &anyhow::Error) {
    match e.downcast_ref::<AsmError>() {
        Some(AsmError::Asm { line, text, kind }) => {
            tracing::error!("{}:{}  {}", input.display(), line, text.trim());
            tracing::error!("Error : {}", kind);
        }
        _ => tracing::error!("{:#}", e),
    }
}

fn assemble_file(input: &Path, outputs: &Outputs) -> Result<Assembly> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;

    let assembly = sicxe::assemble(&source)?;

    let object = ObjectProgram::from_assembly(&assembly);
    let file = File::create(&outputs.object)
        .with_context(|| format!("cannot create {}", outputs.object.display()))?;
    object.write_to(file)?;
    tracing::info!(object = %outputs.object.display(), "object program written");

    if let Some(path) = &outputs.listing {
        assembly
            .save_listing(&path.to_string_lossy())
            .with_context(|| format!("cannot write listing {}", path.display()))?;
        tracing::info!(listing = %path.display(), "listing written");
    }
    Ok(assembly)
}
