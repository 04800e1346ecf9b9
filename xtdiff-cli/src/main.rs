//! Command line front end for the xtdiff structural XML differ.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use xtdiff::{diff_trees, parse_file, DiffOptions, Formatter, Normalize};

/// Structural diff between two XML documents.
#[derive(Parser)]
#[command(name = "xtdiff")]
#[command(version)]
#[command(about = "Structural diff between two XML documents", long_about = None)]
struct Cli {
    /// The first input file
    file1: PathBuf,
    /// The second input file
    file2: PathBuf,

    /// Output representation
    #[arg(long, value_enum, default_value_t = FormatterKind::Diff)]
    formatter: FormatterKind,

    /// Do not strip ignorable whitespace between tags
    #[arg(long)]
    keep_whitespace: bool,

    /// Attach character-level runs to text updates
    #[arg(long)]
    fine_grained: bool,

    /// Try to make XML output more readable
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatterKind {
    /// One machine-readable line per action
    Diff,
    /// The left document with diff annotations
    Xml,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> xtdiff::Result<()> {
    let options = DiffOptions {
        normalize: if cli.keep_whitespace {
            Normalize::NONE
        } else {
            Normalize::TAGS
        },
        fine_grained_text: cli.fine_grained,
        ..DiffOptions::default()
    };

    let left = parse_file(&cli.file1, options.normalize)?;
    let right = parse_file(&cli.file2, options.normalize)?;
    let result = diff_trees(&left, &right, &options)?;

    let formatter: Box<dyn Formatter> = match cli.formatter {
        FormatterKind::Diff => Box::new(xtdiff::DiffFormatter::new()),
        FormatterKind::Xml => Box::new(xtdiff::XmlFormatter::new(cli.pretty)),
    };
    println!("{}", formatter.format(&result, &left)?);
    Ok(())
}
