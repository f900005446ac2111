//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use mklwrap::core::TargetLanguage;
use mklwrap::header::PreprocessMode;

/// mklwrap - generate precision-dispatching wrappers for MKL style routines
#[derive(Parser)]
#[command(name = "mklwrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate dispatch wrappers for the routines in a routine list
    Generate(GenerateArgs),

    /// Show which header routines a routine list matches
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Inputs shared by `generate` and `inspect`.
#[derive(Args)]
pub struct ScanArgs {
    /// Routine list, one pattern per line (`-` for stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Library header (`-` for stdin) [default: $MKLROOT/include/mkl.h]
    #[arg(short = 'm', long, value_name = "HEADER")]
    pub mkl_header: Option<PathBuf>,

    /// When to run the C preprocessor on the header
    #[arg(long, value_name = "WHEN")]
    pub cpp: Option<PreprocessMode>,

    /// Extra include directory for the preprocessor
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Extra macro definition for the preprocessor
    #[arg(short = 'D', long = "define", value_name = "MACRO")]
    pub defines: Vec<String>,

    /// Config file to use instead of ./mklwrap.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Output file (`-` for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Output language [default: from the output extension, else rust]
    #[arg(long, value_name = "LANG", conflicts_with_all = ["for_cc", "for_go"])]
    pub lang: Option<TargetLanguage>,

    /// Generate C++ overloads
    #[arg(long, conflicts_with = "for_go")]
    pub for_cc: bool,

    /// Generate Go generics
    #[arg(long)]
    pub for_go: bool,

    /// Rust path the raw bindings are imported from
    #[arg(short = 'c', long, value_name = "PATH")]
    pub mkl_provider_crate: Option<String>,

    /// Name of the generated Rust trait
    #[arg(short, long, value_name = "NAME")]
    pub trait_name: Option<String>,

    /// Go package name
    #[arg(long, value_name = "NAME")]
    pub gopkg: Option<String>,

    /// Header included by C++ and Go output [default: header file name]
    #[arg(long, value_name = "NAME")]
    pub include: Option<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
