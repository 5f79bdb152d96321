//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kapply - declarative apply against an in-process object store.
#[derive(Parser, Debug)]
#[command(name = "kapply")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (pretty, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply manifests in order and print the resulting live objects
    Apply(ApplyArgs),

    /// List the kinds merged with list-element awareness
    Kinds,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Manifest files (one object or an array of objects each); later files
    /// re-apply over the state left by earlier ones
    #[arg(short = 'f', long = "filename", required = true)]
    pub files: Vec<PathBuf>,
}
