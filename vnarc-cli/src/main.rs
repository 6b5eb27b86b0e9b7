//! vnarc CLI - unpacker for visual novel engine archives.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{ExtractOptions, ListOptions};
use std::path::PathBuf;
use vnarc_core::recursion::DEFAULT_RECURSION_LIMIT;

#[derive(Parser)]
#[command(name = "vnarc")]
#[command(author, version, about = "Unpacker for visual novel engine archives")]
#[command(long_about = "
vnarc reads the archive formats of visual novel engines.
Supported formats: NScripter SAR/NSA, Touhou PBG3, GsWin DataPack5,
KISS ARC, Amuse Craft PAC, KID LNK, Libido ARC

Examples:
  vnarc formats
  vnarc detect arc.nsa
  vnarc list arc.nsa
  vnarc list --json --format kiss/arc data.arc
  vnarc extract arc.nsa -o out
  vnarc extract th06.dat --no-recurse -I '*.anm'
")]
struct Cli {
    /// Log progress and per-entry diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered archive decoders
    Formats,

    /// Detect the archive format of a file
    Detect {
        /// File to detect
        file: PathBuf,
    },

    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Decoder to use instead of auto-detection
        #[arg(short, long)]
        format: Option<String>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only files matching pattern (glob syntax: *.png, bg/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Decoder to use instead of auto-detection
        #[arg(short, long)]
        format: Option<String>,

        /// Save nested archives as they are
        #[arg(long)]
        no_recurse: bool,

        /// Name files by their index in the archive
        #[arg(long)]
        numeric_names: bool,

        /// Maximum depth of nested archives
        #[arg(long, default_value_t = DEFAULT_RECURSION_LIMIT)]
        recursion_limit: usize,

        /// Include only files matching pattern (glob syntax: *.png, bg/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn init_tracing(cli: &Cli) {
    // --quiet wins; --verbose honours RUST_LOG and falls back to info;
    // otherwise RUST_LOG or warnings only.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Commands::Formats => commands::cmd_formats(),
        Commands::Detect { file } => commands::cmd_detect(&file),
        Commands::List {
            archive,
            format,
            json,
            include,
            exclude,
        } => commands::cmd_list(
            &archive,
            &ListOptions {
                format: format.as_deref(),
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            format,
            no_recurse,
            numeric_names,
            recursion_limit,
            include,
            exclude,
            no_progress,
        } => commands::cmd_extract(
            &archive,
            &ExtractOptions {
                output: &output,
                format: format.as_deref(),
                recurse: !no_recurse,
                numeric_names,
                recursion_limit,
                include: &include,
                exclude: &exclude,
                progress: !no_progress && !cli.quiet,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
