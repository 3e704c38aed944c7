use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use odb_format::SchemaVersion;

mod commands;

#[derive(Parser)]
#[command(name = "odbconv")]
#[command(about = "Convert historical league databases between CSV and .odb containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug level logging
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Log progress every N percent (0 logs every update)
    #[arg(long, global = true, default_value_t = 10)]
    progress_every: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Unpack the four .odb containers of a directory into CSV files
    Decode {
        /// Directory holding the historical_*.odb files
        #[arg(short, long)]
        input: PathBuf,
        /// Destination directory (defaults to the input directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip version detection and use this schema (17, 19, 22, 25, 26)
        #[arg(long)]
        schema: Option<SchemaVersion>,
        /// Write reserved slots to Unknown_<n>.csv instead of failing
        #[arg(long, default_value_t = false)]
        keep_unknown: bool,
        /// Do not write DatabaseConfig.txt
        #[arg(long, default_value_t = false)]
        no_config: bool,
    },

    /// Pack a directory of CSV files into the four .odb containers
    ///
    /// Table names come from --schema, else from DatabaseConfig.txt in the
    /// input directory, else from the newest known layout.
    Encode {
        #[arg(short, long)]
        input: PathBuf,
        /// Destination directory (defaults to the input directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        schema: Option<SchemaVersion>,
        /// Do not copy the overlay CSV files next to the containers
        #[arg(long, default_value_t = false)]
        no_external: bool,
    },

    /// Print the schema version the containers of a directory were built with
    Detect {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Per-table record and byte counts of a single container
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Copy every .odb file into a game database directory, backing up
    /// existing files first
    Install {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Decode {
            input,
            output,
            schema,
            keep_unknown,
            no_config,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            let opts = odb_format::DecodeOptions {
                schema,
                keep_unknown,
                write_config: !no_config,
            };
            commands::decode::run(input, output, opts, cli.progress_every)
        }
        Commands::Encode {
            input,
            output,
            schema,
            no_external,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            let opts = odb_format::EncodeOptions {
                schema,
                copy_external: !no_external,
            };
            commands::encode::run(input, output, opts, cli.progress_every)
        }
        Commands::Detect { input } => commands::detect::run(&input),
        Commands::Inspect { input } => {
            commands::inspect::inspect_container(&input)
                .map(|r| commands::inspect::print_report(&r))
        }
        Commands::Install { source, target } => commands::install::run(&source, &target),
    }
}
