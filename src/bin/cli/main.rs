//! CLI tool for ppmrc compression.

mod commands;
mod exit_codes;
mod output;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Order-N context model compressor
#[derive(Parser)]
#[command(name = "ppmrc")]
#[command(author, version, about = "Order-N context model compressor", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress the summary
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

/// Model options shared by every coding command.
#[derive(Args, Clone)]
pub struct ModelArgs {
    /// Context window length (0-16)
    #[arg(short = 'n', long, default_value = "3", env = "PPMRC_ORDER")]
    order: u32,

    /// Reproduce the legacy encoder bit for bit
    #[arg(long)]
    compat: bool,

    /// Start from a model exported with --export-model
    #[arg(short = 'm', long)]
    model: Option<PathBuf>,

    /// Do not adapt the model while coding
    #[arg(long = "static")]
    static_model: bool,

    /// Write the final model to this file
    #[arg(long)]
    export_model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file (alias: c)
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file, or base path of the parts with --split
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Split output into parts of at most this many bytes
        #[arg(short = 's', long)]
        split: Option<u64>,

        /// Pad every part to the split size
        #[arg(long, requires = "split")]
        pad: bool,

        /// Part boundary rule
        #[arg(long, value_enum, default_value = "speculative", requires = "split")]
        strategy: Strategy,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Expand a file (alias: x)
    #[command(alias = "x")]
    Expand {
        /// Coded file, or base path of the parts with --parts
        input: PathBuf,

        /// Output file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Read `{input}-part{n}.bin` files
        #[arg(long)]
        parts: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Rebuild the model of a coded file and export it (alias: t)
    #[command(alias = "t")]
    Train {
        /// Coded file
        input: PathBuf,

        /// Model file to write
        #[arg(short = 'o', long)]
        output: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show information about a model file (alias: i)
    #[command(alias = "i")]
    Info {
        /// Model file to inspect
        model: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    Speculative,
    Estimate,
}

impl From<Strategy> for ppmrc::write::SplitStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Speculative => ppmrc::write::SplitStrategy::Speculative,
            Strategy::Estimate => ppmrc::write::SplitStrategy::Estimate,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Compress {
            input,
            output,
            split,
            pad,
            strategy,
            model,
        } => commands::compress(&commands::CompressConfig {
            input: &input,
            output: output.as_deref(),
            split,
            pad,
            strategy: strategy.into(),
            model: &model,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Expand {
            input,
            output,
            parts,
            model,
        } => commands::expand(&commands::ExpandConfig {
            input: &input,
            output: output.as_deref(),
            parts,
            model: &model,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::Train {
            input,
            output,
            model,
        } => commands::train(&input, &output, &model, cli.format, cli.quiet),

        Commands::Info { model } => commands::info(&model, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
