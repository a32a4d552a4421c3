use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use emstar::model::SetKind;
use emstar::transform::AlignType;
use std::path::PathBuf;

mod assets;
mod config;
mod info;
mod validate;

pub use config::Config;

/// emstar - STAR metadata inspection and asset tooling
#[derive(Parser)]
#[command(name = "emstar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Record kind stored in a STAR file.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum KindArg {
    /// `data_particles`
    #[default]
    Particles,
    /// `data_micrographs`
    Micrographs,
    /// `data_movies`
    Movies,
}

impl From<KindArg> for SetKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Particles => SetKind::Particles,
            KindArg::Micrographs => SetKind::Micrographs,
            KindArg::Movies => SetKind::Movies,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the blocks, columns and row counts of a STAR file
    Info {
        /// Input STAR file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Stream a record set through the reader and report the first error
    Validate {
        /// Input STAR file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Record kind of the main block
        #[arg(short = 'k', long, default_value = "particles", value_enum)]
        kind: KindArg,

        /// Alignment to decode (particles only; defaults to the config file)
        #[arg(short = 'a', long, value_enum)]
        align: Option<AlignType>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Plan and materialize binary files into a job directory
    Assets {
        /// Binary files referenced by a STAR file
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Job directory receiving the `input` root
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Target extension
        #[arg(short = 'e', long)]
        extension: Option<String>,

        /// Convert every file regardless of its format
        #[arg(long)]
        force_convert: bool,

        /// Print the plan without touching the filesystem
        #[arg(long)]
        dry_run: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { file } => info::run(file),
        Commands::Validate {
            file,
            kind,
            align,
            config,
        } => validate::run(file, SetKind::from(kind), align, config),
        Commands::Assets {
            files,
            output_dir,
            extension,
            force_convert,
            dry_run,
            config,
        } => assets::run(files, output_dir, extension, force_convert, dry_run, config),
    }
}
