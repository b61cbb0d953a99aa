//! `clap`-derived command-line front-end (§6): the ambient operational
//! surface around the library core, mapping configuration, the reader,
//! the engine, and a cluster store into a usable binary.

mod cluster;
mod info;
mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ClusterStoreMode;

/// spectra-cluster-rs - streaming greedy clustering of MS/MS spectra.
#[derive(Parser)]
#[command(name = "spectra-cluster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Cluster-store backend selector for the CLI, mirroring
/// [`ClusterStoreMode`] with `clap`'s `ValueEnum`.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum StoreModeArg {
    /// Pre-sized, memory-mapped store; requires `--expected-cluster-count`.
    Static,
    /// Block-structured, Snappy-compressed store; no pre-sizing.
    #[default]
    Dynamic,
}

impl From<StoreModeArg> for ClusterStoreMode {
    fn from(arg: StoreModeArg) -> Self {
        match arg {
            StoreModeArg::Static => ClusterStoreMode::Static,
            StoreModeArg::Dynamic => ClusterStoreMode::Dynamic,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster one or more MGF files into a cluster store.
    Cluster {
        /// Input MGF file paths, processed in the order given.
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output cluster-store path.
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Load clustering settings from a TOML config file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Cluster-store backend.
        #[arg(long, value_enum, default_value_t = StoreModeArg::Dynamic)]
        store_mode: StoreModeArg,

        /// Upper bound on cluster count; required for `--store-mode static`.
        #[arg(long)]
        expected_cluster_count: Option<usize>,
    },

    /// Print summary information about an existing cluster store.
    Info {
        /// Cluster-store path.
        #[arg(value_name = "STORE")]
        store: PathBuf,

        /// Which backend the store was written with.
        #[arg(long, value_enum, default_value_t = StoreModeArg::Dynamic)]
        store_mode: StoreModeArg,
    },

    /// Sniff an input peak-list file without running it through the
    /// engine; reports whether it parses as a well-formed MGF file.
    Validate {
        /// Input peak-list file path.
        #[arg(value_name = "FILE")]
        file: PathBuf,
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

/// The §6 exit-code taxonomy, returned by [`dispatch`] so `main` can
/// translate it to a process exit code without re-deriving the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    InvalidInput,
    IoFailure,
    UnsupportedFileType,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::InvalidInput => 2,
            ExitStatus::IoFailure => 3,
            ExitStatus::UnsupportedFileType => 4,
        }
    }
}

pub fn dispatch(cli: Cli) -> ExitStatus {
    match cli.command {
        Commands::Cluster {
            inputs,
            output,
            config,
            store_mode,
            expected_cluster_count,
        } => cluster::run(inputs, output, config, store_mode.into(), expected_cluster_count),
        Commands::Info { store, store_mode } => info::run(store, store_mode.into()),
        Commands::Validate { file } => validate::run(file),
    }
}
