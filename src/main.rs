//! # spectra-cluster
//!
//! Command-line front-end for streaming greedy clustering of tandem
//! mass spectra.
//!
//! ## Usage
//!
//! ```bash
//! # Cluster one or more MGF files into a cluster store
//! spectra-cluster cluster a.mgf b.mgf --output run.cls
//!
//! # Inspect an existing cluster store
//! spectra-cluster info run.cls
//!
//! # Sniff a file without running it through the engine
//! spectra-cluster validate a.mgf
//! ```

mod cli;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    let status = cli::dispatch(cli);
    std::process::exit(status.code());
}
