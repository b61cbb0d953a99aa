//! `spectra-cluster validate` — sniff an input peak-list file without
//! running it through the engine.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use log::{error, info};

use super::ExitStatus;
use crate::error::ClusterError;
use crate::reader::MgfReader;

pub fn run(file: PathBuf) -> ExitStatus {
    if file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| !e.eq_ignore_ascii_case("mgf"))
        .unwrap_or(true)
    {
        error!("unsupported file type: {}", file.display());
        return ExitStatus::UnsupportedFileType;
    }

    let opened = File::open(&file).map_err(ClusterError::StorageIo).and_then(|f| MgfReader::new(BufReader::new(f)));

    match opened {
        Ok(_) => {
            info!("{}: well-formed MGF header", file.display());
            ExitStatus::Success
        }
        Err(ClusterError::InputFormat(msg)) => {
            error!("{}: {msg}", file.display());
            ExitStatus::InvalidInput
        }
        Err(err) => {
            error!("{}: {err}", file.display());
            ExitStatus::IoFailure
        }
    }
}
