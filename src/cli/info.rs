//! `spectra-cluster info` — print summary information about an
//! existing cluster store without mutating it.

use std::path::PathBuf;

use log::error;

use super::ExitStatus;
use crate::config::ClusterStoreMode;
use crate::store::{ClusterStorage, DynamicClusterStore, StaticClusterStore};

pub fn run(store: PathBuf, mode: ClusterStoreMode) -> ExitStatus {
    let size = match mode {
        ClusterStoreMode::Dynamic => DynamicClusterStore::open(&store, 100).map(|s| s.size()),
        ClusterStoreMode::Static => StaticClusterStore::open(&store).map(|s| s.size()),
    };

    match size {
        Ok(size) => {
            println!("store: {}", store.display());
            println!("mode: {mode:?}");
            println!("entries: {size}");
            ExitStatus::Success
        }
        Err(err) => {
            error!("failed to open cluster store {}: {err}", store.display());
            ExitStatus::IoFailure
        }
    }
}
