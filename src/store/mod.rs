//! Cluster and property persistence (§4.8, §4.9): one key→value contract,
//! two cluster-store backends (pre-sized mmap vs. block-structured +
//! Snappy), and in-memory/on-disk property stores.

pub mod codec;
pub mod disk_property_store;
pub mod dynamic_store;
pub mod memory_property_store;
pub mod static_store;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cluster::Cluster;
use crate::error::ClusterError;

pub use disk_property_store::OnDiskPropertyStore;
pub use dynamic_store::DynamicClusterStore;
pub use memory_property_store::InMemoryPropertyStore;
pub use static_store::StaticClusterStore;

/// Stable 64-bit hash of a cluster/spectrum id, used by the static
/// store's open-addressing table to pick a starting bucket.
pub fn hash_cluster_id(id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

/// Common contract for cluster persistence backends.
///
/// At most one writer is active at a time (§5's shared-resource
/// policy); `delete` is commutative and safe to call from multiple
/// threads for distinct keys, but this trait does not itself provide
/// synchronization — callers serialize access.
pub trait ClusterStorage {
    fn put(&mut self, key: &str, cluster: &Cluster) -> Result<(), ClusterError>;
    fn get(&mut self, key: &str) -> Result<Option<Cluster>, ClusterError>;
    fn delete(&mut self, key: &str) -> Result<(), ClusterError>;
    fn size(&self) -> usize;
    fn close(&mut self) -> Result<(), ClusterError>;
}

/// Common contract for property persistence backends (§4.9). No
/// ordering guarantees across keys; overwriting an existing
/// `(spectrumUui, propertyName)` pair is idempotent.
pub trait PropertyStorage {
    fn put(&mut self, spectrum_uui: &str, property_name: &str, value: String) -> Result<(), ClusterError>;
    fn get(&self, spectrum_uui: &str, property_name: &str) -> Option<&str>;
    fn available_property_names(&self) -> std::collections::HashSet<String>;
    fn size(&self) -> usize;
    fn close(&mut self) -> Result<(), ClusterError>;
}
