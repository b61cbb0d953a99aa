//! Block-structured, Snappy-compressed on-disk cluster store (§4.8
//! "dynamic" variant): an append-only file plus an in-memory offset
//! index, fronted by a byte-budgeted LRU cache of decompressed blocks.
//!
//! No pre-sizing and no compaction: `delete` only removes a key from the
//! index, leaving its bytes as unreachable garbage in the file. Capacity
//! planning trades file growth for not needing an upfront size bound,
//! which is the dynamic store's whole reason to exist alongside the
//! static one.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use lru::LruCache;

use super::codec::{decode_cluster, encode_cluster};
use super::ClusterStorage;
use crate::cluster::Cluster;
use crate::error::ClusterError;

/// Default byte budget for the decompressed-block cache.
pub const DEFAULT_CACHE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct BlockLocation {
    offset: u64,
    compressed_len: u32,
}

/// An LRU cache of decompressed blocks bounded by total byte size
/// rather than entry count, since cluster payloads vary widely. Wraps
/// [`lru::LruCache`] configured unbounded and evicts manually whenever
/// the tracked byte total exceeds budget.
struct BlockCache {
    inner: LruCache<u64, Vec<u8>>,
    bytes_used: u64,
    budget: u64,
}

impl BlockCache {
    fn new(budget: u64) -> Self {
        Self {
            inner: LruCache::unbounded(),
            bytes_used: 0,
            budget,
        }
    }

    fn get(&mut self, offset: u64) -> Option<&[u8]> {
        self.inner.get(&offset).map(|v| v.as_slice())
    }

    fn insert(&mut self, offset: u64, bytes: Vec<u8>) {
        self.bytes_used += bytes.len() as u64;
        if let Some(evicted) = self.inner.put(offset, bytes) {
            self.bytes_used -= evicted.len() as u64;
        }
        while self.bytes_used > self.budget {
            match self.inner.pop_lru() {
                Some((_, evicted)) => self.bytes_used -= evicted.len() as u64,
                None => break,
            }
        }
    }

    fn remove(&mut self, offset: u64) {
        if let Some(evicted) = self.inner.pop(&offset) {
            self.bytes_used -= evicted.len() as u64;
        }
    }
}

pub struct DynamicClusterStore {
    file: File,
    path: PathBuf,
    index: HashMap<String, BlockLocation>,
    cache: BlockCache,
    noise_filter_increment: i32,
}

impl DynamicClusterStore {
    /// Open (creating if absent) a dynamic store at `path` with the
    /// default 100 MiB cache budget.
    pub fn open(path: &Path, noise_filter_increment: i32) -> Result<Self, ClusterError> {
        Self::open_with_cache_budget(path, noise_filter_increment, DEFAULT_CACHE_BYTES)
    }

    pub fn open_with_cache_budget(
        path: &Path,
        noise_filter_increment: i32,
        cache_budget_bytes: u64,
    ) -> Result<Self, ClusterError> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        let mut store = Self {
            file,
            path: path.to_path_buf(),
            index: HashMap::new(),
            cache: BlockCache::new(cache_budget_bytes),
            noise_filter_increment,
        };
        store.rebuild_index()?;
        Ok(store)
    }

    /// Replay the append-only file from the start to rebuild the
    /// in-memory offset index (used on reopen; the index itself is
    /// never persisted).
    fn rebuild_index(&mut self) -> Result<(), ClusterError> {
        self.file.seek(SeekFrom::Start(0))?;
        let len = self.file.metadata()?.len();
        let mut pos = 0u64;
        while pos < len {
            self.file.seek(SeekFrom::Start(pos))?;
            let key_len = match self.file.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(_) => break,
            };
            let mut key_buf = vec![0u8; key_len as usize];
            self.file.read_exact(&mut key_buf)?;
            let key = String::from_utf8(key_buf).map_err(|e| ClusterError::Integrity(e.to_string()))?;
            let compressed_len = self.file.read_u32::<LittleEndian>()?;
            let _uncompressed_len = self.file.read_u32::<LittleEndian>()?;
            let block_offset = pos + 4 + key_len as u64 + 4 + 4;
            self.file.seek(SeekFrom::Current(compressed_len as i64))?;
            self.index.insert(
                key,
                BlockLocation {
                    offset: block_offset,
                    compressed_len,
                },
            );
            pos = block_offset + compressed_len as u64;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClusterStorage for DynamicClusterStore {
    fn put(&mut self, key: &str, cluster: &Cluster) -> Result<(), ClusterError> {
        let payload = encode_cluster(cluster, self.noise_filter_increment)?;
        let compressed = snap::raw::Encoder::new()
            .compress_vec(&payload)
            .map_err(ClusterError::Compression)?;

        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_u32::<LittleEndian>(key.len() as u32)?;
        self.file.write_all(key.as_bytes())?;
        self.file.write_u32::<LittleEndian>(compressed.len() as u32)?;
        self.file.write_u32::<LittleEndian>(payload.len() as u32)?;
        self.file.write_all(&compressed)?;

        let block_offset = offset + 4 + key.len() as u64 + 4 + 4;
        self.index.insert(
            key.to_string(),
            BlockLocation {
                offset: block_offset,
                compressed_len: compressed.len() as u32,
            },
        );
        self.cache.insert(block_offset, payload);
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Cluster>, ClusterError> {
        let Some(&location) = self.index.get(key) else {
            return Ok(None);
        };
        if let Some(cached) = self.cache.get(location.offset) {
            return decode_cluster(cached).map(Some);
        }

        self.file.seek(SeekFrom::Start(location.offset))?;
        let mut compressed = vec![0u8; location.compressed_len as usize];
        self.file.read_exact(&mut compressed)?;
        let payload = snap::raw::Decoder::new()
            .decompress_vec(&compressed)
            .map_err(ClusterError::Compression)?;
        let cluster = decode_cluster(&payload)?;
        self.cache.insert(location.offset, payload);
        Ok(Some(cluster))
    }

    fn delete(&mut self, key: &str) -> Result<(), ClusterError> {
        if let Some(location) = self.index.remove(key) {
            self.cache.remove(location.offset);
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.index.len()
    }

    fn close(&mut self) -> Result<(), ClusterError> {
        self.file.flush()?;
        Ok(())
    }
}

/// Parse a `"100MB"`/`"256MiB"`/raw-byte-count cache-size configuration
/// string into a byte count. Used by [`crate::config`].
pub fn parse_cache_size(spec: &str) -> Option<u64> {
    let spec = spec.trim();
    let (digits, multiplier) = if let Some(prefix) = spec.strip_suffix("MiB").or_else(|| spec.strip_suffix("MB")) {
        (prefix, 1024 * 1024)
    } else if let Some(prefix) = spec.strip_suffix("GiB").or_else(|| spec.strip_suffix("GB")) {
        (prefix, 1024 * 1024 * 1024)
    } else if let Some(prefix) = spec.strip_suffix('B') {
        (prefix, 1)
    } else {
        (spec, 1)
    };
    digits.trim().parse::<u64>().ok().map(|n| n * multiplier)
}
