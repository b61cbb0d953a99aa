//! On-disk [`PropertyStorage`]: an [`InMemoryPropertyStore`] that loads
//! from a flat length-prefixed record file on open and rewrites the
//! whole file on close.
//!
//! Properties are small and comparatively rare next to cluster puts, so
//! unlike the cluster stores this does not need a block/LRU design —
//! load-everything/rewrite-everything is the simpler and sufficient
//! choice here.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::memory_property_store::InMemoryPropertyStore;
use super::PropertyStorage;
use crate::error::ClusterError;

pub struct OnDiskPropertyStore {
    path: PathBuf,
    inner: InMemoryPropertyStore,
}

fn write_record(out: &mut impl Write, s: &str) -> std::io::Result<()> {
    out.write_u32::<LittleEndian>(s.len() as u32)?;
    out.write_all(s.as_bytes())
}

fn read_record(input: &mut impl Read) -> std::io::Result<Option<String>> {
    let len = match input.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    let mut buf = vec![0u8; len as usize];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl OnDiskPropertyStore {
    /// Open (creating if absent) a property store at `path`, loading any
    /// existing records into memory.
    pub fn open(path: &Path) -> Result<Self, ClusterError> {
        let mut inner = InMemoryPropertyStore::new();
        if path.exists() {
            let mut file = OpenOptions::new().read(true).open(path)?;
            loop {
                let Some(spectrum_uui) = read_record(&mut file)? else {
                    break;
                };
                let Some(property_name) = read_record(&mut file)? else {
                    break;
                };
                let Some(value) = read_record(&mut file)? else {
                    break;
                };
                inner.put(&spectrum_uui, &property_name, value)?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    fn rewrite(&self) -> Result<(), ClusterError> {
        let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(&self.path)?;
        for ((spectrum_uui, property_name), value) in self.inner.iter() {
            write_record(&mut file, spectrum_uui)?;
            write_record(&mut file, property_name)?;
            write_record(&mut file, value)?;
        }
        Ok(())
    }
}

impl PropertyStorage for OnDiskPropertyStore {
    fn put(&mut self, spectrum_uui: &str, property_name: &str, value: String) -> Result<(), ClusterError> {
        self.inner.put(spectrum_uui, property_name, value)
    }

    fn get(&self, spectrum_uui: &str, property_name: &str) -> Option<&str> {
        self.inner.get(spectrum_uui, property_name)
    }

    fn available_property_names(&self) -> std::collections::HashSet<String> {
        self.inner.available_property_names()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn close(&mut self) -> Result<(), ClusterError> {
        self.rewrite()
    }
}
