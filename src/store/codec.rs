//! Versioned, length-prefixed little-endian binary codec for [`Cluster`]
//! (§4.8). Deliberately hand-rolled rather than serde/bincode — see
//! Design Note 9's "standardize on one" — since the cluster store needs
//! an on-disk format stable across crate versions independent of any
//! particular serde derive's encoding.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::cluster::{ComparisonMatch, Cluster};
use crate::consensus::ConsensusSpectrumState;
use crate::error::ClusterError;

const MAGIC: u32 = 0x5343_4C55; // "SCLU"
const VERSION: u16 = 1;

fn write_string(out: &mut impl Write, s: &str) -> io::Result<()> {
    out.write_u32::<LittleEndian>(s.len() as u32)?;
    out.write_all(s.as_bytes())
}

fn read_string(input: &mut impl Read) -> io::Result<String> {
    let len = input.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Encode a cluster's payload (without the outer header) to `out`.
fn encode_payload(cluster: &Cluster, noise_filter_increment: i32) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_string(&mut buf, cluster.id())?;

    buf.write_u32::<LittleEndian>(cluster.member_ids().len() as u32)?;
    for member in cluster.member_ids() {
        write_string(&mut buf, member)?;
    }

    let bins = cluster.consensus().sorted_bins();
    buf.write_u32::<LittleEndian>(bins.len() as u32)?;
    for (bin, sum, count) in bins {
        buf.write_i32::<LittleEndian>(bin)?;
        buf.write_i64::<LittleEndian>(sum)?;
        buf.write_i32::<LittleEndian>(count)?;
    }

    buf.write_i64::<LittleEndian>(cluster.consensus().n_spectra())?;
    buf.write_i64::<LittleEndian>(cluster.consensus().sum_precursor_mz())?;
    buf.write_i64::<LittleEndian>(cluster.consensus().sum_precursor_charge())?;
    buf.write_i32::<LittleEndian>(noise_filter_increment)?;

    let matches = cluster.best_matches().as_slice();
    buf.write_u32::<LittleEndian>(matches.len() as u32)?;
    for m in matches {
        write_string(&mut buf, &m.other_id)?;
        buf.write_f32::<LittleEndian>(m.similarity)?;
    }

    Ok(buf)
}

/// Encode a cluster with the `{magic, version, payloadLen}` header.
pub fn encode_cluster(cluster: &Cluster, noise_filter_increment: i32) -> io::Result<Vec<u8>> {
    let payload = encode_payload(cluster, noise_filter_increment)?;
    let mut out = Vec::with_capacity(payload.len() + 10);
    out.write_u32::<LittleEndian>(MAGIC)?;
    out.write_u16::<LittleEndian>(VERSION)?;
    out.write_u32::<LittleEndian>(payload.len() as u32)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a cluster previously written by [`encode_cluster`]. Readers
/// tolerate unknown trailing bytes after the documented payload fields
/// (§6), so this only reads what it recognizes and never errors on
/// extra trailing data.
pub fn decode_cluster(mut input: &[u8]) -> Result<Cluster, ClusterError> {
    let magic = input.read_u32::<LittleEndian>()?;
    if magic != MAGIC {
        return Err(ClusterError::Integrity(format!(
            "bad magic: expected {MAGIC:#x}, got {magic:#x}"
        )));
    }
    let version = input.read_u16::<LittleEndian>()?;
    if version != VERSION {
        return Err(ClusterError::Integrity(format!(
            "unsupported cluster payload version {version}"
        )));
    }
    let payload_len = input.read_u32::<LittleEndian>()? as usize;
    if input.len() < payload_len {
        return Err(ClusterError::Integrity(
            "payload shorter than declared length".to_string(),
        ));
    }

    let id = read_string(&mut input)?;

    let member_count = input.read_u32::<LittleEndian>()? as usize;
    let mut member_ids = HashSet::with_capacity(member_count);
    for _ in 0..member_count {
        member_ids.insert(read_string(&mut input)?);
    }

    let bin_count = input.read_u32::<LittleEndian>()? as usize;
    let mut peak_map = BTreeMap::new();
    for _ in 0..bin_count {
        let bin = input.read_i32::<LittleEndian>()?;
        let sum = input.read_i64::<LittleEndian>()?;
        let count = input.read_i32::<LittleEndian>()?;
        peak_map.insert(bin, (sum, count));
    }

    let n_spectra = input.read_i64::<LittleEndian>()?;
    let sum_precursor_mz = input.read_i64::<LittleEndian>()?;
    let sum_precursor_charge = input.read_i64::<LittleEndian>()?;
    let noise_filter_increment = input.read_i32::<LittleEndian>()?;

    let match_count = input.read_u32::<LittleEndian>()? as usize;
    let mut best_matches = Vec::with_capacity(match_count);
    for _ in 0..match_count {
        let other_id = read_string(&mut input)?;
        let similarity = input.read_f32::<LittleEndian>()?;
        best_matches.push(ComparisonMatch { other_id, similarity });
    }

    let consensus = ConsensusSpectrumState::from_parts(
        id.clone(),
        n_spectra,
        sum_precursor_mz,
        sum_precursor_charge,
        peak_map,
        noise_filter_increment,
    );

    Ok(Cluster::from_parts(
        id,
        member_ids,
        consensus,
        best_matches,
        noise_filter_increment,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(uui: &str) -> crate::spectrum::BinarySpectrum {
        crate::spectrum::BinarySpectrum::new(uui.to_string(), 500250, 2, vec![10, 20, 30], vec![5, 6, 7])
    }

    #[test]
    fn round_trip_is_bit_exact_on_fields() {
        let mut cluster = Cluster::new("abc123".to_string(), 100);
        cluster.add_spectra(&[spectrum("s1"), spectrum("s2")]);
        cluster.save_comparison_result("other1".to_string(), 0.75);

        let original_id = cluster.id().to_string();
        let original_members = cluster.member_ids().clone();
        let original_bins = cluster.consensus().sorted_bins();
        let original_matches = cluster.best_matches().as_slice().to_vec();
        let (orig_mz, orig_intensity) = cluster.representative_peaks();
        let original_representative = (orig_mz.to_vec(), orig_intensity.to_vec());

        let encoded = encode_cluster(&cluster, 100).expect("encode");
        let mut decoded = decode_cluster(&encoded).expect("decode");

        assert_eq!(decoded.id(), original_id);
        assert_eq!(decoded.member_ids(), &original_members);
        assert_eq!(decoded.consensus().sorted_bins(), original_bins);
        assert_eq!(decoded.best_matches().as_slice(), original_matches.as_slice());
        let (dec_mz, dec_intensity) = decoded.representative_peaks();
        assert_eq!((dec_mz.to_vec(), dec_intensity.to_vec()), original_representative);
    }

    #[test]
    fn bad_magic_surfaces_integrity_error() {
        let cluster = Cluster::new("abc".to_string(), 100);
        let mut encoded = encode_cluster(&cluster, 100).expect("encode");
        encoded[0] ^= 0xFF;
        let err = decode_cluster(&encoded).unwrap_err();
        assert!(matches!(err, ClusterError::Integrity(_)));
    }

    #[test]
    fn tolerates_unknown_trailing_bytes() {
        let cluster = Cluster::new("abc".to_string(), 100);
        let mut encoded = encode_cluster(&cluster, 100).expect("encode");
        encoded.extend_from_slice(&[1, 2, 3, 4]);
        let decoded = decode_cluster(&encoded).expect("decode should tolerate trailing bytes");
        assert_eq!(decoded.id(), "abc");
    }
}
