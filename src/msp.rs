//! MSP spectral-library block emission (§6 "MSP output").
//!
//! The core only guarantees a cluster has a deterministic representative;
//! peptide identification that resolves a cluster's sequence and mods is
//! out of scope (spec Non-goal: "identifying peptides"). This module
//! accepts the already-resolved peptide/charge metadata and formats it
//! deterministically, plus the pure sequence-annotation parsing
//! (`extract_mods_from_sequence`/`get_mod_string`) that convention uses
//! to render a `Comment:` line's `Mods=` field from a mass-annotated
//! sequence string.

use std::fmt::Write as _;

/// A single positional modification extracted from a mass-annotated
/// sequence, e.g. `"+42.011EVQ..."`.
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    /// Residues already consumed when the mass token was encountered.
    pub position: usize,
    /// `'['` for an N-terminal mod, `']'` for a C-terminal mod,
    /// otherwise the one-letter residue immediately preceding it.
    pub anchor: char,
    pub mass: f64,
    pub name: String,
}

/// Known mass shifts, `(monoisotopic delta, name)`, matched within
/// `MASS_TOLERANCE`. An unrecognized mass falls back to a `Delta{n.nnn}`
/// label rather than failing — the annotation is cosmetic, not load-bearing.
const KNOWN_MODS: &[(f64, &str)] = &[
    (42.0106, "Acetyl"),
    (15.9949, "Oxidation"),
    (57.0215, "Carbamidomethyl"),
    (79.9663, "Phospho"),
];
const MASS_TOLERANCE: f64 = 0.01;

pub fn mass_to_name(mass: f64) -> String {
    KNOWN_MODS
        .iter()
        .find(|&&(known, _)| (known - mass).abs() <= MASS_TOLERANCE)
        .map(|&(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Delta{mass:.3}"))
}

/// Parse a mass-annotated sequence (`+NN.NNN` or `-NN.NNN` tokens
/// interleaved with residue letters) into its modifications and the
/// bare residue sequence with the mass tokens stripped out.
pub fn extract_mods_from_sequence(sequence: &str) -> (Vec<Modification>, String) {
    let mut residues = String::new();
    let mut raw_mods: Vec<(usize, f64)> = Vec::new();
    let mut chars = sequence.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == '+' || c == '-' {
            let mut token = String::new();
            token.push(c);
            chars.next();
            while matches!(chars.peek(), Some(d) if d.is_ascii_digit() || *d == '.') {
                token.push(chars.next().expect("peeked"));
            }
            let mass: f64 = token.parse().unwrap_or(0.0);
            raw_mods.push((residues.len(), mass));
        } else {
            residues.push(chars.next().expect("peeked"));
        }
    }

    let total = residues.len();
    let mods = raw_mods
        .into_iter()
        .map(|(position, mass)| {
            let anchor = if position == 0 {
                '['
            } else if position == total {
                ']'
            } else {
                residues.as_bytes()[position - 1] as char
            };
            Modification {
                position,
                anchor,
                mass,
                name: mass_to_name(mass),
            }
        })
        .collect();

    (mods, residues)
}

/// Render mods as `"{count}(pos,anchor,name)(pos,anchor,name)..."`, the
/// form used by a `Comment:` line's `Mods=` field.
pub fn get_mod_string(mods: &[Modification]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", mods.len());
    for m in mods {
        let _ = write!(out, "({},{},{})", m.position, m.anchor, m.name);
    }
    out
}

/// Already-resolved metadata for one MSP block. The sequence carries
/// inline mass-annotation tokens (as [`extract_mods_from_sequence`]
/// expects); this module does not identify peptides itself.
pub struct MspClusterInfo<'a> {
    pub annotated_sequence: &'a str,
    pub charge: i32,
    pub parent_mz: f64,
    pub n_reps: u32,
    pub max_ratio: f64,
    pub mz: &'a [f64],
    pub intensity: &'a [f64],
}

/// Format one `Name:`/`Comment:`/`Num peaks:` + sorted peak-line block.
/// Peaks are assumed already sorted ascending by mz, matching a
/// cluster's representative contract.
pub fn write_msp_block(info: &MspClusterInfo) -> String {
    let (mods, clean_sequence) = extract_mods_from_sequence(info.annotated_sequence);

    let name_prefix = mods
        .iter()
        .find(|m| m.position == 0)
        .map(|m| format!("{:+.3}", m.mass))
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "Name: {name_prefix}{clean_sequence}/{}", info.charge);
    let _ = writeln!(
        out,
        "Comment: Spec=Consensus Parent={:.4} Mods={} Nreps={} Naa={} MaxRatio={:.3}",
        info.parent_mz,
        get_mod_string(&mods),
        info.n_reps,
        clean_sequence.len(),
        info.max_ratio
    );
    let _ = writeln!(out, "Num peaks: {}", info.mz.len());
    for (mz, intensity) in info.mz.iter().zip(info.intensity.iter()) {
        let _ = writeln!(out, "{mz}\t{intensity}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_n_term_internal_and_c_term_mods() {
        let (mods, residues) = extract_mods_from_sequence("+42.011EVQLVET+42.011GGGLIQPGGSLR+42.011");
        assert_eq!(residues, "EVQLVETGGGLIQPGGSLR");
        assert_eq!(
            mods,
            vec![
                Modification { position: 0, anchor: '[', mass: 42.011, name: "Acetyl".to_string() },
                Modification { position: 7, anchor: 'T', mass: 42.011, name: "Acetyl".to_string() },
                Modification { position: 19, anchor: ']', mass: 42.011, name: "Acetyl".to_string() },
            ]
        );
    }

    #[test]
    fn mod_string_matches_expected_format() {
        let (mods, _) = extract_mods_from_sequence("+42.011EVQLVET+42.011GGGLIQPGGSLR+42.011");
        assert_eq!(get_mod_string(&mods), "3(0,[,Acetyl)(7,T,Acetyl)(19,],Acetyl)");
    }

    #[test]
    fn unannotated_sequence_has_no_mods() {
        let (mods, residues) = extract_mods_from_sequence("PEPTIDE");
        assert!(mods.is_empty());
        assert_eq!(residues, "PEPTIDE");
    }

    #[test]
    fn unknown_mass_falls_back_to_delta_label() {
        assert_eq!(mass_to_name(12.345), "Delta12.345");
    }

    #[test]
    fn write_msp_block_has_expected_line_shape() {
        let info = MspClusterInfo {
            annotated_sequence: "+42.011EVQLVETGGGLIQPGGSLR",
            charge: 2,
            parent_mz: 977.0230,
            n_reps: 1,
            max_ratio: 1.0,
            mz: &[100.0, 200.0],
            intensity: &[10.0, 20.0],
        };
        let block = write_msp_block(&info);
        let mut lines = block.lines();
        assert_eq!(lines.next(), Some("Name: +42.011EVQLVETGGGLIQPGGSLR/2"));
        assert_eq!(
            lines.next(),
            Some("Comment: Spec=Consensus Parent=977.0230 Mods=1(0,[,Acetyl) Nreps=1 Naa=19 MaxRatio=1.000")
        );
        assert_eq!(lines.next(), Some("Num peaks: 2"));
        assert_eq!(lines.next(), Some("100\t10"));
    }
}
