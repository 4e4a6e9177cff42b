use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::eqe::{EqeOptions, decode_eqe};
use super::jv::decode_jv;
use super::model::Measurement;
use super::mppt::decode_mppt;

// ---------------------------------------------------------------------------
// Measurement kind
// ---------------------------------------------------------------------------

/// Which decoder a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MeasurementKind {
    Jv,
    Mppt,
    Eqe,
}

impl MeasurementKind {
    /// Guess the kind from a file name.
    ///
    /// * `*JV.txt` (any case) – JV sweep
    /// * `*.csv`              – MPPT tracking
    /// * anything else        – EQE spectrum
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if name.ends_with("jv.txt") {
            MeasurementKind::Jv
        } else if name.ends_with(".csv") {
            MeasurementKind::Mppt
        } else {
            MeasurementKind::Eqe
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and decode one export file.  The kind is guessed from the file name
/// unless given.
pub fn load_file(
    path: &Path,
    kind: Option<MeasurementKind>,
    eqe: &EqeOptions,
) -> Result<Measurement> {
    let kind = kind.unwrap_or_else(|| MeasurementKind::from_path(path));
    log::info!("Decoding {} as {kind:?}", path.display());

    let text = read_text(path)?;
    decode_text(&text, kind, eqe).with_context(|| format!("decoding {}", path.display()))
}

/// Decode an export from an already-open reader.
pub fn decode_reader<R: Read>(
    mut reader: R,
    kind: MeasurementKind,
    eqe: &EqeOptions,
) -> Result<Measurement> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context("reading export")?;
    decode_text(&decode_bytes(&bytes), kind, eqe)
}

/// Decode export text with the decoder for `kind`.
pub fn decode_text(text: &str, kind: MeasurementKind, eqe: &EqeOptions) -> Result<Measurement> {
    let measurement = match kind {
        MeasurementKind::Jv => Measurement::Jv(decode_jv(text)?),
        MeasurementKind::Mppt => Measurement::Mppt(decode_mppt(text)?),
        MeasurementKind::Eqe => Measurement::Eqe(decode_eqe(text, eqe)?),
    };
    Ok(measurement)
}

// ---------------------------------------------------------------------------
// Text decoding
// ---------------------------------------------------------------------------

/// Read a file as text.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(decode_bytes(&bytes))
}

/// Windows-1252 code points for bytes 0x80..=0x9F.  The five bytes the code
/// page leaves undefined keep their Latin-1 value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

fn cp1252_char(b: u8) -> char {
    match b {
        0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
        _ => char::from(b),
    }
}

/// UTF-8 when valid, otherwise Windows-1252.
///
/// Every byte maps to one char so offsets by line stay intact and `²` (0xB2)
/// survives.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not UTF-8, reading as Windows-1252");
            bytes.iter().map(|&b| cp1252_char(b)).collect()
        }
    }
}
