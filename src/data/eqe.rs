//! EQE spectrum export decoder.
//!
//! EQE exports carry a caller-known number of header lines, the last of which
//! normally names the columns. Files differ in separator and sometimes in
//! where the column names really sit, so the table is located by trying a
//! fixed sequence of [`EqeAttempt`]s.

use crate::error::{DecodeError, Result};

use super::model::EqeRecord;
use super::physics::PHYSICS;
use super::table::{is_blank, parse_optional, Block, Separator};

/// Points on the interpolated energy grid.
pub const INTERPOLATION_POINTS: usize = 1000;

/// Values above this are wavelengths [nm] / percentages rather than eV /
/// fractions.
const UNIT_THRESHOLD: f64 = 10.0;

const WAVELENGTH_COLUMN: &str = "Wavelength (nm)";
const EQE_COLUMN: &str = "IPCE (%)";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Caller-supplied layout hint for EQE exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqeOptions {
    /// Number of header lines; the last one is expected to hold column names.
    /// `0` means the file starts directly with data.
    pub header_lines: usize,
}

impl Default for EqeOptions {
    fn default() -> Self {
        Self { header_lines: 24 }
    }
}

// ---------------------------------------------------------------------------
// Fallback sequence
// ---------------------------------------------------------------------------

/// One (separator, header position) combination tried when reading the table.
///
/// Order: `Tab` → `Comma` → `TabShifted` → `CommaShifted`. Without header
/// lines only the first two apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqeAttempt {
    /// Tab-separated, names on the last header line.
    Tab,
    /// Comma-separated, names on the last header line.
    Comma,
    /// Tab-separated, names one line further down.
    TabShifted,
    /// Comma-separated, names one line further down.
    CommaShifted,
}

impl EqeAttempt {
    pub const FIRST: EqeAttempt = EqeAttempt::Tab;

    /// The attempt to make after this one fails.
    pub fn next(self, header_lines: usize) -> Option<EqeAttempt> {
        match (self, header_lines) {
            (EqeAttempt::Tab, _) => Some(EqeAttempt::Comma),
            (EqeAttempt::Comma, 0) => None,
            (EqeAttempt::Comma, _) => Some(EqeAttempt::TabShifted),
            (EqeAttempt::TabShifted, _) => Some(EqeAttempt::CommaShifted),
            (EqeAttempt::CommaShifted, _) => None,
        }
    }

    pub fn separator(self) -> Separator {
        match self {
            EqeAttempt::Tab | EqeAttempt::TabShifted => Separator::Tab,
            EqeAttempt::Comma | EqeAttempt::CommaShifted => Separator::Comma,
        }
    }

    /// Row holding the column names (counted over non-blank lines), or
    /// `None` when the file has no header.
    pub fn header_row(self, header_lines: usize) -> Option<usize> {
        if header_lines == 0 {
            return None;
        }
        match self {
            EqeAttempt::Tab | EqeAttempt::Comma => Some(header_lines - 1),
            EqeAttempt::TabShifted | EqeAttempt::CommaShifted => Some(header_lines),
        }
    }

    /// Tokenise `lines` under this attempt; `None` when fewer than two
    /// columns come out.
    fn read(self, lines: &[&str], header_lines: usize) -> Option<RawTable> {
        let block = match Block::read(lines, self.separator()) {
            Ok(block) => block,
            Err(e) => {
                log::debug!("EQE {self:?}: tokenizer failed: {e}");
                return None;
            }
        };

        let (names, data_from) = match self.header_row(header_lines) {
            Some(row) => (Some(block.rows().get(row)?.clone()), row + 1),
            None => (None, 0),
        };
        let width = match &names {
            Some(names) => names.len(),
            None => block.rows().first()?.len(),
        };
        if width < 2 {
            log::debug!("EQE {self:?}: {width} column(s)");
            return None;
        }

        Some(RawTable {
            names,
            rows: block.rows().get(data_from..).unwrap_or(&[]).to_vec(),
            width,
        })
    }
}

/// Table located by a successful attempt, cells still raw.
#[derive(Debug)]
struct RawTable {
    names: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl RawTable {
    fn named(&self, name: &str) -> Option<usize> {
        self.names
            .as_ref()
            .and_then(|n| n.iter().position(|c| c.trim() == name))
    }

    fn cell(&self, row: &[String], col: usize) -> Option<f64> {
        row.get(col)
            .and_then(|c| parse_optional(c))
            .filter(|v| !v.is_nan())
    }

    /// Numeric (x, y) pairs; rows with any non-numeric cell are dropped.
    fn numeric_columns(&self) -> (Vec<f64>, Vec<f64>) {
        // entirely blank columns (trailing separators) would otherwise
        // discard every row
        let used: Vec<usize> = (0..self.width)
            .filter(|&c| self.rows.iter().any(|r| r.get(c).is_some_and(|v| !is_blank(v))))
            .collect();

        let x_col = self.named(WAVELENGTH_COLUMN).unwrap_or(0);
        let y_col = self.named(EQE_COLUMN).unwrap_or(1);

        let mut x = Vec::with_capacity(self.rows.len());
        let mut y = Vec::with_capacity(self.rows.len());
        let mut dropped = 0usize;
        for row in &self.rows {
            let numeric = used.iter().all(|&c| self.cell(row, c).is_some());
            match (numeric, self.cell(row, x_col), self.cell(row, y_col)) {
                (true, Some(xv), Some(yv)) => {
                    x.push(xv);
                    y.push(yv);
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!("EQE table: dropped {dropped} non-numeric row(s)");
        }
        (x, y)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode the text of an EQE export.
pub fn decode_eqe(text: &str, options: &EqeOptions) -> Result<EqeRecord> {
    let (x, y) = read_columns(text, options.header_lines)?;
    if x.len() < 3 {
        return Err(DecodeError::NotEnoughPoints { found: x.len() });
    }

    let (photon_energy_raw, eqe_raw) = normalize_axes(x, y);
    let photon_energy_interpolated = linspace(
        min(&photon_energy_raw),
        max(&photon_energy_raw),
        INTERPOLATION_POINTS,
    );
    let eqe_interpolated = photon_energy_interpolated
        .iter()
        .map(|&e| interpolate(&photon_energy_raw, &eqe_raw, e))
        .collect();

    Ok(EqeRecord {
        photon_energy_raw,
        eqe_raw,
        photon_energy_interpolated,
        eqe_interpolated,
    })
}

/// Locate the table by walking the attempt sequence and return the raw
/// numeric x and y columns.
pub fn read_columns(text: &str, header_lines: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let mut attempt = Some(EqeAttempt::FIRST);
    while let Some(current) = attempt {
        if let Some(table) = current.read(&lines, header_lines) {
            log::debug!("EQE table read as {current:?} with {} columns", table.width);
            return Ok(table.numeric_columns());
        }
        attempt = current.next(header_lines);
    }
    Err(DecodeError::NoColumns { header_lines })
}

/// Convert to photon energy [eV] and EQE fraction, ascending in energy.
///
/// Expects at least three points.
pub fn normalize_axes(mut x: Vec<f64>, mut y: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    if x.iter().any(|&v| v > UNIT_THRESHOLD) {
        for v in &mut x {
            *v = PHYSICS.wavelength_to_ev(*v);
        }
    }
    if y.iter().any(|&v| v > UNIT_THRESHOLD) {
        for v in &mut y {
            *v /= 100.0;
        }
    }
    // Ascending wavelength means descending energy.
    if x.len() > 2 && x[1] > x[2] {
        x.reverse();
        y.reverse();
    }
    (x, y)
}

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Linear interpolation of `(xp, fp)` at `x`; `xp` must be ascending.
/// Queries outside the range clamp to the end values.
pub fn interpolate(xp: &[f64], fp: &[f64], x: f64) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // first index with xp[i] > x; 1 <= i <= n-1 here
    let i = xp[..n].partition_point(|&v| v <= x);
    let (x0, x1) = (xp[i - 1], xp[i]);
    let (f0, f1) = (fp[i - 1], fp[i]);
    if x1 == x0 {
        return f0;
    }
    f0 + (f1 - f0) * (x - x0) / (x1 - x0)
}

fn min(v: &[f64]) -> f64 {
    v.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(v: &[f64]) -> f64 {
    v.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn header(n: usize, names: &str) -> String {
        let mut out = String::new();
        for i in 0..n - 1 {
            out.push_str(&format!("Comment line {i}\n"));
        }
        out.push_str(names);
        out.push('\n');
        out
    }

    #[test]
    fn attempt_sequence() {
        let mut seen = vec![EqeAttempt::FIRST];
        while let Some(next) = seen.last().and_then(|a| a.next(24)) {
            seen.push(next);
        }
        assert_eq!(
            seen,
            vec![
                EqeAttempt::Tab,
                EqeAttempt::Comma,
                EqeAttempt::TabShifted,
                EqeAttempt::CommaShifted
            ]
        );
        assert_eq!(EqeAttempt::Comma.next(0), None);
        assert_eq!(EqeAttempt::Tab.header_row(24), Some(23));
        assert_eq!(EqeAttempt::CommaShifted.header_row(24), Some(24));
        assert_eq!(EqeAttempt::TabShifted.header_row(0), None);
    }

    #[test]
    fn tab_file_with_named_columns() {
        let text = header(3, "Wavelength (nm)\tIPCE (%)") + "800\t5\n750\t12\n700\t45\n650\t60\n";
        let eqe = decode_eqe(&text, &EqeOptions { header_lines: 3 }).unwrap();

        // descending wavelengths are already ascending in energy
        assert!(close(eqe.photon_energy_raw[0], PHYSICS.wavelength_to_ev(800.0)));
        assert!(eqe.photon_energy_raw.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(eqe.eqe_raw, vec![0.05, 0.12, 0.45, 0.6]);
    }

    #[test]
    fn comma_file_falls_back() {
        let text = header(2, "Wavelength (nm),IPCE (%)") + "300,10\n400,50\n500,80\n";
        let eqe = decode_eqe(&text, &EqeOptions { header_lines: 2 }).unwrap();
        // ascending wavelengths are reversed into ascending energy
        assert!(close(eqe.photon_energy_raw[0], PHYSICS.wavelength_to_ev(500.0)));
        assert!(close(eqe.eqe_raw[0], 0.8));
    }

    #[test]
    fn header_count_off_by_one() {
        // The caller says 2 header lines but the names sit on line 3.
        let text = "Title\nInstrument\tX\nWavelength (nm)\tIPCE (%)\n400\t20\n500\t40\n600\t30\n";
        let (x, y) = read_columns(text, 2).unwrap();
        // tab attempt succeeds on the two-column "Instrument\tX" line, so the
        // names row becomes a dropped non-numeric data row
        assert_eq!(x, vec![400.0, 500.0, 600.0]);
        assert_eq!(y, vec![20.0, 40.0, 30.0]);

        let text = "Title\nNotes\nWavelength (nm),IPCE (%)\n400,20\n500,40\n600,30\n";
        let (x, _) = read_columns(text, 2).unwrap();
        assert_eq!(x, vec![400.0, 500.0, 600.0]);
    }

    #[test]
    fn tab_names_one_line_down() {
        // Single-cell line where the names were expected: tab and comma both
        // see one column, the shifted tab attempt finds the names.
        let text = "Title\nNotes\nWavelength (nm)\tIPCE (%)\n400\t20\n500\t40\n600\t30\n";
        let lines: Vec<&str> = text.lines().collect();
        assert!(EqeAttempt::Tab.read(&lines, 2).is_none());
        assert!(EqeAttempt::Comma.read(&lines, 2).is_none());
        let table = EqeAttempt::TabShifted.read(&lines, 2).unwrap();
        assert_eq!(table.width, 2);
        assert_eq!(table.named("IPCE (%)"), Some(1));

        let (x, y) = read_columns(text, 2).unwrap();
        assert_eq!(x, vec![400.0, 500.0, 600.0]);
        assert_eq!(y, vec![20.0, 40.0, 30.0]);
    }

    #[test]
    fn no_columns_is_fatal() {
        let text = "a\nb\nc\n1\n2\n";
        let err = decode_eqe(text, &EqeOptions { header_lines: 2 }).unwrap_err();
        assert!(matches!(err, DecodeError::NoColumns { header_lines: 2 }));
    }

    #[test]
    fn positional_columns_without_header() {
        let text = "1.5\t0.1\n2.0\t0.5\n2.5\t0.7\n";
        let eqe = decode_eqe(text, &EqeOptions { header_lines: 0 }).unwrap();
        assert_eq!(eqe.photon_energy_raw, vec![1.5, 2.0, 2.5]);
        assert_eq!(eqe.eqe_raw, vec![0.1, 0.5, 0.7]);
    }

    #[test]
    fn too_few_points() {
        let text = "x\ty\n1.5\t0.1\nbad\t0.2\n";
        let err = decode_eqe(text, &EqeOptions { header_lines: 1 }).unwrap_err();
        assert!(matches!(err, DecodeError::NotEnoughPoints { found: 1 }));
    }

    #[test]
    fn interpolation_grid() {
        let text = "x\ty\n1.5\t0.1\n2.0\t0.5\n2.5\t0.7\n";
        let eqe = decode_eqe(text, &EqeOptions { header_lines: 1 }).unwrap();
        assert_eq!(eqe.photon_energy_interpolated.len(), INTERPOLATION_POINTS);
        assert_eq!(eqe.eqe_interpolated.len(), INTERPOLATION_POINTS);
        assert_eq!(eqe.photon_energy_interpolated[0], 1.5);
        assert_eq!(eqe.photon_energy_interpolated[INTERPOLATION_POINTS - 1], 2.5);
        assert!(close(eqe.eqe_interpolated[0], 0.1));
        assert!(close(eqe.eqe_interpolated[INTERPOLATION_POINTS - 1], 0.7));
    }

    #[test]
    fn interpolate_matches_linear_segments() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [0.0, 10.0, 30.0];
        assert!(close(interpolate(&xp, &fp, 0.5), 5.0));
        assert!(close(interpolate(&xp, &fp, 2.0), 20.0));
        assert!(close(interpolate(&xp, &fp, 1.0), 10.0));
        assert_eq!(interpolate(&xp, &fp, -1.0), 0.0);
        assert_eq!(interpolate(&xp, &fp, 9.0), 30.0);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
