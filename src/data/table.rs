use csv::ReaderBuilder;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Line slicing
// ---------------------------------------------------------------------------

/// Field separator of a delimited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Tab,
    Comma,
}

impl Separator {
    fn byte(self) -> u8 {
        match self {
            Separator::Tab => b'\t',
            Separator::Comma => b',',
        }
    }
}

/// Split text into lines, keeping line numbers stable (blank lines count).
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Lines `first..end` (0-indexed, end exclusive), clamped to what exists.
pub fn line_range<'a, 'b>(lines: &'b [&'a str], first: usize, end: usize) -> &'b [&'a str] {
    let end = end.min(lines.len());
    let first = first.min(end);
    &lines[first..end]
}

// ---------------------------------------------------------------------------
// Block – a rectangular-ish chunk of delimited text
// ---------------------------------------------------------------------------

/// Rows of raw cells read from a run of lines.
///
/// Rows may have different widths; missing trailing cells read as empty.
/// Blank lines are skipped.
#[derive(Debug, Clone, Default)]
pub struct Block {
    rows: Vec<Vec<String>>,
}

impl Block {
    /// Tokenise `lines` with the given separator.
    pub fn read(lines: &[&str], sep: Separator) -> Result<Self> {
        let joined = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        let mut reader = ReaderBuilder::new()
            .delimiter(sep.byte())
            .has_headers(false)
            .flexible(true)
            .from_reader(joined.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(Block { rows })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at `(row, col)`, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    // -- Row-labelled access (first column holds the field name) --

    /// Index of the first row whose label matches `name`.
    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.first().is_some_and(|c| c.trim() == name))
    }

    /// First value cell of the row labelled `name`.
    pub fn row_value(&self, name: &str) -> Option<&str> {
        self.find_row(name).map(|i| self.cell(i, 1))
    }

    // -- Column-headed access (first row holds the column names) --

    /// Header cells (first row).
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index of the header cell matching `name`.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.header().iter().position(|h| h.trim() == name)
    }

    /// Data rows below the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Cells of column `col` across all rows from `from` on.
    pub fn column_cells(&self, col: usize, from: usize) -> Vec<&str> {
        (from..self.rows.len()).map(|r| self.cell(r, col)).collect()
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse a cell as a number; empty or garbage cells give `None`.
pub fn parse_optional(cell: &str) -> Option<f64> {
    let t = cell.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Parse a cell, replacing garbage, NaN and infinities with `0.0`.
pub fn coerce_or_zero(cell: &str) -> f64 {
    parse_optional(cell)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a cell, leaving garbage as NaN for the caller to detect.
pub fn parse_or_nan(cell: &str) -> f64 {
    parse_optional(cell).unwrap_or(f64::NAN)
}

/// Whether a cell holds nothing at all.
pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}
