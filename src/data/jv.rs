//! JV sweep export decoder.
//!
//! Layout (1-indexed lines):
//!
//! ```text
//!  1–2    free-form title lines
//!  3–41   header block: <field>\t<value>[\t<value>...]
//!  42     blank
//!  43     summary header: <label>\tJsc\tVoc\tFF\tEff\tP_MPP\tJ_MPP\tV_MPP\tRs\tR//
//!  44–46  summary rows, one per curve (placeholder rows have no label)
//!  47     blank
//!  48     curve table header
//!  49..   curve table: V\tJ\tV\tJ... one column pair per curve
//!  last   trailer
//! ```

use crate::error::{DecodeError, Result};

use super::model::{JvCurve, JvRecord};
use super::table::{coerce_or_zero, is_blank, line_range, parse_or_nan, split_lines, Block, Separator};

/// First header-block line (0-indexed, i.e. line 3).
pub const HEADER_FIRST_LINE: usize = 2;
/// Header block length (lines 3–41).
pub const HEADER_LINES: usize = 39;
/// Summary header line (line 43).
pub const SUMMARY_HEADER_LINE: usize = 42;
/// Summary rows below the header.
pub const SUMMARY_ROWS: usize = 3;
/// Curve table header line (line 48).
pub const CURVE_HEADER_LINE: usize = 47;
/// Lines at the end of the file that are not curve data.
pub const CURVE_TRAILER_LINES: usize = 2;
/// The summary block is capped at two illumination conditions.
// Known format assumption: a third curve's summary is discarded while its
// curve table samples are kept.
pub const SUMMARY_CURVE_LIMIT: usize = 2;
/// Shortest text the fixed offsets can be applied to.
pub const MIN_LINES: usize = CURVE_HEADER_LINE + 1;

/// Fixed illumination intensity [mW/cm²]; not read from the file.
pub const INTENSITY: f64 = 100.0;

const AREA_FIELD: &str = "Cell Area (cm2)";
const INTEGRATION_FIELD: &str = "Integration time (s)";
const SETTLING_FIELD: &str = "Settling time (s)";
const AVERAGING_FIELD: &str = "Averaging";
const COMPLIANCE_FIELD: &str = "Compliance (A)";

/// Decode the full text of a JV export.
pub fn decode_jv(text: &str) -> Result<JvRecord> {
    let lines = split_lines(text);
    if lines.len() < MIN_LINES {
        return Err(DecodeError::TooShort {
            format: "JV",
            needed: MIN_LINES,
            found: lines.len(),
        });
    }

    // -- Header block --
    let header = Block::read(
        line_range(&lines, HEADER_FIRST_LINE, HEADER_FIRST_LINE + HEADER_LINES),
        Separator::Tab,
    )?;
    log::debug!("JV header block: {} rows", header.len());

    let active_area = header
        .row_value(AREA_FIELD)
        .map(coerce_or_zero)
        .ok_or_else(|| DecodeError::missing("header", AREA_FIELD))?;
    let reserved = |name: &str| header.row_value(name).map_or(0.0, coerce_or_zero);

    // -- Summary block --
    let summary_block = Block::read(
        line_range(&lines, SUMMARY_HEADER_LINE, SUMMARY_HEADER_LINE + 1 + SUMMARY_ROWS),
        Separator::Tab,
    )?;
    let summary = Summary::new(&summary_block);

    // -- Curve table --
    let newline_count = text.matches('\n').count();
    let data_rows = newline_count.saturating_sub(CURVE_HEADER_LINE + CURVE_TRAILER_LINES);
    let table = Block::read(
        line_range(&lines, CURVE_HEADER_LINE, CURVE_HEADER_LINE + 1 + data_rows),
        Separator::Tab,
    )?;
    let curves = read_curves(&table);

    Ok(JvRecord {
        active_area,
        intensity: INTENSITY,
        integration_time: reserved(INTEGRATION_FIELD),
        settling_time: reserved(SETTLING_FIELD),
        averaging: reserved(AVERAGING_FIELD),
        compliance: reserved(COMPLIANCE_FIELD),
        short_circuit_current: summary.absolute("Jsc")?,
        open_circuit_voltage: summary.absolute("Voc")?,
        fill_factor: summary.column("FF")?,
        efficiency: summary.column("Eff")?,
        power_at_mpp: summary.column("P_MPP")?,
        current_at_mpp: summary.absolute("J_MPP")?,
        voltage_at_mpp: summary.column("V_MPP")?,
        series_resistance: summary.column("Rs")?,
        parallel_resistance: summary.column("R//")?,
        curves,
    })
}

// ---------------------------------------------------------------------------
// Summary block
// ---------------------------------------------------------------------------

/// Per-curve figures of merit, column-addressed by name.
struct Summary<'a> {
    block: &'a Block,
    /// Block rows that carry a curve label.
    rows: Vec<usize>,
}

impl<'a> Summary<'a> {
    fn new(block: &'a Block) -> Self {
        let rows: Vec<usize> = (1..block.len())
            .filter(|&r| {
                let row = &block.rows()[r];
                let labelled = row.first().is_some_and(|c| !is_blank(c));
                let has_values = row.iter().skip(1).any(|c| !is_blank(c));
                labelled && has_values
            })
            .collect();

        let dropped = block.len().saturating_sub(1) - rows.len();
        if dropped > 0 {
            log::debug!("JV summary: dropped {dropped} placeholder row(s)");
        }
        if rows.len() > SUMMARY_CURVE_LIMIT {
            log::warn!(
                "JV summary has {} curves, keeping the first {SUMMARY_CURVE_LIMIT}",
                rows.len()
            );
        }
        Summary { block, rows }
    }

    fn column(&self, name: &str) -> Result<Vec<f64>> {
        let col = self
            .block
            .find_column(name)
            .ok_or_else(|| DecodeError::missing("summary", name))?;
        Ok(self
            .rows
            .iter()
            .take(SUMMARY_CURVE_LIMIT)
            .map(|&r| coerce_or_zero(self.block.cell(r, col)))
            .collect())
    }

    /// Column with the export's sign convention stripped.
    fn absolute(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.column(name)?.into_iter().map(f64::abs).collect())
    }
}

// ---------------------------------------------------------------------------
// Curve table
// ---------------------------------------------------------------------------

fn read_curves(table: &Block) -> Vec<JvCurve> {
    let width = table.width();
    let kept: Vec<usize> = (0..width)
        .filter(|&c| table.column_cells(c, 1).iter().any(|cell| !is_blank(cell)))
        .collect();
    log::debug!(
        "JV curve table: {} data rows, {} of {width} columns kept",
        table.len().saturating_sub(1),
        kept.len()
    );

    if kept.len() % 2 == 1 {
        log::warn!("JV curve table has an unpaired trailing column, ignoring it");
    }

    kept.chunks_exact(2)
        .enumerate()
        .map(|(k, pair)| {
            let v_cells = table.column_cells(pair[0], 1);
            let j_cells = table.column_cells(pair[1], 1);
            // curves shorter than the table end in rows blank in both columns
            let len = v_cells
                .iter()
                .zip(&j_cells)
                .rposition(|(v, j)| !is_blank(v) || !is_blank(j))
                .map_or(0, |i| i + 1);

            JvCurve {
                name: format!("Scan {}", k + 1),
                voltage: v_cells[..len].iter().map(|c| parse_or_nan(c)).collect(),
                current_density: j_cells[..len].iter().map(|c| parse_or_nan(c)).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a JV export with the given summary rows and curve table rows.
    fn jv_text(header: &[(&str, &str)], summary: &[&str], table: &[&str]) -> String {
        let mut lines: Vec<String> = vec!["JV measurement".into(), "Device 001".into()];
        for (name, value) in header {
            lines.push(format!("{name}\t{value}"));
        }
        while lines.len() < HEADER_FIRST_LINE + HEADER_LINES {
            lines.push(format!("Param {}\t0", lines.len()));
        }
        lines.push(String::new());
        lines.push("Pixel\tJsc\tVoc\tFF\tEff\tP_MPP\tJ_MPP\tV_MPP\tRs\tR//".into());
        for i in 0..SUMMARY_ROWS {
            lines.push(summary.get(i).map_or_else(|| "\t-\t-".to_string(), |s| s.to_string()));
        }
        lines.push(String::new());
        lines.push("V (V)\tJ (mA/cm2)\tV (V)\tJ (mA/cm2)".into());
        lines.extend(table.iter().map(|s| s.to_string()));
        lines.push(String::new());
        lines.push("end".into());
        lines.join("\n") + "\n"
    }

    fn default_header() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Integration time (s)", "0.02"),
            ("Settling time (s)", "0.1"),
            ("Averaging", "3"),
            ("Compliance (A)", "0.1"),
            ("Cell Area (cm2)", "0.09"),
        ]
    }

    #[test]
    fn decodes_header_summary_and_curves() {
        let text = jv_text(
            &default_header(),
            &[
                "Fwd\t-21.5\t1.08\t0.78\t18.1\t18.1\t-19.9\t0.91\t5.2\t1200",
                "Rev\t-21.7\t1.10\t0.80\t19.1\t19.1\t-20.1\t0.95\t5.0\t1500",
            ],
            &["0.0\t-21.5\t1.1\t5.0", "0.5\t-20.0\t0.5\t-20.1", "1.1\t5.0\t0.0\t-21.7"],
        );
        let jv = decode_jv(&text).unwrap();

        assert_eq!(jv.active_area, 0.09);
        assert_eq!(jv.intensity, 100.0);
        assert_eq!(jv.integration_time, 0.02);
        assert_eq!(jv.averaging, 3.0);
        assert_eq!(jv.short_circuit_current, vec![21.5, 21.7]);
        assert_eq!(jv.open_circuit_voltage, vec![1.08, 1.10]);
        assert_eq!(jv.current_at_mpp, vec![19.9, 20.1]);
        assert_eq!(jv.parallel_resistance, vec![1200.0, 1500.0]);

        assert_eq!(jv.curves.len(), 2);
        assert_eq!(jv.curves[0].name, "Scan 1");
        assert_eq!(jv.curves[1].name, "Scan 2");
        assert_eq!(jv.curves[0].voltage, vec![0.0, 0.5, 1.1]);
        assert_eq!(jv.curves[1].current_density, vec![5.0, -20.1, -21.7]);
    }

    #[test]
    fn summary_truncates_to_two_curves() {
        // The third summary row is discarded although its curve is kept.
        let text = jv_text(
            &default_header(),
            &[
                "A\t-1\t1\t0.7\t10\t10\t-1\t0.8\t5\t100",
                "B\t-2\t1\t0.7\t11\t11\t-2\t0.8\t5\t100",
                "C\t-3\t1\t0.7\t12\t12\t-3\t0.8\t5\t100",
            ],
            &["0\t-1\t0\t-2\t0\t-3", "1\t1\t1\t1\t1\t1"],
        );
        let jv = decode_jv(&text).unwrap();
        assert_eq!(jv.short_circuit_current, vec![1.0, 2.0]);
        assert_eq!(jv.efficiency, vec![10.0, 11.0]);
        assert_eq!(jv.curves.len(), 3);
        assert_eq!(jv.curves[2].current_density, vec![-3.0, 1.0]);
    }

    #[test]
    fn placeholder_rows_dropped_and_garbage_zeroed() {
        let text = jv_text(
            &default_header(),
            &["A\t-1\tbad\t0.7\tinf\t10\t-1\t0.8\t5\t100"],
            &["0\t-1\t0\t-2"],
        );
        let jv = decode_jv(&text).unwrap();
        assert_eq!(jv.summary_len(), 1);
        assert_eq!(jv.open_circuit_voltage, vec![0.0]);
        assert_eq!(jv.efficiency, vec![0.0]);
    }

    #[test]
    fn empty_columns_dropped_and_bad_cells_are_nan() {
        let text = jv_text(
            &default_header(),
            &[],
            &["0\t\t-1\t0\t-2", "1\t\tx\t1\t-3", "\t\t\t2\t-4"],
        );
        let jv = decode_jv(&text).unwrap();
        assert_eq!(jv.curves.len(), 2);
        assert_eq!(jv.curves[0].voltage, vec![0.0, 1.0]);
        assert_eq!(jv.curves[0].current_density[0], -1.0);
        assert!(jv.curves[0].current_density[1].is_nan());
        // The second curve is one sample longer.
        assert_eq!(jv.curves[1].voltage, vec![0.0, 1.0, 2.0]);
        for curve in &jv.curves {
            assert_eq!(curve.voltage.len(), curve.current_density.len());
        }
    }

    #[test]
    fn missing_area_is_fatal() {
        let header: Vec<_> = default_header()
            .into_iter()
            .filter(|(n, _)| *n != "Cell Area (cm2)")
            .collect();
        let text = jv_text(&header, &[], &["0\t-1\t0\t-2"]);
        let err = decode_jv(&text).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field, .. } if field == "Cell Area (cm2)"));
    }

    #[test]
    fn missing_summary_column_is_fatal() {
        let text = jv_text(&default_header(), &[], &[]).replace("\tR//", "\tRp");
        let err = decode_jv(&text).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { block: "summary", .. }));
    }

    #[test]
    fn short_file_rejected() {
        let err = decode_jv("a\nb\nc\n").unwrap_err();
        assert!(matches!(err, DecodeError::TooShort { found: 3, .. }));
    }
}
