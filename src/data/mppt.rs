//! MPPT tracking export decoder.
//!
//! Lines 1–41 hold `<field>\t<value>` configuration rows; line 43 is the
//! header of the time-series table, which runs to the end of the file.

use crate::error::{DecodeError, Result};

use super::model::MpptRecord;
use super::table::{is_blank, line_range, parse_optional, split_lines, Block, Separator};

/// Configuration block length (lines 1–41).
pub const CONFIG_LINES: usize = 41;
/// Time-series header line (0-indexed, i.e. line 43).
pub const SERIES_HEADER_LINE: usize = 42;
/// Shortest text the fixed offsets can be applied to.
pub const MIN_LINES: usize = SERIES_HEADER_LINE + 1;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

const DURATION_FIELD: &str = "Test duration (hours)";
const INTERVAL_FIELD: &str = "JV interval (min)";
const TRACK_DELAY_FIELD: &str = "track delay (s)";
const AREA_FIELD: &str = "Cell Area (cm2)";

const TIME_COLUMN: &str = "Time (hours)";
const VOLTAGE_COLUMN: &str = "V (V)";
const CURRENT_COLUMN: &str = "J (mAcm-2)";
const POWER_COLUMN: &str = "P (mWcm-2)";

/// Decode the full text of an MPPT export.
pub fn decode_mppt(text: &str) -> Result<MpptRecord> {
    let text = text.replace('²', "^2");
    let lines = split_lines(&text);
    if lines.len() < MIN_LINES {
        return Err(DecodeError::TooShort {
            format: "MPPT",
            needed: MIN_LINES,
            found: lines.len(),
        });
    }

    // -- Configuration block --
    let config = Block::read(line_range(&lines, 0, CONFIG_LINES), Separator::Tab)?;
    let field = |name: &'static str| -> Result<Option<f64>> {
        let value = config
            .row_value(name)
            .ok_or_else(|| DecodeError::missing("config", name))?;
        Ok(parse_optional(value).filter(|v| !v.is_nan()))
    };

    let total_time = field(DURATION_FIELD)?.map(|h| h * SECONDS_PER_HOUR);
    let step_size = field(INTERVAL_FIELD)?.map(|m| m * SECONDS_PER_MINUTE);
    let time_per_track = field(TRACK_DELAY_FIELD)?;
    let active_area = field(AREA_FIELD)?;

    // -- Time series --
    let series = Block::read(line_range(&lines, SERIES_HEADER_LINE, lines.len()), Separator::Tab)?;
    let column = |name: &'static str| {
        series
            .find_column(name)
            .ok_or_else(|| DecodeError::missing("time series", name))
    };
    let cols = [
        column(TIME_COLUMN)?,
        column(VOLTAGE_COLUMN)?,
        column(CURRENT_COLUMN)?,
        column(POWER_COLUMN)?,
    ];
    let width = series.header().len();

    let mut record = MpptRecord {
        total_time,
        step_size,
        time_per_track,
        active_area,
        time: Vec::new(),
        voltage: Vec::new(),
        current_density: Vec::new(),
        power: Vec::new(),
    };

    let mut dropped = 0usize;
    for row in series.data_rows() {
        let complete = (0..width).all(|c| row.get(c).is_some_and(|cell| !is_blank(cell)));
        let values: Option<Vec<f64>> = cols
            .iter()
            .map(|&c| row.get(c).and_then(|cell| parse_optional(cell)))
            .collect();
        match values {
            Some(v) if complete && v.iter().all(|x| !x.is_nan()) => {
                record.time.push(v[0]);
                record.voltage.push(v[1]);
                record.current_density.push(v[2]);
                record.power.push(v[3]);
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!("MPPT time series: dropped {dropped} incomplete row(s)");
    }
    log::debug!("MPPT time series: {} samples", record.len());

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mppt_text(config: &[(&str, &str)], rows: &[&str]) -> String {
        let mut lines: Vec<String> = config
            .iter()
            .map(|(name, value)| format!("{name}\t{value}"))
            .collect();
        while lines.len() < CONFIG_LINES {
            lines.push(format!("Setting {}\t1", lines.len()));
        }
        lines.push(String::new());
        lines.push("Time (hours)\tV (V)\tJ (mAcm-2)\tP (mWcm-2)".into());
        lines.extend(rows.iter().map(|s| s.to_string()));
        lines.join("\n")
    }

    fn config() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Test duration (hours)", "2.5"),
            ("JV interval (min)", "10"),
            ("track delay (s)", "7"),
            ("Cell Area (cm2)", "0.16"),
        ]
    }

    #[test]
    fn decodes_config_and_series() {
        let text = mppt_text(
            &config(),
            &["0.0\t0.90\t-20.0\t18.0", "0.1\t0.91\t-19.9\t18.1", "0.2\t0.92\t-19.8\t18.2"],
        );
        let m = decode_mppt(&text).unwrap();

        assert_eq!(m.total_time, Some(9000.0));
        assert_eq!(m.step_size, Some(600.0));
        assert_eq!(m.time_per_track, Some(7.0));
        assert_eq!(m.active_area, Some(0.16));
        assert_eq!(m.time, vec![0.0, 0.1, 0.2]);
        assert_eq!(m.power, vec![18.0, 18.1, 18.2]);
        assert_eq!(m.voltage.len(), m.current_density.len());
    }

    #[test]
    fn incomplete_rows_dropped() {
        let text = mppt_text(
            &config(),
            &["0.0\t0.90\t-20.0\t18.0", "0.1\t\t-19.9\t18.1", "0.2\t0.92\tnan\t18.2", "0.3\t0.93\t-19.7\t18.3"],
        );
        let m = decode_mppt(&text).unwrap();
        assert_eq!(m.time, vec![0.0, 0.3]);
    }

    #[test]
    fn unparsable_config_is_none_not_zero() {
        let mut cfg = config();
        cfg[0] = ("Test duration (hours)", "n/a");
        cfg[2] = ("track delay (s)", "0");
        let m = decode_mppt(&mppt_text(&cfg, &["0\t1\t1\t1"])).unwrap();
        assert_eq!(m.total_time, None);
        assert_eq!(m.time_per_track, Some(0.0));
    }

    #[test]
    fn missing_config_row_is_fatal() {
        let cfg: Vec<_> = config().into_iter().skip(1).collect();
        let err = decode_mppt(&mppt_text(&cfg, &[])).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { block: "config", .. }));
    }

    #[test]
    fn missing_series_column_is_fatal() {
        let text = mppt_text(&config(), &[]).replace("P (mWcm-2)", "Power");
        let err = decode_mppt(&text).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { block: "time series", .. }));
    }
}
