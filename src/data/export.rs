use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Float64Builder, ListBuilder, StringBuilder};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::{EqeRecord, JvRecord, Measurement, MpptRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write a decoded measurement.  Dispatch by extension.
///
/// * `.json`           – the serialized record
/// * `.parquet`/`.pq`  – one Arrow record batch
pub fn write_file(measurement: &Measurement, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => write_json(measurement, path),
        "parquet" | "pq" => write_parquet(measurement, path),
        other => bail!("Unsupported output extension: .{other}"),
    }
}

/// Serialize to pretty JSON.
pub fn write_json(measurement: &Measurement, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(file, measurement).context("writing JSON")?;
    Ok(())
}

/// Write to Parquet.
pub fn write_parquet(measurement: &Measurement, path: &Path) -> Result<()> {
    let batch = to_record_batch(measurement)?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Arrow layout of a measurement.  Every kind is a single row:
///
/// * scalars (header or config values) as `Float64` columns, nullable where
///   the record holds an `Option`
/// * per-curve summary figures and time series as `List<Float64>`
/// * JV curves as `List<Utf8>` names plus `List<List<Float64>>` sweeps, so
///   the summary length and the curve count stay independent
pub fn to_record_batch(measurement: &Measurement) -> Result<RecordBatch> {
    match measurement {
        Measurement::Jv(jv) => jv_batch(jv),
        Measurement::Mppt(m) => mppt_batch(m),
        Measurement::Eqe(e) => eqe_batch(e),
    }
}

// ---------------------------------------------------------------------------
// Column builders
// ---------------------------------------------------------------------------

fn scalar(value: f64) -> ArrayRef {
    Arc::new(Float64Array::from(vec![value]))
}

fn optional(value: Option<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(vec![value]))
}

fn list(values: &[f64]) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    builder.values().append_slice(values);
    builder.append(true);
    Arc::new(builder.finish())
}

fn nested_list<'a>(rows: impl IntoIterator<Item = &'a [f64]>) -> ArrayRef {
    let mut builder = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
    for row in rows {
        let inner = builder.values();
        inner.values().append_slice(row);
        inner.append(true);
    }
    builder.append(true);
    Arc::new(builder.finish())
}

fn string_list<'a>(values: impl IntoIterator<Item = &'a str>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for v in values {
        builder.values().append_value(v);
    }
    builder.append(true);
    Arc::new(builder.finish())
}

// ---------------------------------------------------------------------------
// Per-kind layouts
// ---------------------------------------------------------------------------

fn jv_batch(jv: &JvRecord) -> Result<RecordBatch> {
    RecordBatch::try_from_iter([
        ("active_area", scalar(jv.active_area)),
        ("intensity", scalar(jv.intensity)),
        ("integration_time", scalar(jv.integration_time)),
        ("settling_time", scalar(jv.settling_time)),
        ("averaging", scalar(jv.averaging)),
        ("compliance", scalar(jv.compliance)),
        ("short_circuit_current", list(&jv.short_circuit_current)),
        ("open_circuit_voltage", list(&jv.open_circuit_voltage)),
        ("fill_factor", list(&jv.fill_factor)),
        ("efficiency", list(&jv.efficiency)),
        ("power_at_mpp", list(&jv.power_at_mpp)),
        ("current_at_mpp", list(&jv.current_at_mpp)),
        ("voltage_at_mpp", list(&jv.voltage_at_mpp)),
        ("series_resistance", list(&jv.series_resistance)),
        ("parallel_resistance", list(&jv.parallel_resistance)),
        ("curve_name", string_list(jv.curves.iter().map(|c| c.name.as_str()))),
        ("curve_voltage", nested_list(jv.curves.iter().map(|c| c.voltage.as_slice()))),
        (
            "curve_current_density",
            nested_list(jv.curves.iter().map(|c| c.current_density.as_slice())),
        ),
    ])
    .context("building JV record batch")
}

fn mppt_batch(m: &MpptRecord) -> Result<RecordBatch> {
    RecordBatch::try_from_iter([
        ("total_time", optional(m.total_time)),
        ("step_size", optional(m.step_size)),
        ("time_per_track", optional(m.time_per_track)),
        ("active_area", optional(m.active_area)),
        ("time", list(&m.time)),
        ("voltage", list(&m.voltage)),
        ("current_density", list(&m.current_density)),
        ("power", list(&m.power)),
    ])
    .context("building MPPT record batch")
}

fn eqe_batch(e: &EqeRecord) -> Result<RecordBatch> {
    RecordBatch::try_from_iter([
        ("photon_energy_raw", list(&e.photon_energy_raw)),
        ("eqe_raw", list(&e.eqe_raw)),
        ("photon_energy_interpolated", list(&e.photon_energy_interpolated)),
        ("eqe_interpolated", list(&e.eqe_interpolated)),
    ])
    .context("building EQE record batch")
}
