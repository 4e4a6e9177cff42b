use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// JV – current-voltage sweeps
// ---------------------------------------------------------------------------

/// One swept curve of a JV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JvCurve {
    /// Synthesised label, `"Scan 1"`, `"Scan 2"`, ...
    pub name: String,
    /// Voltage axis [V].
    pub voltage: Vec<f64>,
    /// Current density [mA/cm²] – same length as `voltage`.
    pub current_density: Vec<f64>,
}

/// Decoded JV export.
///
/// The per-curve scalar vectors are index-aligned and share one length.
/// That length is independent of `curves.len()`: the summary block is capped
/// at two entries while the curve table is not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JvRecord {
    /// Active area [cm²].
    pub active_area: f64,
    /// Illumination intensity [mW/cm²].
    pub intensity: f64,
    pub integration_time: f64,
    pub settling_time: f64,
    pub averaging: f64,
    pub compliance: f64,

    pub short_circuit_current: Vec<f64>,
    pub open_circuit_voltage: Vec<f64>,
    pub fill_factor: Vec<f64>,
    pub efficiency: Vec<f64>,
    pub power_at_mpp: Vec<f64>,
    pub current_at_mpp: Vec<f64>,
    pub voltage_at_mpp: Vec<f64>,
    pub series_resistance: Vec<f64>,
    pub parallel_resistance: Vec<f64>,

    pub curves: Vec<JvCurve>,
}

impl JvRecord {
    /// Number of entries in the per-curve summary vectors.
    pub fn summary_len(&self) -> usize {
        self.short_circuit_current.len()
    }
}

// ---------------------------------------------------------------------------
// MPPT – maximum-power-point tracking
// ---------------------------------------------------------------------------

/// Decoded MPPT export.
///
/// Config scalars are `None` when the source cell could not be parsed; a
/// real zero stays `Some(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MpptRecord {
    /// Total test duration [s].
    pub total_time: Option<f64>,
    /// JV interval [s].
    pub step_size: Option<f64>,
    /// Track delay [s].
    pub time_per_track: Option<f64>,
    /// Active area [cm²].
    pub active_area: Option<f64>,

    /// Sample time [h], as exported.
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
    pub current_density: Vec<f64>,
    pub power: Vec<f64>,
}

impl MpptRecord {
    /// Number of time-series samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EQE – external quantum efficiency
// ---------------------------------------------------------------------------

/// Decoded EQE spectrum, ascending in photon energy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EqeRecord {
    /// Photon energy [eV] of the sampled points.
    pub photon_energy_raw: Vec<f64>,
    /// EQE as a 0–1 fraction – same length as `photon_energy_raw`.
    pub eqe_raw: Vec<f64>,
    /// Evenly spaced energy grid over the raw range.
    pub photon_energy_interpolated: Vec<f64>,
    /// EQE linearly interpolated onto the grid.
    pub eqe_interpolated: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Measurement – any decoded record
// ---------------------------------------------------------------------------

/// A decoded export of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Measurement {
    Jv(JvRecord),
    Mppt(MpptRecord),
    Eqe(EqeRecord),
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Jv(jv) => {
                writeln!(f, "JV export: area {} cm², {} curve(s)", jv.active_area, jv.curves.len())?;
                for (i, jsc) in jv.short_circuit_current.iter().enumerate() {
                    writeln!(
                        f,
                        "  #{}: Jsc {:.3}  Voc {:.3}  FF {:.3}  Eff {:.3}",
                        i + 1,
                        jsc,
                        at(&jv.open_circuit_voltage, i),
                        at(&jv.fill_factor, i),
                        at(&jv.efficiency, i),
                    )?;
                }
                Ok(())
            }
            Measurement::Mppt(m) => {
                writeln!(
                    f,
                    "MPPT export: {} samples, total {} s, step {} s, track {} s, area {} cm²",
                    m.len(),
                    display_opt(m.total_time),
                    display_opt(m.step_size),
                    display_opt(m.time_per_track),
                    display_opt(m.active_area),
                )
            }
            Measurement::Eqe(e) => {
                let lo = e.photon_energy_raw.first().copied().unwrap_or(f64::NAN);
                let hi = e.photon_energy_raw.last().copied().unwrap_or(f64::NAN);
                writeln!(
                    f,
                    "EQE export: {} points, {lo:.3}–{hi:.3} eV",
                    e.photon_energy_raw.len()
                )
            }
        }
    }
}

/// Fields are public, so summary vectors may disagree in length.
fn at(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(f64::NAN)
}

fn display_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "<none>".to_string(), |v| format!("{v}"))
}
