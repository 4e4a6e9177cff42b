//! Decoders for tab-delimited solar-cell instrument exports.
//!
//! Three independent decoders turn export text into plain records:
//!
//! * [`decode_jv`]   – current-voltage sweeps ([`JvRecord`])
//! * [`decode_mppt`] – maximum-power-point tracking ([`MpptRecord`])
//! * [`decode_eqe`]  – external quantum efficiency spectra ([`EqeRecord`])
//!
//! Decoders are pure functions of their input text and hold no state, so
//! files can be decoded in parallel without coordination.
//!
//! ```no_run
//! use rusty_pv::{decode_eqe, EqeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("cell_eqe.txt")?;
//! let eqe = decode_eqe(&text, &EqeOptions { header_lines: 24 })?;
//! println!("{} points", eqe.photon_energy_raw.len());
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;

pub use data::eqe::{decode_eqe, EqeOptions};
pub use data::jv::decode_jv;
pub use data::loader::{load_file, MeasurementKind};
pub use data::model::{EqeRecord, JvCurve, JvRecord, Measurement, MpptRecord};
pub use data::mppt::decode_mppt;
pub use data::physics::{PhysicalConstants, PHYSICS};
pub use error::{DecodeError, Result};
