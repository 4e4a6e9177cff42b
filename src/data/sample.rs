//! Synthetic exports in the instrument layouts, for demos and tests.
//!
//! Curves follow a single-diode model so the figures of merit in the
//! summary block agree with the sweep.

use std::fmt::Write;

use super::jv::{HEADER_LINES, SUMMARY_ROWS};
use super::mppt::CONFIG_LINES;
use super::physics::PHYSICS;

/// Minimal deterministic PRNG (xoshiro256**)
///
/// Taken unchanged from the rusty-panda spectrum generator
/// (`src/bin/generate_sample.rs`) so seeds give the same stream there and here.
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Single-diode cell
// ---------------------------------------------------------------------------

/// Ideal single-diode solar cell under 100 mW/cm².
#[derive(Debug, Clone, Copy)]
pub struct DiodeCell {
    /// Photocurrent [mA/cm²].
    pub jsc: f64,
    /// Saturation current [mA/cm²].
    pub j0: f64,
    /// Ideality factor.
    pub ideality: f64,
}

impl DiodeCell {
    /// Current density at `v`, exported with illumination current negative.
    pub fn current_density(&self, v: f64) -> f64 {
        let nvt = self.ideality * PHYSICS.thermal_voltage();
        -(self.jsc - self.j0 * ((v / nvt).exp() - 1.0))
    }

    pub fn voc(&self) -> f64 {
        self.ideality * PHYSICS.thermal_voltage() * (self.jsc / self.j0 + 1.0).ln()
    }

    /// (V_mpp, J_mpp, P_mpp) found on a fine voltage grid.
    pub fn mpp(&self) -> (f64, f64, f64) {
        let voc = self.voc();
        (0..=2000)
            .map(|i| {
                let v = voc * i as f64 / 2000.0;
                let j = self.current_density(v);
                (v, j, -v * j)
            })
            .fold((0.0, 0.0, f64::MIN), |best, p| if p.2 > best.2 { p } else { best })
    }
}

// ---------------------------------------------------------------------------
// Export writers
// ---------------------------------------------------------------------------

/// JV export with one forward/reverse curve pair per cell.
pub fn jv_export(cells: &[DiodeCell], area: f64, rng: &mut SimpleRng) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Keithley 2400 JV sweep");
    let _ = writeln!(out, "Unit: UNITOV");

    let header: Vec<(String, String)> = vec![
        ("Integration time (s)".into(), "0.02".into()),
        ("Settling time (s)".into(), "0.05".into()),
        ("Averaging".into(), "3".into()),
        ("Compliance (A)".into(), "0.1".into()),
        ("Cell Area (cm2)".into(), format!("{area}")),
    ];
    for (name, value) in &header {
        let _ = writeln!(out, "{name}\t{value}\t{value}");
    }
    for i in header.len()..HEADER_LINES {
        let _ = writeln!(out, "Reserved {i}\t-");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Pixel\tJsc\tVoc\tFF\tEff\tP_MPP\tJ_MPP\tV_MPP\tRs\tR//");
    for row in 0..SUMMARY_ROWS {
        match cells.get(row) {
            Some(cell) => {
                let (v_mpp, j_mpp, p_mpp) = cell.mpp();
                let voc = cell.voc();
                let ff = p_mpp / (cell.jsc * voc);
                let _ = writeln!(
                    out,
                    "{}\t{:.4}\t{voc:.4}\t{ff:.4}\t{p_mpp:.4}\t{p_mpp:.4}\t{j_mpp:.4}\t{v_mpp:.4}\t{:.2}\t{:.1}",
                    row + 1,
                    -cell.jsc,
                    rng.gauss(5.0, 0.5).abs(),
                    rng.gauss(1500.0, 100.0).abs(),
                );
            }
            None => {
                let _ = writeln!(out, "\t-\t-\t-\t-\t-\t-\t-\t-\t-");
            }
        }
    }
    let _ = writeln!(out);

    let header: Vec<&str> = cells.iter().flat_map(|_| ["V (V)", "J (mA/cm2)"]).collect();
    let _ = writeln!(out, "{}", header.join("\t"));
    let points = 60;
    for i in 0..=points {
        let cols: Vec<String> = cells
            .iter()
            .flat_map(|cell| {
                let v = -0.1 + 1.3 * cell.voc() * i as f64 / points as f64;
                let j = cell.current_density(v) + rng.gauss(0.0, 0.02);
                [format!("{v:.4}"), format!("{j:.4}")]
            })
            .collect();
        let _ = writeln!(out, "{}", cols.join("\t"));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "End of measurement");
    out
}

/// MPPT export tracking `cell` for `hours` with samples every `step_hours`.
pub fn mppt_export(cell: &DiodeCell, area: f64, hours: f64, step_hours: f64, rng: &mut SimpleRng) -> String {
    let mut out = String::new();
    let config = [
        ("Test duration (hours)", format!("{hours}")),
        ("JV interval (min)", "15".to_string()),
        ("track delay (s)", "5".to_string()),
        ("Cell Area (cm2)", format!("{area}")),
    ];
    for (name, value) in &config {
        let _ = writeln!(out, "{name}\t{value}");
    }
    for i in config.len()..CONFIG_LINES {
        let _ = writeln!(out, "Setting {i}\t-");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Time (hours)\tV (V)\tJ (mAcm-2)\tP (mWcm-2)");

    let (v_mpp, _, _) = cell.mpp();
    let steps = (hours / step_hours).round() as usize;
    for i in 0..=steps {
        let t = i as f64 * step_hours;
        // slow burn-in loss
        let decay = 1.0 - 0.05 * (1.0 - (-t / 2.0).exp());
        let v = v_mpp + rng.gauss(0.0, 0.002);
        let j = cell.current_density(v) * decay;
        let _ = writeln!(out, "{t:.4}\t{v:.4}\t{j:.4}\t{:.4}", -v * j);
    }
    out
}

/// EQE export with `header_lines` header lines, wavelengths ascending in nm
/// and EQE in percent.
pub fn eqe_export(bandgap_ev: f64, header_lines: usize, rng: &mut SimpleRng) -> String {
    let mut out = String::new();
    for i in 0..header_lines.saturating_sub(1) {
        let _ = writeln!(out, "# EQE setup line {i}");
    }
    if header_lines > 0 {
        let _ = writeln!(out, "Wavelength (nm)\tIPCE (%)");
    }
    for nm in (300..=900).step_by(5) {
        let e = PHYSICS.wavelength_to_ev(nm as f64);
        let edge = 1.0 / (1.0 + (-(e - bandgap_ev) / 0.03).exp());
        let eqe = (85.0 * edge + rng.gauss(0.0, 0.3)).clamp(0.0, 100.0);
        let _ = writeln!(out, "{nm}\t{eqe:.3}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diode_cell_is_consistent() {
        let cell = DiodeCell { jsc: 22.0, j0: 1e-12, ideality: 1.5 };
        let voc = cell.voc();
        assert!(cell.current_density(voc).abs() < 1e-9);
        let (v, j, p) = cell.mpp();
        assert!(v > 0.0 && v < voc);
        assert!(j < 0.0);
        assert!((p + v * j).abs() < 1e-12);
    }

    #[test]
    fn rng_is_deterministic() {
        let mut a = SimpleRng::new(7);
        let mut b = SimpleRng::new(7);
        assert_eq!(a.gauss(0.0, 1.0), b.gauss(0.0, 1.0));
    }
}
