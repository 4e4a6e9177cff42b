use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rusty_pv::data::sample::{eqe_export, jv_export, mppt_export, DiodeCell, SimpleRng};
use rusty_pv::EqeOptions;

/// Write synthetic JV, MPPT and EQE exports.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory the sample files are written to
    #[arg(default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let out_dir = args.out_dir;
    let mut rng = SimpleRng::new(42);

    std::fs::create_dir_all(&out_dir).context("creating output directory")?;

    let cells = [
        DiodeCell { jsc: 22.1, j0: 2e-12, ideality: 1.4 },
        DiodeCell { jsc: 21.8, j0: 5e-12, ideality: 1.5 },
    ];
    let area = 0.09;

    let files = [
        ("001_JV.txt", jv_export(&cells, area, &mut rng)),
        ("001_MPPT.csv", mppt_export(&cells[0], area, 12.0, 0.05, &mut rng)),
        ("001_EQE.txt", eqe_export(1.6, EqeOptions::default().header_lines, &mut rng)),
    ];

    for (name, text) in &files {
        let path = out_dir.join(name);
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {} ({} lines)", path.display(), text.lines().count());
    }
    Ok(())
}
