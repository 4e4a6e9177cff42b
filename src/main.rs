use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use rusty_pv::data::export::write_file;
use rusty_pv::{load_file, EqeOptions, MeasurementKind};

/// Decode solar-cell instrument exports (JV, MPPT, EQE).
#[derive(Debug, Parser)]
#[command(name = "rusty-pv", version, about)]
struct Cli {
    /// Export files to decode.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Decoder to use; guessed from the file name when omitted.
    #[arg(short, long, value_enum)]
    kind: Option<MeasurementKind>,

    /// Header lines of EQE exports.
    #[arg(long, default_value_t = EqeOptions::default().header_lines)]
    header_lines: usize,

    /// Directory for `<file>.json` / `<file>.parquet` exports.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export format when `--output` is given.
    #[arg(long, default_value = "json", value_parser = ["json", "parquet"])]
    format: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut failed = 0usize;
    for path in &cli.files {
        if let Err(e) = process(&cli, path) {
            log::error!("Failed to decode {}: {e:#}", path.display());
            failed += 1;
        }
    }

    if failed > 0 {
        log::error!("{failed} of {} file(s) failed", cli.files.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn process(cli: &Cli, path: &Path) -> Result<()> {
    let options = EqeOptions {
        header_lines: cli.header_lines,
    };
    let measurement = load_file(path, cli.kind, &options)?;
    print!("{}: {measurement}", path.display());

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let target = dir.join(format!("{name}.{}", cli.format));
        write_file(&measurement, &target)?;
        log::info!("Wrote {}", target.display());
    }
    Ok(())
}
