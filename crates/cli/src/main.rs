use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use loomerp_cli::audit;
use loomerp_core::UnitOfMeasure;

/// Audit persisted packing documents.
///
/// Each file holds one packing document or a JSON array of them. Every
/// record is printed with its detected mode and counters; records whose
/// mode was inferred from shape alone are flagged `ambiguous`, records whose
/// stored total disagrees with their pieces are flagged `total-mismatch`.
#[derive(Parser, Debug)]
#[command(name = "packing-audit", version, about)]
struct Cli {
    /// Unit printed after quantities.
    #[arg(long, default_value = "Meter")]
    unit: String,

    /// Packing documents to read.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    loomerp_observability::init();

    let cli = Cli::parse();
    let unit = UnitOfMeasure::new(cli.unit);

    let stdout = std::io::stdout();
    let outcome = audit::run(&cli.files, &unit, &mut stdout.lock())?;

    if outcome.failed_files > 0 {
        bail!(
            "{} of {} file(s) could not be read",
            outcome.failed_files,
            cli.files.len()
        );
    }
    Ok(())
}
