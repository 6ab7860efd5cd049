use anyhow::Context;
use clap::Parser;

use memscram::PatternSet;

/// Overwrite occurrences of the given strings in a process's writable memory.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Pid of the target process
    pid: i32,

    /// Strings to locate and overwrite, matched as literals
    #[arg(required = true)]
    patterns: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let patterns = PatternSet::new(&args.patterns)?;
    let report = memscram::scramble(args.pid, &patterns)
        .with_context(|| format!("could not scramble pid {}", args.pid))?;

    log::info!(
        "scanned {} regions ({} skipped), patched {} matches, {} write failures",
        report.regions_scanned,
        report.regions_skipped,
        report.matches_patched,
        report.write_failures,
    );

    Ok(())
}
