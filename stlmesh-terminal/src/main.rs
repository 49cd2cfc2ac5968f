/// stl-inspect - load STL files and print a summary of each
///
/// Usage:
///   stl-inspect [--format binary|ascii] [--verbose] <FILES>...
///
/// Files that fail to load are reported and skipped; the exit status is
/// non-zero if any file failed.
use clap::Parser;
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use stlmesh_core::StlFormat;
use stlmesh_terminal::Summary;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stl-inspect", version, about = "Load STL meshes and print a summary")]
struct Args {
    /// Force the file format instead of detecting it (binary or ascii)
    #[arg(short, long)]
    format: Option<StlFormat>,

    /// Log reader progress
    #[arg(short, long)]
    verbose: bool,

    /// STL files to load
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = stdout();
    let mut failed = 0;
    for path in &args.files {
        let summary = Summary::load(path, args.format);
        if !summary.is_ok() {
            failed += 1;
        }
        if let Err(err) = summary.draw(&mut stdout) {
            eprintln!("Failed to write summary: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed to load", failed, args.files.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
