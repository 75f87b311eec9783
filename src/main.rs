use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tablesync::presentation::cli_summary::{print_perf_summary, print_summary};
use tablesync::presentation::writers::{all_writers, write_to_file, writer_for};
use tablesync::{AppConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "tablesync",
    about = "tablesync: keep live MySQL tables in step with their declared spec."
)]
struct Cli {
    #[arg(short, long, default_value = "tablesync.toml")]
    config: String,

    /// Plan only: print and write the DDL without running it.
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long, default_value = "all")]
    format: String,

    /// Also log metadata queries.
    #[arg(short, long)]
    verbose: bool,

    /// Print per-statement timings.
    #[arg(long)]
    timings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tablesync::init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    let cfg = AppConfig::load(&cli.config)?;
    let (reports, perf) = tablesync::run_with_timing(&cfg, cli.dry_run).await?;

    print_summary(&reports);
    if cli.timings {
        print_perf_summary(&perf);
    }

    let dir = Path::new(&cfg.sync.output_dir);
    match cli.format.as_str() {
        "all" => {
            for writer in all_writers() {
                let path = write_to_file(&*writer, &reports, dir)?;
                println!("Report written to {}", path.display());
            }
        }
        fmt => {
            let writer =
                writer_for(fmt).ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?;
            let path = write_to_file(&*writer, &reports, dir)?;
            println!("Report written to {}", path.display());
        }
    }

    if reports.iter().any(|r| r.summary.failed > 0) {
        std::process::exit(1);
    }
    Ok(())
}
