use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use benchmate::runner;

#[derive(Parser)]
#[command(name = "benchmate")]
#[command(version)]
#[command(about = "Automated browserbench.org benchmarking across installed browsers", long_about = None)]
struct Cli {
    /// Increase verbosity (specify multiple times for more; -vvvv for
    /// full debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of trials to run
    #[arg(short, long, default_value_t = 1)]
    runs: u32,

    /// Directory for result files and screenshots
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Custom benchmark suite (YAML list); defaults to the built-in
    /// browserbench.org suite
    #[arg(long)]
    suite: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Keep the display awake on macOS for the duration of the run.
    if cfg!(target_os = "macos") {
        let _ = tokio::process::Command::new("caffeinate").arg("-dis").spawn();
    }

    runner::run_benchmarks(cli.runs, &cli.output, cli.suite.as_deref()).await
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}
