use clap::Parser;
use spatialite_helper::demo::{DemoConfig, Shell};
use spatialite_helper::{DEFAULT_SPATIALITE_MODULE, OpenOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Menu-driven SpatiaLite console.
#[derive(Parser, Debug)]
#[command(name = "spatialite_demo")]
#[command(about = "Create a SpatiaLite database, fill it with random polylines and query it")]
struct Cli {
    /// Database file offered by menu option 1.
    #[arg(short, long, default_value = "spatialite_demo.sqlite", env = "SPATIALITE_DEMO_DB")]
    database: PathBuf,

    /// SpatiaLite module name or path.
    #[arg(short, long, default_value = DEFAULT_SPATIALITE_MODULE, env = "SPATIALITE_EXTENSION")]
    extension: String,

    /// Entry point of the extension, when it is not the default one.
    #[arg(long, env = "SPATIALITE_ENTRY_POINT")]
    entry_point: Option<String>,

    /// Polylines inserted per transaction.
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// How long to wait on a locked database, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    busy_timeout_ms: u64,

    /// Seed for reproducible random polylines.
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Cli> for DemoConfig {
    fn from(cli: Cli) -> Self {
        Self {
            database: cli.database,
            extension: cli.extension,
            entry_point: cli.entry_point,
            batch_size: cli.batch_size,
            open_options: OpenOptions {
                busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
                ..OpenOptions::default()
            },
            seed: cli.seed,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("spatialite_demo failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the menu.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(stdin.lock(), stdout.lock(), DemoConfig::from(cli));
    shell.run()?;
    Ok(())
}
