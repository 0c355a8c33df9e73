use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "issuancectl",
    about = "Dynamic issuance — supply adjustment controller",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to issuance.toml
    #[arg(short, long, global = true, default_value = "issuance.toml")]
    config: String,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter issuance.toml
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        path: String,
    },
    /// Compute one adjustment from the [pool] seed without applying it
    Preview {
        /// Seconds since the previous adjustment
        #[arg(short, long, default_value_t = 86_400)]
        elapsed: u64,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run the controller against an in-memory ledger
    Simulate {
        /// Simulated days
        #[arg(long, default_value_t = 365)]
        days: u64,
        /// Days between execution attempts
        #[arg(long, default_value_t = 1)]
        step: u64,
        /// Persist records and the final checkpoint to this redb file
        #[arg(long)]
        db: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// List stored adjustment records, newest first
    History {
        /// redb file written by `simulate --db`
        #[arg(long)]
        db: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,issuance=debug"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init { path } => commands::init::init(&path),
        Commands::Preview { elapsed, format } => {
            commands::preview::preview(&cli.config, elapsed, &format)
        }
        Commands::Simulate {
            days,
            step,
            db,
            format,
        } => commands::simulate::simulate(&cli.config, days, step, db.as_deref(), &format),
        Commands::History { db, limit, format } => commands::history::history(&db, limit, &format),
    }
}
