use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "rsv")]
#[command(
    about = "Reconcile running EC2 instances against reserved instances",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

/// AWS client selection. Unset values fall through to the SDK env/profile chain.
#[derive(Args, Debug, Clone, Default)]
pub struct AwsArgs {
    /// AWS region (overrides config /aws/region and AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Named AWS profile (overrides config /aws/profile)
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print on-demand instances lacking reservations and unused reservations
    Report {
        /// Layered config paths in merge order (later files override earlier)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Reconcile a saved snapshot file instead of calling the EC2 API
        #[arg(long)]
        snapshot: Option<String>,

        #[command(flatten)]
        aws: AwsArgs,

        /// How a scarce region pool is shared across zones (key-order | fair-share)
        #[arg(long)]
        allocation: Option<String>,

        /// Output format (table | json)
        #[arg(long)]
        format: Option<String>,

        /// Exit non-zero when any running instance is uncovered
        #[arg(long, default_value_t = false)]
        fail_on_uncovered: bool,

        /// Exit non-zero when any reservation is unused
        #[arg(long, default_value_t = false)]
        fail_on_unused: bool,
    },

    /// Capture running instances and reservations from EC2 into a JSON file
    Snapshot {
        /// Output file path
        #[arg(long)]
        out: String,

        /// Layered config paths in merge order (later files override earlier)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[command(flatten)]
        aws: AwsArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report {
            config_paths,
            snapshot,
            aws,
            allocation,
            format,
            fail_on_uncovered,
            fail_on_unused,
        } => {
            commands::report::run(commands::report::ReportArgs {
                config_paths,
                snapshot,
                aws,
                allocation,
                format,
                fail_on_uncovered,
                fail_on_unused,
            })
            .await?;
        }

        Commands::Snapshot {
            out,
            config_paths,
            aws,
        } => {
            commands::snapshot::run(&out, &config_paths, &aws).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
