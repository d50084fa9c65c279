use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use exporter::{GroupReport, load_report};
use storage::{Database, services::JudgingService, store::PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "judging-export")]
#[command(about = "Export judging results for a group", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One row per rating, in ranking order
    Csv {
        slug: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Full results snapshot including per-judge data
    Json {
        slug: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the leaderboard
    Summary { slug: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "judging_export={},exporter={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let db = Database::new(&cli.database_url)
        .await
        .context("Failed to initialize database")?;
    let service = JudgingService::from_store(Arc::new(PgStore::new(&db)));

    match cli.command {
        Commands::Csv { slug, output } => {
            let report = load_report(&service, &slug).await?;
            let rows = report.write_csv(open_output(output.as_ref())?)?;
            tracing::info!("Exported {} ratings for {}", rows, slug);
        }
        Commands::Json { slug, output } => {
            let report = load_report(&service, &slug).await?;
            write_json(&report, open_output(output.as_ref())?)?;
            tracing::info!("Exported results snapshot for {}", slug);
        }
        Commands::Summary { slug } => {
            let report = load_report(&service, &slug).await?;
            print!("{}", report.summary());
        }
    }

    Ok(())
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn write_json(report: &GroupReport, mut writer: Box<dyn Write>) -> anyhow::Result<()> {
    report.write_json(&mut writer)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
