use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use uuid::Uuid;

use history_importer::config::ImporterConfig;
use history_importer::database;
use history_importer::input;
use history_importer::models::ProgramInstanceData;
use history_importer::{HistoryImporter, ImportStats, ImportStore, MemoryStore, PgStore};

#[derive(Parser, Debug)]
#[command(
    name = "history-importer",
    about = "Import parsed training logs into the program and instance tables"
)]
struct Args {
    /// Parsed history documents (JSON, one run or an array of runs).
    #[arg(long = "input", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Owner of the imported program instances.
    #[arg(long)]
    user_id: Uuid,

    /// Log every record, not just phase summaries.
    #[arg(short, long)]
    verbose: bool,

    /// Run against an in-memory store and write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Write the final statistics as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Program template slug (overrides IMPORT_PROGRAM_SLUG).
    #[arg(long)]
    program_slug: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let mut config = ImporterConfig::from_env();
    if let Some(slug) = args.program_slug.clone() {
        config.program_slug = slug;
    }

    let runs = input::load_all(&args.inputs)?;
    log::info!("loaded {} runs from {} files", runs.len(), args.inputs.len());

    let stats = if args.dry_run {
        log::info!("dry run: using in-memory store");
        let store = MemoryStore::new();
        import_with(&store, &config, &args, &runs).await?
    } else {
        let database_url = config
            .database_url
            .clone()
            .ok_or("DATABASE_URL must be set unless --dry-run is given")?;
        let pool = database::connect(&database_url, config.max_connections).await?;
        database::run_migrations(&pool).await?;
        let store = PgStore::new(pool.clone());
        let stats = import_with(&store, &config, &args, &runs).await;
        pool.close().await;
        stats?
    };

    println!("{}", stats);

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&stats)?)?;
        log::info!("report written to {}", path.display());
    }

    if stats.has_errors() {
        log::warn!(
            "import finished with {} record errors; re-run to resume",
            stats.errors.len()
        );
    }
    Ok(())
}

async fn import_with<S: ImportStore>(
    store: &S,
    config: &ImporterConfig,
    args: &Args,
    runs: &[ProgramInstanceData],
) -> Result<ImportStats, Box<dyn Error>> {
    let mut importer = HistoryImporter::new(store, config.program_settings(), args.user_id);
    if let Some(creator) = &config.exercise_creator {
        importer = importer.created_by(creator.clone());
    }
    Ok(importer.run(runs).await?)
}
