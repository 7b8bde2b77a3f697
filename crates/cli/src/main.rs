use crate::{
    commands::Commands,
    conn::{ConnectionPinger, PostgresConnectionPinger},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::{
    file::csv::{settings::CsvSettings, source::CsvSource},
    sql::postgres::adapter::{PgAdapter, PgConnector},
};
use engine_config::{
    env::EnvManager,
    settings::{ENV_KEYS, PipelineSettings, SettingsOverrides},
};
use engine_core::{
    pipeline::Pipeline, report::sales_report, staging::StagingLoader, transformer::Transformer,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "sales-elt",
    version = "0.1.0",
    about = "Loads sales CSV data into a Postgres staging table and builds the warehouse tables"
)]
struct Cli {
    #[arg(long, global = true, help = "Read settings from this .env file")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let code = match execute(cli).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };

    std::process::exit(code.as_i32());
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    let mut env = EnvManager::new();
    if let Some(path) = &cli.env_file {
        env.load_from_file(path)?;
    }

    for key in ENV_KEYS {
        if let Some(value) = env.display_value(key) {
            debug!("{}={}", key, value);
        }
    }

    match cli.command {
        Commands::Run {
            pipeline,
            script,
            json,
        } => {
            let settings = load_settings(&env, pipeline.overrides(script))?;
            run_pipeline(settings, json).await
        }
        Commands::Check { pipeline, json } => {
            let settings = load_settings(&env, pipeline.overrides(None))?;
            check_source(&settings, json)
        }
        Commands::TestConn => {
            let settings = load_settings(&env, SettingsOverrides::default())?;
            PostgresConnectionPinger {
                params: settings.db,
            }
            .ping()
            .await?;
            println!("Connection OK");
            Ok(())
        }
        Commands::Report { json } => {
            let settings = load_settings(&env, SettingsOverrides::default())?;
            show_report(&settings, json).await
        }
    }
}

fn load_settings(
    env: &EnvManager,
    overrides: SettingsOverrides,
) -> Result<PipelineSettings, CliError> {
    let settings = PipelineSettings::from_env(env)?.with_overrides(overrides)?;
    Ok(settings)
}

fn staging_loader(settings: &PipelineSettings) -> StagingLoader {
    let source = CsvSource::new(&settings.source_path, CsvSettings::new(settings.delimiter));
    StagingLoader::new(source, settings.staging_table.clone()).with_batch_size(settings.batch_size)
}

async fn run_pipeline(settings: PipelineSettings, json: bool) -> Result<(), CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    info!(
        "Starting pipeline: {} -> {} on {}",
        settings.source_path.display(),
        settings.staging_table,
        settings.db.target()
    );

    let mut pipeline = Pipeline::new(
        PgConnector::new(settings.db.to_pg_config()),
        staging_loader(&settings),
        Transformer::from_file(&settings.script_path),
        settings.lock_key,
        shutdown.cancel_token(),
    );

    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) if shutdown.is_shutdown_requested() => {
            info!("Run stopped after shutdown request: {}", e);
            return Err(CliError::ShutdownRequested);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        output::print_json(&summary)
    } else {
        output::print_run_summary(&summary);
        Ok(())
    }
}

fn check_source(settings: &PipelineSettings, json: bool) -> Result<(), CliError> {
    let prepared = staging_loader(settings).prepare()?;

    if json {
        output::print_json(&prepared.report)
    } else {
        println!(
            "{} rows ready for {}",
            prepared.batch.len(),
            settings.staging_table
        );
        output::print_load_report(&prepared.report);
        Ok(())
    }
}

async fn show_report(settings: &PipelineSettings, json: bool) -> Result<(), CliError> {
    let adapter = PgAdapter::connect(settings.db.to_pg_config()).await?;
    info!("Successfully connected to the database.");

    let report = sales_report(&adapter).await;
    drop(adapter);
    info!("Database connection closed.");

    let report = report?;
    if json {
        output::print_json(&report)
    } else {
        output::print_sales_report(&report);
        Ok(())
    }
}
