use clap::{Args, Subcommand};
use engine_config::settings::SettingsOverrides;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Load the source file into the staging table, then run the transformation
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Transformation script path")]
        script: Option<PathBuf>,

        #[arg(long, help = "Print the run summary as JSON")]
        json: bool,
    },
    /// Read, normalize and deduplicate the source file without touching the database
    Check {
        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(long, help = "Print the load report as JSON")]
        json: bool,
    },
    /// Open a connection with the configured parameters and run `SELECT 1`
    TestConn,
    /// Print the sales aggregates from the warehouse tables
    Report {
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(long, help = "Source CSV file path")]
    pub source: Option<PathBuf>,

    #[arg(long, help = "Staging table name")]
    pub staging_table: Option<String>,

    #[arg(long, help = "Rows per COPY chunk")]
    pub batch_size: Option<usize>,
}

impl PipelineArgs {
    pub fn overrides(&self, script: Option<PathBuf>) -> SettingsOverrides {
        SettingsOverrides {
            source_path: self.source.clone(),
            script_path: script,
            staging_table: self.staging_table.clone(),
            batch_size: self.batch_size,
        }
    }
}
