//! Solderline BOM Processing
//!
//! Command-line batch tool for catalog loading, BOM import, comparison,
//! cost analysis, allocation readiness and lifecycle alerts. Results are
//! printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use solderline_database::{create_postgres_pool, migrations, postgres_health_check, PostgresPool};
use solderline_utils::ai::{create_provider, ContractAnalyzer};
use solderline_utils::{init_logging, validate_app_config, AppConfig, ErrorResponse, SolderlineError};

mod service;

use service::{BomService, ImportRequest};

#[derive(Parser)]
#[command(name = "solderline-bom")]
#[command(about = "Solderline BOM import and analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Store parts and alternatives from a JSON catalog file
    LoadCatalog {
        file: PathBuf,
    },
    /// Import a BOM file as a new project snapshot
    Import {
        /// BOM file (csv, xlsx or xml)
        file: PathBuf,
        #[arg(long)]
        project: String,
        /// Version label of the new snapshot
        #[arg(long)]
        label: String,
        /// Customer name, used when the project does not exist yet
        #[arg(long)]
        customer: Option<String>,
    },
    /// List the snapshots of a project
    Snapshots {
        #[arg(long)]
        project: String,
    },
    /// Compare two snapshots of a project
    Compare {
        #[arg(long)]
        project: String,
        from: String,
        to: String,
    },
    /// Cost breakdown and optimization suggestions for a snapshot
    Analyze {
        #[arg(long)]
        project: String,
        label: String,
    },
    /// Stock readiness for a snapshot
    Allocation {
        #[arg(long)]
        project: String,
        label: String,
    },
    /// Change the allocation flag of one designator
    SetAllocation {
        #[arg(long)]
        project: String,
        label: String,
        designator: String,
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        allocated: bool,
    },
    /// Lifecycle alerts for the parts a snapshot uses
    Alerts {
        #[arg(long)]
        project: String,
        label: String,
        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Extract clauses from a contract with the configured AI provider
    Contract {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let (response, code) = match error.downcast_ref::<SolderlineError>() {
                Some(solderline_error) => (ErrorResponse::from(solderline_error.clone()), solderline_error.exit_code()),
                None => (ErrorResponse::from(SolderlineError::internal(format!("{:#}", error))), 70),
            };
            tracing::error!(code = %response.code, "{}", response.error);

            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", response.error),
            }
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load().map_err(|e| SolderlineError::configuration(e.to_string()))?;
    validate_app_config(&config)?;
    init_logging(&config.logging)?;

    tracing::info!(company = %config.company.name, "Starting Solderline BOM processing");

    match cli.command {
        Commands::Migrate => {
            let pool = connect(&config).await?;
            migrations::run_postgres_migrations(&pool).await?;
            print_json(&serde_json::json!({ "status": "migrated" }))
        }
        Commands::LoadCatalog { file } => {
            let data = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let service = BomService::new(connect(&config).await?, config);
            print_json(&service.load_catalog(&data).await?)
        }
        Commands::Import {
            file,
            project,
            label,
            customer,
        } => {
            let data = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            let service = BomService::new(connect(&config).await?, config);
            let report = service
                .import(ImportRequest {
                    project_name: &project,
                    customer_name: customer.as_deref(),
                    version_label: &label,
                    filename: &filename,
                    data: &data,
                })
                .await?;
            print_json(&report)
        }
        Commands::Snapshots { project } => {
            let service = BomService::new(connect(&config).await?, config);
            print_json(&service.list_snapshots(&project).await?)
        }
        Commands::Compare { project, from, to } => {
            let service = BomService::new(connect(&config).await?, config);
            print_json(&service.compare(&project, &from, &to).await?)
        }
        Commands::Analyze { project, label } => {
            let service = BomService::new(connect(&config).await?, config);
            print_json(&service.analyze(&project, &label).await?)
        }
        Commands::Allocation { project, label } => {
            let service = BomService::new(connect(&config).await?, config);
            let plan = service.allocation(&project, &label).await?;
            print_json(&serde_json::json!({ "ready": plan.is_ready(), "plan": plan }))
        }
        Commands::SetAllocation {
            project,
            label,
            designator,
            allocated,
        } => {
            let service = BomService::new(connect(&config).await?, config);
            service.set_allocation(&project, &label, &designator, allocated).await?;
            print_json(&serde_json::json!({ "designator": designator, "allocated": allocated }))
        }
        Commands::Alerts { project, label, date } => {
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let service = BomService::new(connect(&config).await?, config);
            print_json(&service.alerts(&project, &label, today).await?)
        }
        Commands::Contract { file } => {
            let text = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let provider = create_provider(&config.ai)?;
            let analyzer = ContractAnalyzer::new(provider.as_ref(), config.company.name.clone())?;
            print_json(&analyzer.analyze(&text).await?)
        }
    }
}

async fn connect(config: &AppConfig) -> Result<PostgresPool> {
    let pool = create_postgres_pool(
        &config.database.postgres_url,
        config.database.max_connections,
        Duration::from_secs(config.database.connection_timeout_seconds),
    )
    .await
    .map_err(|e| SolderlineError::database(format!("{:#}", e)))?;

    postgres_health_check(&pool)
        .await
        .map_err(|e| SolderlineError::database(format!("Health check failed: {:#}", e)))?;
    Ok(pool)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_alerts_date() {
        let cli = Cli::try_parse_from([
            "solderline-bom",
            "alerts",
            "--project",
            "Widget",
            "rev-b",
            "--date",
            "2024-06-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Alerts { project, label, date } => {
                assert_eq!(project, "Widget");
                assert_eq!(label, "rev-b");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 1));
            }
            _ => panic!("expected alerts command"),
        }
    }

    #[test]
    fn test_parse_load_catalog() {
        let cli = Cli::try_parse_from(["solderline-bom", "load-catalog", "parts.json"]).unwrap();
        assert!(matches!(cli.command, Commands::LoadCatalog { file } if file == PathBuf::from("parts.json")));
    }

    #[test]
    fn test_parse_set_allocation() {
        let cli = Cli::try_parse_from([
            "solderline-bom",
            "set-allocation",
            "--project",
            "Widget",
            "rev-a",
            "R5",
            "--allocated",
            "false",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::SetAllocation { allocated: false, .. }
        ));
    }
}
