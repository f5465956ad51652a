//! Maintenance commands: schema management, seeding and NACE tooling.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use classifier_api::classification::Classifier;
use classifier_api::config::Config;
use classifier_api::db::{create_pool, drop_db, init_db};
use classifier_api::llm_client::embeddings::EmbeddingClient;
use classifier_api::llm_client::LlmClient;
use classifier_api::nace::parser::{
    parse_nace_activities, split_nace_by_sections, validate_nace_activities, write_section_files,
};
use classifier_api::nace::seed::initialize_app;
use classifier_api::public::schemas::CompanyRequest;
use classifier_api::telemetry::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "manage", version, about = "Classifier API maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing tables.
    Createdb,
    /// Drop every application table.
    Dropdb,
    /// Recreate the schema, seed industries and scopes, build the vector index.
    Initialize,
    /// Parse the NACE Rev. 2 markdown document into scopes.
    ParseNace {
        input: PathBuf,
        /// Where to write the scopes as JSON.
        #[arg(long, default_value = "data/scopes.json")]
        output: PathBuf,
        /// Also write one markdown file per section into this directory.
        #[arg(long)]
        sections_dir: Option<PathBuf>,
    },
    /// Classify a company from the terminal.
    Classify {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long = "industry")]
        industries: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        // Works offline: no configuration or database needed.
        Command::ParseNace {
            input,
            output,
            sections_dir,
        } => {
            init_tracing(env!("CARGO_CRATE_NAME"), "info");
            parse_nace(input, output, sections_dir)
        }
        command => run(command).await,
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);
    let pool = create_pool(&config.database_url).await?;

    match command {
        Command::Createdb => init_db(&pool).await?,
        Command::Dropdb => drop_db(&pool).await?,
        Command::Initialize => {
            let redis = redis::Client::open(config.redis_url.clone())?;
            let classifier = classifier_from(&config);
            let report = initialize_app(
                &pool,
                &redis,
                &classifier,
                &config.data_dir,
                &config.nace_document_path,
            )
            .await?;
            println!(
                "Initialized: {} industries, {} scopes, {} index chunks",
                report.industries, report.scopes, report.chunks
            );
        }
        Command::Classify {
            name,
            description,
            industries,
        } => {
            let company = CompanyRequest {
                name: Some(name),
                description: Some(description),
                industries: Some(industries),
                ..Default::default()
            };
            let classified = classifier_from(&config).classify(&pool, company).await?;
            println!("{}", serde_json::to_string_pretty(&classified)?);
        }
        Command::ParseNace {
            input,
            output,
            sections_dir,
        } => parse_nace(input, output, sections_dir)?,
    }
    Ok(())
}

fn classifier_from(config: &Config) -> Classifier {
    Classifier::new(
        LlmClient::from_config(config),
        EmbeddingClient::from_config(config),
        config.nace_document_path.clone(),
    )
}

fn parse_nace(input: PathBuf, output: PathBuf, sections_dir: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;

    let activities = parse_nace_activities(&text);
    let report = validate_nace_activities(&activities);
    println!("{}", report.summary());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, serde_json::to_string_pretty(&activities)?)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("Wrote {} scopes to {}", activities.len(), output.display());

    if let Some(dir) = sections_dir {
        let sections = split_nace_by_sections(&text);
        let files = write_section_files(&sections, &dir)?;
        println!("Wrote {} section files to {}", files.len(), dir.display());
    }
    Ok(())
}
