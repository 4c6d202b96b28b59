use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banner_cli::{
    health_report, render, AppConfig, BatchFile, Operation, OperationRunner, StoreKind,
};
use banner_core::{HealthStatus, Neo4jClient};

#[derive(Parser)]
#[command(name = "banner")]
#[command(about = "Banner resolution with a cache-aside read path", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "banner.yaml")]
    config: PathBuf,

    /// Role token (admin_token or user_token)
    #[arg(short, long, env = "BANNER_TOKEN")]
    token: Option<String>,

    /// Use the in-memory store instead of Neo4j
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a banner
    Create {
        /// Tag ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<i64>,

        #[arg(long, allow_negative_numbers = true)]
        feature: i64,

        /// Banner content, passed through as-is
        #[arg(long)]
        content: String,

        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        active: bool,
    },

    /// List banners whose tags include all of the given tags
    List {
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<i64>,

        #[arg(long, allow_negative_numbers = true)]
        feature: i64,

        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        limit: i64,

        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset: i64,
    },

    /// Resolve the banner for an exact tag set and feature
    Resolve {
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<i64>,

        #[arg(long, allow_negative_numbers = true)]
        feature: i64,

        /// Skip the cache and read the store
        #[arg(long)]
        last_revision: bool,
    },

    /// Replace a banner's attributes and current content
    Update {
        id: i64,

        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<i64>,

        #[arg(long, allow_negative_numbers = true)]
        feature: i64,

        #[arg(long)]
        content: String,

        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        active: bool,
    },

    /// Delete a banner and its versions
    Delete { id: i64 },

    /// Check the Neo4j connection
    Health,

    /// Create the Neo4j constraint and index
    InitSchema,

    /// Run a YAML file of operations in one process
    Batch { file: PathBuf },
}

impl Commands {
    fn into_operation(self) -> Option<Operation> {
        let op = match self {
            Commands::Create {
                tags,
                feature,
                content,
                active,
            } => Operation::Create {
                tag_ids: tags,
                feature_id: feature,
                content: Value::String(content),
                is_active: active,
            },
            Commands::List {
                tags,
                feature,
                limit,
                offset,
            } => Operation::List {
                tag_ids: tags,
                feature_id: feature,
                limit,
                offset,
            },
            Commands::Resolve {
                tags,
                feature,
                last_revision,
            } => Operation::Resolve {
                tag_ids: tags,
                feature_id: feature,
                use_last_revision: last_revision,
            },
            Commands::Update {
                id,
                tags,
                feature,
                content,
                active,
            } => Operation::Update {
                banner_id: id,
                tag_ids: tags,
                feature_id: feature,
                content: Value::String(content),
                is_active: active,
            },
            Commands::Delete { id } => Operation::Delete { banner_id: id },
            Commands::Health | Commands::InitSchema | Commands::Batch { .. } => return None,
        };
        Some(op)
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "banner=info,banner_cli=info,banner_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // An explicitly named file must exist; the default one is optional
    let explicit = cli.config != PathBuf::from("banner.yaml");
    let mut config = AppConfig::load(&cli.config, explicit)?;
    if cli.memory {
        config.store = StoreKind::Memory;
    }

    match cli.command {
        Commands::Health => {
            let client = Neo4jClient::connect(config.neo4j.clone()).await?;
            let result = client.health_check_detailed().await;
            print_json(&health_report(&result)?)?;
            if result.status != HealthStatus::Healthy {
                std::process::exit(1);
            }
        }

        Commands::InitSchema => {
            let client = Neo4jClient::connect(config.neo4j.clone()).await?;
            client.ensure_schema().await?;
            print_json(&json!({ "status": "ok" }))?;
        }

        Commands::Batch { ref file } => {
            let batch = BatchFile::load(file)?;
            let runner = OperationRunner::from_config(&config).await?;
            let results = runner.run_batch(&batch, cli.token.as_deref()).await;
            print_json(&Value::Array(results))?;
        }

        command => {
            let Some(operation) = command.into_operation() else {
                return Ok(());
            };
            let runner = OperationRunner::from_config(&config).await?;
            let outcome = runner.execute(cli.token.as_deref(), &operation).await;
            print_json(&render(&outcome))?;
            if outcome.is_err() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
