// rhgate - Rate limiting and response caching for research-assistant Gemini calls
// Author: kelexine (https://github.com/kelexine)

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rhgate::cli::{Args, Command};
use rhgate::config::AppConfig;
use rhgate::error::GatewayError;
use rhgate::gateway::{AiGateway, AiReply, PaperMetadata, ReplySource};
use rhgate::gemini::GeminiClient;
use rhgate::governor::{RequestGovernor, UsageStats};
use rhgate::metrics::gather_metrics;
use rhgate::security::{mask_sensitive, validate_api_key};
use rhgate::storage::{FileStore, KeyValueStore, MemoryStore};
use rhgate::utils::{logging, Clock, SystemClock};
use std::io::{Read, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if args.api_key.is_some() {
        config.gemini.api_key = args.api_key.clone();
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    debug!("Starting rhgate v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Durable state and clock
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&config);

    // Phase 4: Run the requested command
    match args.command {
        Command::Usage => {
            let governor = RequestGovernor::new(config.limits.clone(), clock, store);
            print_usage(&governor.usage_stats());
        }
        Command::CheckKey => {
            let key = config.gemini.api_key.as_deref();
            validate_api_key(key).map_err(|e| anyhow!(e))?;
            println!("API key {} looks valid", mask_sensitive(key.unwrap_or_default().trim()));
        }
        Command::Ask { question, context } => {
            let gateway = build_gateway(&config, clock, store)?;
            let reply = gateway.ask(&question, context.as_deref()).await?;
            print_reply(&reply);
        }
        Command::Cite {
            title,
            authors,
            publication,
            year,
            volume,
            issue,
            pages,
            style,
        } => {
            let gateway = build_gateway(&config, clock, store)?;
            let paper = PaperMetadata {
                title,
                authors,
                publication,
                year,
                volume,
                issue,
                pages,
            };
            let reply = gateway.cite(&paper, style).await?;
            print_reply(&reply);
        }
        Command::Summarize { text } => {
            let gateway = build_gateway(&config, clock, store)?;
            let reply = gateway.summarize(&text).await?;
            print_reply(&reply);
        }
        Command::Extract { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };
            let gateway = build_gateway(&config, clock, store)?;
            let metadata = gateway.extract_metadata(&text).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Chat { context } => {
            let gateway = build_gateway(&config, clock, store)?;
            run_chat(&gateway, context.as_deref()).await?;
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    if config.storage.in_memory {
        debug!("Using in-memory storage, daily usage will not persist");
        return Arc::new(MemoryStore::new());
    }

    let path = config
        .storage
        .path
        .clone()
        .map(Into::into)
        .unwrap_or_else(FileStore::default_path);
    debug!("Using storage file {}", path.display());
    Arc::new(FileStore::new(path))
}

fn build_gateway(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
) -> Result<AiGateway<GeminiClient>> {
    let api_key = config.gemini.api_key.as_deref();
    validate_api_key(api_key).map_err(|e| GatewayError::InvalidApiKey(e.to_string()))?;
    let api_key = api_key.unwrap_or_default().trim();

    info!("Using Gemini model {}", config.gemini.default_model);
    let client = GeminiClient::new(&config.gemini, api_key, config.logging.sanitize_tokens)?;
    Ok(AiGateway::from_config(client, config, clock, store))
}

async fn run_chat(gateway: &AiGateway<GeminiClient>, context: Option<&str>) -> Result<()> {
    println!("Research assistant ready. Commands: /usage, /metrics, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/usage" => print_usage(&gateway.usage()),
            "/metrics" => print!("{}", gather_metrics()),
            question => match gateway.ask(question, context).await {
                Ok(reply) => print_reply(&reply),
                // Quota and upstream errors end one turn, not the session
                Err(e) => eprintln!("error: {}", e),
            },
        }
    }

    Ok(())
}

fn print_reply(reply: &AiReply) {
    println!("{}", reply.text);
    if reply.source == ReplySource::Cache {
        eprintln!("(cached)");
    }
}

fn print_usage(stats: &UsageStats) {
    println!(
        "{} of {} requests used today, {} remaining",
        stats.used, stats.limit, stats.remaining
    );
}
