//! SiteBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use sitebuddy::{
    cli::{chat, Args, Commands, Verbosity},
    config::Config,
    embedding::{Embedder, SentenceEncoder, TextEncoder},
    llm::OpenAiChatClient,
    logging,
    rag::{KnowledgeBase, KnowledgePaths},
    Assistant,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();

    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    logging::init(&config.log_dir(), verbosity.log_level());

    match &args.command {
        Commands::Config => show_config(&config),
        Commands::Build => build(&config, verbosity).await,
        Commands::Chat => {
            let assistant = open_assistant(&config, verbosity).await?;
            chat::run(&assistant, &config.assistant.company).await
        }
        Commands::Ask {
            question,
            show_sources,
            ..
        } => {
            let assistant = open_assistant(&config, verbosity).await?;
            let search = args.command.search_overrides(assistant.search_params());
            let reply = assistant.respond_with(question, &search).await?;

            println!("{}", reply.text);
            if *show_sources {
                println!();
                for (i, passage) in reply.passages.iter().enumerate() {
                    println!(
                        "{} {} {}",
                        format!("[{}]", i + 1).cyan(),
                        passage.url,
                        format!("({:.3})", passage.score).dimmed()
                    );
                }
            }
            Ok(())
        }
    }
}

/// Print effective configuration with the API key masked
fn show_config(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("********".to_string());
    }

    println!("{}", "Configuration".bright_cyan().bold());
    if let Some(path) = Config::default_path() {
        println!("{} {}", "Default file:".dimmed(), path.display());
    }
    println!();
    println!("{}", toml::to_string_pretty(&shown).context("Failed to render configuration")?);
    Ok(())
}

/// Force a full index rebuild
async fn build(config: &Config, verbosity: Verbosity) -> Result<()> {
    let embedder = load_embedder(config, verbosity).await?;
    let paths = KnowledgePaths::from_config(config);

    let pb = spinner(verbosity, "Building index...");
    let result = KnowledgeBase::rebuild(&paths, &embedder, config.embedding.dimension).await;
    pb.finish_and_clear();

    let knowledge = result.context("Failed to build index")?;
    if verbosity.show_progress() {
        println!(
            "{} Indexed {} records into {}",
            "✓".green(),
            knowledge.len(),
            paths.index.display()
        );
    }
    Ok(())
}

/// Load model, knowledge base and chat client
async fn open_assistant(config: &Config, verbosity: Verbosity) -> Result<Assistant> {
    let embedder = load_embedder(config, verbosity).await?;
    let paths = KnowledgePaths::from_config(config);

    let pb = spinner(verbosity, "Loading knowledge base...");
    let result = KnowledgeBase::open_or_build(&paths, &embedder, config.embedding.dimension).await;
    pb.finish_and_clear();
    let knowledge = result.context("Failed to open knowledge base")?;

    if config.llm.api_key.is_none() {
        tracing::warn!("no API key configured, set LLM_TOKEN or llm.api_key");
    }
    let model = OpenAiChatClient::from_config(&config.llm)?;

    Ok(Assistant::from_config(config, knowledge, embedder, Arc::new(model)))
}

/// Load the sentence encoder off the async runtime
async fn load_embedder(config: &Config, verbosity: Verbosity) -> Result<Embedder> {
    let model_id = config.embedding.model_id.clone();

    let pb = spinner(verbosity, &format!("Loading embedding model {}...", model_id));
    let result = tokio::task::spawn_blocking(move || SentenceEncoder::from_hub(&model_id)).await;
    pb.finish_and_clear();

    let encoder = result.context("Embedding model loader panicked")??;
    if encoder.dimension() != config.embedding.dimension {
        tracing::warn!(
            configured = config.embedding.dimension,
            model = encoder.dimension(),
            "embedding dimension differs from configuration, using the model's"
        );
    }

    Ok(Embedder::new(
        Arc::new(encoder),
        config.embedding.workers,
        config.embedding.batch_size,
    ))
}

fn spinner(verbosity: Verbosity, message: &str) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
