//! article-outline command line entry point.
//!
//! Usage:
//!   article-outline serve
//!   article-outline generate --topic "how to bake bread" --keyword "sourdough"
//!   article-outline classify "10 best laptops"
//!   article-outline prompt --topic "what is entropy"

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use article_outline::{
    OutlineSource, classify,
    config::Config,
    export::write_export,
    generator::model_note,
    http::start_http_server,
    prompts::build_prompt,
    sessions::Session,
};

#[derive(Parser)]
#[command(name = "article-outline")]
#[command(about = "Generate article outlines with a hosted model or built-in templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the outline form over HTTP
    Serve {
        /// Address to bind, overrides the configured http_bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Generate one outline and print it
    Generate {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        keyword: String,
        /// Hugging Face token, defaults to HF_TOKEN
        #[arg(long)]
        token: Option<String>,
        /// Write <slug>-outline.txt into this directory
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the outline as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the detected article type for a topic
    Classify { topic: String },
    /// Print the prompt that would be sent to the model
    Prompt {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "")]
        keyword: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.runtime.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.runtime.log_ansi)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or(config.server.http_bind);
            start_http_server(config, bind).await?;
        }
        Commands::Generate {
            topic,
            keyword,
            token,
            export,
            json,
        } => generate(&config, &topic, &keyword, token, export, json).await?,
        Commands::Classify { topic } => {
            let article_type = classify(&topic);
            println!("{}\t{}", article_type, article_type.label());
        }
        Commands::Prompt { topic, keyword } => {
            println!("{}", build_prompt(&topic, &keyword, classify(&topic)));
        }
    }

    Ok(())
}

async fn generate(
    config: &Config,
    topic: &str,
    keyword: &str,
    token: Option<String>,
    export: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let token = token.or_else(|| config.runtime.hf_token.clone());
    let mut session = Session::new(config.generation.clone());
    let generation = session.generate(topic, keyword, token.as_deref()).await?;

    match &generation.source {
        OutlineSource::Model { model } => {
            info!("outline generated by {}", model);
            if let Some(note) = model_note(model) {
                info!("{}", note);
            }
        }
        OutlineSource::Template => info!("outline generated from template"),
    }
    if let Some(reason) = &generation.fallback {
        eprintln!("{}", reason);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&generation.outline)?);
    } else {
        print!("{}", generation.text());
    }

    if let Some(dir) = export {
        let path = write_export(&dir, &generation.topic, &generation.outline)
            .await
            .with_context(|| format!("Failed to export outline to {}", dir.display()))?;
        eprintln!("Saved {}", path.display());
    }

    Ok(())
}
