//! Aleph CLI - admin surface for the Aleph Alpha integration
//!
//! Usage:
//!   aleph config set KEY=VALUE...  Store admin config (api_key is encrypted)
//!   aleph config migrate           Encrypt a plaintext api_key in place
//!   aleph models                   List the models available to the API key
//!   aleph complete PROMPT          Raw completion call, prints the mapping
//!   aleph process PROMPT           Run the free-prompt provider

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aleph_core::{AlephAlphaService, ConfigStore, FreePromptProvider, TextProcessingProvider};

#[derive(Parser)]
#[command(name = "aleph")]
#[command(version)]
#[command(about = "Aleph Alpha completion integration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config.json and the field key
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List the models available to the configured API key
    Models,

    /// Send a raw completion request and print the result mapping
    Complete {
        prompt: String,

        /// Number of completions to request
        #[arg(long, default_value_t = 1)]
        n: u32,

        /// Maximum tokens to generate
        #[arg(long, default_value_t = 100)]
        max_tokens: u32,
    },

    /// Run the free-prompt provider and print the completion text
    Process { prompt: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Store KEY=VALUE pairs; api_key is encrypted before persistence
    Set { pairs: Vec<String> },

    /// One-shot upgrade: encrypt a plaintext api_key in place
    Migrate,
}

fn open_store(data_dir: &Path) -> Result<ConfigStore> {
    let cipher = aleph_crypto::keyfile::load_or_generate(&data_dir.join("field.key"))?;
    Ok(ConfigStore::open(data_dir.join("config.json"), cipher)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("no user data directory available")?
            .join("aleph-integration"),
    };
    let mut store = open_store(&data_dir)?;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Set { pairs } => {
                let mut values = Vec::with_capacity(pairs.len());
                for pair in &pairs {
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {pair:?}"))?;
                    values.push((key.to_string(), value.to_string()));
                }
                store.set_admin_config(values)?;
                println!("stored {} value(s)", pairs.len());
            }
            ConfigAction::Migrate => {
                if store.migrate_plaintext_api_key()? {
                    println!("api_key encrypted in place");
                } else {
                    println!("nothing to migrate");
                }
            }
        },

        Commands::Models => {
            let service = AlephAlphaService::new(Arc::new(RwLock::new(store)));
            let overview = service.models_overview().await;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }

        Commands::Complete {
            prompt,
            n,
            max_tokens,
        } => {
            let service = AlephAlphaService::new(Arc::new(RwLock::new(store)));
            let outcome = service.create_completion(&prompt, n, max_tokens).await;
            println!("{}", serde_json::to_string_pretty(&outcome.into_value())?);
        }

        Commands::Process { prompt } => {
            let service = AlephAlphaService::new(Arc::new(RwLock::new(store)));
            let provider = FreePromptProvider::new(service);
            let text = provider.process(&prompt).await?;
            println!("{text}");
        }
    }

    Ok(())
}
