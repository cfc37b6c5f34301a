//! Offline builder for the guideline index.
//!
//! Reads every `.txt` under the knowledge directory, embeds the chunks and
//! writes the index the server loads at start-up. Any failure aborts the
//! build and leaves the previous index in place.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dispatch_core::KnowledgeConfig;
use knowledge::{build_from_dir, ChunkConfig, OpenAIEmbedder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "build_knowledge")]
#[command(about = "Build the emergency guideline index")]
struct Cli {
    /// Directory of guideline documents (defaults to KNOWLEDGE_DIR)
    #[arg(long)]
    knowledge_dir: Option<PathBuf>,

    /// Where to write the index (defaults to KNOWLEDGE_INDEX_PATH)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Window size in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive windows
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Embedding model (defaults to EMBEDDING_MODEL)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,knowledge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = KnowledgeConfig::from_env().context("Failed to load configuration")?;

    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY must be set to build the knowledge index")?;
    let model = cli.model.unwrap_or_else(|| config.embedding_model.clone());
    let embedder = OpenAIEmbedder::new(api_key).with_model(&model);

    let knowledge_dir = cli.knowledge_dir.unwrap_or(config.knowledge_dir);
    let output_dir = cli.output_dir.unwrap_or(config.index_dir);
    let chunk_config = ChunkConfig::new(
        cli.chunk_size.unwrap_or(config.chunk_size),
        cli.chunk_overlap.unwrap_or(config.chunk_overlap),
    )
    .context("Invalid chunk configuration")?;

    println!("Building knowledge index from {}", knowledge_dir.display());

    let index = build_from_dir(&knowledge_dir, &output_dir, &embedder, chunk_config)
        .await
        .context("Failed to build knowledge index")?;

    println!("\nKnowledge index complete!");
    println!("  Chunks: {}", index.len());
    println!("  Model: {}", index.embedding_model());
    println!("  Written to: {}", output_dir.display());

    Ok(())
}
