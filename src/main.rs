//! Embedding Requestor Main
//!
//! Prints the embeddings of a JSON list of texts as one JSON line on stdout.

use clap::Parser;
use embedding_requestor::{EmbedderConfig, EmbeddingRequestor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "embedding_requestor")]
#[command(version)]
#[command(about = "Embed a JSON list of texts with all-MiniLM-L6-v2", long_about = None)]
struct Cli {
    /// JSON array of strings, e.g. '["hello world"]', or raw text with --chunk
    texts: String,

    /// TOML configuration file
    #[arg(long, env = "EMBEDDING_REQUESTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Treat the argument as raw text and embed its sentence chunks
    #[arg(long, value_name = "MAX_CHARS")]
    chunk: Option<usize>,

    /// Extra arguments are ignored
    #[arg(hide = true, num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    _rest: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => EmbedderConfig::from_file(path)?,
        None => EmbedderConfig::default(),
    };
    config.validate()?;

    // stdout carries only the result line
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let requestor = EmbeddingRequestor::new(config);
    let output = match cli.chunk {
        Some(max_chars) => requestor.run_chunked(&cli.texts, max_chars).await?,
        None => requestor.run(&cli.texts).await?,
    };
    println!("{}", output);

    Ok(())
}
