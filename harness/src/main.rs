mod cases;

use clap::{Parser, Subcommand};
use evaluation::{EvaluationRequest, Evaluator, RelevancyJudge};
use model::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "A CLI tool for judging multimodal RAG responses")]
struct Cli {
    /// Ollama base URL
    #[arg(long, global = true, default_value = "http://localhost:11434")]
    base_url: String,
    /// Vision model used as the judge
    #[arg(short, long, global = true, default_value = DEFAULT_VISION_MODEL)]
    model: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge whether a response is in line with its contexts and images
    Evaluate {
        /// JSON case file; overrides the query/response/context flags
        #[arg(long)]
        case: Option<PathBuf>,
        /// The original query
        #[arg(short, long)]
        query: Option<String>,
        /// The generated response to judge
        #[arg(short, long)]
        response: Option<String>,
        /// Textual context snippet (repeatable)
        #[arg(short, long = "context")]
        contexts: Vec<String>,
        /// Image file or directory (repeatable)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
        /// Image URL (accepted, not resolved)
        #[arg(long = "image-url")]
        image_urls: Vec<String>,
        /// Fail with an error instead of reporting a failing verdict
        #[arg(long)]
        raise_on_fail: bool,
        /// File holding a replacement evaluation template
        #[arg(long)]
        eval_template_file: Option<PathBuf>,
        /// Generation cap for the judge model
        #[arg(long, default_value_t = DEFAULT_VISION_MAX_TOKENS)]
        max_tokens: u32,
        /// Request timeout in seconds
        #[arg(long, default_value = "120")]
        timeout_secs: u64,
    },
    /// List available models
    Models,
    /// Health check
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = OllamaConfig::default()
        .with_base_url(cli.base_url.as_str())
        .with_model(cli.model.as_str());

    match cli.command {
        Commands::Evaluate {
            case,
            query,
            response,
            contexts,
            images,
            image_urls,
            raise_on_fail,
            eval_template_file,
            max_tokens,
            timeout_secs,
        } => {
            let request = match case {
                Some(path) => cases::load_case(&path)?,
                None => EvaluationRequest {
                    query,
                    response,
                    contexts: Some(contexts),
                    image_paths: images,
                    image_urls,
                },
            };

            let config = config
                .with_max_tokens(max_tokens)
                .with_timeout(Duration::from_secs(timeout_secs));
            let provider = Arc::new(OllamaProvider::new(config)?);

            let mut builder = RelevancyJudge::builder()
                .model(provider)
                .raise_on_fail(raise_on_fail);
            if let Some(path) = eval_template_file {
                builder = builder.eval_template(std::fs::read_to_string(path)?);
            }
            let judge = builder.build()?;

            evaluate(&judge, &request).await?;
        }
        Commands::Models => {
            let provider = OllamaProvider::new(config)?;
            list_models(&provider).await?;
        }
        Commands::Health => {
            let provider = OllamaProvider::new(config)?;
            health_check(&provider).await?;
        }
    }

    Ok(())
}

async fn evaluate(
    judge: &RelevancyJudge,
    request: &EvaluationRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Evaluating with {} ({} images)",
        judge.model_name(),
        request.image_paths.len()
    );

    match judge.aevaluate(request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            error!("Evaluation failed: {}", e);
            Err(e.into())
        }
    }
}

async fn list_models(provider: &OllamaProvider) -> Result<(), Box<dyn std::error::Error>> {
    println!("Available models:");
    let models = provider.list_models().await?;

    if models.is_empty() {
        println!("  No models found. Make sure Ollama is running and has models installed.");
    } else {
        for model in models {
            println!(
                "  - {} ({})",
                model.name,
                model
                    .size
                    .map(|s| format!("{:.1} GB", s as f64 / 1_000_000_000.0))
                    .unwrap_or_else(|| "unknown size".to_string())
            );
        }
    }

    Ok(())
}

async fn health_check(provider: &OllamaProvider) -> Result<(), Box<dyn std::error::Error>> {
    println!("Performing health check...");

    match provider.health_check().await {
        Ok(()) => {
            println!("✓ Health check passed. Ollama is running and accessible.");
            info!("Health check successful");
        }
        Err(e) => {
            println!("✗ Health check failed: {}", e);
            error!("Health check failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
