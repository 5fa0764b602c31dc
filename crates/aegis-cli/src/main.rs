use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use aegis_core::config::ConfigLoader;
use aegis_core::{AegisConfig, DocumentLibrary, Generator, InMemoryContextProvider, OllamaClient};

mod analyze;
mod chat;
mod commands;
mod output;

#[cfg(test)]
mod test_support;

use analyze::{list_documents, run_analysis, AnalysisOptions};
use chat::ChatApp;

#[derive(Parser, Debug)]
#[clap(
    name = "Aegis",
    author,
    version = "0.1.0",
    about = "Local assistant for analysing legal documents"
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(long, short, help = "Path to a YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log level, overrides the configuration file")]
    log_level: Option<String>,

    #[clap(long, help = "Base URL of the generation server")]
    ollama_url: Option<String>,

    #[clap(long, help = "Model name sent with every request")]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat about uploaded documents across multiple sessions (default command)
    Chat {
        #[clap(long, help = "Document to attach to the first session")]
        document: Option<PathBuf>,
    },
    /// Analyse a document from the document folder against the policy guidelines
    Analyze {
        #[clap(long, help = "Document name, defaults to the first one listed")]
        document: Option<String>,

        #[clap(long, help = "Wait for the whole answer instead of streaming it")]
        no_stream: bool,
    },
    /// List the documents available for analysis
    Documents,
    /// Print the effective configuration as YAML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(cli.config.as_deref()).await?;
    if let Some(url) = &cli.ollama_url {
        config.generation.base_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    init_logging(&config)?;
    log::info!(
        "Using model {} at {}",
        config.generation.model,
        config.generation.base_url
    );

    match cli.command.unwrap_or(Commands::Chat { document: None }) {
        Commands::Chat { document } => run_chat(&config, document).await,
        Commands::Analyze {
            document,
            no_stream,
        } => run_analyze(&config, document, no_stream).await,
        Commands::Documents => {
            let library = DocumentLibrary::from_config(&config.retrieval);
            list_documents(&mut tokio::io::stdout(), &library).await
        }
        Commands::Config => {
            print!("{}", ConfigLoader::to_yaml(&config)?);
            Ok(())
        }
    }
}

/// Logs go to a file so they never interleave with streamed answers.
fn init_logging(config: &AegisConfig) -> Result<()> {
    let level: LevelFilter = config.logging.level.parse().unwrap_or(LevelFilter::Info);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.logging.file)
        .with_context(|| {
            format!(
                "Failed to open log file {}",
                config.logging.file.display()
            )
        })?;

    env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(())
}

async fn run_chat(config: &AegisConfig, document: Option<PathBuf>) -> Result<()> {
    let generator = Arc::new(OllamaClient::from_config(&config.generation));
    let mut app = ChatApp::new(generator, &config.generation, tokio::io::stdout());

    if let Some(path) = document {
        app.upload(&path).await?;
    }
    app.run(BufReader::new(tokio::io::stdin())).await
}

async fn run_analyze(config: &AegisConfig, document: Option<String>, no_stream: bool) -> Result<()> {
    let library = DocumentLibrary::from_config(&config.retrieval);
    let provider = InMemoryContextProvider::from_directory(
        &config.retrieval.documents_dir,
        config.retrieval.chunk_size,
    )
    .await
    .context("Failed to initialize the retriever")?;

    let generator = OllamaClient::from_config(&config.generation);
    if let Err(e) = generator.health_check().await {
        log::warn!("Generation server health check failed: {}", e);
    }

    let options = AnalysisOptions {
        model: config.generation.model.clone(),
        stream: config.generation.stream && !no_stream,
        top_k: config.retrieval.top_k,
    };

    run_analysis(
        &mut tokio::io::stdout(),
        &library,
        &provider,
        &generator,
        &options,
        document.as_deref(),
    )
    .await?;
    Ok(())
}
