use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::Confirm;
use rag_mcp::{ServerConfig, logging, run_server};
use rag_mcp_embed::RemoteEmbedProvider;
use rag_mcp_retriever::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rag_mcp_retriever::registry::{RootRegistry, normalize};
use rag_mcp_retriever::retrieval::indexing_engine::{IndexingEngine, IndexingEngineConfig};
use rag_mcp_retriever::retrieval::search::SearchScope;
use rag_mcp_retriever::storage::index_dir;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

/// RAG MCP Tool CLI. Without arguments, starts the MCP server.
#[derive(Debug, Parser)]
#[command(name = "rag-mcp", disable_version_flag = true)]
struct Cli {
    /// Target directory path
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file path
    #[arg(short = 'c', long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Clean the directory's RAG database
    #[arg(long)]
    clean: bool,

    /// Back up the directory's RAG database
    #[arg(short = 'b', long)]
    backup: bool,

    /// Backup storage path
    #[arg(long = "backup-path", value_name = "PATH")]
    backup_path: Option<PathBuf>,

    /// Start the MCP server after processing
    #[arg(short = 's', long)]
    serve: bool,

    /// Show version
    #[arg(short = 'v', long)]
    version: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.version {
        println!("RAG MCP Tool v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if cli.clean {
        let Some(dir) = cli.dir.as_deref() else {
            bail!("--dir is required for --clean");
        };
        return clean(dir);
    }

    if cli.backup {
        let Some(dir) = cli.dir.as_deref() else {
            bail!("--dir is required for --backup");
        };
        let Some(destination) = cli.backup_path.as_deref() else {
            bail!("--backup-path is required for --backup");
        };
        return backup(dir, destination);
    }

    if let Some(dir) = cli.dir.as_deref() {
        IndexingEngineConfig::new(dir).validate()?;

        if !cli.serve {
            let config = AppConfig::load(&cli.config)?;
            return index(dir, &config).await;
        }
    }

    let app_config = AppConfig::load_or_default(&cli.config);
    let scope = match cli.dir.as_deref() {
        Some(dir) if cli.serve => SearchScope::Pinned(normalize(dir)),
        _ => SearchScope::Registry,
    };
    run_server(ServerConfig::new(scope, app_config, registry()?)).await?;
    Ok(())
}

fn registry() -> Result<RootRegistry> {
    RootRegistry::default_location().context("Could not determine the home directory")
}

async fn index(dir: &Path, config: &AppConfig) -> Result<()> {
    let embedder = Arc::new(RemoteEmbedProvider::new(config.embed_config())?);
    let engine_config = IndexingEngineConfig::from_app_config(dir, config);
    let engine = IndexingEngine::open(engine_config, embedder).await?;

    let report = engine.sync().await?;
    info!(
        "Indexed {}: {} files processed, {} failed, {} removed",
        engine.base_path().display(),
        report.files_processed,
        report.errors,
        report.files_deleted
    );

    registry()?.add(engine.base_path())?;
    Ok(())
}

fn clean(dir: &Path) -> Result<()> {
    let target = normalize(dir);
    let rag_dir = index_dir(&target);

    if !rag_dir.exists() {
        println!("No database found to clean.");
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Are you sure you want to delete {}?",
            rag_dir.display()
        ))
        .default(false)
        .interact()?;
    if confirmed {
        std::fs::remove_dir_all(&rag_dir)
            .with_context(|| format!("Failed to remove {}", rag_dir.display()))?;
        registry()?.remove(&target)?;
        println!("Cleaned up database.");
    }
    Ok(())
}

fn backup(dir: &Path, destination: &Path) -> Result<()> {
    let rag_dir = index_dir(&normalize(dir));

    if !rag_dir.exists() {
        println!("No database found to backup.");
        return Ok(());
    }

    copy_dir_all(&rag_dir, destination)
        .with_context(|| format!("Failed to copy {}", rag_dir.display()))?;
    println!("Backup created at {}", destination.display());
    Ok(())
}

/// Recursive copy that merges into an existing destination.
fn copy_dir_all(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let target = destination.join(entry.path().strip_prefix(source)?);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
