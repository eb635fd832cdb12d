// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use repo_sync::utils::logging::{format_entry, format_info, format_success, format_warning};
use repo_sync::{BatchSync, Config, GitCli, JsonExporter, RepositorySyncer, Validator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "repo_sync")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Clone missing git repositories or fetch all remotes of existing ones", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = repo_sync::config::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone or fetch every repository listed in the configuration
    Sync {
        /// Fetch all remotes of repositories that already exist
        #[arg(long, conflicts_with = "no_fetch")]
        fetch: bool,

        /// Leave existing repositories untouched
        #[arg(long)]
        no_fetch: bool,

        #[arg(short, long, value_name = "NUM")]
        workers: Option<usize>,

        /// Directory to write a JSON report into
        #[arg(long, value_name = "DIR")]
        report: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,
    },

    /// Clone or fetch a single repository
    Repo {
        #[arg(long)]
        path: PathBuf,

        #[arg(long)]
        url: String,

        #[arg(long)]
        fetch: bool,
    },

    /// Show the repositories the configuration resolves to
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(cli.color);
    repo_sync::utils::logging::init_logger(cli.color, cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Sync {
            fetch,
            no_fetch,
            workers,
            report,
            pretty,
        } => {
            let fetch_override = match (fetch, no_fetch) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_sync(&config, fetch_override, workers, report, pretty, cli.color).await?;
        }
        Commands::Repo { path, url, fetch } => {
            cmd_repo(&config, path, url, fetch).await?;
        }
        Commands::List => {
            cmd_list(&config)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    info!("Loading configuration from: {}", cli.config.display());

    if cli.config.exists() {
        return Config::load(Some(cli.config.as_path())).context("Failed to load configuration");
    }

    warn!(
        "Config file {} not found, using default configuration",
        cli.config.display()
    );
    Ok(Config::load(None).unwrap_or_else(|e| {
        warn!("Falling back to built-in defaults: {}", e);
        Config::default_config()
    }))
}

fn build_syncer(config: &Config) -> RepositorySyncer {
    RepositorySyncer::new(Arc::new(GitCli::new(config.sync.git_executable.clone())))
}

async fn cmd_sync(
    config: &Config,
    fetch_override: Option<bool>,
    workers: Option<usize>,
    report: Option<PathBuf>,
    pretty: bool,
    color: bool,
) -> Result<()> {
    let requests = config
        .requests(fetch_override)
        .context("Failed to resolve repositories")?;

    if requests.is_empty() {
        println!("{}", format_warning("No repositories configured"));
        return Ok(());
    }

    let workers = workers.unwrap_or(config.sync.parallel_workers);
    let batch = BatchSync::new(build_syncer(config), workers).with_progress(color);
    let summary = batch.run(requests).await.context("Synchronization failed")?;

    for entry in &summary.entries {
        println!("{}", format_entry(entry));
    }

    if let Some(dir) = report {
        let exporter = JsonExporter::new(dir).context("Failed to create report directory")?;
        let path = exporter
            .write_summary(&summary, pretty)
            .context("Failed to write report")?;
        println!("{}", format_info(&format!("Report: {}", path.display())));
    }

    let stats = &summary.stats;
    println!(
        "{}",
        format_info(&format!(
            "{} cloned, {} present, {} fetched, {} skipped, {} failed",
            stats.cloned, stats.present, stats.fetched, stats.skipped, stats.failed
        ))
    );

    if summary.has_failures() {
        anyhow::bail!("{} repositories failed to synchronize", stats.failed);
    }

    Ok(())
}

async fn cmd_repo(config: &Config, path: PathBuf, url: String, fetch: bool) -> Result<()> {
    Validator::validate_remote_url(&url)?;

    let syncer = build_syncer(config);
    let outcome = tokio::task::spawn_blocking(move || syncer.sync(&path, &url, fetch))
        .await
        .context("Sync task failed")??;

    if outcome.is_skipped() {
        println!("{}", format_warning("Repository skipped"));
    } else {
        println!("{}", format_success(&outcome.to_result_string()));
    }

    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    let requests = config.requests(None)?;

    println!(
        "{}",
        format_info(&format!(
            "{} repositories under {} ({} workers, fetch {})",
            requests.len(),
            config.sync.root_dir.display(),
            config.sync.parallel_workers,
            if config.sync.fetch_if_present { "on" } else { "off" }
        ))
    );

    for request in requests {
        let state = if request.local_path.is_dir() {
            "present"
        } else {
            "absent"
        };
        println!(
            "  {} -> {} [{}]",
            request.remote_url,
            request.local_path.display(),
            state
        );
    }

    Ok(())
}
