// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring

use crate::pipeline::SyncEntry;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the verbosity flag when it is set.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// One console line per repository of a batch run.
pub fn format_entry(entry: &SyncEntry) -> String {
    let target = format!(
        "{} -> {}",
        entry.request.remote_url,
        entry.request.local_path.display()
    );

    match &entry.result {
        Ok(outcome) if outcome.is_skipped() => {
            format_warning(&format!("{} ({})", target, outcome.label()))
        }
        Ok(outcome) => format_success(&format!("{} ({})", target, outcome.label())),
        Err(message) => format_error(&format!("{}: {}", target, message)),
    }
}
