use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;
use selection_history::HistoryConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{DemoError, Result};
use crate::script::ScriptHost;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SELECTION_HISTORY_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "selection-history-demo",
    about = "Drive a selection history from a command script",
    version
)]
pub struct Cli {
    /// TOML or JSON config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Workspace root the history is scoped to (overrides the config).
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// File the history is persisted in (overrides the config).
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// History depth per direction (overrides the config).
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Number of live objects at startup, ids 1..=N.
    #[arg(long, default_value_t = 100)]
    pub objects: u64,

    /// Script to run; reads stdin when absent or `-`.
    pub script: Option<PathBuf>,
}

impl Cli {
    /// The effective config: file (if any), then command-line overrides.
    pub fn config(&self) -> Result<HistoryConfig> {
        let mut config = match &self.config {
            Some(path) => HistoryConfig::from_file(path)?,
            None => HistoryConfig::default(),
        };
        if let Some(root) = &self.workspace {
            config.workspace_root = root.clone();
        }
        if let Some(store) = &self.store {
            config.store_path = Some(store.clone());
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        Ok(config.validated()?)
    }
}

/// Install the log subscriber. Logs go to stderr so script output stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run_from_env() -> Result<()> {
    init_tracing();
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;
    info!(
        workspace = %config.workspace_root.display(),
        max_depth = config.max_depth,
        store = ?config.store_path,
        "starting demo host"
    );

    let host = ScriptHost::start(&config, cli.objects);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let executed = match cli.script.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path).map_err(|e| {
                DemoError::invalid(format!("cannot open script {}: {e}", path.display()))
            })?;
            host.run_script(BufReader::new(file), &mut out)?
        }
        _ => host.run_script(io::stdin().lock(), &mut out)?,
    };
    info!(executed, "script finished");
    host.shutdown();
    Ok(())
}
