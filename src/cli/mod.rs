//! Command-line interface for apimtool.
//!
//! The CLI is organised in three command groups:
//!
//! - `apim`: read and create live backends and APIs in an APIM service
//! - `template`: export, add to and delete from the local backend template
//! - `parse`: reconcile one API config against both sides and write its
//!   Resource Kit artifacts
//!
//! ```bash
//! apimtool apim backend list -g rg-dev -n apim-dev --option list
//! apimtool template backend create --env dev --backend-id svc-a --url https://10.0.0.1 --protocol http
//! apimtool parse -g rg-dev -n apim-dev --env dev --api-id orders
//! ```
//!
//! Global options (`--verbose`, `--quiet`, `--config`, `--project-dir`) are
//! accepted by every subcommand. Every command runs against an explicit
//! [`CommandContext`] built once here; nothing is read from global state
//! afterwards. A command is raced against Ctrl-C and dropped on interrupt,
//! which happens before any template write since writes come last.

pub mod apim;
pub mod output;
pub mod parse;
pub mod template;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ProjectLayout};
use crate::core::ApimError;
use crate::remote::ArmDirectory;

/// Runtime settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one without parsing
/// arguments.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    /// Explicit config file
    pub config_path: Option<PathBuf>,

    /// Project root holding `apis/` and `apim-<env>/`
    pub project_dir: PathBuf,
}

impl CliConfig {
    /// Create a configuration rooted at the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            ..Self::default()
        }
    }

    /// Install the tracing subscriber, writing to stderr.
    ///
    /// Falls back to `RUST_LOG`, then to `warn`. Calling this twice is
    /// harmless; the second subscriber is rejected.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Everything a command needs, constructed once at startup.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Effective configuration
    pub config: AppConfig,
    /// Project paths
    pub layout: ProjectLayout,
}

impl CommandContext {
    /// Open the control-plane client, resolving the access token.
    ///
    /// # Errors
    ///
    /// Missing subscription or no obtainable token.
    pub async fn directory(&self) -> crate::core::Result<ArmDirectory> {
        ArmDirectory::connect(&self.config).await
    }
}

/// Reconcile Azure API Management backends with local ARM templates.
#[derive(Parser)]
#[command(
    name = "apimtool",
    about = "Reconcile Azure API Management backends with local templates",
    version,
    long_about = "apimtool lists and creates APIM backends, maintains backends.template.json \
                  and generates API Management DevOps Resource Kit artifacts for each API."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file (default: ~/.apimtool/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root containing apis/<env> and apim-<env>/
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Query and create live APIM resources
    Apim(apim::ApimCommand),

    /// Maintain the local backends.template.json
    Template(template::TemplateCommand),

    /// Reconcile one API config and write its deployment artifacts
    Parse(parse::ParseCommand),
}

impl Cli {
    /// Execute the CLI with configuration built from the global flags.
    ///
    /// # Errors
    ///
    /// Whatever the command returns, or [`ApimError::Cancelled`] on Ctrl-C.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            project_dir: self.project_dir.clone(),
        }
    }

    /// Execute the CLI with an injected configuration.
    ///
    /// # Errors
    ///
    /// See [`Cli::execute`].
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let app_config = AppConfig::load(config.config_path.as_deref()).await?;
        let context = CommandContext {
            config: app_config,
            layout: ProjectLayout::new(&config.project_dir),
        };
        debug!("Project root: {}", context.layout.root().display());

        let run = async move {
            match self.command {
                Commands::Apim(cmd) => cmd.execute(&context).await,
                Commands::Template(cmd) => cmd.execute(&context).await,
                Commands::Parse(cmd) => cmd.execute(&context).await,
            }
        };

        until_cancelled(run, tokio::signal::ctrl_c()).await
    }
}

/// Drive `run` unless `cancel` resolves first, in which case `run` is
/// dropped at its current await point.
pub(crate) async fn until_cancelled<T>(
    run: impl Future<Output = Result<T>>,
    cancel: impl Future,
) -> Result<T> {
    tokio::select! {
        result = run => result,
        _ = cancel => {
            warn!("Interrupted; no further changes are made");
            Err(ApimError::Cancelled.into())
        }
    }
}
