//! `apim` commands: read and create live resources of one service.
//!
//! ```bash
//! apimtool apim backend list -g rg -n svc --filter-display-name url=10.0.0.1
//! apimtool apim backend create -g rg -n svc --backend-id svc-a --url https://10.0.0.1 --protocol http
//! apimtool apim api list -g rg -n svc --option list
//! apimtool apim backend api depend list -g rg -n svc --backend-id svc-a
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

use super::CommandContext;
use super::output::{OutputMode, render_api_details, render_api_table, render_backends};
use crate::core::ApimError;
use crate::inventory::{collect_api_details, filter_dependents};
use crate::models::{Protocol, ServiceArgs};
use crate::reconcile::{BackendFilter, find_remote_backend_id, normalize_url};
use crate::remote::RemoteDirectory;
use crate::template::validate_backend_id;

/// Live APIM resources.
#[derive(Args)]
pub struct ApimCommand {
    #[command(subcommand)]
    command: ApimSubcommands,
}

#[derive(Subcommand)]
enum ApimSubcommands {
    /// Backends of a service
    Backend(BackendCommand),
    /// APIs of a service
    Api(ApiCommand),
}

#[derive(Args)]
struct BackendCommand {
    #[command(subcommand)]
    command: BackendSubcommands,
}

#[derive(Subcommand)]
enum BackendSubcommands {
    /// List backends
    List(BackendListArgs),
    /// Create a backend unless its URL is already bound
    Create(BackendCreateArgs),
    /// APIs related to a backend
    Api(BackendApiCommand),
}

#[derive(Args)]
struct BackendListArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Filter as `url=<value>` or `name=<value>`; a bare value filters by name
    #[arg(long)]
    filter_display_name: Option<String>,

    /// Output layout
    #[arg(long = "option", value_enum, default_value_t = OutputMode::Table)]
    option: OutputMode,
}

#[derive(Args)]
struct BackendCreateArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Id of the new backend
    #[arg(long)]
    backend_id: String,

    /// Endpoint URL
    #[arg(long)]
    url: String,

    /// Backend protocol
    #[arg(long, value_enum)]
    protocol: Protocol,
}

#[derive(Args)]
struct BackendApiCommand {
    #[command(subcommand)]
    command: BackendApiSubcommands,
}

#[derive(Subcommand)]
enum BackendApiSubcommands {
    /// APIs whose policy routes to a backend
    Depend(DependCommand),
}

#[derive(Args)]
struct DependCommand {
    #[command(subcommand)]
    command: DependSubcommands,
}

#[derive(Subcommand)]
enum DependSubcommands {
    /// List dependent APIs
    List(DependListArgs),
}

#[derive(Args)]
struct DependListArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Backend id the policy must route to
    #[arg(long)]
    backend_id: Option<String>,

    /// Backend URL the policy must resolve to
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommands,
}

#[derive(Subcommand)]
enum ApiSubcommands {
    /// List APIs; `--option list` adds routing and operations
    List(ApiListArgs),
}

#[derive(Args)]
struct ApiListArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Substring of the display name
    #[arg(long, default_value = "")]
    filter_display_name: String,

    /// Output layout
    #[arg(long = "option", value_enum, default_value_t = OutputMode::Table)]
    option: OutputMode,
}

impl ApimCommand {
    /// Run the selected `apim` subcommand.
    ///
    /// # Errors
    ///
    /// Configuration, authentication or control-plane failures.
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let directory = context.directory().await?;
        self.execute_with_directory(&directory).await
    }

    /// Run against an explicit directory.
    ///
    /// # Errors
    ///
    /// See [`ApimCommand::execute`].
    pub async fn execute_with_directory(self, directory: &dyn RemoteDirectory) -> Result<()> {
        let out = match self.command {
            ApimSubcommands::Backend(BackendCommand {
                command,
            }) => match command {
                BackendSubcommands::List(args) => list_backends(directory, args).await?,
                BackendSubcommands::Create(args) => create_backend(directory, args).await?,
                BackendSubcommands::Api(BackendApiCommand {
                    command:
                        BackendApiSubcommands::Depend(DependCommand {
                            command: DependSubcommands::List(args),
                        }),
                }) => list_dependents(directory, args).await?,
            },
            ApimSubcommands::Api(ApiCommand {
                command: ApiSubcommands::List(args),
            }) => list_apis(directory, args).await?,
        };
        print!("{out}");
        Ok(())
    }
}

async fn list_backends(directory: &dyn RemoteDirectory, args: BackendListArgs) -> Result<String> {
    let filter = args.filter_display_name.as_deref().map(BackendFilter::parse).unwrap_or_else(BackendFilter::all);
    let backends = directory.list_backends(&args.service.scope(), &filter).await?;
    Ok(format!("{}\n\n{}", "List Backends".bright_blue().bold().italic(), render_backends(&backends, args.option)))
}

async fn create_backend(directory: &dyn RemoteDirectory, args: BackendCreateArgs) -> Result<String> {
    validate_backend_id(&args.backend_id)?;
    normalize_url(&args.url)?;
    let scope = args.service.scope();

    if let Some(existing_id) = find_remote_backend_id(directory, &scope, &args.url).await? {
        return Err(ApimError::DuplicateEndpoint {
            url: args.url,
            protocol: args.protocol,
            existing_id,
        }
        .into());
    }

    let backend = directory.create_or_update_backend(&scope, &args.backend_id, &args.url, args.protocol).await?;
    info!("Created backend '{}' in {}", backend.name, scope);
    Ok(format!(
        "{} backend '{}' -> {} ({})\n",
        "Created".green().bold(),
        backend.name,
        backend.url,
        backend.protocol
    ))
}

async fn list_apis(directory: &dyn RemoteDirectory, args: ApiListArgs) -> Result<String> {
    let scope = args.service.scope();
    let title = "List API Management APIs".bright_blue().bold().italic();

    let body = match args.option {
        OutputMode::Table => render_api_table(&directory.list_apis(&scope, &args.filter_display_name).await?),
        OutputMode::List => {
            let details = collect_api_details(directory, &scope, &args.filter_display_name).await?;
            render_api_details(&details.iter().collect::<Vec<_>>())
        }
    };
    Ok(format!("{title}\n\n{body}"))
}

async fn list_dependents(directory: &dyn RemoteDirectory, args: DependListArgs) -> Result<String> {
    let details = collect_api_details(directory, &args.service.scope(), "").await?;
    let dependents = filter_dependents(&details, args.backend_id.as_deref(), args.url.as_deref());
    Ok(format!("{}\n\n{}", "List Dependent APIs".bright_blue().bold().italic(), render_api_details(&dependents)))
}
