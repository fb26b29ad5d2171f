//! `template backend` commands: maintain `backends.template.json`.
//!
//! `export` snapshots the live backends of a service into a fresh template;
//! `create` and `delete` edit the template of one environment in place. The
//! template path defaults to `apim-<env>/templates/backends.template.json`
//! under the project root and can be overridden with `--file-path`.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::CommandContext;
use crate::config::BACKEND_TEMPLATE_FILE;
use crate::models::{Protocol, ServiceArgs};
use crate::reconcile::BackendFilter;
use crate::remote::RemoteDirectory;
use crate::template::{BackendTemplate, TemplateStore};
use crate::utils::write_json_file;

/// Local backend template.
#[derive(Args)]
pub struct TemplateCommand {
    #[command(subcommand)]
    command: TemplateSubcommands,
}

#[derive(Subcommand)]
enum TemplateSubcommands {
    /// Backend resources in the template
    Backend(TemplateBackendCommand),
}

#[derive(Args)]
struct TemplateBackendCommand {
    #[command(subcommand)]
    command: TemplateBackendSubcommands,
}

#[derive(Subcommand)]
enum TemplateBackendSubcommands {
    /// Write every live backend of a service into a new template
    Export(ExportArgs),
    /// Add a backend resource
    Create(CreateArgs),
    /// Remove a backend resource by id
    Delete(DeleteArgs),
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Directory receiving backends.template.json (default: current directory)
    #[arg(long)]
    file_path: Option<PathBuf>,
}

#[derive(Args)]
struct CreateArgs {
    /// Environment whose template is edited
    #[arg(long)]
    env: String,

    /// Id of the new backend
    #[arg(long)]
    backend_id: String,

    /// Endpoint URL
    #[arg(long)]
    url: String,

    /// Backend protocol
    #[arg(long, value_enum)]
    protocol: Protocol,

    /// Template file to edit instead of the environment default
    #[arg(long)]
    file_path: Option<PathBuf>,
}

#[derive(Args)]
struct DeleteArgs {
    /// Environment whose template is edited
    #[arg(long)]
    env: String,

    /// Id of the backend to remove
    #[arg(long)]
    backend_id: String,

    /// Template file to edit instead of the environment default
    #[arg(long)]
    file_path: Option<PathBuf>,
}

impl TemplateCommand {
    /// Run the selected `template` subcommand.
    ///
    /// # Errors
    ///
    /// Template load, validation or write failures; for `export`, control-plane
    /// failures.
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let TemplateSubcommands::Backend(TemplateBackendCommand {
            command,
        }) = self.command;

        match command {
            TemplateBackendSubcommands::Export(args) => {
                let directory = context.directory().await?;
                export(&directory, &args).await
            }
            TemplateBackendSubcommands::Create(args) => {
                let store = store_for(context, &args.env, args.file_path.as_deref());
                create(&store, &args)
            }
            TemplateBackendSubcommands::Delete(args) => {
                let store = store_for(context, &args.env, args.file_path.as_deref());
                delete(&store, &args.backend_id)
            }
        }
    }
}

fn store_for(context: &CommandContext, env: &str, file_path: Option<&Path>) -> TemplateStore {
    match file_path {
        Some(path) => TemplateStore::new(path),
        None => TemplateStore::new(context.layout.backend_template_path(env)),
    }
}

async fn export(directory: &dyn RemoteDirectory, args: &ExportArgs) -> Result<()> {
    let scope = args.service.scope();
    let backends = directory.list_backends(&scope, &BackendFilter::all()).await?;
    let doc = BackendTemplate::from_backends(&backends);

    let dir = args.file_path.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = dir.join(BACKEND_TEMPLATE_FILE);
    write_json_file(&path, &doc)?;
    info!("Exported {} backend(s) of {} to {}", backends.len(), scope, path.display());

    println!(
        "{} {} backend(s) to {}",
        "Exported".green().bold(),
        backends.len(),
        path.display()
    );
    Ok(())
}

fn create(store: &TemplateStore, args: &CreateArgs) -> Result<()> {
    println!("{}\n", "Create a new backend entity in backends.template.json".bright_blue().bold().italic());
    println!("Backend ID : {}\nURL        : {}\nProtocol   : {}", args.backend_id, args.url, args.protocol);

    store.add_backend(&args.backend_id, &args.url, args.protocol)?;
    println!("\n{} {}", "Created".green().bold(), store.path().display());
    Ok(())
}

fn delete(store: &TemplateStore, backend_id: &str) -> Result<()> {
    println!("{}\n", "Delete a backend entity in backends.template.json".bright_yellow().bold().italic());
    println!("Backend ID : {backend_id}");

    match store.remove_backend(backend_id)? {
        0 => println!("\n{} no backend '{}' in {}", "Unchanged:".yellow(), backend_id, store.path().display()),
        _ => println!("\n{} {}", "Deleted".green().bold(), store.path().display()),
    }
    Ok(())
}
