//! `parse`: reconcile one API config and write its Resource Kit artifacts.
//!
//! 1. check the project layout of the environment
//! 2. load `apis/<env>/<api-id>.json` and the backend template
//! 3. look the API's backend URL up in the template and in the live service
//! 4. if both sides know it, write the artifacts into
//!    `apim-<env>/sources/<apiname>/`; otherwise report a new backend
//!
//! Local documents are validated before any network call, so a broken
//! project fails fast without credentials.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::CommandContext;
use crate::config::ProjectLayout;
use crate::models::{ApiConfig, ServiceArgs, TagStyle};
use crate::reconcile::reconcile;
use crate::remote::RemoteDirectory;
use crate::synth::{SynthesisOptions, synthesize};
use crate::template::{BackendTemplate, TemplateStore, load_api_config};

/// Reconcile an API config and generate its artifacts.
#[derive(Args)]
pub struct ParseCommand {
    #[command(flatten)]
    service: ServiceArgs,

    /// Environment (selects apis/<env> and apim-<env>)
    #[arg(long)]
    env: String,

    /// API config id, the file name under apis/<env> without `.json`
    #[arg(long)]
    api_id: String,

    /// Shape of `tags` in config.yaml
    #[arg(long, value_enum, default_value_t = TagStyle::Sequence)]
    tags_style: TagStyle,
}

/// What a `parse` run did.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The backend URL is not bound on both sides; nothing was written
    NewBackend {
        /// The API's backend URL
        url: String,
    },
    /// Artifacts were written
    Generated {
        /// Backend id the policy routes to
        backend_id: String,
        /// Directory holding the artifacts
        output_dir: PathBuf,
        /// Written files
        paths: Vec<PathBuf>,
    },
}

struct ParseInputs {
    api: ApiConfig,
    template: BackendTemplate,
}

impl ParseCommand {
    /// Run against the configured service.
    ///
    /// # Errors
    ///
    /// Missing project directories, malformed documents, control-plane
    /// failures, or any artifact that could not be written.
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let inputs = self.load_inputs(&context.layout)?;
        let directory = context.directory().await?;

        match self.run(&directory, &context.layout, inputs).await? {
            ParseOutcome::NewBackend {
                url,
            } => {
                println!("{} ({url})", "new backend".yellow());
            }
            ParseOutcome::Generated {
                backend_id,
                output_dir,
                paths,
            } => {
                println!("{} backend '{}'", "Matched".green().bold(), backend_id);
                println!("Artifacts in {}", output_dir.display());
                for path in paths {
                    println!("  {} {}", "wrote".bright_black(), path.display());
                }
            }
        }
        Ok(())
    }

    fn load_inputs(&self, layout: &ProjectLayout) -> Result<ParseInputs> {
        layout.check(&self.env)?;

        let config_path = layout.api_config_path(&self.env, &self.api_id);
        let api = load_api_config(&config_path)
            .with_context(|| format!("Failed to load API config '{}'", self.api_id))?;
        let template = TemplateStore::new(layout.backend_template_path(&self.env)).load()?;
        debug!("Loaded API '{}' and {} template backend(s)", api.api_name, template.resources.len());

        Ok(ParseInputs {
            api,
            template,
        })
    }

    async fn run(
        &self,
        directory: &dyn RemoteDirectory,
        layout: &ProjectLayout,
        inputs: ParseInputs,
    ) -> Result<ParseOutcome> {
        let ParseInputs {
            api,
            template,
        } = inputs;
        let scope = self.service.scope();
        let url = api.policies.backend_url.clone();

        let verdict = reconcile(directory, &template, &scope, &url).await?;
        if !verdict.exists {
            info!("No existing backend for {} in {}", url, scope);
            return Ok(ParseOutcome::NewBackend {
                url,
            });
        }

        let output_dir = layout.api_output_dir(&self.env, &api.api_name);
        let options = SynthesisOptions {
            tag_style: self.tags_style,
        };
        let report = synthesize(&output_dir, &api, &verdict.id, &scope.service_name, options)?;
        let output_dir = report.output_dir.clone();
        let paths = report.into_result()?;

        Ok(ParseOutcome::Generated {
            backend_id: verdict.id,
            output_dir,
            paths,
        })
    }
}
