//! Project fixtures: template files, API configs and directory layouts.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::ProjectLayout;

/// Template with a single `svc-a` backend at `https://10.0.0.1` (http).
pub const SINGLE_BACKEND_TEMPLATE: &str = r#"{
	"$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
	"contentVersion": "1.0.0.0",
	"parameters": {
		"ApimServiceName": {
			"type": "string"
		}
	},
	"resources": [
		{
			"properties": {
				"credentials": {
					"query": {},
					"header": {}
				},
				"tls": {
					"validateCertificateChain": false,
					"validateCertificateName": false
				},
				"url": "https://10.0.0.1",
				"protocol": "http"
			},
			"name": "[concat(parameters('ApimServiceName'), '/svc-a')]",
			"type": "Microsoft.ApiManagement/service/backends",
			"apiVersion": "2021-01-01-preview"
		}
	]
}
"#;

/// API config `orders` with three operations, backed by `https://10.0.0.1/orders`.
pub const ORDERS_API_CONFIG: &str = r#"{
	"apiname": "orders",
	"env": "dev",
	"tags": ["sales", "public"],
	"policies": {
		"backend-url": "https://10.0.0.1/orders",
		"set-headers": [
			{ "name": "X-Env", "value": "dev" }
		]
	},
	"operations": [
		{ "name": "list-orders", "method": "GET", "url": "/orders" },
		{ "name": "create-order", "method": "POST", "url": "/orders" },
		{ "name": "get-order", "method": "GET", "url": "/orders/{id}" }
	]
}
"#;

/// A temporary project directory with the standard layout.
pub struct ProjectFixture {
    temp: TempDir,
    layout: ProjectLayout,
}

impl ProjectFixture {
    /// Create `apis/<env>`, `apim-<env>/sources` and `apim-<env>/templates`.
    ///
    /// # Panics
    ///
    /// When the temp directory cannot be created.
    #[must_use]
    pub fn new(env: &str) -> Self {
        let temp = TempDir::new().expect("create temp project");
        let layout = ProjectLayout::new(temp.path());
        for dir in [layout.api_config_dir(env), layout.sources_dir(env), layout.templates_dir(env)] {
            fs::create_dir_all(dir).expect("create project directory");
        }
        Self {
            temp,
            layout,
        }
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Layout rooted at the project.
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Write the backend template of `env`.
    ///
    /// # Panics
    ///
    /// On IO failure.
    pub fn with_template(self, env: &str, content: &str) -> Self {
        fs::write(self.layout.backend_template_path(env), content).expect("write template");
        self
    }

    /// Write `apis/<env>/<api_id>.json`.
    ///
    /// # Panics
    ///
    /// On IO failure.
    pub fn with_api_config(self, env: &str, api_id: &str, content: &str) -> Self {
        fs::write(self.layout.api_config_path(env, api_id), content).expect("write api config");
        self
    }

    /// Path of the backend template of `env`.
    #[must_use]
    pub fn template_path(&self, env: &str) -> PathBuf {
        self.layout.backend_template_path(env)
    }

    /// Read the backend template of `env`.
    ///
    /// # Panics
    ///
    /// When the file is missing.
    #[must_use]
    pub fn read_template(&self, env: &str) -> String {
        fs::read_to_string(self.template_path(env)).expect("read template")
    }
}
