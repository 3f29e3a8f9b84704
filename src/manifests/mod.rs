//! Desired-state manifests for an application
//!
//! Renders the workload manifests plus the ArgoCD descriptor and stages them
//! into a [`Workspace`] as additions (deploy) or removals (destroy).
//!
//! Repository layout per application:
//!
//! ```text
//! <manifest_path>/<name>/deployment.yaml
//! <manifest_path>/<name>/service.yaml
//! <manifest_path>/<name>/ingress.yaml
//! <argocd_app_path>/<name>.yaml
//! ```

mod resources;

pub use resources::{
    build_argo_application, build_deployment, build_ingress, build_service, selector_labels,
    standard_labels, CONTAINER_PORT, MANAGED_BY, SERVICE_PORT,
};

use serde::Serialize;
use tracing::debug;

use crate::app::{AppName, Application};
use crate::config::DeployerConfig;
use crate::error::{Error, Result};
use crate::git::Workspace;

/// One rendered file, addressed relative to the repository root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

/// Ordered set of rendered files for one application
///
/// Holds the workload manifests followed by exactly one ArgoCD descriptor.
#[derive(Clone, Debug)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.path.as_str()).collect()
    }

    /// The ArgoCD Application descriptor
    pub fn descriptor(&self) -> Option<&Artifact> {
        self.artifacts.last()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn to_yaml<T: Serialize>(file: &str, value: &T) -> Result<String> {
    serde_yaml::to_string(value)
        .map_err(|e| Error::RenderError(format!("failed to render {file}: {e}")))
}

/// Render the full artifact set for `app`
pub fn render(app: &Application, config: &DeployerConfig) -> Result<ArtifactSet> {
    let dir = config.manifest_dir(app.name.as_str());

    let artifacts = vec![
        Artifact {
            path: format!("{dir}/deployment.yaml"),
            content: to_yaml("deployment.yaml", &build_deployment(app))?,
        },
        Artifact {
            path: format!("{dir}/service.yaml"),
            content: to_yaml("service.yaml", &build_service(app))?,
        },
        Artifact {
            path: format!("{dir}/ingress.yaml"),
            content: to_yaml("ingress.yaml", &build_ingress(app))?,
        },
        Artifact {
            path: config.descriptor_path(app.name.as_str()),
            content: to_yaml("application.yaml", &build_argo_application(app, config))?,
        },
    ];

    Ok(ArtifactSet { artifacts })
}

/// Write every artifact into the workspace and stage each as an addition
pub fn materialize_deploy(workspace: &Workspace, artifacts: &ArtifactSet) -> Result<()> {
    for artifact in artifacts.iter() {
        debug!("Writing {}", artifact.path);
        workspace.write_file(&artifact.path, &artifact.content)?;
    }
    workspace.stage_paths(&artifacts.paths())
}

/// Remove the application's manifests and descriptor, then stage the whole tree
///
/// Paths that are already absent are not an error; an untouched tree leaves
/// the change set empty.
pub fn materialize_destroy(
    workspace: &Workspace,
    name: &AppName,
    config: &DeployerConfig,
) -> Result<()> {
    workspace.remove_path(&config.manifest_dir(name.as_str()))?;
    workspace.remove_path(&config.descriptor_path(name.as_str()))?;
    workspace.stage_all()
}
