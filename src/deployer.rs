//! Deployment orchestration
//!
//! The four operations exposed to callers:
//! - `deploy`: clone, render and stage manifests, commit and push
//! - `destroy`: clone, remove manifests, commit and push
//! - `update`: rolling restart of the live Deployment (no Git involvement)
//! - `status`: aggregated Git / ArgoCD / ingress report
//!
//! deploy and destroy are idempotent: an unchanged tree is reported as a
//! successful no-op and never produces an empty commit.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::app::{AppName, Application};
use crate::cluster;
use crate::config::DeployerConfig;
use crate::error::Result;
use crate::git::{publish, PublishOutcome, Workspace};
use crate::manifests;
use crate::status::{aggregate, StatusReport};

/// Result text of a mutating operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The operation changed the repository or the cluster
    Changed(String),
    /// Desired state was already in place
    Unchanged(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Outcome::Changed(msg) | Outcome::Unchanged(msg) => msg,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Clone, Debug)]
pub struct Deployer {
    config: Arc<DeployerConfig>,
}

impl Deployer {
    pub fn new(config: Arc<DeployerConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Render the application's manifests into the GitOps repository
    #[instrument(skip(self), fields(app = %app_name))]
    pub async fn deploy(&self, app_name: &str, image: &str) -> Result<Outcome> {
        let started = Instant::now();
        let result = async {
            let app = Application::new(AppName::parse(app_name)?, image, &self.config)?;
            let config = Arc::clone(&self.config);
            tokio::task::spawn_blocking(move || deploy_blocking(&config, &app)).await?
        }
        .await;
        record("deploy", started, &result);
        result
    }

    /// Remove the application's manifests from the GitOps repository
    #[instrument(skip(self), fields(app = %app_name))]
    pub async fn destroy(&self, app_name: &str) -> Result<Outcome> {
        let started = Instant::now();
        let result = async {
            let name = AppName::parse(app_name)?;
            let config = Arc::clone(&self.config);
            tokio::task::spawn_blocking(move || destroy_blocking(&config, &name)).await?
        }
        .await;
        record("destroy", started, &result);
        result
    }

    /// Trigger a rolling restart of the application's Deployment
    #[instrument(skip(self), fields(app = %app_name))]
    pub async fn update(&self, app_name: &str) -> Result<Outcome> {
        let started = Instant::now();
        let result = async {
            let name = AppName::parse(app_name)?;
            let client = cluster::client(&self.config).await?;
            let namespace = &self.config.namespace;
            cluster::restart_deployment(client, namespace, &name, Utc::now()).await?;
            Ok(Outcome::Changed(format!(
                "Successfully triggered rolling restart for deployment {name} in namespace {namespace}"
            )))
        }
        .await;
        record("update", started, &result);
        result
    }

    /// Report Git presence, ArgoCD condition and ingress reachability
    ///
    /// Only an invalid name fails; sub-check failures are part of the report.
    #[instrument(skip(self), fields(app = %app_name))]
    pub async fn status(&self, app_name: &str) -> Result<StatusReport> {
        let started = Instant::now();
        let result = match AppName::parse(app_name) {
            Ok(name) => Ok(aggregate(Arc::clone(&self.config), &name).await),
            Err(e) => Err(e),
        };
        record("status", started, &result);
        result
    }
}

fn deploy_blocking(config: &DeployerConfig, app: &Application) -> Result<Outcome> {
    let artifacts = manifests::render(app, config)?;
    let workspace = Workspace::acquire(config)?;
    manifests::materialize_deploy(&workspace, &artifacts)?;

    let message = format!("Deploy application {} with image {}", app.name, app.image);
    let outcome = match publish(&workspace, &message)? {
        PublishOutcome::Pushed { commit } => {
            info!("Deployed {} at commit {}", app.name, commit);
            Outcome::Changed(format!("Successfully deployed {}. Git updated.", app.name))
        }
        PublishOutcome::NoOp => {
            Outcome::Unchanged(format!("No changes to deploy for {}", app.name))
        }
    };
    release_workspace(workspace);
    Ok(outcome)
}

fn destroy_blocking(config: &DeployerConfig, name: &AppName) -> Result<Outcome> {
    let workspace = Workspace::acquire(config)?;
    manifests::materialize_destroy(&workspace, name, config)?;

    let message = format!("Destroy application {name}");
    let outcome = match publish(&workspace, &message)? {
        PublishOutcome::Pushed { commit } => {
            info!("Destroyed {} at commit {}", name, commit);
            Outcome::Changed(format!("Successfully destroyed {name} (manifests removed)."))
        }
        PublishOutcome::NoOp => Outcome::Unchanged(format!(
            "App {name} does not exist or already destroyed"
        )),
    };
    release_workspace(workspace);
    Ok(outcome)
}

/// Remove the working copy after the push; cleanup failure never masks the outcome
fn release_workspace(workspace: Workspace) {
    if let Err(e) = workspace.release() {
        warn!("Failed to clean up workspace: {}", e);
    }
}

#[cfg(feature = "metrics")]
fn record<T: crate::metrics::Observed>(operation: &str, started: Instant, result: &Result<T>) {
    crate::metrics::observe_operation(operation, started.elapsed().as_secs_f64(), result);
}

#[cfg(not(feature = "metrics"))]
fn record<T>(_operation: &str, _started: Instant, _result: &Result<T>) {}
