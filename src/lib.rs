//! argo-deployer: GitOps application deployer for ArgoCD
//!
//! Deploys and destroys applications by committing Kubernetes manifests and
//! an ArgoCD `Application` to a Git repository that ArgoCD watches, restarts
//! running applications through the Kubernetes API, and reports status from
//! Git, the cluster and the application's public ingress.

pub mod app;
pub mod cluster;
pub mod config;
pub mod crd;
pub mod deployer;
pub mod error;
pub mod git;
pub mod manifests;
pub mod mcp;
pub mod probe;
pub mod status;
pub mod telemetry;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "rest-api")]
pub mod rest_api;

pub use crate::config::DeployerConfig;
pub use crate::deployer::{Deployer, Outcome};
pub use crate::error::{Error, Result};
pub use crate::status::StatusReport;
