//! Kubernetes cluster access
//!
//! Clients are built per operation from the configured kubeconfig, so a bad
//! or unreachable cluster only affects the operation that needs it.

mod argo_status;
mod restart;

pub use argo_status::{finding_from_object, read_argo_status, ArgoFinding};
pub use restart::{apply_restart_annotation, restart_deployment, RESTARTED_AT_ANNOTATION};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::debug;

use crate::config::DeployerConfig;
use crate::error::{Error, Result};

/// Build a client from the kubeconfig named in the configuration
pub async fn client(config: &DeployerConfig) -> Result<Client> {
    let path = &config.kubeconfig;
    debug!("Loading kubeconfig from {}", path.display());

    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        Error::ConfigError(format!("failed to read kubeconfig {}: {e}", path.display()))
    })?;
    let kube_config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::ConfigError(format!("invalid kubeconfig {}: {e}", path.display())))?;

    Ok(Client::try_from(kube_config)?)
}
