//! ArgoCD Application status lookup
//!
//! Reads the Application through a dynamic API handle so the deployer does
//! not depend on the ArgoCD CRD being known to the client's type system.
//! Absence and failures are findings, not errors.

use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind};
use kube::Client;
use tracing::{debug, instrument, warn};

use crate::app::AppName;
use crate::config::DeployerConfig;
use crate::crd::{ArgoApplicationStatus, ARGOCD_GROUP, ARGOCD_KIND, ARGOCD_PLURAL, ARGOCD_VERSION};
use crate::error::Result;

use super::client;

/// What the cluster says about an application's ArgoCD resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgoFinding {
    /// Application exists and reports health; sync may be empty
    Found { health: String, sync: String },
    /// Application exists but has no health status yet
    Unknown,
    /// No Application with this name
    NotFound,
    /// Client construction or the API call failed
    Error(String),
}

pub fn application_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(ARGOCD_GROUP, ARGOCD_VERSION, ARGOCD_KIND);
    ApiResource::from_gvk_with_plural(&gvk, ARGOCD_PLURAL)
}

/// Extract the health and sync conditions from a live Application object
pub fn finding_from_object(object: &DynamicObject) -> ArgoFinding {
    let status = object
        .data
        .get("status")
        .cloned()
        .map(serde_json::from_value::<ArgoApplicationStatus>)
        .transpose()
        .unwrap_or_else(|e| {
            warn!("Unparseable Application status: {}", e);
            None
        })
        .unwrap_or_default();

    match status.health.and_then(|h| h.status) {
        Some(health) => ArgoFinding::Found {
            health,
            sync: status.sync.and_then(|s| s.status).unwrap_or_default(),
        },
        None => ArgoFinding::Unknown,
    }
}

async fn fetch(client: Client, namespace: &str, name: &AppName) -> Result<ArgoFinding> {
    let api: Api<DynamicObject> =
        Api::namespaced_with(client, namespace, &application_resource());

    Ok(match api.get_opt(name.as_str()).await? {
        Some(object) => finding_from_object(&object),
        None => ArgoFinding::NotFound,
    })
}

/// Look up the Application named after the app in the ArgoCD namespace
#[instrument(skip(config), fields(app = %name))]
pub async fn read_argo_status(config: &DeployerConfig, name: &AppName) -> ArgoFinding {
    let result = match client(config).await {
        Ok(client) => fetch(client, &config.argocd_namespace, name).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(finding) => {
            debug!("ArgoCD finding: {:?}", finding);
            finding
        }
        Err(e) => {
            warn!("Failed to read ArgoCD Application {}: {}", name, e);
            ArgoFinding::Error(e.to_string())
        }
    }
}
