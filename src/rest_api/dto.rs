//! Request and response bodies for the REST API

use serde::{Deserialize, Serialize};

use crate::cluster::ArgoFinding;
use crate::status::{GitFinding, StatusReport};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeployRequest {
    pub image: String,
}

/// Result of deploy, destroy or update
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OperationResponse {
    pub app: String,
    /// False when the desired state was already in place
    pub changed: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub app: String,
    /// `present`, `missing` or `error`
    pub git: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_error: Option<String>,
    /// `found`, `unknown`, `not_found` or `error`
    pub argo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argo_error: Option<String>,
    pub ingress_url: String,
    pub ingress_reachable: bool,
    /// The same lines the MCP status tool returns
    pub lines: Vec<String>,
}

impl From<&StatusReport> for StatusResponse {
    fn from(report: &StatusReport) -> Self {
        let (git, git_error) = match &report.git {
            GitFinding::Present => ("present", None),
            GitFinding::Missing => ("missing", None),
            GitFinding::Error(e) => ("error", Some(e.clone())),
        };
        let (argo, health, sync, argo_error) = match &report.argo {
            ArgoFinding::Found { health, sync } => {
                ("found", Some(health.clone()), Some(sync.clone()), None)
            }
            ArgoFinding::Unknown => ("unknown", None, None, None),
            ArgoFinding::NotFound => ("not_found", None, None, None),
            ArgoFinding::Error(e) => ("error", None, None, Some(e.clone())),
        };

        Self {
            app: report.app.to_string(),
            git: git.to_string(),
            git_error,
            argo: argo.to_string(),
            health,
            sync,
            argo_error,
            ingress_url: report.ingress.url.clone(),
            ingress_reachable: report.ingress.reachable,
            lines: report.lines(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}
