//! Multi-source status aggregation
//!
//! Git presence, the ArgoCD Application condition and ingress reachability
//! are checked concurrently and independently. A failing check never cancels
//! or hides the others, and the report order is fixed regardless of which
//! check finishes first.

use std::fmt;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::app::AppName;
use crate::cluster::{read_argo_status, ArgoFinding};
use crate::config::DeployerConfig;
use crate::git::read_git_presence;
use crate::probe::probe;

/// Whether the ArgoCD descriptor exists at repository HEAD
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GitFinding {
    Present,
    Missing,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngressFinding {
    pub url: String,
    pub reachable: bool,
}

/// Three independent findings about one application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub app: AppName,
    pub git: GitFinding,
    pub argo: ArgoFinding,
    pub ingress: IngressFinding,
}

impl StatusReport {
    /// Report lines in their fixed order: header, Git, ArgoCD, ingress
    pub fn lines(&self) -> Vec<String> {
        let git = match &self.git {
            GitFinding::Present => "✅ Manifests present in Git".to_string(),
            GitFinding::Missing => "❌ Manifests NOT found in Git".to_string(),
            GitFinding::Error(cause) => format!("Error checking git: {cause}"),
        };

        let argo = match &self.argo {
            ArgoFinding::Found { health, sync } => {
                format!("✅ ArgoCD App found. Health: {health}, Sync: {sync}")
            }
            ArgoFinding::Unknown => "⚠️ ArgoCD App found but status unknown".to_string(),
            ArgoFinding::NotFound => "❌ ArgoCD Application not found".to_string(),
            ArgoFinding::Error(cause) => format!("Error checking ArgoCD: {cause}"),
        };

        let ingress = if self.ingress.reachable {
            format!("✅ Ingress reachable: {}", self.ingress.url)
        } else {
            format!("❌ Ingress unreachable: {}", self.ingress.url)
        };

        vec![
            format!("Status for application: {}", self.app),
            git,
            argo,
            ingress,
        ]
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

async fn check_git(config: Arc<DeployerConfig>, name: AppName) -> GitFinding {
    let joined = tokio::task::spawn_blocking(move || read_git_presence(&config, &name)).await;
    match joined {
        Ok(Ok(true)) => GitFinding::Present,
        Ok(Ok(false)) => GitFinding::Missing,
        Ok(Err(e)) => {
            warn!("Git presence check failed: {}", e);
            GitFinding::Error(e.to_string())
        }
        Err(e) => GitFinding::Error(format!("presence check task failed: {e}")),
    }
}

async fn check_ingress(config: &DeployerConfig, name: &AppName) -> IngressFinding {
    let url = config.ingress_url(name.as_str());
    let reachable = probe(&url, config.probe_timeout).await;
    IngressFinding { url, reachable }
}

/// Run all three checks concurrently and collect every outcome
#[instrument(skip(config), fields(app = %name))]
pub async fn aggregate(config: Arc<DeployerConfig>, name: &AppName) -> StatusReport {
    let (git, argo, ingress) = tokio::join!(
        check_git(Arc::clone(&config), name.clone()),
        read_argo_status(&config, name),
        check_ingress(&config, name),
    );

    StatusReport {
        app: name.clone(),
        git,
        argo,
        ingress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::{bare_remote, config_for};

    fn report(git: GitFinding, argo: ArgoFinding, reachable: bool) -> StatusReport {
        StatusReport {
            app: AppName::parse("checkout-svc").unwrap(),
            git,
            argo,
            ingress: IngressFinding {
                url: "http://checkout-svc.tykus.net".to_string(),
                reachable,
            },
        }
    }

    #[test]
    fn healthy_report_lines() {
        let lines = report(
            GitFinding::Present,
            ArgoFinding::Found {
                health: "Healthy".to_string(),
                sync: "Synced".to_string(),
            },
            true,
        )
        .lines();
        assert_eq!(
            lines,
            vec![
                "Status for application: checkout-svc",
                "✅ Manifests present in Git",
                "✅ ArgoCD App found. Health: Healthy, Sync: Synced",
                "✅ Ingress reachable: http://checkout-svc.tykus.net",
            ]
        );
    }

    #[test]
    fn cluster_error_only_marks_its_own_line() {
        let lines = report(
            GitFinding::Present,
            ArgoFinding::Error("connection refused".to_string()),
            true,
        )
        .lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "✅ Manifests present in Git");
        assert_eq!(lines[2], "Error checking ArgoCD: connection refused");
        assert_eq!(lines[3], "✅ Ingress reachable: http://checkout-svc.tykus.net");
    }

    #[test]
    fn absent_app_lines() {
        let text = report(GitFinding::Missing, ArgoFinding::NotFound, false).to_string();
        assert!(text.contains("NOT found in Git"));
        assert!(text.contains("not found"));
        assert!(text.contains("❌ Ingress unreachable"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn unknown_and_git_error_lines() {
        let lines = report(
            GitFinding::Error("authentication required".to_string()),
            ArgoFinding::Unknown,
            false,
        )
        .lines();
        assert_eq!(lines[1], "Error checking git: authentication required");
        assert_eq!(lines[2], "⚠️ ArgoCD App found but status unknown");
    }

    #[tokio::test]
    async fn aggregate_survives_unreachable_cluster() {
        let remote = bare_remote();
        let mut config = config_for(&remote);
        config.domain = "invalid".to_string();
        config.probe_timeout = std::time::Duration::from_secs(1);
        let name = AppName::parse("ghost-app").unwrap();

        let report = aggregate(Arc::new(config), &name).await;

        assert_eq!(report.git, GitFinding::Missing);
        assert!(matches!(report.argo, ArgoFinding::Error(_)));
        assert!(!report.ingress.reachable);
        assert_eq!(report.ingress.url, "http://ghost-app.invalid");
        assert_eq!(report.lines().len(), 4);
    }
}
