//! Process-wide deployer configuration
//!
//! Built once at startup, validated, then shared read-only as
//! `Arc<DeployerConfig>` by every component.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_NAMESPACE: &str = "applications";
pub const DEFAULT_DOMAIN: &str = "tykus.net";
pub const DEFAULT_ARGOCD_APP_PATH: &str = "argocd-apps";
pub const DEFAULT_MANIFEST_PATH: &str = "manifests";
pub const DEFAULT_ARGOCD_NAMESPACE: &str = "argocd";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable configuration for all deployer components
#[derive(Clone)]
pub struct DeployerConfig {
    /// Path to the kubeconfig used for every cluster call
    pub kubeconfig: PathBuf,
    /// Namespace the application workloads live in
    pub namespace: String,
    /// Base domain; applications are served at `<name>.<domain>`
    pub domain: String,
    /// URL of the GitOps repository watched by ArgoCD
    pub repo_url: String,
    /// Access token used as the HTTP password for every Git remote call
    pub git_token: String,
    /// Repository directory holding ArgoCD Application descriptors
    pub argocd_app_path: String,
    /// Repository directory holding per-application workload manifests
    pub manifest_path: String,
    /// Namespace ArgoCD Application resources are created in
    pub argocd_namespace: String,
    /// Timeout for the ingress reachability probe
    pub probe_timeout: Duration,
}

impl fmt::Debug for DeployerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployerConfig")
            .field("kubeconfig", &self.kubeconfig)
            .field("namespace", &self.namespace)
            .field("domain", &self.domain)
            .field("repo_url", &self.repo_url)
            .field("git_token", &"<redacted>")
            .field("argocd_app_path", &self.argocd_app_path)
            .field("manifest_path", &self.manifest_path)
            .field("argocd_namespace", &self.argocd_namespace)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl DeployerConfig {
    /// Create a configuration with the required values and defaults for the rest
    pub fn new(
        kubeconfig: impl Into<PathBuf>,
        repo_url: impl Into<String>,
        git_token: impl Into<String>,
    ) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            repo_url: repo_url.into(),
            git_token: git_token.into(),
            argocd_app_path: DEFAULT_ARGOCD_APP_PATH.to_string(),
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            argocd_namespace: DEFAULT_ARGOCD_NAMESPACE.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Rewrite the repository path prefixes into the form Git index paths use
    pub fn normalize_paths(&mut self) {
        self.argocd_app_path = normalize_repo_path(&self.argocd_app_path);
        self.manifest_path = normalize_repo_path(&self.manifest_path);
    }

    /// Check that all required values are present and paths stay inside the repository
    pub fn validate(&self) -> Result<()> {
        if self.kubeconfig.as_os_str().is_empty()
            || self.repo_url.trim().is_empty()
            || self.git_token.trim().is_empty()
        {
            return Err(Error::ConfigError(
                "--kubeconfig, --github-url, and --github-token are required".to_string(),
            ));
        }

        for (flag, value) in [
            ("--namespace", &self.namespace),
            ("--domain", &self.domain),
            ("--argocd-namespace", &self.argocd_namespace),
        ] {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("{flag} must not be empty")));
            }
        }

        check_repo_relative("--argocd-path", &self.argocd_app_path)?;
        check_repo_relative("--manifest-path", &self.manifest_path)?;

        if self.probe_timeout.is_zero() {
            return Err(Error::ConfigError(
                "probe timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Repository-relative path of the ArgoCD descriptor for `app_name`
    pub fn descriptor_path(&self, app_name: &str) -> String {
        format!("{}/{}.yaml", self.argocd_app_path, app_name)
    }

    /// Repository-relative directory of the workload manifests for `app_name`
    pub fn manifest_dir(&self, app_name: &str) -> String {
        format!("{}/{}", self.manifest_path, app_name)
    }

    /// Externally routable URL of the application ingress
    pub fn ingress_url(&self, app_name: &str) -> String {
        format!("http://{}.{}", app_name, self.domain)
    }
}

/// Drop `.` and empty segments from a `/`-separated repository path
///
/// A leading `/` is kept so absolute paths are still rejected by validation.
pub fn normalize_repo_path(value: &str) -> String {
    let body = value
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if value.starts_with('/') {
        format!("/{body}")
    } else {
        body
    }
}

fn check_repo_relative(flag: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ConfigError(format!("{flag} must not be empty")));
    }
    let escapes = Path::new(value)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(Error::ConfigError(format!(
            "{flag} must be a relative path inside the repository, got {value:?}"
        )));
    }
    let canonical = normalize_repo_path(value);
    if canonical != value {
        return Err(Error::ConfigError(format!(
            "{flag} must be written as {canonical:?}, got {value:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeployerConfig {
        DeployerConfig::new(
            "/home/ops/.kube/config",
            "https://github.com/acme/gitops",
            "ghp_secret",
        )
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = config();
        assert_eq!(cfg.namespace, "applications");
        assert_eq!(cfg.domain, "tykus.net");
        assert_eq!(cfg.argocd_app_path, "argocd-apps");
        assert_eq!(cfg.manifest_path, "manifests");
        assert_eq!(cfg.argocd_namespace, "argocd");
        assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_required_values_are_rejected() {
        let mut cfg = config();
        cfg.git_token = String::new();
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));

        let mut cfg = config();
        cfg.repo_url = "  ".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.kubeconfig = PathBuf::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn paths_escaping_the_repository_are_rejected() {
        let mut cfg = config();
        cfg.manifest_path = "../outside".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.argocd_app_path = "/etc".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.manifest_path = "deploy/manifests".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn non_canonical_prefixes_need_normalizing() {
        for (manifest_path, argocd_app_path) in [
            ("./manifests", "argocd-apps"),
            ("manifests/", "argocd-apps"),
            ("manifests", "argocd-apps//"),
            ("deploy//manifests", "./argocd-apps/"),
        ] {
            let mut cfg = config();
            cfg.manifest_path = manifest_path.to_string();
            cfg.argocd_app_path = argocd_app_path.to_string();
            assert!(
                matches!(cfg.validate(), Err(Error::ConfigError(_))),
                "{manifest_path} / {argocd_app_path} accepted as-is"
            );

            cfg.normalize_paths();
            assert!(cfg.validate().is_ok(), "{cfg:?}");
            assert!(!cfg.manifest_dir("cart").contains("//"));
            assert!(!cfg.descriptor_path("cart").starts_with("./"));
        }
    }

    #[test]
    fn normalizing_keeps_escaping_paths_invalid() {
        assert_eq!(normalize_repo_path("./a//b/"), "a/b");
        assert_eq!(normalize_repo_path("/etc/"), "/etc");

        for bad in ["/etc", "../outside", "./", "."] {
            let mut cfg = config();
            cfg.manifest_path = bad.to_string();
            cfg.normalize_paths();
            assert!(cfg.validate().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn derived_paths_and_urls() {
        let cfg = config();
        assert_eq!(cfg.descriptor_path("checkout-svc"), "argocd-apps/checkout-svc.yaml");
        assert_eq!(cfg.manifest_dir("checkout-svc"), "manifests/checkout-svc");
        assert_eq!(cfg.ingress_url("checkout-svc"), "http://checkout-svc.tykus.net");
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
