//! Application identity
//!
//! An application name doubles as a Kubernetes resource name and as the first
//! DNS label of its public hostname, so it is validated as an RFC 1123 label
//! before any Git or cluster work starts.

use std::fmt;

use crate::config::DeployerConfig;
use crate::error::{Error, Result};

const MAX_LABEL_LEN: usize = 63;

/// A validated application name
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn parse(name: &str) -> Result<Self> {
        validate_dns_label(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_dns_label(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::ValidationError(
            "app_name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_LABEL_LEN {
        return Err(Error::ValidationError(format!(
            "app_name {name:?} is longer than {MAX_LABEL_LEN} characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(Error::ValidationError(format!(
            "app_name {name:?} may only contain lowercase letters, digits and '-'"
        )));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(Error::ValidationError(format!(
            "app_name {name:?} must start and end with a letter or digit"
        )));
    }
    Ok(())
}

/// Validate a container image reference
pub fn validate_image(image: &str) -> Result<()> {
    if image.trim().is_empty() {
        return Err(Error::ValidationError("image must not be empty".to_string()));
    }
    if image.chars().any(char::is_whitespace) {
        return Err(Error::ValidationError(format!(
            "image {image:?} must not contain whitespace"
        )));
    }
    Ok(())
}

/// Everything needed to render the desired state of one application
#[derive(Clone, Debug)]
pub struct Application {
    pub name: AppName,
    pub image: String,
    pub namespace: String,
    pub domain: String,
}

impl Application {
    pub fn new(name: AppName, image: impl Into<String>, config: &DeployerConfig) -> Result<Self> {
        let image = image.into();
        validate_image(&image)?;
        Ok(Self {
            name,
            image,
            namespace: config.namespace.clone(),
            domain: config.domain.clone(),
        })
    }

    /// Public hostname routed to the application
    pub fn host(&self) -> String {
        format!("{}.{}", self.name, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_labels() {
        for name in ["checkout-svc", "a", "app1", "9lives", &"x".repeat(63)] {
            assert!(AppName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_labels() {
        for name in [
            "",
            "Checkout",
            "-leading",
            "trailing-",
            "has_underscore",
            "dotted.name",
            "../escape",
            "with space",
            &"x".repeat(64),
        ] {
            assert!(
                matches!(AppName::parse(name), Err(Error::ValidationError(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn image_validation() {
        assert!(validate_image("registry/checkout:1.2").is_ok());
        assert!(validate_image("").is_err());
        assert!(validate_image("nginx latest").is_err());
    }

    #[test]
    fn application_host_uses_configured_domain() {
        let mut config = DeployerConfig::new("/kube", "https://example.com/r.git", "t");
        config.domain = "apps.example.com".to_string();
        let app = Application::new(
            AppName::parse("checkout-svc").unwrap(),
            "registry/checkout:1.2",
            &config,
        )
        .unwrap();
        assert_eq!(app.host(), "checkout-svc.apps.example.com");
        assert_eq!(app.namespace, "applications");
    }
}
