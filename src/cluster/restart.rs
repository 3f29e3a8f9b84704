//! Rolling restart of an application's Deployment
//!
//! Uses the same pod-template annotation as `kubectl rollout restart`. The
//! update is a plain replace carrying the fetched resourceVersion, so a
//! concurrent writer surfaces as a conflict error instead of being
//! overwritten.

use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::{info, instrument};

use crate::app::AppName;
use crate::error::{Error, Result};

pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Set the restart annotation on the pod template to `now`
pub fn apply_restart_annotation(deployment: &mut Deployment, now: DateTime<Utc>) -> Result<()> {
    let name = deployment.metadata.name.clone().unwrap_or_default();
    let spec = deployment
        .spec
        .as_mut()
        .ok_or_else(|| Error::ValidationError(format!("deployment {name} has no spec")))?;

    spec.template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(Default::default)
        .insert(
            RESTARTED_AT_ANNOTATION.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
    Ok(())
}

/// Trigger a rolling restart of the Deployment named `name` in `namespace`
#[instrument(skip(client), fields(app = %name, namespace = %namespace))]
pub async fn restart_deployment(
    client: Client,
    namespace: &str,
    name: &AppName,
    now: DateTime<Utc>,
) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(client, namespace);

    let mut deployment = match api.get(name.as_str()).await {
        Ok(deployment) => deployment,
        Err(kube::Error::Api(e)) if e.code == 404 => {
            return Err(Error::NotFoundError(format!(
                "deployment {name} in namespace {namespace}: {}",
                e.message
            )));
        }
        Err(e) => return Err(Error::KubeError(e)),
    };

    apply_restart_annotation(&mut deployment, now)?;

    api.replace(name.as_str(), &PostParams::default(), &deployment)
        .await?;

    info!("Triggered rolling restart of {}/{}", namespace, name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::core::v1::PodTemplateSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn deployment(template_meta: Option<ObjectMeta>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("checkout-svc".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                template: PodTemplateSpec {
                    metadata: template_meta,
                    spec: None,
                },
                ..Default::default()
            }),
            status: None,
        }
    }

    fn annotations(d: &Deployment) -> BTreeMap<String, String> {
        d.spec
            .as_ref()
            .and_then(|s| s.template.metadata.as_ref())
            .and_then(|m| m.annotations.clone())
            .unwrap_or_default()
    }

    #[test]
    fn annotation_added_when_template_has_no_metadata() {
        let mut d = deployment(None);
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 30, 0).unwrap();
        apply_restart_annotation(&mut d, now).unwrap();
        assert_eq!(
            annotations(&d).get(RESTARTED_AT_ANNOTATION).map(String::as_str),
            Some("2026-10-17T12:30:00Z")
        );
    }

    #[test]
    fn annotation_overwrites_previous_restart_and_keeps_others() {
        let meta = ObjectMeta {
            annotations: Some(BTreeMap::from([
                (RESTARTED_AT_ANNOTATION.to_string(), "2020-01-01T00:00:00Z".to_string()),
                ("team".to_string(), "payments".to_string()),
            ])),
            ..Default::default()
        };
        let mut d = deployment(Some(meta));
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 5).unwrap();
        apply_restart_annotation(&mut d, now).unwrap();

        let annotations = annotations(&d);
        assert_eq!(
            annotations.get(RESTARTED_AT_ANNOTATION).map(String::as_str),
            Some("2026-10-17T08:00:05Z")
        );
        assert_eq!(annotations.get("team").map(String::as_str), Some("payments"));
    }

    #[test]
    fn deployment_without_spec_is_rejected() {
        let mut d = deployment(None);
        d.spec = None;
        assert!(apply_restart_annotation(&mut d, Utc::now()).is_err());
    }
}
