//! Kubernetes resource builders for a deployed application
//!
//! Workloads are built as typed k8s-openapi objects and the ArgoCD descriptor
//! as an [`ArgoApplication`], so application parameters can never break the
//! structure of the rendered YAML.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::app::Application;
use crate::config::DeployerConfig;
use crate::crd::{
    ApplicationDestination, ApplicationSource, ArgoApplication, ArgoApplicationSpec,
    AutomatedSync, SyncPolicy, RESOURCES_FINALIZER,
};

pub const MANAGED_BY: &str = "argo-deployer";
pub const CONTAINER_PORT: i32 = 8080;
pub const SERVICE_PORT: i32 = 80;
pub const IN_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";

/// Labels used to select the application's pods
pub fn selector_labels(app: &Application) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), app.name.to_string())])
}

/// Get the standard labels for an application's resources
pub fn standard_labels(app: &Application) -> BTreeMap<String, String> {
    let mut labels = selector_labels(app);
    labels.insert(
        "app.kubernetes.io/name".to_string(),
        app.name.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels
}

fn object_meta(app: &Application) -> ObjectMeta {
    ObjectMeta {
        name: Some(app.name.to_string()),
        namespace: Some(app.namespace.clone()),
        labels: Some(standard_labels(app)),
        ..Default::default()
    }
}

// ============================================================================
// Deployment
// ============================================================================

pub fn build_deployment(app: &Application) -> Deployment {
    let selector = selector_labels(app);

    Deployment {
        metadata: object_meta(app),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(standard_labels(app)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: app.name.to_string(),
                        image: Some(app.image.clone()),
                        ports: Some(vec![ContainerPort {
                            name: Some("http".to_string()),
                            container_port: CONTAINER_PORT,
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

// ============================================================================
// Service
// ============================================================================

pub fn build_service(app: &Application) -> Service {
    Service {
        metadata: object_meta(app),
        spec: Some(ServiceSpec {
            selector: Some(selector_labels(app)),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: SERVICE_PORT,
                target_port: Some(IntOrString::Int(CONTAINER_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

// ============================================================================
// Ingress
// ============================================================================

pub fn build_ingress(app: &Application) -> Ingress {
    let rule = IngressRule {
        host: Some(app.host()),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some("/".to_string()),
                path_type: "Prefix".to_string(),
                backend: IngressBackend {
                    service: Some(IngressServiceBackend {
                        name: app.name.to_string(),
                        port: Some(ServiceBackendPort {
                            number: Some(SERVICE_PORT),
                            name: None,
                        }),
                    }),
                    ..Default::default()
                },
            }],
        }),
    };

    Ingress {
        metadata: object_meta(app),
        spec: Some(IngressSpec {
            rules: Some(vec![rule]),
            ..Default::default()
        }),
        status: None,
    }
}

// ============================================================================
// ArgoCD Application
// ============================================================================

pub fn build_argo_application(app: &Application, config: &DeployerConfig) -> ArgoApplication {
    let mut application = ArgoApplication::new(
        app.name.as_str(),
        ArgoApplicationSpec {
            project: "default".to_string(),
            source: ApplicationSource {
                repo_url: config.repo_url.clone(),
                target_revision: "HEAD".to_string(),
                path: config.manifest_dir(app.name.as_str()),
            },
            destination: ApplicationDestination {
                server: IN_CLUSTER_SERVER.to_string(),
                namespace: app.namespace.clone(),
            },
            sync_policy: Some(SyncPolicy {
                automated: Some(AutomatedSync {
                    prune: true,
                    self_heal: true,
                }),
                sync_options: vec!["CreateNamespace=true".to_string()],
            }),
        },
    );

    application.metadata.namespace = Some(config.argocd_namespace.clone());
    application.metadata.finalizers = Some(vec![RESOURCES_FINALIZER.to_string()]);
    application.metadata.labels = Some(BTreeMap::from([(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    )]));
    application
}
