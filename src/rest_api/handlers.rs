//! HTTP handlers for the REST API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, instrument, warn};

use crate::deployer::{Deployer, Outcome};
use crate::error::Error;

use super::dto::{DeployRequest, ErrorResponse, HealthResponse, OperationResponse, StatusResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a deployer error onto an HTTP status and error body
pub(crate) fn error_response(e: &Error) -> ApiError {
    let status = match e {
        Error::ValidationError(_) => StatusCode::BAD_REQUEST,
        Error::NotFoundError(_) => StatusCode::NOT_FOUND,
        Error::AuthError(_) | Error::GitError(_) | Error::KubeError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, Json(ErrorResponse::new(e.kind(), &e.to_string())))
}

fn operation_response(app: String, outcome: Outcome) -> Json<OperationResponse> {
    Json(OperationResponse {
        app,
        changed: outcome.is_changed(),
        message: outcome.to_string(),
    })
}

/// Health check endpoint
#[instrument]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Deploy or redeploy an application
#[instrument(skip(deployer, body), fields(app = %name))]
pub async fn deploy_app(
    State(deployer): State<Arc<Deployer>>,
    Path(name): Path<String>,
    Json(body): Json<DeployRequest>,
) -> Result<Json<OperationResponse>, ApiError> {
    match deployer.deploy(&name, &body.image).await {
        Ok(outcome) => Ok(operation_response(name, outcome)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Remove an application from the GitOps repository
#[instrument(skip(deployer), fields(app = %name))]
pub async fn destroy_app(
    State(deployer): State<Arc<Deployer>>,
    Path(name): Path<String>,
) -> Result<Json<OperationResponse>, ApiError> {
    match deployer.destroy(&name).await {
        Ok(outcome) => Ok(operation_response(name, outcome)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Rolling restart of the application's Deployment
#[instrument(skip(deployer), fields(app = %name))]
pub async fn restart_app(
    State(deployer): State<Arc<Deployer>>,
    Path(name): Path<String>,
) -> Result<Json<OperationResponse>, ApiError> {
    match deployer.update(&name).await {
        Ok(outcome) => Ok(operation_response(name, outcome)),
        Err(e) => Err(error_response(&e)),
    }
}

/// Aggregated status of an application
#[instrument(skip(deployer), fields(app = %name))]
pub async fn app_status(
    State(deployer): State<Arc<Deployer>>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    match deployer.status(&name).await {
        Ok(report) => Ok(Json(StatusResponse::from(&report))),
        Err(e) => Err(error_response(&e)),
    }
}
