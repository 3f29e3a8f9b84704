//! REST API module
//!
//! Provides an HTTP surface over the same four deployer operations the MCP
//! tools expose, plus health and metrics endpoints.

mod dto;
mod handlers;
mod server;

pub use dto::{DeployRequest, ErrorResponse, HealthResponse, OperationResponse, StatusResponse};
pub use server::{router, run_server};
