//! MCP tool surface
//!
//! Exposes the four deployer operations as MCP tools over stdio. Each tool
//! returns its operation text on success; failures come back as error-flagged
//! text carrying the error message.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::deployer::Deployer;
use crate::error::{Error, Result};

// ===================================================================
// Input structs
// ===================================================================

/// Input parameters for the `deploy` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct DeployInput {
    /// Application name (lowercase DNS label, e.g. `checkout-svc`).
    pub app_name: String,
    /// Container image reference, e.g. `ghcr.io/acme/checkout:1.4.2`.
    pub image: String,
}

/// Input parameters for the `destroy`, `update` and `status` tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AppInput {
    /// Application name (lowercase DNS label).
    pub app_name: String,
}

// ===================================================================
// DeployerTools — the MCP server handler
// ===================================================================

#[derive(Clone)]
pub struct DeployerTools {
    deployer: Arc<Deployer>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DeployerTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployerTools")
            .field("deployer", &self.deployer)
            .finish()
    }
}

impl DeployerTools {
    pub fn new(deployer: Arc<Deployer>) -> Self {
        Self {
            deployer,
            tool_router: Self::tool_router(),
        }
    }
}

fn into_tool_result<T: ToString>(operation: &str, result: Result<T>) -> Result<String, String> {
    result.map(|value| value.to_string()).map_err(|e| {
        warn!("{} failed: {}", operation, e);
        e.to_string()
    })
}

#[tool_router]
impl DeployerTools {
    #[tool(description = "Deploy an application by committing its Kubernetes manifests \
        and ArgoCD Application to the GitOps repository.")]
    async fn deploy(&self, params: Parameters<DeployInput>) -> Result<String, String> {
        let input = params.0;
        into_tool_result(
            "deploy",
            self.deployer.deploy(&input.app_name, &input.image).await,
        )
    }

    #[tool(description = "Destroy an application by removing its manifests and ArgoCD \
        Application from the GitOps repository.")]
    async fn destroy(&self, params: Parameters<AppInput>) -> Result<String, String> {
        into_tool_result("destroy", self.deployer.destroy(&params.0.app_name).await)
    }

    #[tool(description = "Trigger a rolling restart of an application's Deployment.")]
    async fn update(&self, params: Parameters<AppInput>) -> Result<String, String> {
        into_tool_result("update", self.deployer.update(&params.0.app_name).await)
    }

    #[tool(description = "Report an application's Git presence, ArgoCD health and sync \
        state, and ingress reachability.")]
    async fn status(&self, params: Parameters<AppInput>) -> Result<String, String> {
        into_tool_result("status", self.deployer.status(&params.0.app_name).await)
    }
}

#[tool_handler]
impl ServerHandler for DeployerTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "GitOps deployer for ArgoCD. Use deploy/destroy to change what is \
                 committed to the GitOps repository, update to restart a running \
                 application, and status to inspect it."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve the tools over stdin/stdout until the client disconnects
pub async fn serve_stdio(deployer: Arc<Deployer>) -> Result<()> {
    let service = DeployerTools::new(deployer)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| Error::SetupError(format!("failed to start MCP server: {e}")))?;

    info!("MCP server ready on stdio");
    service.waiting().await?;
    info!("MCP client disconnected");
    Ok(())
}
