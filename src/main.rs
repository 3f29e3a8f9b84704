use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use argo_deployer::config::{
    DEFAULT_ARGOCD_APP_PATH, DEFAULT_ARGOCD_NAMESPACE, DEFAULT_DOMAIN, DEFAULT_MANIFEST_PATH,
    DEFAULT_NAMESPACE,
};
use argo_deployer::telemetry::{self, LogTarget};
use argo_deployer::{mcp, Deployer, DeployerConfig, Error};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the deploy/destroy/update/status tools over MCP stdio
    Mcp(ConfigArgs),
    /// Serve the HTTP API
    #[cfg(feature = "rest-api")]
    Serve(ServeArgs),
    /// Show version and build information
    Version,
}

#[derive(ClapArgs, Debug)]
struct ConfigArgs {
    /// Path to the kubeconfig used for all cluster calls
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Namespace the application workloads are deployed to
    #[arg(long, env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Base domain; applications are exposed at <name>.<domain>
    #[arg(long, env = "DOMAIN", default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// URL of the GitOps repository watched by ArgoCD
    #[arg(long, env = "GITHUB_URL")]
    github_url: Option<String>,

    /// Access token for the GitOps repository
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository directory holding ArgoCD Application descriptors
    #[arg(long = "argocd-path", env = "ARGOCD_APP_PATH", default_value = DEFAULT_ARGOCD_APP_PATH)]
    argocd_app_path: String,

    /// Repository directory holding per-application manifests
    #[arg(long, env = "MANIFEST_PATH", default_value = DEFAULT_MANIFEST_PATH)]
    manifest_path: String,

    /// Namespace ArgoCD Applications are created in
    #[arg(long, env = "ARGOCD_NAMESPACE", default_value = DEFAULT_ARGOCD_NAMESPACE)]
    argocd_namespace: String,

    /// Ingress reachability probe timeout in seconds
    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = 5)]
    probe_timeout_secs: u64,
}

#[cfg(feature = "rest-api")]
#[derive(ClapArgs, Debug)]
struct ServeArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Address the HTTP API listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: std::net::SocketAddr,
}

impl ConfigArgs {
    fn into_config(self) -> Result<DeployerConfig, Error> {
        let mut config = DeployerConfig::new(
            self.kubeconfig.unwrap_or_default(),
            self.github_url.unwrap_or_default(),
            self.github_token.unwrap_or_default(),
        );
        config.namespace = self.namespace;
        config.domain = self.domain;
        config.argocd_app_path = self.argocd_app_path;
        config.manifest_path = self.manifest_path;
        config.argocd_namespace = self.argocd_namespace;
        config.probe_timeout = Duration::from_secs(self.probe_timeout_secs);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Commands::Version = args.command {
        println!("argo-deployer v{}", env!("CARGO_PKG_VERSION"));
        println!("Build Date: {}", env!("BUILD_DATE"));
        println!("Git SHA: {}", env!("GIT_SHA"));
        println!("Rust Version: {}", env!("RUST_VERSION"));
        return;
    }

    let target = match args.command {
        Commands::Mcp(_) => LogTarget::Stderr,
        _ => LogTarget::Stdout,
    };
    if let Err(e) = telemetry::init_tracing(target) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let result = run(args.command).await;
    telemetry::shutdown_telemetry();

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Mcp(config_args) => {
            let deployer = build_deployer(config_args)?;
            mcp::serve_stdio(deployer).await
        }
        #[cfg(feature = "rest-api")]
        Commands::Serve(serve_args) => {
            let deployer = build_deployer(serve_args.config)?;
            argo_deployer::rest_api::run_server(deployer, serve_args.listen_addr).await
        }
        Commands::Version => Ok(()),
    }
}

fn build_deployer(config_args: ConfigArgs) -> Result<Arc<Deployer>, Error> {
    let config = config_args.into_config()?;
    info!(
        "Starting argo-deployer v{} for repository {} (namespace {}, domain {})",
        env!("CARGO_PKG_VERSION"),
        config.repo_url,
        config.namespace,
        config.domain
    );
    Ok(Arc::new(Deployer::new(Arc::new(config))))
}
