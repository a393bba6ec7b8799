use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{BotColor, BotConfig};

/// Fixed Ollama inference port and API path.
const INFERENCE_PORT: u16 = 11434;
const INFERENCE_PATH: &str = "/api/generate";

/// Used whenever the cluster lookup fails, for any reason.
pub const FALLBACK_URL: &str = "http://localhost:11434/api/generate";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to run cluster client: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Cluster client exited with {status}: {stderr}")]
    ClientFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Service description is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Service has no load balancer ingress hostname")]
    NoIngress,
}

/// Resolves a logical service name to an externally reachable address.
#[async_trait]
pub trait ServiceLookup: Send + Sync {
    async fn lookup_address(&self, service: &str) -> Result<String, LookupError>;
}

/// Queries the cluster for a service's load balancer hostname via `kubectl`.
pub struct KubectlLookup {
    namespace: String,
}

impl KubectlLookup {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl ServiceLookup for KubectlLookup {
    async fn lookup_address(&self, service: &str) -> Result<String, LookupError> {
        let output = Command::new("kubectl")
            .args(["get", "svc", service, "-n", &self.namespace, "-o", "json"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(LookupError::ClientFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        ingress_hostname(&output.stdout)
    }
}

/// Extracts `status.loadBalancer.ingress[0].hostname` from a service
/// description.
fn ingress_hostname(description: &[u8]) -> Result<String, LookupError> {
    let service: Value = serde_json::from_slice(description)?;
    service["status"]["loadBalancer"]["ingress"][0]["hostname"]
        .as_str()
        .map(str::to_owned)
        .ok_or(LookupError::NoIngress)
}

/// A resolved inference endpoint. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub model: String,
    pub name: String,
    pub color: BotColor,
}

impl Endpoint {
    /// Resolves a bot's service name to a concrete endpoint URL.
    ///
    /// Never fails: any lookup error is absorbed and the local fallback URL
    /// is used instead.
    pub async fn resolve(lookup: &dyn ServiceLookup, bot: &BotConfig) -> Self {
        let url = match lookup.lookup_address(&bot.service).await {
            Ok(host) => format!("http://{host}:{INFERENCE_PORT}{INFERENCE_PATH}"),
            Err(err) => {
                warn!(
                    "Lookup for service '{}' failed ({err}), using fallback",
                    bot.service
                );
                FALLBACK_URL.to_string()
            }
        };
        debug!("Resolved service '{}' to {url}", bot.service);

        Self {
            url,
            model: bot.model.clone(),
            name: bot.name.clone(),
            color: bot.color,
        }
    }
}
