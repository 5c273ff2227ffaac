/// `load_config` module: loads the YAML pipeline config and injects secrets from the environment.
///
/// This is the only place where the user-supplied YAML is parsed into the
/// strongly-typed [`PipelineConfig`] of `pressroom-core`.
///
/// # Environment
/// - `OPENAI_API_KEY` (required): credential for the text and image generators.
/// - `OPENAI_BASE_URL` (optional): OpenAI-compatible API root, defaults to the public API.
/// - `PUBLISH_ENDPOINT` (optional): overrides `publish.endpoint` from the file.
/// - `PUBLISH_API_TOKEN` (optional): bearer token for the publish endpoint.
///
/// # Errors
/// All errors use `anyhow::Error` and name the offending file or variable;
/// they are surfaced at the CLI boundary.
use anyhow::{bail, Result};
use pressroom_core::config::PipelineConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Credentials for the OpenAI-compatible generator client.
#[derive(Clone)]
pub struct OpenAiCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for OpenAiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCredentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug)]
pub struct RunConfig {
    pub pipeline: PipelineConfig,
    pub openai: OpenAiCredentials,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut pipeline: PipelineConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(endpoint) = env_non_empty("PUBLISH_ENDPOINT") {
        info!(endpoint = %endpoint, "PUBLISH_ENDPOINT found in env, overriding publish.endpoint");
        pipeline.publish.endpoint = endpoint;
    }
    if pipeline.publish.endpoint.trim().is_empty() {
        error!("No publish endpoint configured");
        bail!("publish.endpoint is empty and PUBLISH_ENDPOINT is not set");
    }
    pipeline.publish.api_token = env_non_empty("PUBLISH_API_TOKEN");

    if pipeline.generation.min_body_chars == 0 {
        info!("generation.min_body_chars is 0: any non-empty body passes the length gate");
    }

    let api_key = match env_non_empty("OPENAI_API_KEY") {
        Some(key) => {
            info!("OPENAI_API_KEY found in env");
            key
        }
        None => {
            error!("OPENAI_API_KEY environment variable not set");
            bail!("OPENAI_API_KEY environment variable not set");
        }
    };
    let base_url = env_non_empty("OPENAI_BASE_URL")
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    info!(
        records = %pipeline.records.path.display(),
        endpoint = %pipeline.publish.endpoint,
        base_url = %base_url,
        "Config loaded and merged successfully"
    );

    Ok(RunConfig {
        pipeline,
        openai: OpenAiCredentials { api_key, base_url },
    })
}
