//! HTTP publisher for the destination platform's ingestion endpoint.
//!
//! One POST per item, either multipart (binary cover/thumbnail parts) or
//! URL-encoded (static asset path placeholders). Nothing here returns an
//! error: every failure becomes a [`PublishOutcome`] so a single item can
//! never abort the batch. There is no retry loop; the next pass is the retry.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{PublishConfig, PublishEncoding};
use crate::contract::{AssetRole, PublishOutcome, PublishRequest, Publisher};

/// Longest response excerpt kept in a rejection reason.
const REASON_EXCERPT_CHARS: usize = 200;

pub struct HttpPublisher {
    client: reqwest::Client,
    config: PublishConfig,
}

impl HttpPublisher {
    pub fn new(config: PublishConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!(
            endpoint = %config.endpoint,
            encoding = ?config.encoding,
            timeout_secs = config.timeout_secs,
            token_set = config.api_token.is_some(),
            "Initialised HttpPublisher"
        );
        Ok(Self { client, config })
    }

    fn text_fields(&self, request: &PublishRequest) -> Vec<(String, String)> {
        let fields = &self.config.fields;
        let mut out = vec![
            (fields.title.clone(), request.title.clone()),
            (fields.content.clone(), request.body.clone()),
            (fields.keywords.clone(), request.keyword.clone()),
        ];
        if let Some(id) = request.classification_id {
            out.push((fields.category_id.clone(), id.to_string()));
        }
        out
    }

    fn field_for(&self, role: AssetRole) -> &str {
        match role {
            AssetRole::Cover => &self.config.fields.cover_image,
            AssetRole::Thumbnail => &self.config.fields.thumbnail_image,
        }
    }

    fn form_body(&self, request: &PublishRequest) -> Vec<(String, String)> {
        let mut out = self.text_fields(request);
        out.push((
            self.config.fields.cover_image.clone(),
            self.config.cover_placeholder.clone(),
        ));
        out.push((
            self.config.fields.thumbnail_image.clone(),
            self.config.thumbnail_placeholder.clone(),
        ));
        out
    }

    async fn multipart_body(&self, request: &PublishRequest) -> Result<Form, String> {
        let mut form = Form::new();
        for (name, value) in self.text_fields(request) {
            form = form.text(name, value);
        }
        for asset in &request.assets {
            let bytes = tokio::fs::read(&asset.path)
                .await
                .map_err(|e| format!("could not read asset {}: {e}", asset.path.display()))?;
            let file_name = asset
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}.bin", asset.role));
            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(mime_for(&asset.path))
                .map_err(|e| format!("invalid mime type: {e}"))?;
            form = form.part(self.field_for(asset.role).to_string(), part);
        }
        Ok(form)
    }
}

fn mime_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, request: &PublishRequest) -> PublishOutcome {
        info!(
            keyword = %request.keyword,
            title = %request.title,
            assets = request.assets.len(),
            "[PUBLISH] Sending item"
        );

        let mut builder = self.client.post(&self.config.endpoint);
        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }
        builder = match self.config.encoding {
            PublishEncoding::Multipart => match self.multipart_body(request).await {
                Ok(form) => builder.multipart(form),
                Err(reason) => {
                    error!(keyword = %request.keyword, %reason, "[PUBLISH] Could not build multipart body");
                    return PublishOutcome::TransportFailure { reason };
                }
            },
            PublishEncoding::Form => builder.form(&self.form_body(request)),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(keyword = %request.keyword, error = ?e, "[PUBLISH] Request failed");
                return PublishOutcome::TransportFailure {
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(keyword = %request.keyword, error = ?e, "[PUBLISH] Failed to read response body");
                return PublishOutcome::TransportFailure {
                    reason: e.to_string(),
                };
            }
        };
        debug!(keyword = %request.keyword, status = status.as_u16(), body = %excerpt(&body), "[PUBLISH] Response received");

        let outcome = interpret(status.as_u16(), status.is_success(), &body, &self.config.id_field);
        match &outcome {
            PublishOutcome::Published { remote_id } => {
                info!(keyword = %request.keyword, remote_id = %remote_id, "[PUBLISH] Item accepted")
            }
            other => {
                warn!(keyword = %request.keyword, outcome = ?other, "[PUBLISH] Item not accepted")
            }
        }
        outcome
    }
}

/// Maps a completed HTTP exchange to an outcome.
pub fn interpret(status: u16, success: bool, body: &str, id_field: &str) -> PublishOutcome {
    if !success {
        return PublishOutcome::Rejected {
            status,
            reason: excerpt(body),
        };
    }
    let ack: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return PublishOutcome::Rejected {
                status,
                reason: format!("acknowledgement is not JSON: {e}"),
            }
        }
    };
    match extract_id(&ack, id_field) {
        Some(remote_id) => PublishOutcome::Published { remote_id },
        None => PublishOutcome::Rejected {
            status,
            reason: format!("acknowledgement has no usable {id_field:?}"),
        },
    }
}

/// Follows a dotted path (`data.id`, `items.0.id`) and renders the leaf as text.
pub fn extract_id(ack: &Value, path: &str) -> Option<String> {
    let mut node = ack;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match node {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= REASON_EXCERPT_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(REASON_EXCERPT_CHARS).collect();
        format!("{cut}…")
    }
}
