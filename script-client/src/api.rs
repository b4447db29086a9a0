//! REST client for the script backend.
//!
//! Stateless: one network round trip per call, no retries, no caching.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared_types::{ImportRequest, ImportedFields, NewScript, Script, ScriptId, ScriptPatch};

use crate::config::ClientConfig;
use crate::error::ScriptError;

/// The five REST verbs plus URL import.
#[async_trait]
pub trait ScriptApi: Send + Sync {
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Script>, ScriptError>;

    async fn get(&self, id: ScriptId) -> Result<Script, ScriptError>;

    async fn create(&self, script: &NewScript) -> Result<Script, ScriptError>;

    /// PATCH semantics: fields absent from `patch` are left unchanged.
    async fn update(&self, id: ScriptId, patch: &ScriptPatch) -> Result<Script, ScriptError>;

    async fn delete(&self, id: ScriptId) -> Result<(), ScriptError>;

    /// Every failure is reported as [`ScriptError::Import`].
    async fn import_from_url(&self, url: &str) -> Result<ImportedFields, ScriptError>;
}

/// [`ScriptApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpScriptApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScriptApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ScriptError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScriptError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and reject non-2xx. `target` turns a 404 into `NotFound`.
    async fn execute(
        &self,
        request: RequestBuilder,
        target: Option<ScriptId>,
    ) -> Result<Response, ScriptError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(id)) = (status, target) {
            return Err(ScriptError::NotFound(id));
        }
        Err(describe_http_error(response).await)
    }
}

#[async_trait]
impl ScriptApi for HttpScriptApi {
    async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Script>, ScriptError> {
        let request = self
            .http
            .get(self.url("/scripts/"))
            .query(&[("offset", offset), ("limit", limit)]);
        let response = self.execute(request, None).await?;
        decode_json(response).await
    }

    async fn get(&self, id: ScriptId) -> Result<Script, ScriptError> {
        let request = self.http.get(self.url(&format!("/scripts/{id}")));
        let response = self.execute(request, Some(id)).await?;
        decode_json(response).await
    }

    async fn create(&self, script: &NewScript) -> Result<Script, ScriptError> {
        let request = self.http.post(self.url("/scripts/")).json(script);
        let response = self.execute(request, None).await?;
        decode_json(response).await
    }

    async fn update(&self, id: ScriptId, patch: &ScriptPatch) -> Result<Script, ScriptError> {
        let request = self
            .http
            .patch(self.url(&format!("/scripts/{id}")))
            .json(patch);
        let response = self.execute(request, Some(id)).await?;
        decode_json(response).await
    }

    async fn delete(&self, id: ScriptId) -> Result<(), ScriptError> {
        let request = self.http.delete(self.url(&format!("/scripts/{id}")));
        // Body is an ack; its shape does not matter.
        self.execute(request, Some(id)).await.map(|_| ())
    }

    async fn import_from_url(&self, url: &str) -> Result<ImportedFields, ScriptError> {
        let body = ImportRequest {
            url: url.to_string(),
        };
        let request = self.http.post(self.url("/import-url")).json(&body);
        let response = self
            .execute(request, None)
            .await
            .map_err(ScriptError::into_import)?;
        let fields: ImportedFields = decode_json(response)
            .await
            .map_err(ScriptError::into_import)?;
        if !fields.has_content() {
            return Err(ScriptError::Import(
                "import returned no usable fields".to_string(),
            ));
        }
        Ok(fields)
    }
}

fn network_error(e: reqwest::Error) -> ScriptError {
    if e.is_timeout() {
        ScriptError::Network(format!("Request timed out: {e}"))
    } else {
        ScriptError::Network(format!("Request failed: {e}"))
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ScriptError> {
    let body = response.bytes().await.map_err(network_error)?;
    serde_json::from_slice(&body)
        .map_err(|e| ScriptError::MalformedResponse(format!("Failed to parse JSON: {e}")))
}

async fn describe_http_error(response: Response) -> ScriptError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ScriptError::Http {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

/// Pull a readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            match json.get(key) {
                Some(serde_json::Value::String(text)) => return text.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    body.trim().to_string()
}
