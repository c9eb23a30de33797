//! # HTTP assistant
//!
//! Client for a remote assistant service. Every call is a JSON `POST`
//! authenticated with a bearer token; any status other than `200 OK` is
//! an error carrying the response body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::assistant::Assistant;
use crate::error::{MindError, MindResult};
use crate::types::{Analysis, CommitMessage, DiffRequest, Documentation, PathRequest, Review};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Assistant backed by a remote HTTP service.
///
/// Cheaply cloneable; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpAssistant {
    base_url: String,
    api_key: String,
    http: Client,
}

impl HttpAssistant {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> MindResult<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> MindResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> MindResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(endpoint, "assistant request");
        let res = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            let message = res.text().await.unwrap_or_default();
            return Err(MindError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| MindError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HttpAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssistant")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn generate_commit_message(&self, diff: &str) -> MindResult<String> {
        let res: CommitMessage = self.post("/commit/generate", &DiffRequest { diff }).await?;
        Ok(res.message)
    }

    async fn review_code(&self, diff: &str) -> MindResult<Review> {
        self.post("/review", &DiffRequest { diff }).await
    }

    async fn analyze_repository(&self, path: &str) -> MindResult<Analysis> {
        self.post("/analyze", &PathRequest { path }).await
    }

    async fn generate_documentation(&self, path: &str) -> MindResult<Documentation> {
        self.post("/docs/generate", &PathRequest { path }).await
    }
}
