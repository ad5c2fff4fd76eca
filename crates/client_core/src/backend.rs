//! HTTP surface of the clinic backend consumed by the front desk.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DocumentId, ParsedDocId},
    error::ApiErrorBody,
    protocol::{DocumentRecord, DocumentResponse, QueueEntry, QueueResponse, QueueStats, StatsResponse},
};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::ClientError};

#[async_trait]
pub trait ClinicBackend: Send + Sync {
    async fn get_document(&self, document_id: &DocumentId) -> Result<DocumentRecord, ClientError>;
    /// Raw parsed-document payload; callers decode it with [`crate::normalizer::decode_payload`].
    async fn get_parsed_document(
        &self,
        parsed_doc_id: &ParsedDocId,
    ) -> Result<serde_json::Value, ClientError>;
    async fn extract_document(&self, document_id: &DocumentId) -> Result<(), ClientError>;
    async fn current_queue(&self) -> Result<Vec<QueueEntry>, ClientError>;
    async fn queue_stats(&self) -> Result<QueueStats, ClientError>;
}

pub struct HttpClinicBackend {
    http: Client,
    base_url: Url,
}

impl HttpClinicBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(&settings.api_base_url)
            .map_err(|err| ClientError::Endpoint(format!("{}: {err}", settings.api_base_url)))?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::Transport {
                path: base_url.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        debug!(%path, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(&path, err))?;
        let response = check_status(&path, response).await?;
        response.json::<T>().await.map_err(|err| ClientError::Decode {
            path,
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl ClinicBackend for HttpClinicBackend {
    async fn get_document(&self, document_id: &DocumentId) -> Result<DocumentRecord, ClientError> {
        let body: DocumentResponse = self
            .get_json(&["api", "gp", "documents", document_id.as_str()])
            .await?;
        Ok(body.document)
    }

    async fn get_parsed_document(
        &self,
        parsed_doc_id: &ParsedDocId,
    ) -> Result<serde_json::Value, ClientError> {
        self.get_json(&["api", "gp", "parsed-document", parsed_doc_id.as_str()])
            .await
    }

    async fn extract_document(&self, document_id: &DocumentId) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "gp", "documents", document_id.as_str(), "extract"])?;
        let path = url.path().to_string();
        debug!(%path, "POST");
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|err| transport_error(&path, err))?;
        check_status(&path, response).await?;
        Ok(())
    }

    async fn current_queue(&self) -> Result<Vec<QueueEntry>, ClientError> {
        let body: QueueResponse = self.get_json(&["api", "queue", "current"]).await?;
        Ok(body.queue)
    }

    async fn queue_stats(&self) -> Result<QueueStats, ClientError> {
        let body: StatsResponse = self.get_json(&["api", "queue", "stats"]).await?;
        Ok(body.stats)
    }
}

fn transport_error(path: &str, err: reqwest::Error) -> ClientError {
    ClientError::Transport {
        path: path.to_string(),
        message: err.to_string(),
    }
}

/// Maps a non-2xx response to [`ClientError::Http`], keeping the body's `detail`.
async fn check_status(path: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .text()
        .await
        .ok()
        .and_then(|text| serde_json::from_str::<ApiErrorBody>(&text).ok())
        .and_then(|body| body.detail_message());

    Err(ClientError::Http {
        path: path.to_string(),
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
