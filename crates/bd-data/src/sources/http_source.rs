//! HTTP client for the breakdown API

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DataAccess;
use crate::config::ClientConfig;
use crate::model::{DataSource, ExplorerPage, InsightsSnapshot, SourceId};
use crate::{DataError, Result};

/// Every endpoint wraps its payload in `{ "status": "ok", "data": ... }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct AnnotationRequest<'a> {
    file_id: &'a str,
    column_name: &'a str,
}

/// Data access over HTTP
pub struct HttpSource {
    http: Client,
    base_url: String,
}

impl HttpSource {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::NetworkFailure(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(path, response).await
    }

    /// Map the status code, then unwrap the envelope
    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.chars().take(200).collect::<String>();
            warn!("{} failed with {}: {}", path, status, detail);
            return Err(Self::status_error(status, detail));
        }

        let envelope: Envelope<T> = response.json().await?;
        if envelope.status != "ok" {
            return Err(DataError::NetworkFailure(format!(
                "{} answered with status '{}'",
                path, envelope.status
            )));
        }

        envelope
            .data
            .ok_or_else(|| DataError::NetworkFailure(format!("{} returned no data", path)))
    }

    fn status_error(status: StatusCode, detail: String) -> DataError {
        match status {
            StatusCode::NOT_FOUND => DataError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                DataError::InvalidRequest(detail)
            }
            _ => DataError::NetworkFailure(format!("{}: {}", status, detail)),
        }
    }
}

#[async_trait]
impl DataAccess for HttpSource {
    async fn list_sources(&self) -> Result<Vec<DataSource>> {
        self.get("/files/list").await
    }

    async fn fetch_rows(&self, id: &SourceId, skip: usize, limit: usize) -> Result<ExplorerPage> {
        self.get(&format!("/files/{}/rows?skip={}&limit={}", id, skip, limit))
            .await
    }

    async fn fetch_insights(&self, id: &SourceId) -> Result<InsightsSnapshot> {
        self.get(&format!("/files/{}/insights", id)).await
    }

    async fn request_annotation(&self, id: &SourceId, column: &str) -> Result<String> {
        let path = "/ask-gpt";
        debug!("POST {} ({}, {})", path, id, column);
        let response = self
            .http
            .post(self.url(path))
            .json(&AnnotationRequest {
                file_id: id.as_str(),
                column_name: column,
            })
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<DataSource> {
        let path = "/files/upload";
        let part = multipart::Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);

        debug!("POST {} ({})", path, filename);
        let response = self.http.post(self.url(path)).multipart(form).send().await?;
        Self::decode(path, response).await
    }

    async fn delete(&self, id: &SourceId) -> Result<()> {
        let path = format!("/files/{}", id);
        debug!("DELETE {}", path);
        let response = self.http.delete(self.url(&path)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }
        Ok(())
    }

    fn source_name(&self) -> &str {
        &self.base_url
    }
}
