//! reqwest-backed implementation of [`ChatBackend`]

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use studymate_core::config::BackendConfig;
use studymate_core::session::HistoryEntry;
use tracing::{debug, error};

use crate::base::{
    ChatBackend, ChatRequest, ChatResponse, HealthResponse, ResetResponse, ServiceError,
    ServiceResult, StatusResponse, UploadResponse,
};
use crate::document::DocumentFile;

const UPLOAD_FIELD: &str = "file";
const PDF_MIME: &str = "application/pdf";

/// HTTP client for the question-answering backend.
///
/// Chat, reset, health and status go through `api_base`; uploads go through
/// `upload_base`, which may point at a different host.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_base: String,
    upload_base: String,
}

impl ApiClient {
    /// Create a client without a request timeout
    pub fn new(api_base: impl Into<String>, upload_base: Option<String>) -> Self {
        Self::with_client(Client::new(), api_base.into(), upload_base)
    }

    /// Create a client from the backend section of the configuration
    pub fn from_config(config: &BackendConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().unwrap_or_else(|e| {
            error!("Failed to build HTTP client, using defaults: {}", e);
            Client::new()
        });

        Self::with_client(
            client,
            config.api_base.clone(),
            Some(config.effective_upload_base().to_string()),
        )
    }

    fn with_client(client: Client, api_base: String, upload_base: Option<String>) -> Self {
        let api_base = api_base.trim_end_matches('/').to_string();
        let upload_base = upload_base
            .filter(|base| !base.trim().is_empty())
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| api_base.clone());

        Self {
            client,
            api_base,
            upload_base,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn upload_base(&self) -> &str {
        &self.upload_base
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base, endpoint)
    }

    /// Send an API-prefix request and decode its JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> ServiceResult<T> {
        debug!("Sending request to {}{}", self.api_base, endpoint);

        let response = request.send().await.map_err(|e| {
            error!("API request to {} failed: {}", endpoint, e);
            ServiceError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("API request to {} returned {}", endpoint, status);
            return Err(ServiceError::HttpStatus {
                status,
                message: format!("HTTP error! status: {}", status.as_u16()),
            });
        }

        response.json::<T>().await.map_err(|e| {
            error!("API response from {} could not be read: {}", endpoint, e);
            ServiceError::from(e)
        })
    }
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn send_chat_turn(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> ServiceResult<ChatResponse> {
        let payload = ChatRequest {
            message,
            chat_history: history,
        };
        let request = self.client.post(self.api_url("/chat")).json(&payload);
        self.send_json("/chat", request).await
    }

    async fn upload_document(&self, document: &DocumentFile) -> ServiceResult<UploadResponse> {
        let url = format!("{}/upload-pdf", self.upload_base);
        debug!(
            "Uploading {} ({} bytes) to {}",
            document.name,
            document.bytes.len(),
            url
        );

        let part = Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(PDF_MIME)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload of {} failed: {}", document.name, e);
                ServiceError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Upload of {} returned {}: {}", document.name, status, detail);
            return Err(ServiceError::HttpStatus {
                status,
                message: format!("Upload failed: {}", status_text(status)),
            });
        }

        Ok(response.json().await?)
    }

    async fn reset_conversation(&self) -> ServiceResult<ResetResponse> {
        let request = self.client.post(self.api_url("/reset-conversation"));
        self.send_json("/reset-conversation", request).await
    }

    async fn check_health(&self) -> ServiceResult<HealthResponse> {
        let request = self.client.get(self.api_url("/health"));
        self.send_json("/health", request).await
    }

    async fn get_status(&self) -> ServiceResult<StatusResponse> {
        let request = self.client.get(self.api_url("/status"));
        self.send_json("/status", request).await
    }
}
