//! Backend contract: payloads, errors and the client trait

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use studymate_core::session::HistoryEntry;
use thiserror::Error;

use crate::document::DocumentFile;

/// Error type for backend calls
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never completed (connection refused, reset, timeout, ...)
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{message}")]
    HttpStatus { status: StatusCode, message: String },

    /// A success response whose body is not the documented payload
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Status code if the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else {
            ServiceError::Transport(e)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub chat_history: &'a [HistoryEntry],
}

/// Answer to a chat turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Confirmation of a processed upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Backend initialization flags
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub initialized: bool,
    pub has_database: bool,
    pub has_qa_chain: bool,
}

/// Operations the session manager needs from the backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask a question, optionally with prior turns
    async fn send_chat_turn(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> ServiceResult<ChatResponse>;

    /// Upload a document for indexing
    async fn upload_document(&self, document: &DocumentFile) -> ServiceResult<UploadResponse>;

    /// Drop the backend's conversation memory
    async fn reset_conversation(&self) -> ServiceResult<ResetResponse>;

    /// Liveness probe
    async fn check_health(&self) -> ServiceResult<HealthResponse>;

    /// Initialization probe
    async fn get_status(&self) -> ServiceResult<StatusResponse>;
}
