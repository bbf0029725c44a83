//! Remote service client for studymate
//!
//! Stateless wrapper around the backend's HTTP API. Every call is an
//! independent request; transport and status failures are normalized into
//! [`ServiceError`].

pub mod base;
pub mod document;
pub mod http;

pub use base::{
    ChatBackend, ChatRequest, ChatResponse, HealthResponse, ResetResponse, ServiceError,
    ServiceResult, StatusResponse, UploadResponse,
};
pub use document::DocumentFile;
pub use http::ApiClient;
pub use reqwest::StatusCode;
