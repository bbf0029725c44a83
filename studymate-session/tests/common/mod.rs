//! Scripted in-process backend for driving the session manager

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use studymate_client::{
    ChatBackend, ChatResponse, DocumentFile, HealthResponse, ResetResponse, ServiceError,
    ServiceResult, StatusCode, StatusResponse, UploadResponse,
};
use studymate_core::config::SessionConfig;
use studymate_core::session::HistoryEntry;
use studymate_core::storage::MemoryStore;
use studymate_session::SessionManager;
use tokio::sync::oneshot;

/// A reply that is either ready or released later by the test
pub enum Scripted<T> {
    Ready(ServiceResult<T>),
    Gated(oneshot::Receiver<ServiceResult<T>>),
}

impl<T> Scripted<T> {
    async fn resolve(self) -> ServiceResult<T> {
        match self {
            Scripted::Ready(result) => result,
            Scripted::Gated(rx) => rx.await.unwrap_or_else(|_| Err(server_error())),
        }
    }
}

pub fn server_error() -> ServiceError {
    ServiceError::HttpStatus {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "HTTP error! status: 500".to_string(),
    }
}

pub fn reply(text: &str) -> ServiceResult<ChatResponse> {
    Ok(ChatResponse {
        response: text.to_string(),
        sources: Vec::new(),
    })
}

pub fn uploaded(name: &str) -> ServiceResult<UploadResponse> {
    Ok(UploadResponse {
        message: format!("PDF '{}' processed successfully", name),
        filename: name.to_string(),
    })
}

pub fn reset_ok() -> ServiceResult<ResetResponse> {
    Ok(ResetResponse {
        message: "Conversation reset successfully".to_string(),
    })
}

#[derive(Default)]
pub struct ScriptedBackend {
    chat: Mutex<VecDeque<Scripted<ChatResponse>>>,
    upload: Mutex<VecDeque<Scripted<UploadResponse>>>,
    reset: Mutex<VecDeque<Scripted<ResetResponse>>>,
    pub chat_calls: Mutex<Vec<(String, Vec<HistoryEntry>)>>,
    pub upload_calls: Mutex<Vec<String>>,
    pub reset_calls: Mutex<usize>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_chat(&self, result: ServiceResult<ChatResponse>) {
        self.chat.lock().push_back(Scripted::Ready(result));
    }

    pub fn gate_chat(&self) -> oneshot::Sender<ServiceResult<ChatResponse>> {
        let (tx, rx) = oneshot::channel();
        self.chat.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn push_upload(&self, result: ServiceResult<UploadResponse>) {
        self.upload.lock().push_back(Scripted::Ready(result));
    }

    pub fn gate_upload(&self) -> oneshot::Sender<ServiceResult<UploadResponse>> {
        let (tx, rx) = oneshot::channel();
        self.upload.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn push_reset(&self, result: ServiceResult<ResetResponse>) {
        self.reset.lock().push_back(Scripted::Ready(result));
    }

    pub fn chat_count(&self) -> usize {
        self.chat_calls.lock().len()
    }

    pub fn upload_count(&self) -> usize {
        self.upload_calls.lock().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_chat_turn(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> ServiceResult<ChatResponse> {
        self.chat_calls
            .lock()
            .push((message.to_string(), history.to_vec()));
        let next = self.chat.lock().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(server_error()),
        }
    }

    async fn upload_document(&self, document: &DocumentFile) -> ServiceResult<UploadResponse> {
        self.upload_calls.lock().push(document.name.clone());
        let next = self.upload.lock().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(server_error()),
        }
    }

    async fn reset_conversation(&self) -> ServiceResult<ResetResponse> {
        *self.reset_calls.lock() += 1;
        let next = self.reset.lock().pop_front();
        match next {
            Some(scripted) => scripted.resolve().await,
            None => Err(server_error()),
        }
    }

    async fn check_health(&self) -> ServiceResult<HealthResponse> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            message: "scripted".to_string(),
        })
    }

    async fn get_status(&self) -> ServiceResult<StatusResponse> {
        Ok(StatusResponse {
            initialized: true,
            has_database: true,
            has_qa_chain: true,
        })
    }
}

pub fn manager_with(
    backend: Arc<ScriptedBackend>,
    store: Arc<MemoryStore>,
    config: &SessionConfig,
) -> SessionManager {
    SessionManager::new(backend, store, config)
}

pub fn manager(backend: Arc<ScriptedBackend>) -> SessionManager {
    manager_with(backend, Arc::new(MemoryStore::new()), &SessionConfig::default())
}

pub fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, b"%PDF-1.4".to_vec())
}
