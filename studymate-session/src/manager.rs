//! Session state manager

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use studymate_client::{ChatBackend, DocumentFile, ServiceResult};
use studymate_core::config::SessionConfig;
use studymate_core::session::{
    ChatMessage, DeliveryStatus, MessageIdGenerator, Role, Transcript,
};
use studymate_core::storage::KeyValueStore;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::notify::{Notification, Notifier};
use crate::recent::RecentDocuments;

/// How an operation ended. Failures are already reported through a
/// notification by the time the caller sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend call succeeded and its result was applied
    Completed,
    /// Nothing to do (blank message)
    Ignored,
    /// Refused before contacting the backend
    Rejected,
    /// The backend call failed
    Failed,
    /// Aborted before its result arrived; nothing was applied
    Cancelled,
}

/// Point-in-time copy of everything the presentation layer reads
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub is_processing_document: bool,
    pub active_document_name: Option<String>,
    pub recent_documents: Vec<String>,
}

/// Identifies the lifecycle a request was issued in
struct Ticket {
    epoch: u64,
    token: CancellationToken,
}

/// Generation counter for one kind of request
struct Lifecycle {
    epoch: u64,
    cancel: CancellationToken,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            epoch: 0,
            cancel: CancellationToken::new(),
        }
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            token: self.cancel.clone(),
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.epoch == ticket.epoch
    }

    /// Abort every request issued so far and start a new generation
    fn invalidate(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.epoch += 1;
    }
}

struct SessionState {
    transcript: Transcript,
    chats_in_flight: usize,
    uploads_in_flight: usize,
    active_document: Option<String>,
    recent: RecentDocuments,
    /// Chat turns and resets; ended by `clear_chat` and a successful reset
    chats: Lifecycle,
    /// Uploads; only `cancel_pending` ends these
    uploads: Lifecycle,
}

/// Owns the conversation state of one client session.
///
/// All mutation goes through the operations below. State sits behind a
/// mutex that is never held across an await, so several operations may be
/// in flight at once; their results are applied in arrival order. Chat
/// turns issued before `clear_chat` or a successful reset are aborted and
/// their late replies dropped. Uploads outlive both, since the backend keeps
/// the document; only `cancel_pending` aborts them.
pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    notifier: Notifier,
    ids: MessageIdGenerator,
    include_history: bool,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// Create a session, seeding the recent-document list from `store`
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn KeyValueStore>,
        config: &SessionConfig,
    ) -> Self {
        let recent = RecentDocuments::load(store, config.recent_limit);

        Self {
            backend,
            notifier: Notifier::new(config.notification_capacity),
            ids: MessageIdGenerator::new(),
            include_history: config.include_history,
            state: Mutex::new(SessionState {
                transcript: Transcript::new(),
                chats_in_flight: 0,
                uploads_in_flight: 0,
                active_document: None,
                recent,
                chats: Lifecycle::new(),
                uploads: Lifecycle::new(),
            }),
        }
    }

    /// Listen for notifications emitted from now on
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().transcript.messages().to_vec()
    }

    /// True while at least one chat turn is in flight
    pub fn is_loading(&self) -> bool {
        self.state.lock().chats_in_flight > 0
    }

    /// True while at least one upload is in flight
    pub fn is_processing_document(&self) -> bool {
        self.state.lock().uploads_in_flight > 0
    }

    pub fn active_document_name(&self) -> Option<String> {
        self.state.lock().active_document.clone()
    }

    pub fn recent_documents(&self) -> Vec<String> {
        self.state.lock().recent.names().to_vec()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            messages: state.transcript.messages().to_vec(),
            is_loading: state.chats_in_flight > 0,
            is_processing_document: state.uploads_in_flight > 0,
            active_document_name: state.active_document.clone(),
            recent_documents: state.recent.names().to_vec(),
        }
    }

    /// Send one chat turn.
    ///
    /// The user message is appended as `Pending` before the request starts
    /// and stays in the transcript whatever happens; it becomes `Sent` with
    /// the reply or `Failed` with an error notification.
    pub async fn send_message(&self, text: &str) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Ignored;
        }

        let (message_id, history, ticket) = {
            let mut state = self.state.lock();
            let history = if self.include_history {
                state.transcript.history()
            } else {
                Vec::new()
            };
            let message = ChatMessage::pending(self.ids.next_id(), text);
            let message_id = message.id.clone();
            state.transcript.push(message);
            state.chats_in_flight += 1;
            (message_id, history, state.chats.ticket())
        };

        debug!("Sending chat turn {}", message_id);
        let result = run_until_cancelled(
            &ticket,
            self.backend.send_chat_turn(text, &history),
        )
        .await;

        let mut state = self.state.lock();
        state.chats_in_flight = state.chats_in_flight.saturating_sub(1);

        let Some(result) = result.filter(|_| state.chats.is_current(&ticket)) else {
            debug!("Discarding chat turn {} from a previous lifecycle", message_id);
            return Outcome::Cancelled;
        };

        match result {
            Ok(reply) => {
                state.transcript.set_status(&message_id, DeliveryStatus::Sent);
                state.transcript.push(ChatMessage::new(
                    self.ids.next_id(),
                    Role::Assistant,
                    reply.response,
                ));
                Outcome::Completed
            }
            Err(e) => {
                error!("Error sending message: {}", e);
                state
                    .transcript
                    .set_status(&message_id, DeliveryStatus::Failed);
                drop(state);
                self.notifier.notify(Notification::error(
                    "Error",
                    "Failed to send message. Please try again.",
                ));
                Outcome::Failed
            }
        }
    }

    /// Upload a PDF and make it the active document.
    ///
    /// Names not ending in `.pdf` (any case) are rejected without contacting
    /// the backend. On success the name is prepended to the recent list and
    /// a system message is appended; on failure prior state is untouched.
    pub async fn upload_document(&self, document: DocumentFile) -> Outcome {
        if !document.is_pdf() {
            info!("Rejecting non-PDF upload {}", document.name);
            self.notifier.notify(Notification::error(
                "Invalid file type",
                "Please upload a PDF file.",
            ));
            return Outcome::Rejected;
        }

        let ticket = {
            let mut state = self.state.lock();
            state.uploads_in_flight += 1;
            state.uploads.ticket()
        };

        let result = run_until_cancelled(&ticket, self.backend.upload_document(&document)).await;

        let mut state = self.state.lock();
        state.uploads_in_flight = state.uploads_in_flight.saturating_sub(1);

        let Some(result) = result.filter(|_| state.uploads.is_current(&ticket)) else {
            debug!("Discarding upload of {} from a previous lifecycle", document.name);
            return Outcome::Cancelled;
        };

        match result {
            Ok(reply) => {
                info!("Uploaded {} (stored as {})", document.name, reply.filename);
                state.active_document = Some(document.name.clone());
                state.recent.push_front(document.name.clone());
                state.transcript.push(ChatMessage::new(
                    self.ids.next_id(),
                    Role::System,
                    format!(
                        "PDF file {} has been uploaded and processed. You can now ask questions about its contents.",
                        document.name
                    ),
                ));
                drop(state);
                self.notifier.notify(Notification::success(
                    "PDF uploaded successfully",
                    format!(
                        "{} has been processed and is ready for questions.",
                        document.name
                    ),
                ));
                Outcome::Completed
            }
            Err(e) => {
                error!("Error uploading PDF {}: {}", document.name, e);
                drop(state);
                self.notifier.notify(Notification::error(
                    "Error",
                    "Failed to upload PDF. Please try again.",
                ));
                Outcome::Failed
            }
        }
    }

    /// Empty the transcript and forget the active document.
    ///
    /// Local only: the backend is not contacted and the recent list is kept.
    /// Chat turns still in flight are aborted; uploads are not.
    pub fn clear_chat(&self) {
        let mut state = self.state.lock();
        state.transcript.clear();
        state.active_document = None;
        state.chats.invalidate();
        debug!("Chat cleared");
    }

    /// Ask the backend to forget the conversation, then empty the transcript.
    ///
    /// On success chat turns still in flight are aborted. On failure the
    /// transcript is left untouched.
    pub async fn reset_conversation(&self) -> Outcome {
        let ticket = self.state.lock().chats.ticket();

        let result = run_until_cancelled(&ticket, self.backend.reset_conversation()).await;

        let mut state = self.state.lock();
        let Some(result) = result.filter(|_| state.chats.is_current(&ticket)) else {
            debug!("Discarding reset from a previous lifecycle");
            return Outcome::Cancelled;
        };

        match result {
            Ok(reply) => {
                info!("Conversation reset: {}", reply.message);
                state.transcript.clear();
                state.chats.invalidate();
                drop(state);
                self.notifier.notify(Notification::success(
                    "Conversation reset",
                    "Chat history has been cleared.",
                ));
                Outcome::Completed
            }
            Err(e) => {
                error!("Error resetting conversation: {}", e);
                drop(state);
                self.notifier.notify(Notification::error(
                    "Reset failed",
                    "Failed to reset conversation. Please try again.",
                ));
                Outcome::Failed
            }
        }
    }

    /// Record a document name without uploading it
    pub fn add_recent_search(&self, name: impl Into<String>) {
        self.state.lock().recent.push_front(name);
    }

    /// Forget every recent document name, in memory and in storage
    pub fn clear_recent_documents(&self) {
        self.state.lock().recent.clear();
    }

    /// Abort every in-flight request, uploads included, without clearing anything.
    ///
    /// User messages still waiting for a reply are marked `Failed`.
    pub fn cancel_pending(&self) {
        let mut state = self.state.lock();
        let failed = state.transcript.fail_pending();
        state.chats.invalidate();
        state.uploads.invalidate();
        debug!("Cancelled pending requests ({} unanswered messages)", failed);
    }
}

/// Drive `request` unless the ticket's lifecycle ends first
async fn run_until_cancelled<T>(
    ticket: &Ticket,
    request: impl Future<Output = ServiceResult<T>>,
) -> Option<ServiceResult<T>> {
    tokio::select! {
        biased;
        _ = ticket.token.cancelled() => None,
        result = request => Some(result),
    }
}
