//! Conversation session manager
//!
//! Owns the transcript, loading flags, active document and the persisted
//! list of recently uploaded documents, and coordinates calls to the remote
//! backend. Presentation code reads state through [`SessionManager`] and
//! listens for [`Notification`]s; failures never surface as errors.

pub mod manager;
pub mod notify;
pub mod recent;

pub use manager::{Outcome, SessionManager, SessionSnapshot};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use recent::{RecentDocuments, RECENT_DOCUMENTS_KEY};
