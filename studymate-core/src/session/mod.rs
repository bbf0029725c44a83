//! Conversation transcript types
//!
//! The transcript lives only in memory for the lifetime of a session; it is
//! never persisted.

pub mod store;

pub use store::{ChatMessage, DeliveryStatus, HistoryEntry, MessageIdGenerator, Role, Transcript};
