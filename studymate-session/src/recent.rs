//! Persisted list of recently uploaded documents

use std::sync::Arc;
use studymate_core::storage::KeyValueStore;
use tracing::{debug, warn};

/// Storage key holding the JSON-encoded list
pub const RECENT_DOCUMENTS_KEY: &str = "recent_documents";

/// Most-recent-first document names, capped and mirrored to a durable store.
///
/// The list is read once on construction and rewritten in full on every
/// change. Names are not de-duplicated.
pub struct RecentDocuments {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
    names: Vec<String>,
}

impl RecentDocuments {
    /// Seed the list from `store`; unreadable data yields an empty list
    pub fn load(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        let limit = limit.max(1);
        let mut names = match store.get(RECENT_DOCUMENTS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed recent documents list: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read recent documents: {}", e);
                Vec::new()
            }
        };
        names.truncate(limit);
        debug!("Loaded {} recent documents", names.len());

        Self {
            store,
            limit,
            names,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Prepend a name, evicting the oldest entries past the limit
    pub fn push_front(&mut self, name: impl Into<String>) {
        self.names.insert(0, name.into());
        self.names.truncate(self.limit);
        self.persist();
    }

    /// Forget every name, both in memory and in the store
    pub fn clear(&mut self) {
        self.names.clear();
        if let Err(e) = self.store.remove(RECENT_DOCUMENTS_KEY) {
            warn!("Failed to remove recent documents: {}", e);
        }
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string(&self.names) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode recent documents: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(RECENT_DOCUMENTS_KEY, &encoded) {
            warn!("Failed to persist recent documents: {}", e);
        }
    }
}
