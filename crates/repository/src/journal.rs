//! EventJournal - Bounded history of repository events

use chrono::Utc;
use planner_domain::{ChangeEvent, ChangeKind, Observer};
use serde::{Deserialize, Serialize};
use shared::EntityKind;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub timestamp: String,
    pub kind: ChangeKind,
    pub entity: EntityKind,
    pub entity_id: Option<String>,
}

impl std::fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            ChangeKind::Added => "added",
            ChangeKind::Changed => "changed",
            ChangeKind::Removed => "removed",
            ChangeKind::TypesChanged => "types changed",
            ChangeKind::OperationStarted => "operation started",
            ChangeKind::OperationEnded => "operation ended",
        };
        match &self.entity_id {
            Some(id) => write!(f, "{} {} {}", self.entity, id, kind),
            None => write!(f, "{} {}", self.entity, kind),
        }
    }
}

/// Journal statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalStats {
    pub total_entries: usize,
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
    pub types_changed: usize,
    pub operations: usize,
}

/// Event journal
///
/// Shared between observers of both repositories, hence the interior lock.
#[derive(Debug)]
pub struct EventJournal {
    entries: Mutex<VecDeque<JournalEntry>>,
    max_entries: usize,
}

impl EventJournal {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    /// Record an event, evicting the oldest entry when full
    pub fn record<E: ChangeEvent>(&self, event: &E) {
        self.push(JournalEntry {
            timestamp: Utc::now().to_rfc3339(),
            kind: event.change(),
            entity: event.entity_kind(),
            entity_id: event.entity_id().map(|id| id.to_string()),
        });
    }

    pub fn push(&self, entry: JournalEntry) {
        if self.max_entries == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Observer recording into this journal
    pub fn observer<E: ChangeEvent + 'static>(self: &Arc<Self>) -> Observer<E> {
        let journal = Arc::clone(self);
        Box::new(move |event: &E| journal.record(event))
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<JournalEntry> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> JournalStats {
        let entries = self.lock();
        let count = |kind: ChangeKind| entries.iter().filter(|e| e.kind == kind).count();

        JournalStats {
            total_entries: entries.len(),
            added: count(ChangeKind::Added),
            changed: count(ChangeKind::Changed),
            removed: count(ChangeKind::Removed),
            types_changed: count(ChangeKind::TypesChanged),
            operations: count(ChangeKind::OperationStarted),
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.entries()).unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<JournalEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(1000)
    }
}
