//! Deduplicated, capacity-bounded notification list.

use std::collections::VecDeque;

use tracing;

use super::model::{AlertItem, Notification, NotificationId};

/// Default number of retained notifications.
pub const DEFAULT_CAPACITY: usize = 50;

/// Result of ingesting a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new entry was added at the front.
    Inserted(NotificationId),
    /// An entry with the same fingerprint was refreshed and moved to the front.
    Merged(NotificationId),
    /// A new entry was added and the oldest one dropped to respect capacity.
    InsertedWithEviction {
        /// The new entry.
        inserted: NotificationId,
        /// The dropped entry.
        evicted: NotificationId,
    },
}

/// Most-recently-updated-first list with at most one entry per fingerprint.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    entries: VecDeque<Notification>,
    capacity: usize,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationStore {
    /// Create an empty store. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a candidate, or merge it into the entry sharing its fingerprint.
    ///
    /// A merge keeps the existing id, takes the candidate's timestamp and
    /// items, and marks the entry unread again.
    pub fn ingest(&mut self, candidate: Notification) -> IngestOutcome {
        let existing = self
            .entries
            .iter()
            .position(|n| n.fingerprint == candidate.fingerprint)
            .and_then(|pos| self.entries.remove(pos));

        if let Some(mut entry) = existing {
            entry.occurred_at = candidate.occurred_at;
            entry.items = candidate.items;
            entry.read = false;
            let id = entry.id;
            self.entries.push_front(entry);
            tracing::trace!("Merged notification {} ({})", id, candidate.fingerprint);
            return IngestOutcome::Merged(id);
        }

        let id = candidate.id;
        self.entries.push_front(candidate);

        if self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::debug!("Notification list full, evicted {}", evicted.id);
                return IngestOutcome::InsertedWithEviction {
                    inserted: id,
                    evicted: evicted.id,
                };
            }
        }
        IngestOutcome::Inserted(id)
    }

    /// Mark a notification as read.
    ///
    /// Returns `true` only if the entry existed and was unread.
    pub fn mark_as_read(&mut self, id: NotificationId) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) if !entry.read => {
                entry.read = true;
                true
            }
            _ => false,
        }
    }

    /// Mark every notification as read, returning how many changed.
    pub fn mark_all_as_read(&mut self) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|n| !n.read) {
            entry.read = true;
            changed += 1;
        }
        changed
    }

    /// Remove every notification.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Look up a notification by id.
    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    /// Notifications, most recently updated first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// Owned copy of the list, most recently updated first.
    pub fn to_vec(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    /// Every payload item across all notifications, in list order.
    pub fn alert_items(&self) -> Vec<AlertItem> {
        self.entries
            .iter()
            .flat_map(|n| n.items.iter().cloned())
            .collect()
    }

    /// Number of retained notifications.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained notifications.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
