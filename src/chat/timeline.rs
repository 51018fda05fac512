// Local conversation view with optimistic sends.
//
// A sent message shows up as pending straight away. It is confirmed when
// the store accepts it and removed if the store rejects it, so the view
// never keeps a row that was not persisted.

use super::models::{Message, Scope};

/// Handle for a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Pending {
        local: LocalId,
        sender_id: String,
        content: String,
        is_toxic: bool,
    },
    Confirmed(Message),
}

impl Entry {
    pub fn content(&self) -> &str {
        match self {
            Entry::Pending { content, .. } => content,
            Entry::Confirmed(message) => &message.content,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Entry::Pending { .. })
    }
}

pub struct Timeline {
    scope: Scope,
    entries: Vec<Entry>,
    next_local: u64,
}

impl Timeline {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            entries: Vec::new(),
            next_local: 0,
        }
    }

    /// Start from stored history.
    pub fn with_history(scope: Scope, history: Vec<Message>) -> Self {
        let mut timeline = Self::new(scope);
        for message in history {
            timeline.apply_remote(message);
        }
        timeline
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_pending(&mut self, sender_id: &str, content: &str, is_toxic: bool) -> LocalId {
        let local = LocalId(self.next_local);
        self.next_local += 1;
        self.entries.push(Entry::Pending {
            local,
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            is_toxic,
        });
        local
    }

    /// Replace a pending entry with the stored row. If realtime delivery
    /// already added that row, the pending entry is just dropped.
    pub fn confirm(&mut self, local: LocalId, message: Message) {
        let Some(index) = self.position(local) else {
            return;
        };
        if self.contains_id(message.id) {
            self.entries.remove(index);
        } else {
            self.entries[index] = Entry::Confirmed(message);
        }
    }

    /// Remove a pending entry the store rejected.
    pub fn rollback(&mut self, local: LocalId) {
        if let Some(index) = self.position(local) {
            self.entries.remove(index);
        }
    }

    /// Add a pushed row. Returns false for rows outside the scope or
    /// already shown.
    pub fn apply_remote(&mut self, message: Message) -> bool {
        if !self.scope.matches(&message) || self.contains_id(message.id) {
            return false;
        }
        self.entries.push(Entry::Confirmed(message));
        true
    }

    fn position(&self, local: LocalId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, Entry::Pending { local: l, .. } if *l == local))
    }

    fn contains_id(&self, id: i64) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, Entry::Confirmed(m) if m.id == id))
    }
}
