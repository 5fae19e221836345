//! Edit history (undo/redo) fed by document change notifications.

use std::fmt;

use tracing::trace;

use crate::diff::TextChange;

/// What produced a change. Undo and redo tag their own edits so the history
/// does not record them again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditKind {
    /// Plain typing
    InsertText,
    InsertFromPaste,
    DeleteBackward,
    DeleteForward,
    /// Programmatic replacement through a range
    #[default]
    Replace,
    /// Edit performed by an ex command
    Command,
    HistoryUndo,
    HistoryRedo,
}

impl EditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::InsertText => "insertText",
            EditKind::InsertFromPaste => "insertFromPaste",
            EditKind::DeleteBackward => "deleteContentBackward",
            EditKind::DeleteForward => "deleteContentForward",
            EditKind::Replace => "insertReplacementText",
            EditKind::Command => "command",
            EditKind::HistoryUndo => "historyUndo",
            EditKind::HistoryRedo => "historyRedo",
        }
    }

    /// Edits replayed from the history itself
    pub fn is_history(&self) -> bool {
        matches!(self, EditKind::HistoryUndo | EditKind::HistoryRedo)
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub kind: EditKind,
    pub change: TextChange,
}

impl EditRecord {
    /// Can `next` be folded into this record? Only single-char typing that
    /// continues exactly where the previous typing ended.
    fn absorbs(&self, kind: EditKind, next: &TextChange) -> bool {
        kind == EditKind::InsertText
            && self.kind == EditKind::InsertText
            && self.change.old_text.is_empty()
            && next.old_text.is_empty()
            && next.new_len() == 1
            && self.change.new_end() == next.start
    }
}

/// Bounded back/forward list of edit records.
///
/// `position` is 1-indexed: 0 means "at the origin, nothing to undo", and
/// `states[position - 1]` is the most recently applied record.
#[derive(Debug, Clone)]
pub struct EditHistory {
    states: Vec<EditRecord>,
    position: usize,
    max_depth: usize,
    /// Set after undo/redo so the next typing starts a new entry
    sealed: bool,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    /// Create a new edit history with default max depth
    pub fn new() -> Self {
        Self::with_max_depth(100)
    }

    /// Create a new edit history with specified max depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            states: Vec::new(),
            position: 0,
            max_depth: max_depth.max(1),
            sealed: false,
        }
    }

    /// Record a change. Unchanged diffs and history replays are ignored;
    /// anything recorded discards the redo tail.
    pub fn push(&mut self, kind: EditKind, change: &TextChange) {
        if change.unchanged || kind.is_history() {
            return;
        }
        self.states.truncate(self.position);

        if !self.sealed {
            if let Some(last) = self.states.last_mut() {
                if last.absorbs(kind, change) {
                    last.change.new_text.push_str(&change.new_text);
                    trace!(text = %last.change.new_text, "coalesced typing");
                    return;
                }
            }
        }

        self.states.push(EditRecord {
            kind,
            change: change.clone(),
        });
        while self.states.len() > self.max_depth {
            self.states.remove(0);
        }
        self.position = self.states.len();
        self.sealed = false;
    }

    /// Step back; returns the record to revert, `None` at the origin
    pub fn back(&mut self) -> Option<&EditRecord> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.sealed = true;
        self.states.get(self.position)
    }

    /// Step forward; returns the record to re-apply, `None` at the end
    pub fn forward(&mut self) -> Option<&EditRecord> {
        if self.position == self.states.len() {
            return None;
        }
        self.position += 1;
        self.sealed = true;
        self.states.get(self.position - 1)
    }

    /// The most recently applied record
    pub fn state(&self) -> Option<&EditRecord> {
        self.position.checked_sub(1).and_then(|i| self.states.get(i))
    }

    /// 1-indexed position, 0 at the origin
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.states.len()
    }

    /// Force the next edit into a new entry
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.states.clear();
        self.position = 0;
        self.sealed = false;
    }
}
