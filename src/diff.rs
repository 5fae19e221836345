//! Minimal changed-region computation between two text snapshots.
//!
//! A surface only ever tells us "the text is now X". Everything downstream
//! (live ranges, undo history, observers) wants to know *where* it changed, so
//! this module trims the common prefix and suffix and reports what remains.

use crate::util::text::char_len;

/// The contiguous region that differs between two snapshots, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextChange {
    /// Char offset where the change starts
    pub start: usize,
    /// Text removed at `start` (empty for pure inserts)
    pub old_text: String,
    /// Text inserted at `start` (empty for pure deletes)
    pub new_text: String,
    /// Both snapshots were identical
    pub unchanged: bool,
}

impl TextChange {
    pub fn new(start: usize, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            start,
            old_text: old_text.into(),
            new_text: new_text.into(),
            unchanged: false,
        }
    }

    /// A no-op change
    pub fn unchanged() -> Self {
        Self {
            unchanged: true,
            ..Self::default()
        }
    }

    pub fn old_len(&self) -> usize {
        char_len(&self.old_text)
    }

    pub fn new_len(&self) -> usize {
        char_len(&self.new_text)
    }

    /// Exclusive end of the replaced region in the old text
    pub fn old_end(&self) -> usize {
        self.start + self.old_len()
    }

    /// Exclusive end of the inserted region in the new text
    pub fn new_end(&self) -> usize {
        self.start + self.new_len()
    }

    /// Pure insertion (nothing removed)
    pub fn is_insertion(&self) -> bool {
        !self.unchanged && self.old_text.is_empty() && !self.new_text.is_empty()
    }

    /// Apply this change to `text`, replacing `old_text` at `start` with `new_text`
    pub fn apply(&self, text: &str) -> String {
        if self.unchanged {
            return text.to_string();
        }
        let chars: Vec<char> = text.chars().collect();
        let start = self.start.min(chars.len());
        let end = self.old_end().min(chars.len());
        let mut out = String::with_capacity(text.len() + self.new_text.len());
        out.extend(&chars[..start]);
        out.push_str(&self.new_text);
        out.extend(&chars[end..]);
        out
    }

    /// The change that undoes this one
    pub fn inverse(&self) -> Self {
        Self {
            start: self.start,
            old_text: self.new_text.clone(),
            new_text: self.old_text.clone(),
            unchanged: self.unchanged,
        }
    }
}

/// Compute the minimal changed region between two snapshots.
///
/// Identical inputs yield [`TextChange::unchanged`] with `start == 0`.
pub fn diff(old: &str, new: &str) -> TextChange {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    diff_chars(&old_chars, &new_chars)
}

fn diff_chars(old: &[char], new: &[char]) -> TextChange {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    if prefix == old.len() && prefix == new.len() {
        return TextChange::unchanged();
    }

    // Suffix may not eat into the prefix on either side
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    TextChange::new(
        prefix,
        old[prefix..old.len() - suffix].iter().collect::<String>(),
        new[prefix..new.len() - suffix].iter().collect::<String>(),
    )
}

/// Like [`diff`], but uses the caret reported by the surface to place pure
/// insertions and deletions that prefix/suffix trimming alone cannot locate.
///
/// Typing `a` into `aaa` at offset 1 trims to an insertion at offset 3. The
/// caret (after the insertion, at 2) tells us the edit really happened at 1.
/// For deletions the caret sits at the deletion point.
pub fn diff_with_caret(old: &str, new: &str, caret: usize) -> TextChange {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let change = diff_chars(&old_chars, &new_chars);

    if change.unchanged || (!change.old_text.is_empty() && !change.new_text.is_empty()) {
        return change;
    }

    if change.old_text.is_empty() {
        let len = change.new_len();
        let Some(start) = caret.checked_sub(len) else {
            return change;
        };
        if start != change.start
            && start <= old_chars.len()
            && start + len <= new_chars.len()
            && old_chars[..start] == new_chars[..start]
            && old_chars[start..] == new_chars[start + len..]
        {
            tracing::trace!(trimmed = change.start, caret, "insertion relocated to caret");
            return TextChange::new(
                start,
                String::new(),
                new_chars[start..start + len].iter().collect::<String>(),
            );
        }
    } else {
        let len = change.old_len();
        let start = caret;
        if start != change.start
            && start + len <= old_chars.len()
            && start <= new_chars.len()
            && old_chars[..start] == new_chars[..start]
            && old_chars[start + len..] == new_chars[start..]
        {
            tracing::trace!(trimmed = change.start, caret, "deletion relocated to caret");
            return TextChange::new(
                start,
                old_chars[start..start + len].iter().collect::<String>(),
                String::new(),
            );
        }
    }

    change
}
