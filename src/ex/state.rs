//! Per-document ex state: options, marks and save status.

use std::collections::BTreeMap;
use std::fmt;

use crate::bounds::Bounds;
use crate::live::BoundsCell;

use super::options::Options;

/// Mark holding the position before the last addressed jump
pub const PREVIOUS_MARK: &str = "'";
/// Mark holding the position after the last command
pub const CURRENT_MARK: &str = "''";

/// Whether the buffer matches what was last persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Clean,
    Dirty,
    /// A write is in flight
    Pending,
    /// The last write failed
    Failed,
}

impl SaveStatus {
    /// Changes exist that were not persisted
    pub fn is_dirty(&self) -> bool {
        !matches!(self, SaveStatus::Clean)
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaveStatus::Clean => "clean",
            SaveStatus::Dirty => "dirty",
            SaveStatus::Pending => "pending",
            SaveStatus::Failed => "failed",
        })
    }
}

/// Ex state private to one document. Registers are shared and live on the
/// session instead.
#[derive(Debug, Default)]
pub struct ExState {
    pub options: Options,
    /// Named bookmarks; each cell is tracked as a live range by the document
    pub(crate) marks: BTreeMap<String, BoundsCell>,
    pub status: SaveStatus,
}

impl ExState {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Raw (unclamped) bounds of a mark
    pub fn mark(&self, name: &str) -> Option<Bounds> {
        self.marks.get(name).map(|cell| cell.get())
    }

    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_status_dirtiness() {
        assert!(!SaveStatus::Clean.is_dirty());
        assert!(SaveStatus::Dirty.is_dirty());
        assert!(SaveStatus::Pending.is_dirty());
        assert!(SaveStatus::Failed.is_dirty());
        assert_eq!(SaveStatus::Pending.to_string(), "pending");
    }
}
