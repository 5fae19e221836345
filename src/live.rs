//! Live ranges: bounds that follow the text as it is edited.
//!
//! A live range shares its bounds cell with the tracker through a weak
//! reference. The tracker never keeps a range alive, but it does keep the
//! registration slot until the range is explicitly untracked (dead slots are
//! pruned on the next rebase).

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::bounds::Bounds;
use crate::diff::TextChange;

/// Shared bounds storage of a range
pub type BoundsCell = Rc<Cell<Bounds>>;

/// Move `bounds` across `change`.
///
/// An endpoint before the edit stays put and one after it shifts by the size
/// delta. An endpoint inside the replaced region snaps: the start forward to
/// the end of the new text, the end back to the edit start. A range whose
/// interior is entirely replaced therefore collapses to a point.
pub fn rebase(bounds: Bounds, change: &TextChange) -> Bounds {
    if change.unchanged {
        return bounds;
    }
    let start = change.start;
    let old_end = change.old_end();
    let new_end = change.new_end();
    let shift = |at: usize| at - old_end + new_end;

    let b0 = if bounds.start <= start {
        bounds.start
    } else if bounds.start > old_end {
        shift(bounds.start)
    } else {
        new_end
    };

    let b1 = if bounds.end < start {
        bounds.end
    } else if bounds.end >= old_end {
        shift(bounds.end)
    } else {
        start
    };

    Bounds::new(b0, b1)
}

/// Per-document set of tracked ranges.
#[derive(Debug, Default)]
pub struct LiveRangeSet {
    entries: Vec<Weak<Cell<Bounds>>>,
}

impl LiveRangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a bounds cell. Tracking the same cell twice is a no-op.
    pub fn track(&mut self, cell: &BoundsCell) {
        if !self.contains(cell) {
            self.entries.push(Rc::downgrade(cell));
        }
    }

    /// Stop tracking a bounds cell. Returns whether it was tracked.
    pub fn untrack(&mut self, cell: &BoundsCell) -> bool {
        let before = self.entries.len();
        let target = Rc::downgrade(cell);
        self.entries.retain(|w| !w.ptr_eq(&target));
        self.entries.len() != before
    }

    pub fn contains(&self, cell: &BoundsCell) -> bool {
        let target = Rc::downgrade(cell);
        self.entries.iter().any(|w| w.ptr_eq(&target))
    }

    /// Number of registration slots, including ones whose range is gone
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebase every tracked range across `change`
    pub fn rebase_all(&mut self, change: &TextChange) {
        if change.unchanged {
            return;
        }
        self.entries.retain(|weak| match weak.upgrade() {
            Some(cell) => {
                let before = cell.get();
                let after = rebase(before, change);
                trace!(%before, %after, "rebased live range");
                cell.set(after);
                true
            }
            None => false,
        });
    }
}
