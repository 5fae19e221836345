//! Per-surface document: the surface plus everything that observes it.
//!
//! Every text mutation funnels through [`Document::replace`] (programmatic
//! edits) or [`Document::sync_from_surface`] (edits the host already made to
//! the native element). Both compute a [`TextChange`] and run the same
//! pipeline: live ranges are rebased, the undo history records, the save
//! status turns dirty and observers are told.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::bounds::{BoundsFn, BoundsRegistry, Bounds};
use crate::config::Config;
use crate::diff::{diff, diff_with_caret, TextChange};
use crate::error::RangeError;
use crate::ex::options::Options;
use crate::ex::state::{ExState, SaveStatus};
use crate::history::{EditHistory, EditKind};
use crate::live::{BoundsCell, LiveRangeSet};
use crate::surface::{probe, Element, Surface};
use crate::util::text::{char_len, char_slice};

/// Shared handle to a document; ranges hold one of these
pub type DocumentRef = Rc<RefCell<Document>>;

/// When an observer is notified relative to the mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePhase {
    Before,
    After,
}

/// Change observer. Observers run while the document is borrowed and must
/// not reach back into it.
pub type ChangeObserver = Box<dyn FnMut(ChangePhase, EditKind, &TextChange)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

/// Focus tracking and the selection to restore on the next focus.
#[derive(Debug, Clone)]
pub struct FocusState {
    focused: bool,
    pending: Option<Bounds>,
    last_pointer_down: Option<Instant>,
    suppress_window: Duration,
}

impl Default for FocusState {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl FocusState {
    pub fn new(suppress_window: Duration) -> Self {
        Self {
            focused: false,
            pending: None,
            last_pointer_down: None,
            suppress_window,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn pending(&self) -> Option<Bounds> {
        self.pending
    }

    /// Was a pointer pressed within the suppression window before `now`?
    fn pointer_recent(&self, now: Instant) -> bool {
        self.last_pointer_down
            .is_some_and(|at| now.saturating_duration_since(at) < self.suppress_window)
    }
}

/// An open edit group: changes made while it is open are recorded as one
/// history entry when the outermost group closes.
#[derive(Debug)]
struct Batch {
    depth: usize,
    /// Text when the outermost group opened
    before: String,
}

pub struct Document {
    surface: Box<dyn Surface>,
    /// Text as of the last notification
    snapshot: String,
    live: LiveRangeSet,
    history: EditHistory,
    batch: Option<Batch>,
    focus: FocusState,
    observers: Vec<(ObserverId, ChangeObserver)>,
    next_observer: usize,
    registry: BoundsRegistry,
    ex: ExState,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.surface.kind())
            .field("len", &char_len(&self.snapshot))
            .field("live", &self.live.len())
            .field("history", &self.history.len())
            .field("observers", &self.observers.len())
            .field("status", &self.ex.status)
            .finish()
    }
}

impl Document {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self::with_config(surface, &Config::default())
    }

    /// Create a document seeded from configuration
    pub fn with_config(mut surface: Box<dyn Surface>, config: &Config) -> Self {
        let mut options = Options::default();
        config.apply(&mut options);
        {
            let viewport = surface.viewport_mut();
            viewport.line_height = config.line_height;
            viewport.height = config.viewport_height;
        }
        Self {
            snapshot: surface.text(),
            surface,
            live: LiveRangeSet::new(),
            history: EditHistory::with_max_depth(config.history_depth),
            batch: None,
            focus: FocusState::new(Duration::from_millis(config.focus_suppress_ms)),
            observers: Vec::new(),
            next_observer: 0,
            registry: BoundsRegistry::standard(),
            ex: ExState::new(options),
        }
    }

    /// Probe an element and wrap the matching surface
    pub fn from_element(element: Element) -> Self {
        Self::new(probe(element))
    }

    /// Move into a shared handle
    pub fn shared(self) -> DocumentRef {
        Rc::new(RefCell::new(self))
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Current logical text
    pub fn text(&self) -> &str {
        &self.snapshot
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.surface.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text between two char offsets (clamped)
    pub fn slice(&self, start: usize, end: usize) -> String {
        let b = Bounds::new(start, end).clamp(self.len());
        self.surface.slice(b.start, b.end)
    }

    // =========================================================================
    // Mutation pipeline
    // =========================================================================

    /// Replace `[start, end)` with `text`, notifying before and after.
    ///
    /// Offsets are clamped. Returns the minimal change actually applied.
    pub fn replace(&mut self, start: usize, end: usize, text: &str, kind: EditKind) -> TextChange {
        let b = Bounds::new(start, end).clamp(self.len());
        let old = char_slice(&self.snapshot, b.start, b.end);
        let mut change = diff(old, text);
        if change.unchanged {
            trace!(%b, "replace left text unchanged");
            return change;
        }
        change.start += b.start;

        self.notify(ChangePhase::Before, kind, &change);
        self.surface
            .replace(change.start, change.old_end(), &change.new_text);
        self.snapshot = self.surface.text();
        debug!(
            kind = %kind,
            start = change.start,
            removed = change.old_len(),
            inserted = change.new_len(),
            "text changed"
        );
        self.record(kind, &change);
        change
    }

    /// Pick up an edit the host already applied to the surface.
    ///
    /// `caret` is the caret after the edit, used to place insertions and
    /// deletions that trimming alone cannot locate. Only the after-change
    /// notification fires since the mutation already happened.
    pub fn sync_from_surface(&mut self, kind: EditKind, caret: Option<usize>) -> TextChange {
        let current = self.surface.text();
        let change = match caret {
            Some(caret) => diff_with_caret(&self.snapshot, &current, caret),
            None => diff(&self.snapshot, &current),
        };
        self.snapshot = current;
        if !change.unchanged {
            self.record(kind, &change);
        }
        change
    }

    /// Let the host mutate the native surface (typing, pasting) and sync the
    /// result through the change pipeline using the native caret.
    pub fn edit_native(&mut self, kind: EditKind, f: impl FnOnce(&mut dyn Surface)) -> TextChange {
        f(self.surface.as_mut());
        let caret = self.surface.selection().map(|b| b.end);
        self.sync_from_surface(kind, caret)
    }

    fn record(&mut self, kind: EditKind, change: &TextChange) {
        self.live.rebase_all(change);
        if self.batch.is_none() {
            self.history.push(kind, change);
        }
        self.ex.status = SaveStatus::Dirty;
        self.notify(ChangePhase::After, kind, change);
    }

    fn notify(&mut self, phase: ChangePhase, kind: EditKind, change: &TextChange) {
        for (_, observer) in self.observers.iter_mut() {
            observer(phase, kind, change);
        }
    }

    /// Register a change observer
    pub fn observe(&mut self, observer: ChangeObserver) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove a change observer; returns whether it was registered
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    /// Revert the most recent history entry. Returns the bounds of the
    /// restored text, `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Bounds> {
        let change = self.history.back()?.change.inverse();
        self.replay(change, EditKind::HistoryUndo)
    }

    /// Re-apply the next history entry, `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Bounds> {
        let change = self.history.forward()?.change.clone();
        self.replay(change, EditKind::HistoryRedo)
    }

    fn replay(&mut self, change: TextChange, kind: EditKind) -> Option<Bounds> {
        self.replace(change.start, change.old_end(), &change.new_text, kind);
        let restored = Bounds::new(change.start, change.new_end());
        self.select(Bounds::collapsed(restored.end));
        Some(restored)
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        if let Some(batch) = &mut self.batch {
            batch.before = self.snapshot.clone();
        }
    }

    /// Open an edit group. Groups nest; only the outermost one records.
    pub fn begin_batch(&mut self) {
        match &mut self.batch {
            Some(batch) => batch.depth += 1,
            None => {
                self.batch = Some(Batch {
                    depth: 1,
                    before: self.snapshot.clone(),
                })
            }
        }
    }

    /// Close an edit group. Closing the outermost group records everything
    /// changed since it opened as a single [`EditKind::Command`] entry.
    pub fn end_batch(&mut self) {
        let Some(batch) = &mut self.batch else {
            return;
        };
        batch.depth -= 1;
        if batch.depth > 0 {
            return;
        }
        if let Some(batch) = self.batch.take() {
            let change = diff(&batch.before, &self.snapshot);
            trace!(start = change.start, unchanged = change.unchanged, "edit group closed");
            self.history.push(EditKind::Command, &change);
        }
    }

    // =========================================================================
    // Live ranges and marks
    // =========================================================================

    pub fn track(&mut self, cell: &BoundsCell) {
        self.live.track(cell);
    }

    pub fn untrack(&mut self, cell: &BoundsCell) -> bool {
        self.live.untrack(cell)
    }

    pub fn is_tracked(&self, cell: &BoundsCell) -> bool {
        self.live.contains(cell)
    }

    pub fn live_ranges(&self) -> &LiveRangeSet {
        &self.live
    }

    /// Bind a live bookmark at `bounds` to `name`, replacing any previous one
    pub fn set_mark(&mut self, name: &str, bounds: Bounds) {
        let cell = Rc::new(Cell::new(bounds));
        self.live.track(&cell);
        if let Some(old) = self.ex.marks.insert(name.to_string(), cell) {
            self.live.untrack(&old);
        }
    }

    /// Current (clamped) bounds of a mark
    pub fn mark(&self, name: &str) -> Option<Bounds> {
        self.ex.mark(name).map(|b| b.clamp(self.len()))
    }

    /// All marks with their current bounds, ordered by name
    pub fn marks(&self) -> Vec<(String, Bounds)> {
        self.ex
            .mark_names()
            .filter_map(|name| Some((name.to_string(), self.mark(name)?)))
            .collect()
    }

    pub fn remove_mark(&mut self, name: &str) -> bool {
        match self.ex.marks.remove(name) {
            Some(cell) => {
                self.live.untrack(&cell);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Focus and selection
    // =========================================================================

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    pub fn is_focused(&self) -> bool {
        self.focus.focused
    }

    /// Record a pointer press (click or drop) at `now`
    pub fn pointer_down_at(&mut self, now: Instant) {
        self.focus.last_pointer_down = Some(now);
    }

    pub fn pointer_down(&mut self) {
        self.pointer_down_at(Instant::now());
    }

    /// The surface gained focus at `now`. A pending selection is restored
    /// unless the focus came from a recent pointer press.
    pub fn focus_at(&mut self, now: Instant) {
        self.focus.focused = true;
        let pending = self.focus.pending.take();
        if self.focus.pointer_recent(now) {
            trace!("focus from pointer, pending selection dropped");
            return;
        }
        if let Some(bounds) = pending {
            self.surface.set_selection(bounds);
        }
    }

    pub fn focus(&mut self) {
        self.focus_at(Instant::now());
    }

    /// The surface lost focus; keep its selection for the next focus
    pub fn blur(&mut self) {
        self.focus.focused = false;
        self.focus.pending = self.surface.selection();
    }

    /// Native selection when focused, otherwise the pending selection
    pub fn selection(&self) -> Bounds {
        let len = self.len();
        let current = if self.focus.focused {
            self.surface.selection()
        } else {
            self.focus.pending.or_else(|| self.surface.selection())
        };
        current.unwrap_or_default().clamp(len)
    }

    /// Push bounds to the native selection if focused, else store them as
    /// pending
    pub fn select(&mut self, bounds: Bounds) {
        let bounds = bounds.clamp(self.len());
        if self.focus.focused {
            self.surface.set_selection(bounds);
        } else {
            self.focus.pending = Some(bounds);
        }
    }

    // =========================================================================
    // Surface passthroughs
    // =========================================================================

    /// Scroll the viewport so the line containing `offset` is visible
    pub fn scroll_into_view(&mut self, offset: usize) {
        let y = self.surface.vertical_offset(offset.min(self.len()));
        self.surface.viewport_mut().reveal(y);
    }

    /// Wrap `bounds` in a container element; text content is unaffected
    pub fn wrap(&mut self, bounds: Bounds, tag: &str) -> Result<(), RangeError> {
        let bounds = bounds.clamp(self.len());
        self.surface.wrap(bounds, tag)
    }

    // =========================================================================
    // Registry and ex state
    // =========================================================================

    pub fn bounds_registry(&self) -> &BoundsRegistry {
        &self.registry
    }

    pub fn bounds_registry_mut(&mut self) -> &mut BoundsRegistry {
        &mut self.registry
    }

    pub fn bounds_fn(&self, name: &str) -> Option<BoundsFn> {
        self.registry.get(name)
    }

    pub fn ex_state(&self) -> &ExState {
        &self.ex
    }

    pub fn options(&self) -> &Options {
        &self.ex.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.ex.options
    }

    pub fn status(&self) -> SaveStatus {
        self.ex.status
    }

    pub fn set_status(&mut self, status: SaveStatus) {
        debug!(%status, "save status");
        self.ex.status = status;
    }
}
