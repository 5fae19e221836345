//! `TextRange`: a `[start, end)` view over a document's text.
//!
//! A range owns no text. Its bounds are unchecked on write and clamped on
//! read, so a range that outlived an edit never reads past the buffer end.
//! Cloning yields an independent range over the same document; a range only
//! follows edits after [`TextRange::track`] registers it as live.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::bounds::{Bounds, BoundsArg};
use crate::diff::TextChange;
use crate::document::{Document, DocumentRef};
use crate::error::{RangeError, SearchError};
use crate::hooks::{self, HookContext, TextOptions};
use crate::live::BoundsCell;
use crate::search::{self, SearchOptions};
use crate::surface::Element;
use crate::util::text::{char_len, line_at, LINE_SEPARATOR};

pub struct TextRange {
    doc: DocumentRef,
    cell: BoundsCell,
    matched: Option<bool>,
}

impl Clone for TextRange {
    /// Same document and offsets, fresh untracked bounds
    fn clone(&self) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
            cell: Rc::new(Cell::new(self.cell.get())),
            matched: self.matched,
        }
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRange")
            .field("bounds", &self.cell.get())
            .field("matched", &self.matched)
            .finish()
    }
}

impl TextRange {
    /// A collapsed range at the start of `doc`
    pub fn new(doc: &DocumentRef) -> Self {
        Self::with_bounds(doc, Bounds::default())
    }

    pub fn with_bounds(doc: &DocumentRef, bounds: impl Into<Bounds>) -> Self {
        Self {
            doc: Rc::clone(doc),
            cell: Rc::new(Cell::new(bounds.into())),
            matched: None,
        }
    }

    /// Build a document for `element` and a range over it
    pub fn for_element(element: Element) -> Self {
        Self::new(&Document::from_element(element).shared())
    }

    /// A range that is tracked from the start
    pub fn live(doc: &DocumentRef, bounds: impl Into<Bounds>) -> Self {
        let range = Self::with_bounds(doc, bounds);
        range.track();
        range
    }

    pub fn document(&self) -> &DocumentRef {
        &self.doc
    }

    /// Length of the whole document in chars
    pub fn len(&self) -> usize {
        self.doc.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds().is_empty()
    }

    /// Run `f` over the document text
    pub fn with_text<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(self.doc.borrow().text())
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    /// Bounds as stored, possibly out of range
    pub fn raw_bounds(&self) -> Bounds {
        self.cell.get()
    }

    /// Current bounds clamped into `[0, len]` with `start <= end`
    pub fn bounds(&self) -> Bounds {
        self.cell.get().clamp(self.len())
    }

    /// Set bounds, unchecked until the next read
    pub fn set_bounds(&mut self, bounds: impl Into<Bounds>) -> &mut Self {
        self.cell.set(bounds.into());
        self
    }

    /// Apply a named bounds function; its result becomes the new bounds
    pub fn apply(&mut self, name: &str, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
        let f = self
            .doc
            .borrow()
            .bounds_fn(name)
            .ok_or_else(|| RangeError::UnknownBounds(name.to_string()))?;
        let bounds = f(self, args)?;
        self.set_bounds(bounds);
        Ok(self.bounds())
    }

    /// Select 1-indexed line `n`
    pub fn set_line(&mut self, n: usize) -> &mut Self {
        self.set_lines(n, n)
    }

    /// Select lines `first..=last` (1-indexed), separators between them
    /// included, the final one excluded
    pub fn set_lines(&mut self, first: usize, last: usize) -> &mut Self {
        let bounds = self.with_text(|t| {
            let to_i64 = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
            crate::bounds::line_bounds(t, to_i64(first))
                .union(crate::bounds::line_bounds(t, to_i64(last)))
        });
        self.set_bounds(bounds)
    }

    /// 1-indexed line containing the start
    pub fn line(&self) -> usize {
        let start = self.bounds().start;
        self.with_text(|t| line_at(t, start))
    }

    /// First and last 1-indexed lines the range touches. A range ending just
    /// past a separator does not count the empty line after it.
    pub fn lines(&self) -> (usize, usize) {
        let b = self.bounds();
        self.with_text(|t| {
            let first = line_at(t, b.start);
            let mut end = b.end;
            if end > b.start
                && crate::util::text::char_slice(t, end - 1, end)
                    .starts_with(LINE_SEPARATOR)
            {
                end -= 1;
            }
            (first, line_at(t, end).max(first))
        })
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Text under the current bounds
    pub fn text(&self) -> String {
        let b = self.bounds();
        self.doc.borrow().slice(b.start, b.end)
    }

    /// Replace the text under the bounds
    pub fn set_text(&mut self, text: &str) -> TextChange {
        self.set_text_with(text, &TextOptions::default())
    }

    /// Replace the text under the bounds after running the text hooks. The
    /// range then covers the written text.
    pub fn set_text_with(&mut self, text: &str, options: &TextOptions) -> TextChange {
        let b = self.bounds();
        let written = self.with_text(|t| {
            hooks::run(
                &HookContext {
                    text: t,
                    start: b.start,
                    options,
                },
                text,
            )
        });
        let change = self
            .doc
            .borrow_mut()
            .replace(b.start, b.end, &written, options.kind);
        self.set_bounds(Bounds::new(b.start, b.start + char_len(&written)));
        change
    }

    // =========================================================================
    // Selection and viewport
    // =========================================================================

    /// Push the bounds into the native selection (or the pending selection
    /// when the surface is not focused)
    pub fn select(&self) {
        let b = self.bounds();
        self.doc.borrow_mut().select(b);
    }

    /// Bounds of the document's selection
    pub fn selection(&self) -> Bounds {
        self.doc.borrow().selection()
    }

    pub fn scroll_into_view(&self) {
        let b = self.bounds();
        self.doc.borrow_mut().scroll_into_view(b.start);
    }

    /// Surround the bounds with a container element
    pub fn wrap(&self, tag: &str) -> Result<(), RangeError> {
        let b = self.bounds();
        self.doc.borrow_mut().wrap(b, tag)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Find `pattern` using the document's options overridden by `flags`.
    ///
    /// On success the bounds move to the match. On failure they stay put.
    /// Either way [`TextRange::matched`] reports the outcome.
    pub fn find(&mut self, pattern: &str, flags: &str) -> Result<bool, SearchError> {
        let options = SearchOptions::from_options(self.doc.borrow().options()).with_flags(flags)?;
        self.find_with(pattern, &options)
    }

    /// Convenience form: `no_wrap` disables wrapscan, `backward` searches
    /// towards the start
    pub fn find_next(
        &mut self,
        pattern: &str,
        no_wrap: bool,
        backward: bool,
    ) -> Result<bool, SearchError> {
        let mut options = SearchOptions::from_options(self.doc.borrow().options());
        options.wrapscan &= !no_wrap;
        options.backward = backward;
        self.find_with(pattern, &options)
    }

    pub fn find_with(&mut self, pattern: &str, options: &SearchOptions) -> Result<bool, SearchError> {
        let regex = search::compile(pattern, options)?;
        let current = self.bounds();
        let found = self.with_text(|t| search::find(t, current, &regex, options));
        if let Some(b) = found {
            self.set_bounds(b);
        }
        self.matched = Some(found.is_some());
        Ok(found.is_some())
    }

    /// Outcome of the last find, `None` before any
    pub fn matched(&self) -> Option<bool> {
        self.matched
    }

    /// Replace matches of `pattern` inside the bounds with `template`.
    /// Returns the number of replacements.
    pub fn replace(
        &mut self,
        pattern: &str,
        template: &str,
        flags: &str,
        global: bool,
    ) -> Result<usize, SearchError> {
        let options = SearchOptions::from_options(self.doc.borrow().options()).with_flags(flags)?;
        let regex = search::compile(pattern, &options)?;
        let region = self.bounds();
        let result = self.with_text(|t| {
            search::replace(t, region, &regex, template, global, options.backward, options.magic)
        });
        match result {
            Some((text, count)) => {
                self.set_text_with(&text, &TextOptions::default());
                Ok(count)
            }
            None => Ok(0),
        }
    }

    // =========================================================================
    // Live tracking
    // =========================================================================

    /// Follow edits from now on. Tracked ranges stay registered until
    /// [`TextRange::untrack`].
    pub fn track(&self) {
        self.doc.borrow_mut().track(&self.cell);
    }

    pub fn untrack(&self) -> bool {
        self.doc.borrow_mut().untrack(&self.cell)
    }

    pub fn is_live(&self) -> bool {
        self.doc.borrow().is_tracked(&self.cell)
    }

    /// Bind a mark at the current bounds
    pub fn bookmark(&self, name: &str) {
        let b = self.bounds();
        self.doc.borrow_mut().set_mark(name, b);
    }
}
