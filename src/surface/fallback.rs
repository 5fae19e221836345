//! Fallback surface for elements without native editing support.
//!
//! Text lives in a `ropey::Rope`; there is no native selection, so the last
//! requested selection is remembered and reported back verbatim.

use ropey::Rope;

use crate::bounds::Bounds;

use super::{Surface, SurfaceKind, Viewport};

/// Surface wrapping a `ropey::Rope` with an emulated selection.
#[derive(Debug, Clone, Default)]
pub struct FallbackSurface {
    rope: Rope,
    selection: Option<Bounds>,
    viewport: Viewport,
}

impl FallbackSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a FallbackSurface from a string slice
    pub fn from_text(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            ..Self::default()
        }
    }

    /// Access the underlying Rope for rope-specific operations
    pub fn rope(&self) -> &Rope {
        &self.rope
    }
}

impl Surface for FallbackSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Fallback
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars());
        if start >= end {
            return String::new();
        }
        self.rope.slice(start..end).to_string()
    }

    fn replace(&mut self, start: usize, end: usize, text: &str) {
        let start = start.min(self.len_chars());
        let end = end.clamp(start, self.len_chars());
        if start < end {
            self.rope.remove(start..end);
        }
        self.rope.insert(start, text);
        let caret = start + text.chars().count();
        self.selection = Some(Bounds::collapsed(caret));
    }

    fn selection(&self) -> Option<Bounds> {
        self.selection.map(|b| b.clamp(self.len_chars()))
    }

    fn set_selection(&mut self, bounds: Bounds) {
        self.selection = Some(bounds.clamp(self.len_chars()));
    }

    fn visual_line(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.len_chars()))
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_surface_multiline() {
        let surface = FallbackSurface::from_text("line1\nline2\nline3");
        assert_eq!(surface.len_chars(), 17);
        assert_eq!(surface.slice(6, 11), "line2");
        assert_eq!(surface.visual_line(6), 1);
        assert_eq!(surface.vertical_offset(12), 32);
    }

    #[test]
    fn test_fallback_surface_replace() {
        let mut surface = FallbackSurface::from_text("hello\nworld");
        surface.replace(5, 6, " ");
        assert_eq!(surface.text(), "hello world");
        surface.replace(0, 99, "");
        assert_eq!(surface.text(), "");
    }

    #[test]
    fn test_fallback_selection_is_emulated() {
        let mut surface = FallbackSurface::from_text("abc");
        assert_eq!(surface.selection(), None);
        surface.set_selection(Bounds::new(1, 2));
        assert_eq!(surface.selection(), Some(Bounds::new(1, 2)));
    }
}
