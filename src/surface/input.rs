//! Flat-text surface for inputs and text areas.

use crate::bounds::Bounds;
use crate::util::text::{char_len, char_slice, char_to_byte, line_at};

use super::{Surface, SurfaceKind, Viewport};

/// Surface wrapping a `String` value with a native selection
/// (`selectionStart` / `selectionEnd` in char offsets).
#[derive(Debug, Clone, Default)]
pub struct InputSurface {
    value: String,
    selection: Bounds,
    viewport: Viewport,
}

impl InputSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an InputSurface from a string slice
    pub fn from_text(s: &str) -> Self {
        Self {
            value: s.to_string(),
            ..Self::default()
        }
    }

    /// Access the underlying value
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Surface for InputSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Input
    }

    fn len_chars(&self) -> usize {
        char_len(&self.value)
    }

    fn text(&self) -> String {
        self.value.clone()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        char_slice(&self.value, start, end).to_string()
    }

    fn replace(&mut self, start: usize, end: usize, text: &str) {
        let start_byte = char_to_byte(&self.value, start);
        let end_byte = char_to_byte(&self.value, end.max(start));
        self.value.replace_range(start_byte..end_byte, text);
        let caret = start.min(self.len_chars()) + char_len(text);
        self.selection = Bounds::collapsed(caret);
    }

    fn selection(&self) -> Option<Bounds> {
        Some(self.selection.clamp(self.len_chars()))
    }

    fn set_selection(&mut self, bounds: Bounds) {
        self.selection = bounds.clamp(self.len_chars());
    }

    fn visual_line(&self, offset: usize) -> usize {
        line_at(&self.value, offset) - 1
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }
}
