//! Editable surfaces: the native text-editing primitives a range sits on.
//!
//! Three variants exist, each backed by a different native model:
//!
//! - [`InputSurface`]: a flat `String` with a real native selection (text
//!   inputs and text areas)
//! - [`ContentSurface`]: a node tree whose text content is the concatenation
//!   of its text nodes and line breaks (rich, structured content)
//! - [`FallbackSurface`]: a `ropey::Rope` with an emulated selection, for
//!   non-interactive elements
//!
//! All of them speak char offsets at the trait boundary. [`probe`] is the one
//! place that picks an implementation for a host element.

mod content;
mod fallback;
mod input;

use std::fmt;

use crate::bounds::Bounds;
use crate::error::RangeError;

pub use content::{ContentSurface, Node, NodePoint};
pub use fallback::FallbackSurface;
pub use input::InputSurface;

/// Which native model backs a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Input,
    Content,
    Fallback,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SurfaceKind::Input => "plain-text input",
            SurfaceKind::Content => "structured content",
            SurfaceKind::Fallback => "fallback",
        })
    }
}

/// Scroll state and line metrics shared by every surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Vertical scroll position in pixels
    pub scroll_top: usize,
    /// Visible height in pixels
    pub height: usize,
    /// Height of one text line in pixels
    pub line_height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_top: 0,
            height: 480,
            line_height: 16,
        }
    }
}

impl Viewport {
    /// Adjust `scroll_top` so that a line starting at pixel `y` is visible
    pub fn reveal(&mut self, y: usize) {
        if y < self.scroll_top {
            self.scroll_top = y;
        } else if y + self.line_height > self.scroll_top + self.height {
            self.scroll_top = (y + self.line_height).saturating_sub(self.height);
        }
    }
}

/// The primitive contract every backing surface implements.
///
/// Offsets are char offsets into the surface's logical text. Implementations
/// clamp out-of-range offsets instead of failing.
pub trait Surface: fmt::Debug {
    fn kind(&self) -> SurfaceKind;

    /// Total length in chars
    fn len_chars(&self) -> usize;

    /// Full logical text
    fn text(&self) -> String;

    /// Text between two char offsets
    fn slice(&self, start: usize, end: usize) -> String;

    /// Replace `[start, end)` with `text`. The native selection collapses to
    /// the end of the inserted text.
    fn replace(&mut self, start: usize, end: usize, text: &str);

    /// Native selection translated to char offsets
    fn selection(&self) -> Option<Bounds>;

    /// Push char-offset bounds into the native selection
    fn set_selection(&mut self, bounds: Bounds);

    /// 0-indexed visual line containing `offset`
    fn visual_line(&self, offset: usize) -> usize;

    fn viewport(&self) -> &Viewport;

    fn viewport_mut(&mut self) -> &mut Viewport;

    /// Pixel offset of the line containing `offset`
    fn vertical_offset(&self, offset: usize) -> usize {
        self.visual_line(offset) * self.viewport().line_height
    }

    /// Surround `bounds` with a container element
    fn wrap(&mut self, _bounds: Bounds, _tag: &str) -> Result<(), RangeError> {
        Err(RangeError::UnsupportedOperation {
            operation: "wrap",
            kind: self.kind(),
        })
    }
}

/// Host element description handed to [`probe`].
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Input or text area exposing a native text-selection API
    TextControl { value: String },
    /// Element whose content is editable as a node tree
    ContentEditable { nodes: Vec<Node> },
    /// Anything else; text is editable through the range API only
    Static { text: String },
}

/// Pick the surface implementation for an element by what it supports.
pub fn probe(element: Element) -> Box<dyn Surface> {
    match element {
        Element::TextControl { value } => Box::new(InputSurface::from_text(&value)),
        Element::ContentEditable { nodes } => Box::new(ContentSurface::new(nodes)),
        Element::Static { text } => Box::new(FallbackSurface::from_text(&text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_selects_variant() {
        let input = probe(Element::TextControl {
            value: "a".to_string(),
        });
        assert_eq!(input.kind(), SurfaceKind::Input);

        let content = probe(Element::ContentEditable {
            nodes: vec![Node::text("a")],
        });
        assert_eq!(content.kind(), SurfaceKind::Content);

        let fallback = probe(Element::Static {
            text: "a".to_string(),
        });
        assert_eq!(fallback.kind(), SurfaceKind::Fallback);
    }

    #[test]
    fn test_viewport_reveal() {
        let mut viewport = Viewport {
            scroll_top: 100,
            height: 160,
            line_height: 16,
        };
        viewport.reveal(40);
        assert_eq!(viewport.scroll_top, 40);
        viewport.reveal(400);
        assert_eq!(viewport.scroll_top, 256);
        viewport.reveal(300);
        assert_eq!(viewport.scroll_top, 256);
    }
}
