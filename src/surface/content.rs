//! Structured-content surface.
//!
//! The native model is a tree of text nodes, line breaks and elements. Logical
//! offsets index the concatenated text content (a line break counts as one
//! `\n`); native positions are [`NodePoint`]s, a child-index path to a leaf plus
//! an offset inside it.

use crate::bounds::Bounds;
use crate::error::RangeError;
use crate::util::text::{char_len, char_to_byte, line_at};

use super::{Surface, SurfaceKind, Viewport};

/// One node of the content tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// Line break, text content `\n`
    Break,
    Element { tag: String, children: Vec<Node> },
}

impl Node {
    pub fn text(s: &str) -> Self {
        Node::Text(s.to_string())
    }

    pub fn element(tag: &str, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            children,
        }
    }

    /// Length of the text content in chars
    pub fn len(&self) -> usize {
        match self {
            Node::Text(s) => char_len(s),
            Node::Break => 1,
            Node::Element { children, .. } => children.iter().map(Node::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(s),
            Node::Break => out.push('\n'),
            Node::Element { children, .. } => children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    fn collect_markup(&self, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(s),
            Node::Break => out.push_str("<br>"),
            Node::Element { tag, children } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                children.iter().for_each(|c| c.collect_markup(out));
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Native position: child-index path from the root to a leaf, and a char
/// offset inside that leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

/// Surface over a node tree with a native (node-point) selection.
#[derive(Debug, Clone, Default)]
pub struct ContentSurface {
    nodes: Vec<Node>,
    selection: Option<(NodePoint, NodePoint)>,
    viewport: Viewport,
}

impl ContentSurface {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render the tree as simple markup (`<tag>..</tag>`, `<br>`)
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.collect_markup(&mut out));
        out
    }

    /// Translate a logical offset into a native node point
    pub fn locate(&self, offset: usize) -> NodePoint {
        let mut path = Vec::new();
        let mut remaining = offset;
        let mut level = &self.nodes;
        loop {
            let mut descended = false;
            for (i, node) in level.iter().enumerate() {
                let len = node.len();
                let last = i + 1 == level.len();
                if remaining < len || (remaining == len && last) {
                    path.push(i);
                    match node {
                        Node::Element { children, .. } if !children.is_empty() => {
                            level = children;
                            descended = true;
                        }
                        _ => {
                            return NodePoint {
                                path,
                                offset: remaining.min(len),
                            }
                        }
                    }
                    break;
                }
                remaining -= len;
            }
            if !descended {
                return NodePoint {
                    path,
                    offset: remaining,
                };
            }
        }
    }

    /// Translate a native node point back into a logical offset
    pub fn offset_of(&self, point: &NodePoint) -> usize {
        let mut offset = 0;
        let mut level = &self.nodes;
        for &index in &point.path {
            offset += level.iter().take(index).map(Node::len).sum::<usize>();
            match level.get(index) {
                Some(Node::Element { children, .. }) => level = children,
                Some(leaf) => return offset + point.offset.min(leaf.len()),
                None => return offset,
            }
        }
        offset + point.offset
    }
}

/// Split text leaves so that `offset` falls on a leaf boundary.
fn split_at(nodes: &mut Vec<Node>, offset: usize) {
    let mut base = 0;
    for i in 0..nodes.len() {
        let len = nodes[i].len();
        if offset > base && offset < base + len {
            let tail = match &mut nodes[i] {
                Node::Text(s) => {
                    let at = char_to_byte(s, offset - base);
                    Some(s.split_off(at))
                }
                Node::Element { children, .. } => {
                    split_at(children, offset - base);
                    None
                }
                Node::Break => None,
            };
            if let Some(tail) = tail {
                nodes.insert(i + 1, Node::Text(tail));
            }
            return;
        }
        base += len;
    }
}

/// Remove every node lying inside `[start, end)`. Boundaries must be split.
fn remove_range(nodes: &mut Vec<Node>, start: usize, end: usize) {
    let mut base = 0;
    nodes.retain_mut(|node| {
        let len = node.len();
        let (node_start, node_end) = (base, base + len);
        base = node_end;
        if len > 0 && node_start >= start && node_end <= end {
            return false;
        }
        match node {
            Node::Element { children, .. } => {
                if node_end > start && node_start < end {
                    remove_range(
                        children,
                        start.saturating_sub(node_start),
                        end.min(node_end) - node_start,
                    );
                }
                true
            }
            Node::Text(s) => !s.is_empty(),
            Node::Break => true,
        }
    });
}

/// Insert into the first text leaf touching `offset`
fn insert_into_text(nodes: &mut [Node], offset: usize, text: &str) -> bool {
    let mut base = 0;
    for node in nodes.iter_mut() {
        let len = node.len();
        if offset >= base && offset <= base + len {
            match node {
                Node::Text(s) => {
                    let at = char_to_byte(s, offset - base);
                    s.insert_str(at, text);
                    return true;
                }
                Node::Element { children, .. } => {
                    if insert_into_text(children, offset - base, text) {
                        return true;
                    }
                }
                Node::Break => {}
            }
        }
        base += len;
    }
    false
}

/// Top-level index of the first node starting at or after `offset`
fn top_level_index(nodes: &[Node], offset: usize) -> usize {
    let mut base = 0;
    for (i, node) in nodes.iter().enumerate() {
        if base >= offset {
            return i;
        }
        base += node.len();
    }
    nodes.len()
}

fn wrap_range(nodes: &mut Vec<Node>, start: usize, end: usize, tag: &str) {
    let old = std::mem::take(nodes);
    let mut run: Vec<Node> = Vec::new();
    let mut base = 0;
    for mut node in old {
        let len = node.len();
        let (node_start, node_end) = (base, base + len);
        base = node_end;
        let inside = node_start >= start && node_end <= end;
        if inside && (len > 0 || (!run.is_empty() && node_end < end)) {
            run.push(node);
            continue;
        }
        flush_run(nodes, &mut run, tag);
        if let Node::Element { children, .. } = &mut node {
            if node_end > start && node_start < end {
                wrap_range(
                    children,
                    start.saturating_sub(node_start),
                    end.min(node_end) - node_start,
                    tag,
                );
            }
        }
        nodes.push(node);
    }
    flush_run(nodes, &mut run, tag);
}

fn flush_run(nodes: &mut Vec<Node>, run: &mut Vec<Node>, tag: &str) {
    if !run.is_empty() {
        nodes.push(Node::element(tag, std::mem::take(run)));
    }
}

impl Surface for ContentSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Content
    }

    fn len_chars(&self) -> usize {
        self.nodes.iter().map(Node::len).sum()
    }

    fn text(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.collect_text(&mut out));
        out
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let text = self.text();
        crate::util::text::char_slice(&text, start, end).to_string()
    }

    fn replace(&mut self, start: usize, end: usize, text: &str) {
        let len = self.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);

        split_at(&mut self.nodes, start);
        split_at(&mut self.nodes, end);
        remove_range(&mut self.nodes, start, end);

        if !text.is_empty() && !insert_into_text(&mut self.nodes, start, text) {
            let index = top_level_index(&self.nodes, start);
            self.nodes.insert(index, Node::text(text));
        }

        let caret = self.locate(start + char_len(text));
        self.selection = Some((caret.clone(), caret));
    }

    fn selection(&self) -> Option<Bounds> {
        let (anchor, focus) = self.selection.as_ref()?;
        let a = self.offset_of(anchor);
        let f = self.offset_of(focus);
        Some(Bounds::new(a.min(f), a.max(f)))
    }

    fn set_selection(&mut self, bounds: Bounds) {
        let bounds = bounds.clamp(self.len_chars());
        self.selection = Some((self.locate(bounds.start), self.locate(bounds.end)));
    }

    fn visual_line(&self, offset: usize) -> usize {
        line_at(&self.text(), offset) - 1
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    fn wrap(&mut self, bounds: Bounds, tag: &str) -> Result<(), RangeError> {
        let b = bounds.clamp(self.len_chars());
        split_at(&mut self.nodes, b.start);
        split_at(&mut self.nodes, b.end);
        if b.is_empty() {
            let index = top_level_index(&self.nodes, b.start);
            self.nodes.insert(index, Node::element(tag, Vec::new()));
        } else {
            wrap_range(&mut self.nodes, b.start, b.end, tag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentSurface {
        ContentSurface::new(vec![
            Node::text("One"),
            Node::Break,
            Node::element("b", vec![Node::text("Two")]),
            Node::Break,
            Node::text("Three"),
        ])
    }

    #[test]
    fn test_text_content_concatenates_leaves() {
        let surface = sample();
        assert_eq!(surface.text(), "One\nTwo\nThree");
        assert_eq!(surface.len_chars(), 13);
        assert_eq!(surface.slice(4, 7), "Two");
    }

    #[test]
    fn test_locate_round_trips() {
        let surface = sample();
        for offset in 0..=surface.len_chars() {
            let point = surface.locate(offset);
            assert_eq!(surface.offset_of(&point), offset, "offset {}", offset);
        }
        assert_eq!(
            surface.locate(5),
            NodePoint {
                path: vec![2, 0],
                offset: 1
            }
        );
    }

    #[test]
    fn test_replace_across_nodes() {
        let mut surface = sample();
        surface.replace(2, 6, "X");
        assert_eq!(surface.text(), "OnXo\nThree");
        assert_eq!(surface.to_markup(), "OnX<b>o</b><br>Three");
    }

    #[test]
    fn test_replace_inside_element() {
        let mut surface = sample();
        surface.replace(4, 5, "*");
        assert_eq!(surface.to_markup(), "One<br><b>*wo</b><br>Three");
        assert_eq!(surface.selection(), Some(Bounds::collapsed(5)));
    }

    #[test]
    fn test_replace_everything() {
        let mut surface = sample();
        surface.replace(0, 13, "fresh");
        assert_eq!(surface.text(), "fresh");
    }

    #[test]
    fn test_insert_into_empty_tree() {
        let mut surface = ContentSurface::default();
        surface.replace(0, 0, "abc");
        assert_eq!(surface.text(), "abc");
    }

    #[test]
    fn test_wrap_keeps_text_and_nests() {
        let mut surface = sample();
        surface.wrap(Bounds::new(1, 6), "mark").unwrap();
        assert_eq!(surface.text(), "One\nTwo\nThree");
        assert_eq!(
            surface.to_markup(),
            "O<mark>ne<br></mark><b><mark>Tw</mark>o</b><br>Three"
        );
    }
}
