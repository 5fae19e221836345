//! Bounds value type and the registry of named boundary computations.
//!
//! A bounds function receives the range it is applied to plus arguments and
//! answers the new `[start, end]`. The registry is keyed by name so hosts and
//! the interpreter can compose them (`union`, `whole`, ...) without knowing the
//! concrete function.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::RangeError;
use crate::ex::options::OptionName;
use crate::range::TextRange;
use crate::util::text::{
    byte_to_char, char_len, char_to_byte, line_end_from, line_start, line_start_from,
};

/// `[start, end)` char offsets into a surface's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub start: usize,
    pub end: usize,
}

impl Bounds {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Clamp into `[0, len]` and enforce `start <= end` by raising `end`.
    pub fn clamp(self, len: usize) -> Self {
        let start = self.start.min(len);
        let end = self.end.min(len).max(start);
        Self { start, end }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Componentwise intersection; disjoint inputs collapse at the later start.
    pub fn intersection(self, other: Bounds) -> Self {
        let start = self.start.max(other.start);
        Self::new(start, self.end.min(other.end).max(start))
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl From<(usize, usize)> for Bounds {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}

impl From<[usize; 2]> for Bounds {
    fn from([start, end]: [usize; 2]) -> Self {
        Self::new(start, end)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// =============================================================================
// Separators
// =============================================================================

/// What `to`, `from` and `whole` extend towards.
#[derive(Debug, Clone)]
pub enum Separator {
    Literal(String),
    Pattern(Regex),
    /// Open/close delimiters; `from` uses the first, `to` the second
    Pair(Box<Separator>, Box<Separator>),
}

impl Separator {
    pub fn literal(text: impl Into<String>) -> Self {
        Separator::Literal(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, RangeError> {
        let regex = Regex::new(pattern).map_err(crate::error::SearchError::from)?;
        Ok(Separator::Pattern(regex))
    }

    pub fn pair(open: Separator, close: Separator) -> Self {
        Separator::Pair(Box::new(open), Box::new(close))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Separator::Pair(..))
    }

    fn opening(&self) -> &Separator {
        match self {
            Separator::Pair(open, _) => open.opening(),
            other => other,
        }
    }

    fn closing(&self) -> &Separator {
        match self {
            Separator::Pair(_, close) => close.closing(),
            other => other,
        }
    }

    /// First match starting at or after char offset `from`
    fn find_forward(&self, text: &str, from: usize) -> Option<Bounds> {
        let from_byte = char_to_byte(text, from);
        let (s, e) = match self {
            Separator::Literal(lit) if lit.is_empty() => return None,
            Separator::Literal(lit) => {
                let pos = text[from_byte..].find(lit.as_str())? + from_byte;
                (pos, pos + lit.len())
            }
            Separator::Pattern(re) => {
                let m = re.find_at(text, from_byte)?;
                (m.start(), m.end())
            }
            Separator::Pair(_, close) => return close.find_forward(text, from),
        };
        Some(Bounds::new(byte_to_char(text, s), byte_to_char(text, e)))
    }

    /// Last match ending at or before char offset `before`
    fn find_backward(&self, text: &str, before: usize) -> Option<Bounds> {
        let hay = &text[..char_to_byte(text, before)];
        let (s, e) = match self {
            Separator::Literal(lit) if lit.is_empty() => return None,
            Separator::Literal(lit) => {
                let pos = hay.rfind(lit.as_str())?;
                (pos, pos + lit.len())
            }
            Separator::Pattern(re) => {
                let m = re.find_iter(hay).last()?;
                (m.start(), m.end())
            }
            Separator::Pair(open, _) => return open.find_backward(text, before),
        };
        Some(Bounds::new(byte_to_char(text, s), byte_to_char(text, e)))
    }
}

// =============================================================================
// Arguments
// =============================================================================

/// Argument passed to a bounds function.
#[derive(Debug, Clone)]
pub enum BoundsArg {
    Int(i64),
    Name(String),
    Separator(Separator),
    Flag(bool),
}

impl From<i64> for BoundsArg {
    fn from(n: i64) -> Self {
        BoundsArg::Int(n)
    }
}

impl From<usize> for BoundsArg {
    fn from(n: usize) -> Self {
        BoundsArg::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<bool> for BoundsArg {
    fn from(flag: bool) -> Self {
        BoundsArg::Flag(flag)
    }
}

impl From<&str> for BoundsArg {
    fn from(name: &str) -> Self {
        BoundsArg::Name(name.to_string())
    }
}

impl From<Separator> for BoundsArg {
    fn from(sep: Separator) -> Self {
        BoundsArg::Separator(sep)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Signature shared by every bounds function
pub type BoundsFn = fn(&TextRange, &[BoundsArg]) -> Result<Bounds, RangeError>;

/// Name → bounds function mapping.
#[derive(Clone)]
pub struct BoundsRegistry {
    entries: HashMap<String, BoundsFn>,
}

impl fmt::Debug for BoundsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BoundsRegistry").field("names", &names).finish()
    }
}

impl Default for BoundsRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoundsRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in bounds functions
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("all", all);
        registry.register("start", start);
        registry.register("end", end);
        registry.register("startbounds", start_bounds);
        registry.register("endbounds", end_bounds);
        registry.register("selection", selection);
        registry.register("BOL", bol);
        registry.register("EOL", eol);
        registry.register("line", line);
        registry.register("lines", line);
        registry.register("union", union);
        registry.register("intersection", intersection);
        registry.register("to", to);
        registry.register("from", from);
        registry.register("whole", whole);
        registry.register("word", word);
        registry.register("sentence", sentence);
        registry.register("paragraph", paragraph);
        registry.register("section", section);
        registry
    }

    /// Add or replace a named bounds function
    pub fn register(&mut self, name: impl Into<String>, f: BoundsFn) {
        self.entries.insert(name.into(), f);
    }

    pub fn get(&self, name: &str) -> Option<BoundsFn> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

fn all(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(Bounds::new(0, range.len()))
}

fn start(_: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(Bounds::collapsed(0))
}

fn end(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(Bounds::collapsed(range.len()))
}

fn start_bounds(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(Bounds::collapsed(range.bounds().start))
}

fn end_bounds(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(Bounds::collapsed(range.bounds().end))
}

fn selection(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    Ok(range.document().borrow().selection())
}

fn bol(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let at = range.bounds().start;
    Ok(Bounds::collapsed(range.with_text(|t| line_start_from(t, at))))
}

fn eol(range: &TextRange, _: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let at = range.bounds().end;
    Ok(Bounds::collapsed(range.with_text(|t| line_end_from(t, at))))
}

/// Bounds of 1-indexed line `n` in `text`, without its separator.
pub fn line_bounds(text: &str, n: i64) -> Bounds {
    if n < 1 {
        return Bounds::collapsed(0);
    }
    let n = usize::try_from(n).unwrap_or(usize::MAX);
    match line_start(text, n) {
        Some(start) => Bounds::new(start, line_end_from(text, start)),
        None => Bounds::collapsed(char_len(text)),
    }
}

fn line(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    match args {
        [] => {
            let b = range.bounds();
            Ok(range.with_text(|t| Bounds::new(line_start_from(t, b.start), line_end_from(t, b.end))))
        }
        [BoundsArg::Int(n)] => Ok(range.with_text(|t| line_bounds(t, *n))),
        [BoundsArg::Int(n), BoundsArg::Int(m)] => {
            Ok(range.with_text(|t| line_bounds(t, *n).union(line_bounds(t, *m))))
        }
        _ => Err(RangeError::BadBoundsArgs {
            name: "line",
            reason: "expected no arguments or one or two line numbers".to_string(),
        }),
    }
}

fn combine(
    range: &TextRange,
    args: &[BoundsArg],
    name: &'static str,
    op: fn(Bounds, Bounds) -> Bounds,
) -> Result<Bounds, RangeError> {
    let Some((BoundsArg::Name(other_name), rest)) = args.split_first() else {
        return Err(RangeError::BadBoundsArgs {
            name,
            reason: "expected a bounds name".to_string(),
        });
    };
    let mut other = range.clone();
    let other_bounds = other.apply(other_name, rest)?;
    Ok(op(range.bounds(), other_bounds))
}

fn union(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    combine(range, args, "union", Bounds::union)
}

fn intersection(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    combine(range, args, "intersection", Bounds::intersection)
}

fn separator_args(
    args: &[BoundsArg],
    name: &'static str,
) -> Result<(Separator, bool), RangeError> {
    let sep = match args.first() {
        Some(BoundsArg::Separator(sep)) => sep.clone(),
        Some(BoundsArg::Name(lit)) => Separator::literal(lit.clone()),
        _ => {
            return Err(RangeError::BadBoundsArgs {
                name,
                reason: "expected a separator".to_string(),
            })
        }
    };
    let outer = matches!(args.get(1), Some(BoundsArg::Flag(true)));
    Ok((sep, outer))
}

fn extend_forward(text: &str, from: usize, sep: &Separator, outer: bool) -> usize {
    match sep.find_forward(text, from) {
        Some(m) if outer => m.end,
        Some(m) => m.start,
        None => char_len(text),
    }
}

fn extend_backward(text: &str, before: usize, sep: &Separator, outer: bool) -> usize {
    match sep.find_backward(text, before) {
        Some(m) if outer => m.start,
        Some(m) => m.end,
        None => 0,
    }
}

fn to(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let (sep, outer) = separator_args(args, "to")?;
    let b = range.bounds();
    let end = range.with_text(|t| extend_forward(t, b.end, sep.closing(), outer));
    Ok(Bounds::new(b.start, end))
}

fn from(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let (sep, outer) = separator_args(args, "from")?;
    let b = range.bounds();
    let start = range.with_text(|t| extend_backward(t, b.start, sep.opening(), outer));
    Ok(Bounds::new(start, b.end))
}

/// Union of `from` and `to`. With a pair, `outer` takes in the open delimiter
/// on the `from` side and the close delimiter on the `to` side; a single
/// separator is only taken in on the `to` side.
fn whole(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let (sep, outer) = separator_args(args, "whole")?;
    whole_with(range, &sep, outer)
}

fn whole_with(range: &TextRange, sep: &Separator, outer: bool) -> Result<Bounds, RangeError> {
    let b = range.bounds();
    let from_outer = sep.is_pair() && outer;
    Ok(range.with_text(|t| {
        Bounds::new(
            extend_backward(t, b.start, sep.opening(), from_outer),
            extend_forward(t, b.end, sep.closing(), outer),
        )
    }))
}

fn outer_flag(args: &[BoundsArg]) -> bool {
    matches!(args.first(), Some(BoundsArg::Flag(true)))
}

fn word(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    whole_with(range, &Separator::pattern(r"\W+")?, outer_flag(args))
}

fn sentence(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    whole_with(range, &Separator::pattern(r"[.!?]\s+|\n\s*\n")?, outer_flag(args))
}

fn option_separator(range: &TextRange, name: OptionName) -> Result<Separator, RangeError> {
    let pattern = range
        .document()
        .borrow()
        .options()
        .text(name)
        .unwrap_or_default()
        .to_string();
    Separator::pattern(&pattern)
}

fn paragraph(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let sep = option_separator(range, OptionName::Paragraphs)?;
    whole_with(range, &sep, outer_flag(args))
}

fn section(range: &TextRange, args: &[BoundsArg]) -> Result<Bounds, RangeError> {
    let sep = option_separator(range, OptionName::Sections)?;
    whole_with(range, &sep, outer_flag(args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_enforces_order_and_length() {
        assert_eq!(Bounds::new(3, 99).clamp(10), Bounds::new(3, 10));
        assert_eq!(Bounds::new(20, 30).clamp(10), Bounds::new(10, 10));
        assert_eq!(Bounds::new(6, 3).clamp(10), Bounds::new(6, 6));
    }

    #[test]
    fn test_union_and_intersection() {
        let a = Bounds::new(2, 6);
        let b = Bounds::new(4, 9);
        assert_eq!(a.union(b), Bounds::new(2, 9));
        assert_eq!(a.intersection(b), Bounds::new(4, 6));
        assert_eq!(Bounds::new(0, 2).intersection(Bounds::new(5, 7)), Bounds::new(5, 5));
    }

    #[test]
    fn test_line_bounds() {
        let text = "One\nTwo\nThree";
        assert_eq!(line_bounds(text, 0), Bounds::new(0, 0));
        assert_eq!(line_bounds(text, 1), Bounds::new(0, 3));
        assert_eq!(line_bounds(text, 2), Bounds::new(4, 7));
        assert_eq!(line_bounds(text, 3), Bounds::new(8, 13));
        assert_eq!(line_bounds(text, 4), Bounds::new(13, 13));
    }

    #[test]
    fn test_separator_search() {
        let sep = Separator::literal(",");
        assert_eq!(sep.find_forward("a,b,c", 2), Some(Bounds::new(3, 4)));
        assert_eq!(sep.find_backward("a,b,c", 3), Some(Bounds::new(1, 2)));
        let pair = Separator::pair(Separator::literal("("), Separator::literal(")"));
        assert_eq!(pair.find_forward("f(x)", 0), Some(Bounds::new(3, 4)));
        assert_eq!(pair.find_backward("f(x)", 3), Some(Bounds::new(1, 2)));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = BoundsRegistry::standard();
        assert!(registry.contains("line"));
        assert!(registry.contains("whole"));
        assert!(registry.get("nonsense").is_none());
    }
}
