//! Regex search and bounded replace over a document's text.
//!
//! Positions are char offsets on the way in and out; the regex engine works in
//! bytes, so every boundary is converted at the edges.

use regex::{Captures, Regex, RegexBuilder};
use tracing::trace;

use crate::bounds::Bounds;
use crate::error::SearchError;
use crate::ex::options::{OptionName, Options};
use crate::util::text::{byte_to_char, char_to_byte, next_boundary};

/// Flags controlling one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub ignorecase: bool,
    /// `^` and `$` match at line boundaries
    pub multiline: bool,
    /// `.` matches a line separator
    pub dotall: bool,
    pub unicode: bool,
    /// Retry across the whole buffer when nothing is found
    pub wrapscan: bool,
    /// Treat the pattern as a regex (off: literal text)
    pub magic: bool,
    pub backward: bool,
    /// The match must start exactly where the search starts
    pub sticky: bool,
    /// Only look inside the current bounds
    pub restricted: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignorecase: false,
            multiline: false,
            dotall: false,
            unicode: true,
            wrapscan: true,
            magic: true,
            backward: false,
            sticky: false,
            restricted: false,
        }
    }
}

impl SearchOptions {
    /// Instance defaults taken from a document's options
    pub fn from_options(options: &Options) -> Self {
        Self {
            ignorecase: options.flag(OptionName::Ignorecase),
            multiline: options.flag(OptionName::Multiline),
            wrapscan: options.flag(OptionName::Wrapscan),
            magic: options.flag(OptionName::Magic),
            ..Self::default()
        }
    }

    /// Override with flag letters: lowercase turns a flag on, uppercase off.
    ///
    /// `i` ignorecase, `m` multiline, `s` dotall, `u` unicode, `w` wrapscan,
    /// `b` backward, `y` sticky, `r` restricted, `x` magic.
    pub fn with_flags(mut self, flags: &str) -> Result<Self, SearchError> {
        for ch in flags.chars() {
            let on = ch.is_ascii_lowercase();
            let slot = match ch.to_ascii_lowercase() {
                'i' => &mut self.ignorecase,
                'm' => &mut self.multiline,
                's' => &mut self.dotall,
                'u' => &mut self.unicode,
                'w' => &mut self.wrapscan,
                'b' => &mut self.backward,
                'y' => &mut self.sticky,
                'r' => &mut self.restricted,
                'x' => &mut self.magic,
                _ => return Err(SearchError::BadFlag(ch)),
            };
            *slot = on;
        }
        Ok(self)
    }
}

/// Compile `pattern` under `options`. With magic off the pattern is matched
/// literally.
pub fn compile(pattern: &str, options: &SearchOptions) -> Result<Regex, SearchError> {
    let source = if options.magic {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    let regex = RegexBuilder::new(&source)
        .case_insensitive(options.ignorecase)
        .multi_line(options.multiline)
        .dot_matches_new_line(options.dotall)
        .unicode(options.unicode)
        .build()?;
    Ok(regex)
}

fn to_bounds(text: &str, start: usize, end: usize) -> Bounds {
    Bounds::new(byte_to_char(text, start), byte_to_char(text, end))
}

/// Find the next match relative to `current`.
///
/// A match identical to `current` is never reported; the search moves past
/// it instead. Returns `None` when nothing else matches.
pub fn find(text: &str, current: Bounds, regex: &Regex, options: &SearchOptions) -> Option<Bounds> {
    let found = if options.backward {
        find_backward(text, current, regex, options.restricted)
    } else {
        find_forward(text, current, regex, options)
    };
    if found.is_some() || !options.wrapscan || options.sticky || options.restricted {
        return found;
    }

    trace!(backward = options.backward, "search wrapped");
    if options.backward {
        last_match(text, 0, text.len(), None, current, regex)
    } else {
        first_match(text, 0, text.len(), current, regex)
    }
}

fn find_forward(text: &str, current: Bounds, regex: &Regex, options: &SearchOptions) -> Option<Bounds> {
    let (from, hay_end) = if options.restricted {
        (char_to_byte(text, current.start), char_to_byte(text, current.end))
    } else {
        (char_to_byte(text, current.end), text.len())
    };
    if options.sticky {
        let m = regex.find_at(&text[..hay_end], from)?;
        let b = to_bounds(text, m.start(), m.end());
        return (m.start() == from && b != current).then_some(b);
    }
    first_match(text, from, hay_end, current, regex)
}

fn find_backward(text: &str, current: Bounds, regex: &Regex, restricted: bool) -> Option<Bounds> {
    if restricted {
        let lo = char_to_byte(text, current.start);
        let hi = char_to_byte(text, current.end);
        last_match(text, lo, hi, None, current, regex)
    } else {
        let limit = char_to_byte(text, current.start);
        last_match(text, 0, text.len(), Some(limit), current, regex)
    }
}

/// First match in `text[from..hay_end]` that differs from `current`
fn first_match(text: &str, from: usize, hay_end: usize, current: Bounds, regex: &Regex) -> Option<Bounds> {
    let hay = &text[..hay_end];
    let mut at = from;
    while at <= hay.len() {
        let m = regex.find_at(hay, at)?;
        let b = to_bounds(text, m.start(), m.end());
        if b != current {
            return Some(b);
        }
        at = next_boundary(hay, m.start());
    }
    None
}

/// Rightmost match in `text[from..hay_end]` starting before `limit` that
/// differs from `current`. Scans forward one position past each hit.
fn last_match(
    text: &str,
    from: usize,
    hay_end: usize,
    limit: Option<usize>,
    current: Bounds,
    regex: &Regex,
) -> Option<Bounds> {
    let hay = &text[..hay_end];
    let mut best = None;
    let mut at = from;
    while at <= hay.len() {
        let Some(m) = regex.find_at(hay, at) else {
            break;
        };
        if limit.is_some_and(|limit| m.start() >= limit) {
            break;
        }
        let b = to_bounds(text, m.start(), m.end());
        if b != current {
            best = Some(b);
        }
        at = next_boundary(hay, m.start());
    }
    best
}

/// Replace matches inside `region` and return the region's new text along
/// with the number of replacements, or `None` when nothing matched.
///
/// Matching sees the text before the region (so anchors and word boundaries
/// behave as in the full buffer) but never extends past its end. The region
/// end counts as the end of the text: `$` and `\b` match there even when more
/// text follows it. Backward without global replaces only the last match.
pub fn replace(
    text: &str,
    region: Bounds,
    regex: &Regex,
    template: &str,
    global: bool,
    backward: bool,
    magic: bool,
) -> Option<(String, usize)> {
    let start = char_to_byte(text, region.start);
    let end = char_to_byte(text, region.end);
    let hay = &text[..end];

    let mut matches: Vec<Captures<'_>> = Vec::new();
    let mut prev_end = None;
    let mut at = start;
    while at <= hay.len() {
        let Some(caps) = regex.captures_at(hay, at) else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };
        let (m_start, m_end) = (m.start(), m.end());
        at = if m_end > m_start {
            m_end
        } else {
            next_boundary(hay, m_end)
        };
        // an empty match right after a previous match is not a new match
        if m_start == m_end && prev_end == Some(m_start) {
            continue;
        }
        prev_end = Some(m_end);
        matches.push(caps);
        if !global && !backward {
            break;
        }
    }
    if matches.is_empty() {
        return None;
    }
    if backward && !global {
        matches.drain(..matches.len() - 1);
    }

    let mut out = String::with_capacity(end - start);
    let mut last = start;
    for caps in &matches {
        if let Some(m) = caps.get(0) {
            out.push_str(&hay[last..m.start()]);
            out.push_str(&expand(template, caps, magic));
            last = m.end();
        }
    }
    out.push_str(&hay[last..end]);
    Some((out, matches.len()))
}

#[derive(Debug, Clone, Copy)]
enum Case {
    Upper,
    Lower,
}

fn push_cased(out: &mut String, s: &str, one: &mut Option<Case>, span: Option<Case>) {
    for ch in s.chars() {
        match one.take().or(span) {
            Some(Case::Upper) => out.extend(ch.to_uppercase()),
            Some(Case::Lower) => out.extend(ch.to_lowercase()),
            None => out.push(ch),
        }
    }
}

/// Expand a replacement template against one match.
///
/// `&` (or `\&` with magic off) is the whole match, `\0`..`\9` the groups,
/// `\n` and `\t` a newline and a tab, `\u`/`\l` change the case of the next
/// char, `\U`/`\L` of everything up to `\E` or `\e`.
pub fn expand(template: &str, caps: &Captures<'_>, magic: bool) -> String {
    let group = |n: usize| caps.get(n).map_or("", |m| m.as_str());
    let mut out = String::new();
    let mut one = None;
    let mut span = None;
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => {
                    let n = d.to_digit(10).map_or(0, |n| n as usize);
                    push_cased(&mut out, group(n), &mut one, span);
                }
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('u') => one = Some(Case::Upper),
                Some('l') => one = Some(Case::Lower),
                Some('U') => span = Some(Case::Upper),
                Some('L') => span = Some(Case::Lower),
                Some('E' | 'e') => span = None,
                Some('&') if !magic => push_cased(&mut out, group(0), &mut one, span),
                Some(other) => push_cased(&mut out, other.encode_utf8(&mut [0; 4]), &mut one, span),
                None => out.push('\\'),
            },
            '&' if magic => push_cased(&mut out, group(0), &mut one, span),
            other => push_cased(&mut out, other.encode_utf8(&mut [0; 4]), &mut one, span),
        }
    }
    out
}

/// Substitute the previous replacement for `~` (`\~` with magic off).
pub fn resolve_previous(template: &str, previous: &str, magic: bool) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('~') if !magic => out.push_str(previous),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '~' if magic => out.push_str(previous),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(pattern: &str) -> Regex {
        compile(pattern, &SearchOptions::default()).unwrap()
    }

    #[test]
    fn test_flags_lowercase_on_uppercase_off() {
        let options = SearchOptions::default().with_flags("ibW").unwrap();
        assert!(options.ignorecase);
        assert!(options.backward);
        assert!(!options.wrapscan);
        assert!(matches!(
            SearchOptions::default().with_flags("q"),
            Err(SearchError::BadFlag('q'))
        ));
    }

    #[test]
    fn test_forward_skips_current_match() {
        let text = "ab ab ab";
        let options = SearchOptions::default();
        assert_eq!(find(text, Bounds::new(0, 2), &re("ab"), &options), Some(Bounds::new(3, 5)));
        assert_eq!(find(text, Bounds::new(6, 8), &re("ab"), &options), Some(Bounds::new(0, 2)));
    }

    #[test]
    fn test_single_match_is_not_repeated() {
        let text = "xx ab xx";
        let options = SearchOptions::default();
        let first = find(text, Bounds::new(0, 0), &re("ab"), &options);
        assert_eq!(first, Some(Bounds::new(3, 5)));
        assert_eq!(find(text, Bounds::new(3, 5), &re("ab"), &options), None);
    }

    #[test]
    fn test_backward_finds_rightmost_before() {
        let text = "aaa aaa aaa";
        let options = SearchOptions {
            backward: true,
            ..SearchOptions::default()
        };
        assert_eq!(find(text, Bounds::new(8, 11), &re("aa"), &options), Some(Bounds::new(5, 7)));
        assert_eq!(find(text, Bounds::new(0, 2), &re("aa"), &options), Some(Bounds::new(9, 11)));
    }

    #[test]
    fn test_no_wrap_reports_failure() {
        let options = SearchOptions::default().with_flags("W").unwrap();
        assert_eq!(find("ab cd", Bounds::new(3, 5), &re("ab"), &options), None);
    }

    #[test]
    fn test_magic_off_is_literal() {
        let options = SearchOptions::default().with_flags("X").unwrap();
        let regex = compile("a.c", &options).unwrap();
        assert_eq!(find("abc a.c", Bounds::default(), &regex, &options), Some(Bounds::new(4, 7)));
    }

    #[test]
    fn test_restricted_stays_inside() {
        let options = SearchOptions::default().with_flags("r").unwrap();
        assert_eq!(find("ab ab", Bounds::new(1, 5), &re("ab"), &options), Some(Bounds::new(3, 5)));
        assert_eq!(find("ab ab", Bounds::new(1, 4), &re("ab"), &options), None);
    }

    #[test]
    fn test_replace_is_bounded() {
        let text = "cat cat cat";
        let (out, count) = replace(text, Bounds::new(4, 11), &re("cat"), "dog", true, false, true).unwrap();
        assert_eq!(out, "dog dog");
        assert_eq!(count, 2);
        let (out, _) = replace(text, Bounds::new(0, 11), &re("cat"), "dog", false, true, true).unwrap();
        assert_eq!(out, "cat cat dog");
        assert!(replace(text, Bounds::new(1, 3), &re("cat"), "dog", true, false, true).is_none());
    }

    #[test]
    fn test_replace_sees_context_before_region() {
        assert!(replace("ab", Bounds::new(1, 2), &re(r"^b"), "X", true, false, true).is_none());
        let (out, _) = replace("a b", Bounds::new(2, 3), &re(r"\bb"), "X", true, false, true).unwrap();
        assert_eq!(out, "X");
    }

    #[test]
    fn test_region_end_acts_as_text_end() {
        let (out, _) = replace("ab", Bounds::new(0, 1), &re(r"a$"), "X", true, false, true).unwrap();
        assert_eq!(out, "X");
        let (out, _) = replace("abc", Bounds::new(0, 2), &re(r"b\b"), "X", true, false, true).unwrap();
        assert_eq!(out, "aX");
    }

    #[test]
    fn test_template_expansion() {
        let regex = re(r"(\w+) (\w+)");
        let caps = regex.captures("hello world").unwrap();
        assert_eq!(expand(r"\2 \1", &caps, true), "world hello");
        assert_eq!(expand(r"[&]", &caps, true), "[hello world]");
        assert_eq!(expand(r"\u\1 \U\2\E!", &caps, true), "Hello WORLD!");
        assert_eq!(expand(r"&\&", &caps, false), "&hello world");
        assert_eq!(expand(r"a\nb", &caps, true), "a\nb");
    }

    #[test]
    fn test_resolve_previous_replacement() {
        assert_eq!(resolve_previous("x~y", "P", true), "xPy");
        assert_eq!(resolve_previous(r"x\~y", "P", true), r"x\~y");
        assert_eq!(resolve_previous(r"x\~y", "P", false), "xPy");
        assert_eq!(resolve_previous("x~y", "P", false), "x~y");
    }
}
