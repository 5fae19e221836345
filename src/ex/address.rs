//! Resolve parsed address tokens to a 1-indexed line span.

use crate::error::ExError;
use crate::range::TextRange;
use crate::search::{self, SearchOptions};
use crate::util::text::{line_at, line_count};

use super::parser::{AddressBase, AddressToken};

/// Resolved `[first, last]`, 1-indexed; 0 addresses the position before
/// line 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }
}

/// Resolve `tokens` against `range`. Returns `None` when there are none.
///
/// Pattern addresses record their pattern in `last_search`; an empty
/// pattern reuses it.
pub fn resolve(
    tokens: &[AddressToken],
    range: &TextRange,
    last_search: &mut Option<String>,
) -> Result<Option<LineSpan>, ExError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let (span_first, span_last) = range.lines();
    let doc = range.document().borrow();
    let text = doc.text();
    let total = line_count(text);

    let mut current = span_last;
    let mut values: Vec<usize> = Vec::new();
    for token in tokens {
        let address = match token {
            AddressToken::Comma => continue,
            AddressToken::Semicolon => {
                if let Some(&v) = values.last() {
                    current = v;
                }
                continue;
            }
            AddressToken::Address(address) => address,
        };
        let base = match &address.base {
            AddressBase::Current | AddressBase::Empty => current,
            AddressBase::Last => total,
            AddressBase::Whole => {
                values.push(1);
                total
            }
            AddressBase::CurrentRange => {
                if tokens.len() > 1 {
                    return Err(ExError::AmbiguousAddress("%%".to_string()));
                }
                values.push(span_first);
                span_last
            }
            AddressBase::Line(n) => *n,
            AddressBase::Mark(name) => doc
                .mark(name)
                .map(|b| line_at(text, b.start))
                .ok_or_else(|| ExError::MarkNotSet(name.clone()))?,
            AddressBase::Search {
                pattern,
                flags,
                backward,
            } => {
                let pattern = if pattern.is_empty() {
                    last_search.clone().ok_or(ExError::NoPreviousPattern)?
                } else {
                    pattern.clone()
                };
                let mut options = SearchOptions::from_options(doc.options()).with_flags(flags)?;
                options.backward ^= *backward;
                let line = search_line(text, current, &pattern, &options)?;
                *last_search = Some(pattern);
                line
            }
        };
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let value = i64::try_from(base).unwrap_or(i64::MAX).saturating_add(address.offset);
        values.push(usize::try_from(value.clamp(0, total)).unwrap_or(0));
    }

    let span = match values.as_slice() {
        [] => return Ok(None),
        [only] => LineSpan::new(*only, *only),
        [.., a, b] => LineSpan::new(*a.min(b), *a.max(b)),
    };
    Ok(Some(span))
}

/// Line of the next line matching `pattern` after (or before) `current`
fn search_line(
    text: &str,
    current: usize,
    pattern: &str,
    options: &SearchOptions,
) -> Result<usize, ExError> {
    let regex = search::compile(pattern, options)?;
    let lines: Vec<&str> = text.split('\n').collect();
    let total = line_count(text);
    let current = current.min(total);

    let order: Vec<usize> = if options.backward {
        let mut order: Vec<usize> = (1..current).rev().collect();
        if options.wrapscan {
            order.extend((current.max(1)..=total).rev());
        }
        order
    } else {
        let mut order: Vec<usize> = (current + 1..=total).collect();
        if options.wrapscan {
            order.extend(1..=current);
        }
        order
    };
    order
        .into_iter()
        .find(|&n| lines.get(n - 1).is_some_and(|line| regex.is_match(line)))
        .ok_or_else(|| ExError::PatternNotFound(pattern.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::ex::parser::parse;
    use crate::surface::InputSurface;

    fn range(text: &str, line: usize) -> TextRange {
        let doc = Document::new(Box::new(InputSurface::from_text(text))).shared();
        let mut range = TextRange::new(&doc);
        range.set_line(line);
        range
    }

    fn span(input: &str, range: &TextRange) -> Result<Option<LineSpan>, ExError> {
        let cmd = parse(input)?;
        resolve(&cmd.addresses, range, &mut None)
    }

    #[test]
    fn test_numbers_and_specials() {
        let r = range("One\nTwo\nThree\nFour", 2);
        assert_eq!(span("p", &r).unwrap(), None);
        assert_eq!(span("3p", &r).unwrap(), Some(LineSpan::new(3, 3)));
        assert_eq!(span(".p", &r).unwrap(), Some(LineSpan::new(2, 2)));
        assert_eq!(span("$p", &r).unwrap(), Some(LineSpan::new(4, 4)));
        assert_eq!(span("%p", &r).unwrap(), Some(LineSpan::new(1, 4)));
        assert_eq!(span("3,1p", &r).unwrap(), Some(LineSpan::new(1, 3)));
        assert_eq!(span("+,$-1p", &r).unwrap(), Some(LineSpan::new(3, 3)));
        assert_eq!(span("99p", &r).unwrap(), Some(LineSpan::new(4, 4)));
    }

    #[test]
    fn test_semicolon_reanchors() {
        let r = range("One\nTwo\nThree\nFour", 1);
        assert_eq!(span("3;+1p", &r).unwrap(), Some(LineSpan::new(3, 4)));
        assert_eq!(span("3,+1p", &r).unwrap(), Some(LineSpan::new(2, 3)));
    }

    #[test]
    fn test_search_addresses() {
        let r = range("One\nTwo\nThree", 1);
        let mut last = None;
        let cmd = parse("/Two/;+1p").unwrap();
        let resolved = resolve(&cmd.addresses, &r, &mut last).unwrap();
        assert_eq!(resolved, Some(LineSpan::new(2, 3)));
        assert_eq!(last.as_deref(), Some("Two"));

        // wraps past the end
        let r = range("One\nTwo\nThree", 3);
        assert_eq!(span("/One/p", &r).unwrap(), Some(LineSpan::new(1, 1)));
        assert_eq!(span("?Three?p", &r).unwrap(), Some(LineSpan::new(3, 3)));
        assert!(matches!(span("/Zzz/p", &r), Err(ExError::PatternNotFound(_))));
        assert!(matches!(span("//p", &r), Err(ExError::NoPreviousPattern)));
    }

    #[test]
    fn test_marks_and_current_range() {
        let mut r = range("One\nTwo\nThree", 1);
        assert!(matches!(span("'a", &r), Err(ExError::MarkNotSet(_))));
        r.set_line(3);
        r.bookmark("a");
        r.set_lines(1, 2);
        assert_eq!(span("'a", &r).unwrap(), Some(LineSpan::new(3, 3)));
        assert_eq!(span("%%", &r).unwrap(), Some(LineSpan::new(1, 2)));
        assert!(matches!(
            span("%%,3p", &r),
            Err(ExError::AmbiguousAddress(_))
        ));
    }
}
