//! Character-offset helpers over plain `&str` text.
//!
//! Every offset handled by the range layer counts Unicode scalar values, while
//! `regex` and `str` slicing work in bytes. These helpers convert between the two
//! and answer the line questions the bounds registry and the interpreter ask.

/// Line separator understood by line arithmetic
pub const LINE_SEPARATOR: char = '\n';

/// Convert a char offset to a byte offset (clamped to the end of `text`)
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Convert a byte offset to a char offset
pub fn byte_to_char(text: &str, byte_offset: usize) -> usize {
    let byte_offset = byte_offset.min(text.len());
    text[..byte_offset].chars().count()
}

/// Byte index of the char boundary following `byte_offset`
pub fn next_boundary(text: &str, byte_offset: usize) -> usize {
    text[byte_offset..]
        .chars()
        .next()
        .map(|c| byte_offset + c.len_utf8())
        .unwrap_or(text.len() + 1)
}

/// Total length in chars
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Slice by char offsets (clamped)
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = char_to_byte(text, start);
    let end_byte = char_to_byte(text, end.max(start));
    &text[start_byte..end_byte]
}

/// Number of lines: separators plus a partial final line, never less than one.
///
/// A trailing separator terminates the last line rather than opening a new one.
pub fn line_count(text: &str) -> usize {
    let separators = text.matches(LINE_SEPARATOR).count();
    let partial = usize::from(!text.is_empty() && !text.ends_with(LINE_SEPARATOR));
    (separators + partial).max(1)
}

/// Char offset where 1-indexed line `n` starts, `None` when the buffer has
/// fewer than `n - 1` separators.
pub fn line_start(text: &str, n: usize) -> Option<usize> {
    if n <= 1 {
        return Some(0);
    }
    let mut seen = 0;
    for (i, ch) in text.chars().enumerate() {
        if ch == LINE_SEPARATOR {
            seen += 1;
            if seen == n - 1 {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Char offset of the separator ending the line that contains `offset`,
/// or the buffer length.
pub fn line_end_from(text: &str, offset: usize) -> usize {
    let mut pos = offset;
    for ch in text.chars().skip(offset) {
        if ch == LINE_SEPARATOR {
            return pos;
        }
        pos += 1;
    }
    pos
}

/// Char offset just after the separator preceding `offset`, or 0.
pub fn line_start_from(text: &str, offset: usize) -> usize {
    let byte = char_to_byte(text, offset);
    match text[..byte].rfind(LINE_SEPARATOR) {
        Some(sep) => byte_to_char(text, sep) + 1,
        None => 0,
    }
}

/// 1-indexed line number containing the char offset
pub fn line_at(text: &str, offset: usize) -> usize {
    let byte = char_to_byte(text, offset);
    text[..byte].matches(LINE_SEPARATOR).count() + 1
}

/// Leading whitespace of a line
pub fn indentation(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !matches!(c, ' ' | '\t'))
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Visual width of an indentation string, expanding tabs to `tabsize` stops
pub fn indent_width(indent: &str, tabsize: usize) -> usize {
    let tabsize = tabsize.max(1);
    indent.chars().fold(0, |col, ch| {
        if ch == '\t' {
            col + tabsize - (col % tabsize)
        } else {
            col + 1
        }
    })
}

/// Remove up to `width` columns of leading whitespace from `line`
pub fn outdent(line: &str, width: usize, tabsize: usize) -> &str {
    let tabsize = tabsize.max(1);
    let mut col = 0;
    for (i, ch) in line.char_indices() {
        if col >= width {
            return &line[i..];
        }
        match ch {
            ' ' => col += 1,
            '\t' => col += tabsize - (col % tabsize),
            _ => return &line[i..],
        }
    }
    ""
}
