//! Text hooks run, in declaration order, on text about to be written through
//! a range.
//!
//! Each hook is a plain function from the incoming text to the text that is
//! actually written. There is no wrapping or chaining of methods: [`run`] walks
//! [`HOOKS`] front to back.

use crate::history::EditKind;
use crate::util::text::{line_start_from, LINE_SEPARATOR};

/// Per-call options for a text write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Edit type tag carried by the change notifications
    pub kind: EditKind,
    /// Indentation to apply to every line the write starts
    pub indent: Option<String>,
}

impl TextOptions {
    pub fn kind(kind: EditKind) -> Self {
        Self { kind, indent: None }
    }

    pub fn with_indent(mut self, indent: Option<String>) -> Self {
        self.indent = indent.filter(|i| !i.is_empty());
        self
    }
}

/// What a hook can see about the write
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Text before the write
    pub text: &'a str,
    /// Char offset the write starts at
    pub start: usize,
    pub options: &'a TextOptions,
}

pub type TextHook = fn(&HookContext<'_>, String) -> String;

/// The hook chain, in the order it runs
pub const HOOKS: &[(&str, TextHook)] = &[("newlines", newlines), ("autoindent", autoindent)];

/// Run every hook over `text`
pub fn run(ctx: &HookContext<'_>, text: &str) -> String {
    HOOKS
        .iter()
        .fold(text.to_string(), |acc, (_, hook)| hook(ctx, acc))
}

/// Normalize `\r\n` and lone `\r` to `\n`
fn newlines(_: &HookContext<'_>, text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Prefix the configured indentation to each non-empty line the write
/// begins: the first one when the write starts at a line start, and every
/// line following a separator.
fn autoindent(ctx: &HookContext<'_>, text: String) -> String {
    let Some(indent) = ctx.options.indent.as_deref() else {
        return text;
    };
    let at_line_start = line_start_from(ctx.text, ctx.start) == ctx.start;

    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    for (i, line) in text.split(LINE_SEPARATOR).enumerate() {
        if i > 0 {
            out.push(LINE_SEPARATOR);
        }
        if (i > 0 || at_line_start) && !line.is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(text: &'a str, start: usize, options: &'a TextOptions) -> HookContext<'a> {
        HookContext {
            text,
            start,
            options,
        }
    }

    #[test]
    fn test_newlines_normalized() {
        let options = TextOptions::default();
        assert_eq!(run(&ctx("", 0, &options), "a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_autoindent_after_separator() {
        let options = TextOptions::default().with_indent(Some("  ".to_string()));
        // insertion at the end of "  One": first line continues, the new one is indented
        assert_eq!(run(&ctx("  One", 5, &options), "\nfoo"), "\n  foo");
    }

    #[test]
    fn test_autoindent_at_line_start_skips_empty_lines() {
        let options = TextOptions::default().with_indent(Some("\t".to_string()));
        assert_eq!(run(&ctx("x\n", 2, &options), "a\n\nb"), "\ta\n\n\tb");
    }

    #[test]
    fn test_no_indent_leaves_text() {
        let options = TextOptions::default().with_indent(Some(String::new()));
        assert_eq!(options.indent, None);
        assert_eq!(run(&ctx("", 0, &options), "a\nb"), "a\nb");
    }
}
