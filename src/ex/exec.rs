//! Command bodies.
//!
//! [`execute`] resolves a parsed command's addresses, positions the range on
//! the addressed lines and dispatches. Every body works on whole lines and
//! leaves the range on the lines it produced.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::bounds::Bounds;
use crate::error::ExError;
use crate::history::EditKind;
use crate::hooks::TextOptions;
use crate::range::TextRange;
use crate::search::{self, SearchOptions};
use crate::session::{Session, Substitution};
use crate::util::text::{
    char_len, indentation, line_at, line_count, line_end_from, line_start, outdent, LINE_SEPARATOR,
};

use super::address::{self, LineSpan};
use super::commands::{Command, DefaultAddress};
use super::options::{tokenize, OptionName};
use super::parser::{self, is_pattern_delimiter, ParsedCommand};
use super::registers::is_register_name;
use super::state::{SaveStatus, CURRENT_MARK, PREVIOUS_MARK};

const NO_WRITE: &str = "No write since last change (add ! to override)";

/// Execute one parsed command against `range`
pub(crate) async fn execute(
    session: &mut Session,
    range: &mut TextRange,
    cmd: &ParsedCommand,
) -> Result<(), ExError> {
    let explicit = address::resolve(&cmd.addresses, range, &mut session.last_search)?;
    if explicit.is_some() {
        range.bookmark(PREVIOUS_MARK);
    }

    let Some(command) = cmd.command else {
        // a bare address only moves the range
        if let Some(span) = explicit {
            range.set_lines(span.first.max(1), span.last.max(1));
            range.bookmark(CURRENT_MARK);
        }
        return Ok(());
    };

    let span = match (explicit, command.default_address()) {
        (Some(span), _) => span,
        (None, DefaultAddress::Current | DefaultAddress::Keep) => {
            let (first, last) = range.lines();
            LineSpan::new(first, last)
        }
        (None, DefaultAddress::Whole) => LineSpan::new(1, total_lines(range)),
        (None, DefaultAddress::Last) => {
            let total = total_lines(range);
            LineSpan::new(total, total)
        }
    };
    if explicit.is_some() && command.default_address() != DefaultAddress::Keep {
        range.set_lines(span.first.max(1), span.last.max(1));
    }
    debug!(%command, first = span.first, last = span.last, variant = cmd.variant, "ex command");

    // undo and redo walk the history and must not record into it
    let grouped = !matches!(command, Command::Undo | Command::Redo);
    let doc = range.document().clone();
    if grouped {
        doc.borrow_mut().begin_batch();
    }
    let result = dispatch(session, range, cmd, command, span).await;
    if grouped {
        doc.borrow_mut().end_batch();
    }
    result?;

    range.bookmark(CURRENT_MARK);
    Ok(())
}

/// Run `command` over the resolved `span`
async fn dispatch(
    session: &mut Session,
    range: &mut TextRange,
    cmd: &ParsedCommand,
    command: Command,
    span: LineSpan,
) -> Result<(), ExError> {
    let param = cmd.parameter.as_str();
    let variant = cmd.variant;
    match command {
        Command::Append => append(range, span.last, span.last, param, variant),
        Command::Insert => append(range, span.first.saturating_sub(1), span.first, param, variant),
        Command::Change => change(session, range, span, param, variant)?,
        Command::Delete => delete(session, range, span, param, true)?,
        Command::Yank => delete(session, range, span, param, false)?,
        Command::Put => put(session, range, span, param, variant)?,
        Command::Join => join(range, span, param, variant)?,
        Command::Move => transfer(session, range, span, param, true)?,
        Command::Copy => transfer(session, range, span, param, false)?,
        Command::Substitute | Command::Ampersand | Command::Tilde => {
            substitute(session, range, span, command, param)?
        }
        Command::Global => global(session, range, span, param, variant).await?,
        Command::Notglobal => global(session, range, span, param, true).await?,
        Command::Print => print(session, range, span, false),
        Command::Number => print(session, range, span, true),
        Command::LineNumber => session.host.stdout(&span.last.to_string()),
        Command::ShiftLeft | Command::ShiftRight => {
            shift(range, span, param, cmd.repeat, command == Command::ShiftRight)?
        }
        Command::Mark => mark(range, span, param)?,
        Command::Marks => marks(session, range),
        Command::Registers => registers(session),
        Command::Undo => {
            let restored = range.document().borrow_mut().undo();
            if let Some(bounds) = restored {
                range.set_bounds(bounds);
            }
        }
        Command::Redo => {
            let restored = range.document().borrow_mut().redo();
            if let Some(bounds) = restored {
                range.set_bounds(bounds);
            }
        }
        Command::Set => set(session, range, param)?,
        Command::Option(name) => {
            let output = range
                .document()
                .borrow_mut()
                .options_mut()
                .command(name, param, variant)?;
            if let Some(output) = output {
                session.host.stdout(&output);
            }
        }
        Command::Write => write(session, range, span, param).await?,
        Command::Edit => edit(session, range, param, variant).await?,
        Command::Read => read(session, range, span, param).await?,
        Command::File => file(session, range, param)?,
        Command::Quit => quit(session, range, variant)?,
        Command::Wq => {
            write(session, range, span, param).await?;
            quit(session, range, variant)?;
        }
        Command::Xit => {
            if range.document().borrow().status().is_dirty() {
                write(session, range, span, param).await?;
            }
            quit(session, range, variant)?;
        }
    }
    Ok(())
}

// =============================================================================
// Line helpers
// =============================================================================

fn total_lines(range: &TextRange) -> usize {
    range.with_text(line_count)
}

/// Content of 1-indexed line `n`, without its separator
fn line_text(text: &str, n: usize) -> &str {
    text.split(LINE_SEPARATOR)
        .nth(n.saturating_sub(1))
        .unwrap_or("")
}

/// Content of lines `first..=last` joined by separators
fn lines_text(text: &str, first: usize, last: usize) -> String {
    let first = first.max(1);
    text.split(LINE_SEPARATOR)
        .skip(first - 1)
        .take((last + 1).saturating_sub(first))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Char offset of the separator ending line `n`, or the buffer length
fn line_end(text: &str, n: usize) -> usize {
    line_start(text, n.max(1)).map_or(char_len(text), |s| line_end_from(text, s))
}

/// Content region of lines `first..=last`, separators excluded at the ends
fn line_region(text: &str, first: usize, last: usize) -> Bounds {
    let start = line_start(text, first.max(1)).unwrap_or(char_len(text));
    Bounds::new(start, line_end(text, last).max(start))
}

/// Region removed when deleting lines `first..=last`: the lines with the
/// separator after them, or the one before them at the end of the buffer
fn delete_region(text: &str, first: usize, last: usize) -> Bounds {
    let first = first.max(1);
    let start = line_start(text, first).unwrap_or(char_len(text));
    if let Some(next) = line_start(text, last + 1) {
        return Bounds::new(start, next);
    }
    if first > 1 {
        return Bounds::new(start.saturating_sub(1), char_len(text));
    }
    Bounds::new(0, char_len(text))
}

fn replace(range: &TextRange, region: Bounds, text: &str) {
    range
        .document()
        .borrow_mut()
        .replace(region.start, region.end, text, EditKind::Command);
}

fn text_options(range: &TextRange, indent_line: Option<usize>, variant: bool) -> TextOptions {
    let autoindent = range
        .document()
        .borrow()
        .options()
        .flag(OptionName::Autoindent);
    let indent = match indent_line {
        Some(n) if autoindent != variant => {
            Some(range.with_text(|t| indentation(line_text(t, n)).to_string()))
        }
        _ => None,
    };
    TextOptions::kind(EditKind::Command).with_indent(indent)
}

/// Insert `body` as new lines after line `after` (0: before the first) and
/// put the range on them
fn insert_lines(range: &mut TextRange, after: usize, body: &str, options: &TextOptions) -> LineSpan {
    let after = after.min(total_lines(range));
    let (at, chunk) = range.with_text(|t| {
        if t.is_empty() {
            (0, body.to_string())
        } else if after == 0 {
            (0, format!("{body}\n"))
        } else {
            (line_end(t, after), format!("\n{body}"))
        }
    });
    range.set_bounds(Bounds::collapsed(at));
    range.set_text_with(&chunk, options);
    let added = body.split(LINE_SEPARATOR).count();
    let span = LineSpan::new(after + 1, after + added);
    range.set_lines(span.first, span.last);
    span
}

/// Optional register name then optional count, e.g. `a 3`
fn register_and_count(param: &str) -> Result<(Option<char>, Option<usize>), ExError> {
    let param = param.trim();
    let mut chars = param.chars();
    let register = match chars.next() {
        Some(c) if is_register_name(c) && !c.is_ascii_digit() => Some(c),
        _ => None,
    };
    let rest = if register.is_some() {
        chars.as_str().trim()
    } else {
        param
    };
    let count = if rest.is_empty() {
        None
    } else {
        match rest.parse::<usize>() {
            Ok(0) | Err(_) => return Err(ExError::parse(format!("bad count: {rest}"))),
            Ok(n) => Some(n),
        }
    };
    Ok((register, count))
}

/// `count` lines starting at `span.last`, clamped to the buffer
fn counted(span: LineSpan, count: Option<usize>, total: usize) -> LineSpan {
    match count {
        Some(n) => LineSpan::new(span.last.max(1), (span.last.max(1) + n - 1).min(total)),
        None => LineSpan::new(span.first.max(1), span.last.max(1)),
    }
}

// =============================================================================
// Text commands
// =============================================================================

/// Insert lines after `after`, indenting like line `indent_line` when
/// autoindent (flipped by `!`) is on
fn append(range: &mut TextRange, after: usize, indent_line: usize, text: &str, variant: bool) {
    let options = text_options(range, Some(indent_line).filter(|n| *n > 0), variant);
    insert_lines(range, after, text, &options);
}

fn change(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    text: &str,
    variant: bool,
) -> Result<(), ExError> {
    let first = span.first.max(1);
    let last = span.last.max(first);
    let (old, region) = range.with_text(|t| (lines_text(t, first, last), line_region(t, first, last)));
    session.registers.store(None, format!("{old}\n"))?;

    let options = text_options(range, Some(first), variant);
    range.set_bounds(region);
    range.set_text_with(text, &options);
    let added = text.split(LINE_SEPARATOR).count();
    range.set_lines(first, first + added - 1);
    Ok(())
}

/// `delete` and `yank`
fn delete(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
    remove: bool,
) -> Result<(), ExError> {
    let (register, count) = register_and_count(param)?;
    let span = counted(span, count, total_lines(range));
    let (text, region) = range.with_text(|t| {
        (
            lines_text(t, span.first, span.last),
            delete_region(t, span.first, span.last),
        )
    });
    session.registers.store(register, format!("{text}\n"))?;
    if remove {
        replace(range, region, "");
    }
    let line = span.first.min(total_lines(range));
    range.set_line(line);
    Ok(())
}

fn put(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
    before: bool,
) -> Result<(), ExError> {
    // put takes no count, so a lone digit names a numbered register
    let register = match param.trim() {
        p if p.len() == 1 && p.starts_with(|c: char| c.is_ascii_digit()) => p.chars().next(),
        p => register_and_count(p)?.0,
    };
    let text = session
        .registers
        .get(register)
        .ok_or(ExError::EmptyRegister(register.unwrap_or('"')))?;
    let text = text.strip_suffix('\n').unwrap_or(text).to_string();
    let after = if before {
        span.first.saturating_sub(1)
    } else {
        span.last
    };
    insert_lines(range, after, &text, &TextOptions::kind(EditKind::Command));
    Ok(())
}

fn join(range: &mut TextRange, span: LineSpan, param: &str, variant: bool) -> Result<(), ExError> {
    let (_, count) = register_and_count(param)?;
    let total = total_lines(range);
    let first = span.first.max(1);
    let last = match count {
        Some(n) => first + n.max(2) - 1,
        None if span.last > first => span.last,
        None => first + 1,
    }
    .min(total);
    if last <= first {
        return Ok(());
    }

    let (joined, region) = range.with_text(|t| {
        let lines: Vec<&str> = t
            .split(LINE_SEPARATOR)
            .skip(first - 1)
            .take(last - first + 1)
            .collect();
        let joined = if variant {
            lines.concat()
        } else {
            // whitespace is collapsed only at join points
            let mut out = lines[0].to_string();
            for line in &lines[1..] {
                let line = line.trim_start();
                if line.is_empty() {
                    continue;
                }
                out.truncate(out.trim_end().len());
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(line);
            }
            out
        };
        (joined, line_region(t, first, last))
    });
    replace(range, region, &joined);
    range.set_line(first);
    Ok(())
}

/// `move` and `copy`
fn transfer(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
    remove: bool,
) -> Result<(), ExError> {
    let tokens = parser::parse_address_list(param)?;
    let dest = address::resolve(&tokens, range, &mut session.last_search)?
        .ok_or_else(|| ExError::parse("missing destination address"))?
        .last;
    let first = span.first.max(1);
    let last = span.last.max(first);
    let text = range.with_text(|t| lines_text(t, first, last));
    let options = TextOptions::kind(EditKind::Command);

    if !remove {
        insert_lines(range, dest, &text, &options);
        return Ok(());
    }
    if (first..=last).contains(&dest) || dest + 1 == first {
        range.set_lines(first, last);
        return Ok(());
    }
    let moved = last - first + 1;
    if dest > last {
        insert_lines(range, dest, &text, &options);
        let region = range.with_text(|t| delete_region(t, first, last));
        replace(range, region, "");
        range.set_lines(dest - moved + 1, dest);
    } else {
        let region = range.with_text(|t| delete_region(t, first, last));
        replace(range, region, "");
        insert_lines(range, dest, &text, &options);
    }
    Ok(())
}

// =============================================================================
// Substitute and global
// =============================================================================

/// Split `/pattern/replacement/rest` (the leading delimiter already removed)
/// into its sections. An escaped delimiter loses its backslash; other
/// escapes are kept for the regex or template.
fn split_sections(src: &str, delim: char, sections: usize) -> (Vec<String>, &str) {
    let mut out = Vec::with_capacity(sections);
    let mut current = String::new();
    let mut chars = src.char_indices();
    let mut rest = src.len();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, next)) if next == delim => current.push(next),
                Some((_, next)) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            c if c == delim => {
                out.push(std::mem::take(&mut current));
                if out.len() == sections {
                    rest = i + c.len_utf8();
                    break;
                }
            }
            c => current.push(c),
        }
    }
    if out.len() < sections {
        out.push(current);
    }
    out.resize(sections, String::new());
    (out, &src[rest..])
}

fn substitute(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    command: Command,
    param: &str,
) -> Result<(), ExError> {
    let param = param.trim_start();
    let magic = range.document().borrow().options().flag(OptionName::Magic);
    let previous = session.last_substitute.clone();

    let explicit = param
        .chars()
        .next()
        .filter(|c| command == Command::Substitute && is_pattern_delimiter(*c));
    let (pattern, replacement, flags) = match explicit {
        Some(delim) => {
            let (sections, rest) = split_sections(&param[delim.len_utf8()..], delim, 2);
            let pattern = if sections[0].is_empty() {
                session
                    .last_search
                    .clone()
                    .ok_or(ExError::NoPreviousPattern)?
            } else {
                sections[0].clone()
            };
            let previous_replacement = previous.as_ref().map_or("", |p| p.replacement.as_str());
            let replacement = search::resolve_previous(&sections[1], previous_replacement, magic);
            (pattern, replacement, rest.to_string())
        }
        None => {
            let previous = previous.ok_or(ExError::NoPreviousPattern)?;
            let flags = match param.strip_prefix('&') {
                Some(extra) => format!("{}{}", previous.flags, extra),
                None => param.to_string(),
            };
            let pattern = match command {
                Command::Tilde => session.last_search.clone().unwrap_or(previous.pattern),
                _ => previous.pattern,
            };
            (pattern, previous.replacement, flags)
        }
    };

    let doc_options = range.document().borrow().options().clone();
    let mut search_options = SearchOptions::from_options(&doc_options);
    let mut global = doc_options.flag(OptionName::Global);
    let mut count = String::new();
    for ch in flags.chars() {
        match ch {
            'g' => global = !global,
            'i' => search_options.ignorecase = true,
            'I' => search_options.ignorecase = false,
            c if c.is_ascii_digit() => count.push(c),
            c if c.is_whitespace() => {}
            c => return Err(ExError::parse(format!("bad substitute flag: {c}"))),
        }
    }
    let count = if count.is_empty() {
        None
    } else {
        count.parse::<usize>().ok().filter(|n| *n > 0)
    };
    let span = counted(span, count, total_lines(range));
    let regex = search::compile(&pattern, &search_options)?;

    let mut replaced = 0;
    let mut last_hit = None;
    {
        let mut doc = range.document().borrow_mut();
        let regions: Vec<(usize, usize)> = if doc_options.flag(OptionName::Multiline) {
            vec![(span.first, span.last)]
        } else {
            (span.first..=span.last).rev().map(|n| (n, n)).collect()
        };
        for (first, last) in regions {
            let region = line_region(doc.text(), first, last);
            let result = search::replace(doc.text(), region, &regex, &replacement, global, false, magic);
            if let Some((new_text, n)) = result {
                doc.replace(region.start, region.end, &new_text, EditKind::Command);
                replaced += n;
                last_hit.get_or_insert(last);
            }
        }
    }

    debug!(%pattern, replaced, "substitute");
    session.last_search = Some(pattern.clone());
    if replaced == 0 {
        if session.in_global {
            return Ok(());
        }
        return Err(ExError::PatternNotFound(pattern));
    }
    session.last_substitute = Some(Substitution {
        pattern,
        replacement,
        flags,
    });
    if let Some(line) = last_hit {
        range.set_line(line.min(total_lines(range)));
    }
    Ok(())
}

type Run<'a> = Pin<Box<dyn Future<Output = Result<(), ExError>> + 'a>>;

/// `global` and `notglobal`: run subcommands on every (non-)matching line.
///
/// After each hit the scan resumes one line past the hit, shifted by however
/// many lines the subcommands added or removed. This assumes the change
/// happened at the hit line; subcommands editing elsewhere can skip or
/// revisit lines.
async fn global(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
    invert: bool,
) -> Result<(), ExError> {
    if session.in_global {
        return Err(ExError::parse("global cannot be nested"));
    }
    let param = param.trim_start();
    let delim = param
        .chars()
        .next()
        .filter(|c| is_pattern_delimiter(*c))
        .ok_or_else(|| ExError::parse("global needs a delimited pattern"))?;
    let (sections, rest) = split_sections(&param[delim.len_utf8()..], delim, 1);
    let pattern = if sections[0].is_empty() {
        session
            .last_search
            .clone()
            .ok_or(ExError::NoPreviousPattern)?
    } else {
        sections[0].clone()
    };
    let commands = match rest.trim() {
        "" => "p".to_string(),
        _ => rest.trim_start().to_string(),
    };
    let options = SearchOptions::from_options(range.document().borrow().options());
    let regex = search::compile(&pattern, &options)?;
    session.last_search = Some(pattern);

    session.in_global = true;
    let result = run_global(session, range, span, &regex, invert, &commands).await;
    session.in_global = false;
    result
}

async fn run_global(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    regex: &regex::Regex,
    invert: bool,
    commands: &str,
) -> Result<(), ExError> {
    let mut line = span.first.max(1);
    let mut last = span.last;
    while line <= last {
        let (hit, before) = range.with_text(|t| (regex.is_match(line_text(t, line)), line_count(t)));
        if hit == invert {
            line += 1;
            continue;
        }
        range.set_line(line);
        for sub in commands.split(LINE_SEPARATOR) {
            let run: Run<'_> = Box::pin(session.run(range, sub));
            run.await?;
        }
        let after = total_lines(range);
        if after >= before {
            line += 1 + (after - before);
            last += after - before;
        } else {
            let removed = before - after;
            line = (line + 1).saturating_sub(removed).max(1);
            last = last.saturating_sub(removed);
        }
    }
    Ok(())
}

// =============================================================================
// Display
// =============================================================================

fn print(session: &mut Session, range: &mut TextRange, span: LineSpan, numbered: bool) {
    let first = span.first.max(1);
    let last = span.last.max(first);
    let output = range.with_text(|t| {
        t.split(LINE_SEPARATOR)
            .enumerate()
            .skip(first - 1)
            .take(last - first + 1)
            .map(|(i, line)| {
                if numbered {
                    format!("{:>6}  {line}", i + 1)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    });
    session.host.stdout(&output);
    range.set_line(last);
}

fn marks(session: &mut Session, range: &TextRange) {
    let listing = {
        let doc = range.document().borrow();
        let text = doc.text();
        doc.marks()
            .into_iter()
            .map(|(name, b)| format!("{name} {} {b}", line_at(text, b.start)))
            .collect::<Vec<_>>()
    };
    if !listing.is_empty() {
        session.host.stdout(&listing.join("\n"));
    }
}

fn registers(session: &mut Session) {
    let listing: Vec<String> = session
        .registers
        .list()
        .into_iter()
        .map(|(name, text)| format!("\"{name} {}", serde_json::to_string(text).unwrap_or_default()))
        .collect();
    if !listing.is_empty() {
        session.host.stdout(&listing.join("\n"));
    }
}

// =============================================================================
// Lines, marks, options
// =============================================================================

fn shift(
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
    repeat: usize,
    right: bool,
) -> Result<(), ExError> {
    let (_, count) = register_and_count(param)?;
    let span = counted(span, count, total_lines(range));
    let (shiftwidth, tabsize) = {
        let doc = range.document().borrow();
        let options = doc.options();
        (
            usize::try_from(options.number(OptionName::Shiftwidth)).unwrap_or(0),
            usize::try_from(options.number(OptionName::Tabsize)).unwrap_or(1),
        )
    };
    let width = shiftwidth * repeat.max(1);
    let (shifted, region) = range.with_text(|t| {
        let lines: Vec<String> = t
            .split(LINE_SEPARATOR)
            .skip(span.first - 1)
            .take(span.last - span.first + 1)
            .map(|line| {
                if !right {
                    outdent(line, width, tabsize).to_string()
                } else if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{line}", " ".repeat(width))
                }
            })
            .collect();
        (lines.join("\n"), line_region(t, span.first, span.last))
    });
    replace(range, region, &shifted);
    range.set_lines(span.first, span.last);
    Ok(())
}

fn mark(range: &mut TextRange, span: LineSpan, param: &str) -> Result<(), ExError> {
    let name = param.trim();
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => {}
        _ => return Err(ExError::parse(format!("bad mark name: {name:?}"))),
    }
    let line = span.last.max(1);
    let at = range.with_text(|t| line_start(t, line).unwrap_or(char_len(t)));
    range
        .document()
        .borrow_mut()
        .set_mark(name, Bounds::collapsed(at));
    Ok(())
}

fn set(session: &mut Session, range: &mut TextRange, param: &str) -> Result<(), ExError> {
    let mut tokens = tokenize(param);
    if tokens.is_empty() {
        tokens.push("all".to_string());
    }
    let mut output = Vec::new();
    {
        let mut doc = range.document().borrow_mut();
        for token in &tokens {
            if let Some(text) = doc.options_mut().apply_token(token)? {
                output.push(text);
            }
        }
    }
    if !output.is_empty() {
        session.host.stdout(&output.join("\n"));
    }
    Ok(())
}

// =============================================================================
// Files and quitting
// =============================================================================

/// File id from the parameter, else the `file` option, else a prompt
async fn file_name(session: &mut Session, range: &TextRange, param: &str) -> Result<String, ExError> {
    let param = param.trim();
    if !param.is_empty() {
        return Ok(param.to_string());
    }
    let current = range
        .document()
        .borrow()
        .options()
        .text(OptionName::File)
        .filter(|f| !f.is_empty())
        .map(String::from);
    if let Some(file) = current {
        return Ok(file);
    }
    let answer = session.prompt.prompt("File: ").await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(ExError::parse("no file name"));
    }
    Ok(answer.to_string())
}

fn directory(range: &TextRange) -> Option<String> {
    range
        .document()
        .borrow()
        .options()
        .text(OptionName::Directory)
        .filter(|d| !d.is_empty())
        .map(String::from)
}

async fn write(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
) -> Result<(), ExError> {
    let file = file_name(session, range, param).await?;
    let directory = directory(range);
    let text = range.with_text(|t| {
        if span.first <= 1 && span.last >= line_count(t) {
            t.to_string()
        } else {
            format!("{}\n", lines_text(t, span.first, span.last))
        }
    });

    range.document().borrow_mut().set_status(SaveStatus::Pending);
    let result = session
        .persistence
        .write(&text, &file, directory.as_deref())
        .await;
    match result {
        Ok(()) => {
            let mut doc = range.document().borrow_mut();
            doc.set_status(SaveStatus::Clean);
            if doc.options().text(OptionName::File).map_or(true, str::is_empty) {
                doc.options_mut().set_text(OptionName::File, file.clone())?;
            }
            drop(doc);
            debug!(%file, chars = char_len(&text), "written");
            session.host.stdout(&format!(
                "\"{file}\" {}L, {}C written",
                line_count(&text),
                char_len(&text)
            ));
            Ok(())
        }
        Err(source) => {
            range.document().borrow_mut().set_status(SaveStatus::Failed);
            warn!(%file, error = %source, "write failed");
            Err(ExError::Persistence {
                message: format!("{file} not saved"),
                source,
            })
        }
    }
}

async fn load(session: &mut Session, range: &TextRange, file: &str) -> Result<String, ExError> {
    let directory = directory(range);
    session
        .persistence
        .read(file, directory.as_deref())
        .await
        .map_err(|source| {
            warn!(%file, error = %source, "read failed");
            ExError::Persistence {
                message: format!("{file} not loaded"),
                source,
            }
        })
}

async fn edit(
    session: &mut Session,
    range: &mut TextRange,
    param: &str,
    force: bool,
) -> Result<(), ExError> {
    let dirty = range.document().borrow().status().is_dirty();
    if dirty && !force && !session.host.confirm("Discard unsaved changes?") {
        return Err(ExError::Refused(NO_WRITE.to_string()));
    }
    let file = file_name(session, range, param).await?;
    let text = load(session, range, &file).await?;
    {
        let mut doc = range.document().borrow_mut();
        let len = doc.len();
        doc.replace(0, len, &text, EditKind::Command);
        doc.clear_history();
        doc.set_status(SaveStatus::Clean);
        doc.options_mut().set_text(OptionName::File, file)?;
    }
    range.set_line(1);
    Ok(())
}

async fn read(
    session: &mut Session,
    range: &mut TextRange,
    span: LineSpan,
    param: &str,
) -> Result<(), ExError> {
    let file = file_name(session, range, param).await?;
    let text = load(session, range, &file).await?;
    let body = text.strip_suffix('\n').unwrap_or(&text);
    insert_lines(range, span.last, body, &TextOptions::kind(EditKind::Command));
    Ok(())
}

fn file(session: &mut Session, range: &mut TextRange, param: &str) -> Result<(), ExError> {
    let name = param.trim();
    let mut doc = range.document().borrow_mut();
    if !name.is_empty() {
        doc.options_mut().set_text(OptionName::File, name)?;
        return Ok(());
    }
    let file = doc
        .options()
        .text(OptionName::File)
        .filter(|f| !f.is_empty())
        .unwrap_or("[No Name]")
        .to_string();
    let message = format!(
        "\"{file}\" {} {} lines",
        doc.status(),
        line_count(doc.text())
    );
    drop(doc);
    session.host.stdout(&message);
    Ok(())
}

fn quit(session: &mut Session, range: &TextRange, force: bool) -> Result<(), ExError> {
    let dirty = range.document().borrow().status().is_dirty();
    if dirty && !force && !session.host.confirm("Quit without saving?") {
        return Err(ExError::Refused(NO_WRITE.to_string()));
    }
    session.host.quit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_helpers() {
        let text = "One\nTwo\nThree";
        assert_eq!(line_text(text, 2), "Two");
        assert_eq!(lines_text(text, 2, 3), "Two\nThree");
        assert_eq!(line_region(text, 2, 2), Bounds::new(4, 7));
        assert_eq!(delete_region(text, 1, 2), Bounds::new(0, 8));
        assert_eq!(delete_region(text, 3, 3), Bounds::new(7, 13));
        assert_eq!(delete_region("One", 1, 1), Bounds::new(0, 3));
        assert_eq!(delete_region("One\nTwo\n", 2, 2), Bounds::new(4, 8));
    }

    #[test]
    fn test_register_and_count() {
        assert_eq!(register_and_count("").unwrap(), (None, None));
        assert_eq!(register_and_count("a").unwrap(), (Some('a'), None));
        assert_eq!(register_and_count("3").unwrap(), (None, Some(3)));
        assert_eq!(register_and_count("B 2").unwrap(), (Some('B'), Some(2)));
        assert!(register_and_count("a x").is_err());
        assert!(register_and_count("0").is_err());
    }

    #[test]
    fn test_split_sections() {
        let (sections, rest) = split_sections(r"a\/b/c&/g3", '/', 2);
        assert_eq!(sections, vec!["a/b".to_string(), "c&".to_string()]);
        assert_eq!(rest, "g3");

        let (sections, rest) = split_sections(r"x\dy", '/', 2);
        assert_eq!(sections, vec![r"x\dy".to_string(), String::new()]);
        assert_eq!(rest, "");

        let (sections, rest) = split_sections("e/ c foo", '/', 1);
        assert_eq!(sections, vec!["e".to_string()]);
        assert_eq!(rest, " c foo");
    }
}
