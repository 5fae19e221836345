//! Ex command-line parsing: splitting on `|`, address tokens, command words,
//! the `!` variant and the parameter.
//!
//! A command line is parsed one command at a time so that a malformed command
//! only stops the chain at the point where it appears.
//!
//! ```text
//! [addresses] command[!] [parameter] | ...
//! ```

use crate::error::ExError;

use super::commands::Command;

/// What an address is measured from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBase {
    /// `.`
    Current,
    /// `$`
    Last,
    /// `%`, shorthand for `1,$`
    Whole,
    /// `%%`, the lines the range currently spans
    CurrentRange,
    /// Absolute 1-indexed line
    Line(usize),
    /// `/pattern/flags` or `?pattern?flags`
    Search {
        pattern: String,
        flags: String,
        backward: bool,
    },
    /// `'x`
    Mark(String),
    /// Bare offset, or nothing before a separator; relative to the current line
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub base: AddressBase,
    pub offset: i64,
}

impl Address {
    pub fn new(base: AddressBase) -> Self {
        Self { base, offset: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressToken {
    Address(Address),
    /// `,`: independent addresses
    Comma,
    /// `;`: the previous address becomes the current line
    Semicolon,
}

/// One parsed command
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub addresses: Vec<AddressToken>,
    /// `None` for a bare address, which only positions the range
    pub command: Option<Command>,
    pub variant: bool,
    /// How many times a repeatable symbol was given (`>>>` is 3)
    pub repeat: usize,
    pub parameter: String,
}

impl ParsedCommand {
    fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.command.is_none() && self.parameter.is_empty()
    }
}

/// Search flag letters accepted after an address pattern
const FLAG_LETTERS: &str = "imsuwbyrxIMSUWBYRX";

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.skip_while(char::is_whitespace);
    }

    fn number(&mut self) -> Option<usize> {
        self.skip_while(|c| c.is_ascii_digit()).parse().ok()
    }

    /// Text up to an unescaped `delim` (consumed) or the end of input. An
    /// escaped delimiter loses its backslash; other escapes are kept.
    fn delimited(&mut self, delim: char) -> String {
        let mut out = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                '\\' => match self.bump() {
                    Some(next) if next == delim => out.push(next),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                c if c == delim => break,
                c => out.push(c),
            }
        }
        out
    }
}

// =============================================================================
// Addresses
// =============================================================================

fn parse_address(s: &mut Scanner<'_>) -> Result<Option<Address>, ExError> {
    let base = match s.peek() {
        Some('%') => {
            s.bump();
            if s.eat('%') {
                AddressBase::CurrentRange
            } else {
                AddressBase::Whole
            }
        }
        Some('.') => {
            s.bump();
            AddressBase::Current
        }
        Some('$') => {
            s.bump();
            AddressBase::Last
        }
        Some(c) if c.is_ascii_digit() => AddressBase::Line(s.number().unwrap_or(0)),
        Some('\'') => {
            s.bump();
            match s.bump() {
                Some(c) if !c.is_whitespace() => AddressBase::Mark(c.to_string()),
                _ => return Err(ExError::parse("missing mark name")),
            }
        }
        Some(delim @ ('/' | '?')) => {
            s.bump();
            let pattern = s.delimited(delim);
            let flags = address_flags(s);
            AddressBase::Search {
                pattern,
                flags,
                backward: delim == '?',
            }
        }
        Some('+' | '-') => AddressBase::Empty,
        _ => return Ok(None),
    };

    let mut offset = 0i64;
    loop {
        let sign = match s.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => break,
        };
        s.bump();
        let n = s.number().unwrap_or(1);
        offset += sign * i64::try_from(n).unwrap_or(i64::MAX);
    }
    Ok(Some(Address { base, offset }))
}

/// Flag letters after an address pattern. They are only taken as flags when
/// something other than a command word follows; `/x/d` stays a delete.
fn address_flags(s: &mut Scanner<'_>) -> String {
    let rest = s.rest();
    let run: &str = &rest[..rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len())];
    if run.is_empty() || !run.chars().all(|c| FLAG_LETTERS.contains(c)) {
        return String::new();
    }
    let follows_address = rest[run.len()..]
        .chars()
        .next()
        .is_some_and(|c| matches!(c, ',' | ';' | '+' | '-') || c.is_whitespace() || c.is_ascii_digit());
    if !follows_address {
        return String::new();
    }
    s.pos += run.len();
    run.to_string()
}

fn parse_addresses(s: &mut Scanner<'_>) -> Result<Vec<AddressToken>, ExError> {
    let mut tokens = Vec::new();
    loop {
        s.skip_ws();
        let address = parse_address(s)?;
        s.skip_ws();
        let separator = match s.peek() {
            Some(',') => Some(AddressToken::Comma),
            Some(';') => Some(AddressToken::Semicolon),
            _ => None,
        };
        let address = address.map(AddressToken::Address);
        match (address, separator) {
            (address, Some(separator)) => {
                s.bump();
                tokens.push(
                    address.unwrap_or(AddressToken::Address(Address::new(AddressBase::Empty))),
                );
                tokens.push(separator);
            }
            (Some(address), None) => {
                tokens.push(address);
                break;
            }
            (None, None) => {
                if matches!(
                    tokens.last(),
                    Some(AddressToken::Comma | AddressToken::Semicolon)
                ) {
                    tokens.push(AddressToken::Address(Address::new(AddressBase::Empty)));
                }
                break;
            }
        }
    }
    Ok(tokens)
}

/// Parse a standalone address list, e.g. the destination of `move`
pub fn parse_address_list(src: &str) -> Result<Vec<AddressToken>, ExError> {
    let mut s = Scanner::new(src);
    let tokens = parse_addresses(&mut s)?;
    s.skip_ws();
    if !s.rest().is_empty() {
        return Err(ExError::parse(format!("bad address: {src}")));
    }
    Ok(tokens)
}

// =============================================================================
// Command word and parameter
// =============================================================================

/// Command word: a run of letters, or one symbol. `<` and `>` repeat.
fn command_word<'a>(s: &mut Scanner<'a>) -> (&'a str, usize) {
    let start = s.pos;
    match s.peek() {
        Some(c) if c.is_ascii_alphabetic() => {
            let word = s.skip_while(|c| c.is_ascii_alphabetic());
            (word, 1)
        }
        Some(c @ ('<' | '>')) => {
            let run = s.skip_while(|x| x == c);
            (&s.src[start..start + c.len_utf8()], run.len())
        }
        Some('&' | '~' | '=' | '#') => {
            s.bump();
            (&s.src[start..s.pos], 1)
        }
        _ => ("", 1),
    }
}

/// End of a plain parameter: the first `|` outside a double-quoted string
fn plain_end(s: &mut Scanner<'_>) -> usize {
    loop {
        match s.peek() {
            None => return s.src.len(),
            Some('|') => return s.pos,
            Some('"') => {
                s.bump();
                while let Some(ch) = s.bump() {
                    match ch {
                        '\\' => {
                            s.bump();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            Some('\\') => {
                s.bump();
                s.bump();
            }
            Some(_) => {
                s.bump();
            }
        }
    }
}

/// Can `c` delimit a substitute pattern?
pub fn is_pattern_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '\\' | '"' | '|' | '&')
}

/// End of a substitute parameter: skip the pattern and replacement sections
/// before looking for `|`
fn pattern_end(s: &mut Scanner<'_>) -> usize {
    if let Some(delim) = s.peek().filter(|c| is_pattern_delimiter(*c)) {
        s.bump();
        s.delimited(delim);
        loop {
            match s.peek() {
                None | Some('|') => break,
                Some('\\') => {
                    s.bump();
                    s.bump();
                }
                Some(c) if c == delim => {
                    s.bump();
                    break;
                }
                Some(_) => {
                    s.bump();
                }
            }
        }
    }
    plain_end(s)
}

/// The whole parameter JSON-decoded when it is one quoted string
fn decode_parameter(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        if let Ok(decoded) = serde_json::from_str::<String>(trimmed) {
            return decoded;
        }
    }
    trimmed.to_string()
}

/// Parse the first command of `src`. Returns it with the byte offset where
/// it ends (a top-level `|` or the end of input).
fn scan(src: &str) -> Result<(ParsedCommand, usize), ExError> {
    let mut s = Scanner::new(src);
    s.skip_while(|c| c == ':' || c.is_whitespace());

    let addresses = parse_addresses(&mut s)?;
    s.skip_ws();

    let (word, repeat) = command_word(&mut s);
    let mut legacy_mark = None;
    let command = if word.is_empty() {
        None
    } else {
        match Command::lookup(word) {
            Ok(command) => Some(command),
            // `ka` is the old spelling of `k a`
            Err(_) if word.len() == 2 && word.starts_with('k') => {
                legacy_mark = Some(word[1..].to_string());
                Some(Command::Mark)
            }
            Err(e) => return Err(e),
        }
    };
    let variant = s.eat('!');

    let param_start = s.pos;
    let end = match command {
        Some(c) if c.takes_rest_of_line() => src.len(),
        Some(c) if c.takes_pattern() => {
            s.skip_ws();
            pattern_end(&mut s)
        }
        _ => plain_end(&mut s),
    };
    let raw = &src[param_start..end];
    let parameter = match (legacy_mark, command) {
        (Some(name), _) => name,
        (None, Some(c)) if c.takes_pattern() || c.takes_rest_of_line() => raw.trim().to_string(),
        _ => decode_parameter(raw).replace("\\|", "|"),
    };

    if command.is_none() && (variant || !parameter.is_empty()) {
        return Err(ExError::parse(format!("missing command: {}", src.trim())));
    }

    Ok((
        ParsedCommand {
            addresses,
            command,
            variant,
            repeat,
            parameter,
        },
        end,
    ))
}

/// Parse a single command
pub fn parse(src: &str) -> Result<ParsedCommand, ExError> {
    scan(src).map(|(command, _)| command)
}

/// Split a command line into its top-level `|`-separated commands.
///
/// A `|` inside a quoted string, an address pattern or a substitute section
/// does not split, and `global` takes the rest of the line.
pub fn split(input: &str) -> Result<Vec<&str>, ExError> {
    let mut segments = Vec::new();
    let mut rest = input;
    loop {
        let (_, end) = scan(rest)?;
        segments.push(&rest[..end]);
        if end >= rest.len() {
            return Ok(segments);
        }
        rest = &rest[end + 1..];
    }
}

/// Lazily parse every command of a line; parsing stops at the first error.
pub fn commands(input: &str) -> Commands<'_> {
    Commands { rest: Some(input) }
}

pub struct Commands<'a> {
    rest: Option<&'a str>,
}

impl Iterator for Commands<'_> {
    type Item = Result<ParsedCommand, ExError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.rest?;
            match scan(rest) {
                Ok((command, end)) => {
                    self.rest = (end < rest.len()).then(|| &rest[end + 1..]);
                    if command.is_empty() {
                        continue;
                    }
                    return Some(Ok(command));
                }
                Err(e) => {
                    self.rest = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> AddressToken {
        AddressToken::Address(Address::new(AddressBase::Line(n)))
    }

    #[test]
    fn test_parse_append_with_address() {
        let cmd = parse("2 a foo").unwrap();
        assert_eq!(cmd.addresses, vec![line(2)]);
        assert_eq!(cmd.command, Some(Command::Append));
        assert_eq!(cmd.parameter, "foo");
        assert!(!cmd.variant);
    }

    #[test]
    fn test_parse_range_and_variant() {
        let cmd = parse("::1,2d!").unwrap();
        assert_eq!(cmd.addresses, vec![line(1), AddressToken::Comma, line(2)]);
        assert_eq!(cmd.command, Some(Command::Delete));
        assert!(cmd.variant);
    }

    #[test]
    fn test_parse_search_and_semicolon() {
        let cmd = parse("/Two/;+1 s/[et]/*/ig").unwrap();
        assert_eq!(
            cmd.addresses,
            vec![
                AddressToken::Address(Address::new(AddressBase::Search {
                    pattern: "Two".to_string(),
                    flags: String::new(),
                    backward: false,
                })),
                AddressToken::Semicolon,
                AddressToken::Address(Address {
                    base: AddressBase::Empty,
                    offset: 1,
                }),
            ]
        );
        assert_eq!(cmd.command, Some(Command::Substitute));
        assert_eq!(cmd.parameter, "/[et]/*/ig");
    }

    #[test]
    fn test_address_flags_only_before_separators() {
        let cmd = parse("/x/i,$p").unwrap();
        assert!(matches!(
            &cmd.addresses[0],
            AddressToken::Address(Address { base: AddressBase::Search { flags, .. }, .. }) if flags == "i"
        ));
        let cmd = parse("/x/d").unwrap();
        assert_eq!(cmd.command, Some(Command::Delete));
    }

    #[test]
    fn test_parse_marks_and_specials() {
        let cmd = parse("'a,$-2 >>").unwrap();
        assert_eq!(
            cmd.addresses[0],
            AddressToken::Address(Address::new(AddressBase::Mark("a".to_string())))
        );
        assert_eq!(
            cmd.addresses[2],
            AddressToken::Address(Address {
                base: AddressBase::Last,
                offset: -2,
            })
        );
        assert_eq!(cmd.command, Some(Command::ShiftRight));
        assert_eq!(cmd.repeat, 2);

        let cmd = parse("%%p").unwrap();
        assert_eq!(
            cmd.addresses,
            vec![AddressToken::Address(Address::new(AddressBase::CurrentRange))]
        );
    }

    #[test]
    fn test_legacy_mark_spelling() {
        let cmd = parse("kx").unwrap();
        assert_eq!(cmd.command, Some(Command::Mark));
        assert_eq!(cmd.parameter, "x");
    }

    #[test]
    fn test_json_parameter_decoded() {
        let cmd = parse(r#"a "one\ntwo""#).unwrap();
        assert_eq!(cmd.parameter, "one\ntwo");
    }

    #[test]
    fn test_split_respects_nesting() {
        assert_eq!(split("1d|2d").unwrap(), vec!["1d", "2d"]);
        assert_eq!(split(r#"a "x|y" | p"#).unwrap(), vec![r#"a "x|y" "#, " p"]);
        assert_eq!(split("/a|b/d|p").unwrap(), vec!["/a|b/d", "p"]);
        assert_eq!(split("s/a|b/c|d/g|p").unwrap(), vec!["s/a|b/c", "d/g", "p"]);
        assert_eq!(split("s/a/b|c/|p").unwrap(), vec!["s/a/b", "c/", "p"]);
        assert_eq!(split("g/x/d|p").unwrap(), vec!["g/x/d|p"]);
    }

    #[test]
    fn test_commands_skip_empty_segments() {
        let parsed: Vec<_> = commands("1d||:|p").collect::<Result<_, _>>().unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].command, Some(Command::Print));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("zap"), Err(ExError::UnknownCommand(_))));
        assert!(matches!(parse("' d"), Err(ExError::Parse(_))));
        let mut chain = commands("p|zap|p");
        assert!(chain.next().is_some_and(|c| c.is_ok()));
        assert!(chain.next().is_some_and(|c| c.is_err()));
        assert!(chain.next().is_none());
    }

    #[test]
    fn test_standalone_address_list() {
        assert_eq!(parse_address_list("0").unwrap(), vec![line(0)]);
        assert!(parse_address_list("3 junk").is_err());
    }
}
