//! The closed ex command table and command-word resolution.
//!
//! Resolution is a pure function over a static table: an exact name wins,
//! otherwise the first entry in declaration order whose name starts with the
//! lowercased word.

use std::fmt;

use crate::error::ExError;

use super::options::OptionName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Append,
    Change,
    Copy,
    Delete,
    Edit,
    File,
    Global,
    Insert,
    Join,
    Mark,
    Marks,
    Move,
    Number,
    Notglobal,
    Print,
    Put,
    Quit,
    Read,
    Redo,
    Registers,
    Substitute,
    Set,
    Undo,
    Write,
    Wq,
    Xit,
    Yank,
    /// `=`: print a line number
    LineNumber,
    ShiftLeft,
    ShiftRight,
    /// `&`: repeat the last substitution
    Ampersand,
    /// `~`: repeat the last substitution with the last search pattern
    Tilde,
    /// An option's own command
    Option(OptionName),
}

/// Lines a command works on when it is given no address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAddress {
    /// The current line
    Current,
    /// `1,$`
    Whole,
    /// `$`
    Last,
    /// Leave the range where it is
    Keep,
}

/// Base table in declaration order, synonyms included
const TABLE: &[(&str, Command)] = &[
    ("append", Command::Append),
    ("change", Command::Change),
    ("copy", Command::Copy),
    ("t", Command::Copy),
    ("delete", Command::Delete),
    ("edit", Command::Edit),
    ("file", Command::File),
    ("global", Command::Global),
    ("insert", Command::Insert),
    ("join", Command::Join),
    ("k", Command::Mark),
    ("move", Command::Move),
    ("mark", Command::Mark),
    ("marks", Command::Marks),
    ("number", Command::Number),
    ("#", Command::Number),
    ("notglobal", Command::Notglobal),
    ("print", Command::Print),
    ("put", Command::Put),
    ("quit", Command::Quit),
    ("read", Command::Read),
    ("redo", Command::Redo),
    ("registers", Command::Registers),
    ("display", Command::Registers),
    ("substitute", Command::Substitute),
    ("set", Command::Set),
    ("undo", Command::Undo),
    ("v", Command::Notglobal),
    ("write", Command::Write),
    ("wq", Command::Wq),
    ("xit", Command::Xit),
    ("yank", Command::Yank),
    ("=", Command::LineNumber),
    ("<", Command::ShiftLeft),
    (">", Command::ShiftRight),
    ("&", Command::Ampersand),
    ("~", Command::Tilde),
];

/// Every name in declaration order: the base table, then option names, then
/// option abbreviations
fn entries() -> impl Iterator<Item = (&'static str, Command)> {
    let options = OptionName::ALL
        .into_iter()
        .map(|name| (name.name(), Command::Option(name)));
    let abbreviations = OptionName::ALL
        .into_iter()
        .filter_map(|name| Some((name.abbreviation()?, Command::Option(name))));
    TABLE.iter().copied().chain(options).chain(abbreviations)
}

impl Command {
    /// Resolve a command word
    pub fn lookup(word: &str) -> Result<Self, ExError> {
        if let Some((_, command)) = entries().find(|(name, _)| *name == word) {
            return Ok(command);
        }
        let lowered = word.to_lowercase();
        if !lowered.is_empty() {
            if let Some((_, command)) = entries().find(|(name, _)| name.starts_with(&lowered)) {
                return Ok(command);
            }
        }
        Err(ExError::UnknownCommand(word.to_string()))
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        if let Command::Option(option) = self {
            return option.name();
        }
        TABLE
            .iter()
            .find(|(_, command)| command == self)
            .map_or("?", |(name, _)| name)
    }

    pub fn default_address(&self) -> DefaultAddress {
        match self {
            Command::Global
            | Command::Notglobal
            | Command::Write
            | Command::Wq
            | Command::Xit => DefaultAddress::Whole,
            Command::LineNumber => DefaultAddress::Last,
            Command::Undo
            | Command::Redo
            | Command::Set
            | Command::Option(_)
            | Command::Quit
            | Command::Edit
            | Command::File
            | Command::Registers
            | Command::Marks => DefaultAddress::Keep,
            _ => DefaultAddress::Current,
        }
    }

    /// Does the parameter carry a delimited pattern section (so `|` inside
    /// it does not end the command)?
    pub fn takes_pattern(&self) -> bool {
        matches!(
            self,
            Command::Substitute | Command::Ampersand | Command::Tilde
        )
    }

    /// Does the command consume the rest of the line, `|` included?
    pub fn takes_rest_of_line(&self) -> bool {
        matches!(self, Command::Global | Command::Notglobal)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_lookup() {
        assert_eq!(Command::lookup("a").unwrap(), Command::Append);
        assert_eq!(Command::lookup("c").unwrap(), Command::Change);
        assert_eq!(Command::lookup("co").unwrap(), Command::Copy);
        assert_eq!(Command::lookup("t").unwrap(), Command::Copy);
        assert_eq!(Command::lookup("d").unwrap(), Command::Delete);
        assert_eq!(Command::lookup("m").unwrap(), Command::Move);
        assert_eq!(Command::lookup("ma").unwrap(), Command::Mark);
        assert_eq!(Command::lookup("marks").unwrap(), Command::Marks);
        assert_eq!(Command::lookup("s").unwrap(), Command::Substitute);
        assert_eq!(Command::lookup("se").unwrap(), Command::Set);
        assert_eq!(Command::lookup("u").unwrap(), Command::Undo);
        assert_eq!(Command::lookup("w").unwrap(), Command::Write);
        assert_eq!(Command::lookup("wq").unwrap(), Command::Wq);
        assert_eq!(Command::lookup("x").unwrap(), Command::Xit);
        assert_eq!(Command::lookup("P").unwrap(), Command::Print);
    }

    #[test]
    fn test_option_commands_resolve() {
        assert_eq!(
            Command::lookup("ai").unwrap(),
            Command::Option(OptionName::Autoindent)
        );
        assert_eq!(
            Command::lookup("ta").unwrap(),
            Command::Option(OptionName::Tabsize)
        );
        assert_eq!(
            Command::lookup("ig").unwrap(),
            Command::Option(OptionName::Ignorecase)
        );
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::lookup("zz"),
            Err(ExError::UnknownCommand(word)) if word == "zz"
        ));
    }

    #[test]
    fn test_default_addresses() {
        assert_eq!(Command::Global.default_address(), DefaultAddress::Whole);
        assert_eq!(Command::LineNumber.default_address(), DefaultAddress::Last);
        assert_eq!(Command::Undo.default_address(), DefaultAddress::Keep);
        assert_eq!(Command::Delete.default_address(), DefaultAddress::Current);
        assert_eq!(Command::Copy.name(), "copy");
    }
}
