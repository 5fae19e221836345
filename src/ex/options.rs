//! Typed option bag with per-kind handlers and change observers.
//!
//! Every option is both a plain property (`get`/`set`) and an ex command of the
//! same name. Its kind decides how a value is parsed and printed: booleans as
//! `on`/`off`, numbers as `[n]`, regex and generic values as JSON strings.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::ExError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionName {
    Autoindent,
    Ignorecase,
    Wrapscan,
    Magic,
    Global,
    Multiline,
    Tabsize,
    Shiftwidth,
    Paragraphs,
    Sections,
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Boolean,
    Number,
    Regex,
    Generic,
}

impl OptionName {
    pub const ALL: [OptionName; 12] = [
        OptionName::Autoindent,
        OptionName::Ignorecase,
        OptionName::Wrapscan,
        OptionName::Magic,
        OptionName::Global,
        OptionName::Multiline,
        OptionName::Tabsize,
        OptionName::Shiftwidth,
        OptionName::Paragraphs,
        OptionName::Sections,
        OptionName::File,
        OptionName::Directory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptionName::Autoindent => "autoindent",
            OptionName::Ignorecase => "ignorecase",
            OptionName::Wrapscan => "wrapscan",
            OptionName::Magic => "magic",
            OptionName::Global => "global",
            OptionName::Multiline => "multiline",
            OptionName::Tabsize => "tabsize",
            OptionName::Shiftwidth => "shiftwidth",
            OptionName::Paragraphs => "paragraphs",
            OptionName::Sections => "sections",
            OptionName::File => "file",
            OptionName::Directory => "directory",
        }
    }

    pub fn abbreviation(&self) -> Option<&'static str> {
        match self {
            OptionName::Autoindent => Some("ai"),
            OptionName::Ignorecase => Some("ic"),
            OptionName::Wrapscan => Some("ws"),
            OptionName::Tabsize => Some("ts"),
            OptionName::Shiftwidth => Some("sw"),
            OptionName::Paragraphs => Some("para"),
            OptionName::Sections => Some("sect"),
            OptionName::Directory => Some("dir"),
            _ => None,
        }
    }

    pub fn kind(&self) -> OptionKind {
        match self {
            OptionName::Autoindent
            | OptionName::Ignorecase
            | OptionName::Wrapscan
            | OptionName::Magic
            | OptionName::Global
            | OptionName::Multiline => OptionKind::Boolean,
            OptionName::Tabsize | OptionName::Shiftwidth => OptionKind::Number,
            OptionName::Paragraphs | OptionName::Sections => OptionKind::Regex,
            OptionName::File | OptionName::Directory => OptionKind::Generic,
        }
    }

    /// Look up by full name or abbreviation
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|opt| opt.name() == name || opt.abbreviation() == Some(name))
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Number(i64),
    /// Regex source or generic text
    Text(String),
}

/// Called after an option was set
pub type OptionObserver = Box<dyn FnMut(OptionName, &OptionValue)>;

pub struct Options {
    values: HashMap<OptionName, OptionValue>,
    observers: Vec<OptionObserver>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in OptionName::ALL {
            map.entry(&name.name(), &self.values.get(&name));
        }
        map.finish()
    }
}

impl Clone for Options {
    /// Values only; observers stay with the original
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            observers: Vec::new(),
        }
    }
}

pub const DEFAULT_PARAGRAPHS: &str = r"\n[ \t]*\n";
pub const DEFAULT_SECTIONS: &str = r"\n[ \t]*\n[ \t]*\n";

impl Default for Options {
    fn default() -> Self {
        let values = HashMap::from([
            (OptionName::Autoindent, OptionValue::Bool(false)),
            (OptionName::Ignorecase, OptionValue::Bool(false)),
            (OptionName::Wrapscan, OptionValue::Bool(true)),
            (OptionName::Magic, OptionValue::Bool(true)),
            (OptionName::Global, OptionValue::Bool(false)),
            (OptionName::Multiline, OptionValue::Bool(false)),
            (OptionName::Tabsize, OptionValue::Number(4)),
            (OptionName::Shiftwidth, OptionValue::Number(4)),
            (OptionName::Paragraphs, OptionValue::Text(DEFAULT_PARAGRAPHS.to_string())),
            (OptionName::Sections, OptionValue::Text(DEFAULT_SECTIONS.to_string())),
            (OptionName::File, OptionValue::Text(String::new())),
            (OptionName::Directory, OptionValue::Text(String::new())),
        ]);
        Self {
            values,
            observers: Vec::new(),
        }
    }
}

impl Options {
    pub fn get(&self, name: OptionName) -> Option<&OptionValue> {
        self.values.get(&name)
    }

    /// Boolean value; false for other kinds
    pub fn flag(&self, name: OptionName) -> bool {
        matches!(self.values.get(&name), Some(OptionValue::Bool(true)))
    }

    /// Numeric value; 0 for other kinds
    pub fn number(&self, name: OptionName) -> i64 {
        match self.values.get(&name) {
            Some(OptionValue::Number(n)) => *n,
            _ => 0,
        }
    }

    /// Text of a regex or generic option
    pub fn text(&self, name: OptionName) -> Option<&str> {
        match self.values.get(&name) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Set a value after checking it against the option's kind, then notify
    /// observers
    pub fn set(&mut self, name: OptionName, value: OptionValue) -> Result<(), ExError> {
        match (name.kind(), &value) {
            (OptionKind::Boolean, OptionValue::Bool(_))
            | (OptionKind::Number, OptionValue::Number(_))
            | (OptionKind::Generic, OptionValue::Text(_)) => {}
            (OptionKind::Regex, OptionValue::Text(source)) => {
                Regex::new(source).map_err(|e| ExError::BadOption(format!("{name}: {e}")))?;
            }
            _ => {
                return Err(ExError::BadOption(format!(
                    "{name}: wrong kind of value {value:?}"
                )))
            }
        }
        tracing::debug!(option = %name, ?value, "option set");
        self.values.insert(name, value.clone());
        for observer in self.observers.iter_mut() {
            observer(name, &value);
        }
        Ok(())
    }

    pub fn set_flag(&mut self, name: OptionName, on: bool) -> Result<(), ExError> {
        self.set(name, OptionValue::Bool(on))
    }

    pub fn set_number(&mut self, name: OptionName, n: i64) -> Result<(), ExError> {
        self.set(name, OptionValue::Number(n))
    }

    pub fn set_text(&mut self, name: OptionName, text: impl Into<String>) -> Result<(), ExError> {
        self.set(name, OptionValue::Text(text.into()))
    }

    /// Register an observer, called after every successful set
    pub fn observe(&mut self, observer: OptionObserver) {
        self.observers.push(observer);
    }

    /// `name value`, printed the way the option's kind prints
    pub fn describe(&self, name: OptionName) -> String {
        let value = match self.values.get(&name) {
            Some(OptionValue::Bool(on)) => String::from(if *on { "on" } else { "off" }),
            Some(OptionValue::Number(n)) => format!("[{n}]"),
            Some(OptionValue::Text(s)) => serde_json::to_string(s).unwrap_or_default(),
            None => String::new(),
        };
        format!("{} {}", name.name(), value)
    }

    fn parse_value(name: OptionName, raw: &str) -> Result<OptionValue, ExError> {
        let bad = || ExError::BadOption(format!("{name}: bad value {raw:?}"));
        match name.kind() {
            OptionKind::Boolean => match raw {
                "on" | "true" | "1" => Ok(OptionValue::Bool(true)),
                "off" | "false" | "0" => Ok(OptionValue::Bool(false)),
                _ => Err(bad()),
            },
            OptionKind::Number => raw.trim().parse().map(OptionValue::Number).map_err(|_| bad()),
            OptionKind::Regex | OptionKind::Generic => Ok(OptionValue::Text(unquote(raw))),
        }
    }

    /// Apply one `set` token. Returns text to print for queries.
    ///
    /// Accepted: `name`, `noname`, `invname`, `name!`, `name=value`, `name?`
    /// and `all`. A bare non-boolean name prints its value.
    pub fn apply_token(&mut self, token: &str) -> Result<Option<String>, ExError> {
        if token == "all" {
            let all: Vec<String> = OptionName::ALL.iter().map(|n| self.describe(*n)).collect();
            return Ok(Some(all.join("\n")));
        }
        if let Some((name, raw)) = token.split_once('=') {
            let name = lookup(name)?;
            let value = Self::parse_value(name, raw)?;
            self.set(name, value)?;
            return Ok(None);
        }
        if let Some(name) = token.strip_suffix('?') {
            return Ok(Some(self.describe(lookup(name)?)));
        }
        if let Some(name) = token.strip_suffix('!') {
            return self.toggle(lookup(name)?).map(|_| None);
        }
        if let Some(name) = OptionName::lookup(token) {
            return self.command(name, "", false);
        }
        if let Some(name) = token.strip_prefix("inv").and_then(OptionName::lookup) {
            return self.toggle(name).map(|_| None);
        }
        if let Some(name) = token.strip_prefix("no").and_then(OptionName::lookup) {
            if name.kind() != OptionKind::Boolean {
                return Err(ExError::BadOption(format!("{name} is not a boolean option")));
            }
            self.set_flag(name, false)?;
            return Ok(None);
        }
        Err(ExError::BadOption(format!("unknown option: {token}")))
    }

    fn toggle(&mut self, name: OptionName) -> Result<(), ExError> {
        if name.kind() != OptionKind::Boolean {
            return Err(ExError::BadOption(format!("{name} is not a boolean option")));
        }
        let on = self.flag(name);
        self.set_flag(name, !on)
    }

    /// Handler for the option's own ex command.
    ///
    /// Booleans: no parameter sets, `!` toggles. Every kind: `?` prints, any
    /// other parameter is parsed and set. A non-boolean without a parameter
    /// prints.
    pub fn command(
        &mut self,
        name: OptionName,
        param: &str,
        variant: bool,
    ) -> Result<Option<String>, ExError> {
        let param = param.trim();
        if param == "?" {
            return Ok(Some(self.describe(name)));
        }
        if param.is_empty() {
            return match (name.kind(), variant) {
                (OptionKind::Boolean, true) => self.toggle(name).map(|_| None),
                (OptionKind::Boolean, false) => self.set_flag(name, true).map(|_| None),
                _ => Ok(Some(self.describe(name))),
            };
        }
        let value = Self::parse_value(name, param)?;
        self.set(name, value).map(|_| None)
    }
}

fn lookup(name: &str) -> Result<OptionName, ExError> {
    OptionName::lookup(name).ok_or_else(|| ExError::BadOption(format!("unknown option: {name}")))
}

/// JSON-decode a quoted value, anything else is taken verbatim
fn unquote(raw: &str) -> String {
    if raw.starts_with('"') {
        if let Ok(s) = serde_json::from_str::<String>(raw) {
            return s;
        }
    }
    raw.to_string()
}

/// Split a `set` parameter on whitespace, keeping quoted values whole
pub fn tokenize(param: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for ch in param.chars() {
        if in_quotes {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
