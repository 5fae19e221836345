//! Delete/yank registers shared by every document in a session.
//!
//! The unnamed register is a stack of the most recent texts; digits `1`-`9`
//! read into it (1 is the top). Letters are single slots and an uppercase
//! letter appends to its lowercase slot.

use std::collections::{BTreeMap, VecDeque};

use crate::error::ExError;

/// How many texts the unnamed stack keeps
pub const UNNAMED_DEPTH: usize = 9;

#[derive(Debug, Clone, Default)]
pub struct Registers {
    unnamed: VecDeque<String>,
    named: BTreeMap<char, String>,
}

/// Can `c` name a register in a command parameter?
pub fn is_register_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '"'
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` in register `name` (`None` or `"` for the unnamed stack)
    pub fn store(&mut self, name: Option<char>, text: String) -> Result<(), ExError> {
        match name {
            None | Some('"') => {
                self.unnamed.push_front(text);
                self.unnamed.truncate(UNNAMED_DEPTH);
            }
            Some(c) if c.is_ascii_lowercase() => {
                self.named.insert(c, text);
            }
            Some(c) if c.is_ascii_uppercase() => {
                self.named
                    .entry(c.to_ascii_lowercase())
                    .or_default()
                    .push_str(&text);
            }
            Some(c) => return Err(ExError::parse(format!("cannot write register {c}"))),
        }
        Ok(())
    }

    /// Read register `name`
    pub fn get(&self, name: Option<char>) -> Option<&str> {
        match name {
            None | Some('"') => self.unnamed.front().map(String::as_str),
            Some(d @ '1'..='9') => {
                let index = d as usize - '1' as usize;
                self.unnamed.get(index).map(String::as_str)
            }
            Some(c) if c.is_ascii_alphabetic() => self
                .named
                .get(&c.to_ascii_lowercase())
                .map(String::as_str),
            Some(_) => None,
        }
    }

    /// Every non-empty register as `(name, text)`, stack first
    pub fn list(&self) -> Vec<(char, &str)> {
        let stack = self
            .unnamed
            .iter()
            .zip('1'..='9')
            .map(|(text, name)| (name, text.as_str()));
        let named = self.named.iter().map(|(name, text)| (*name, text.as_str()));
        stack.chain(named).collect()
    }
}
