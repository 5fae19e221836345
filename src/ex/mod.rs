//! The ex line-command interpreter.
//!
//! A command line flows through [`parser`] (split and parse), [`address`]
//! (resolve line addresses), [`commands`] (resolve the command word) and
//! [`exec`] (run it). Entry point: [`crate::session::Session::ex`].

pub mod address;
pub mod commands;
pub(crate) mod exec;
pub mod options;
pub mod parser;
pub mod registers;
pub mod state;

pub use address::LineSpan;
pub use commands::{Command, DefaultAddress};
pub use options::{OptionKind, OptionName, OptionValue, Options};
pub use parser::{parse, split, ParsedCommand};
pub use registers::Registers;
pub use state::{ExState, SaveStatus, CURRENT_MARK, PREVIOUS_MARK};
