//! An editing session: what every document edited through it shares.
//!
//! Registers and the last search/substitution are session-wide; marks,
//! options and history stay with each document. The injected collaborators
//! are where output, confirmation, persistence and prompting go.

use std::fmt;

use tracing::{debug, warn};

use crate::error::ExError;
use crate::ex::exec;
use crate::ex::parser;
use crate::ex::registers::Registers;
use crate::host::{ConsoleHost, Host, NoPersistence, NoPrompt, Persistence, Prompt};
use crate::range::TextRange;

/// The last substitution, for `&`, `~` and a bare `s`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub flags: String,
}

/// How an [`Session::ex`] invocation ended
#[derive(Debug)]
pub enum ExStatus {
    Completed,
    /// A command failed; the rest of the line was skipped. The error has
    /// already gone to [`Host::stderr`].
    Failed(ExError),
    /// A prompt was dismissed
    Cancelled,
}

impl ExStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExStatus::Completed)
    }

    pub fn error(&self) -> Option<&ExError> {
        match self {
            ExStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

pub struct Session {
    pub registers: Registers,
    pub last_search: Option<String>,
    pub last_substitute: Option<Substitution>,
    pub(crate) host: Box<dyn Host>,
    pub(crate) persistence: Box<dyn Persistence>,
    pub(crate) prompt: Box<dyn Prompt>,
    /// Set while a `global` runs its subcommands
    pub(crate) in_global: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("registers", &self.registers)
            .field("last_search", &self.last_search)
            .field("last_substitute", &self.last_substitute)
            .field("in_global", &self.in_global)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with console output, no persistence and no prompt
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            last_search: None,
            last_substitute: None,
            host: Box::new(ConsoleHost::new()),
            persistence: Box::new(NoPersistence),
            prompt: Box::new(NoPrompt),
            in_global: false,
        }
    }

    pub fn with_host(mut self, host: impl Host + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Run an ex command line against `range`.
    ///
    /// Commands run left to right; the first failure stops the line and is
    /// reported through the host. Never returns an error.
    pub async fn ex(&mut self, range: &mut TextRange, input: &str) -> ExStatus {
        debug!(input, "ex");
        match self.run(range, input).await {
            Ok(()) => ExStatus::Completed,
            Err(e) if e.is_cancelled() => {
                debug!(input, "ex cancelled");
                ExStatus::Cancelled
            }
            Err(e) => {
                warn!(input, error = %e, "ex command failed");
                self.host.stderr(&e);
                ExStatus::Failed(e)
            }
        }
    }

    /// Run every command of `input`, stopping at the first error
    pub(crate) async fn run(&mut self, range: &mut TextRange, input: &str) -> Result<(), ExError> {
        for command in parser::commands(input) {
            let command = command?;
            exec::execute(self, range, &command).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::surface::InputSurface;

    #[tokio::test]
    async fn test_ex_reports_status() {
        let doc = Document::new(Box::new(InputSurface::from_text("One\nTwo"))).shared();
        let mut range = TextRange::new(&doc);
        let mut session = Session::new();

        assert!(session.ex(&mut range, "2d").await.is_completed());
        assert_eq!(doc.borrow().text(), "One");

        let status = session.ex(&mut range, "1d|zap|1d").await;
        assert!(matches!(status.error(), Some(ExError::UnknownCommand(_))));
        assert_eq!(doc.borrow().text(), "");

        assert!(matches!(
            session.ex(&mut range, "w").await,
            ExStatus::Cancelled
        ));
    }
}
