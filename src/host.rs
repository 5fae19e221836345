//! Collaborators the interpreter talks to: output sinks and confirmation
//! ([`Host`]), file reading/writing ([`Persistence`]) and line input
//! ([`Prompt`]).
//!
//! Everything runs on one thread, so the async traits are not `Send`.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::error::{Cancelled, ExError};

/// Output sinks and the confirmation callback
pub trait Host {
    /// Command output
    fn stdout(&mut self, message: &str);
    /// A failed command
    fn stderr(&mut self, error: &ExError);
    /// Ask before a destructive action; `true` proceeds
    fn confirm(&mut self, message: &str) -> bool;
    /// The buffer asked to be closed
    fn quit(&mut self);
}

/// Reads and writes buffers by file id, relative to an optional directory id
#[async_trait(?Send)]
pub trait Persistence {
    async fn read(&mut self, file: &str, directory: Option<&str>) -> anyhow::Result<String>;
    async fn write(&mut self, text: &str, file: &str, directory: Option<&str>) -> anyhow::Result<()>;
}

/// Asks the user for a line of input
#[async_trait(?Send)]
pub trait Prompt {
    async fn prompt(&mut self, message: &str) -> Result<String, Cancelled>;
}

/// Console host: prints to stdout/stderr and mirrors into the log
#[derive(Debug, Default)]
pub struct ConsoleHost {
    /// Answer given to every confirmation
    pub assume_yes: bool,
    quit: Rc<Cell<bool>>,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.get()
    }

    /// Flag set by `quit`, readable after the host moved into a session
    pub fn quit_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.quit)
    }
}

impl Host for ConsoleHost {
    fn stdout(&mut self, message: &str) {
        tracing::info!(target: "exrange::stdout", "{message}");
        println!("{message}");
    }

    fn stderr(&mut self, error: &ExError) {
        tracing::error!(target: "exrange::stderr", "{error:#}");
        eprintln!("{error}");
    }

    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!(answer = self.assume_yes, "confirm: {message}");
        self.assume_yes
    }

    fn quit(&mut self) {
        self.quit.set(true);
    }
}

/// Persistence for documents with nowhere to go
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

#[async_trait(?Send)]
impl Persistence for NoPersistence {
    async fn read(&mut self, file: &str, _directory: Option<&str>) -> anyhow::Result<String> {
        Err(anyhow!("no reader configured for {file}"))
    }

    async fn write(&mut self, _text: &str, file: &str, _directory: Option<&str>) -> anyhow::Result<()> {
        Err(anyhow!("no writer configured for {file}"))
    }
}

/// Prompt that is always dismissed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

#[async_trait(?Send)]
impl Prompt for NoPrompt {
    async fn prompt(&mut self, _message: &str) -> Result<String, Cancelled> {
        Err(Cancelled)
    }
}
