//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::anyhow;
use async_trait::async_trait;

use exrange::surface::{probe, Element, Node};
use exrange::{Cancelled, Document, DocumentRef, ExError, Host, Persistence, Prompt, Session, TextRange};

/// Everything a [`MemoryHost`] saw
#[derive(Debug, Default)]
pub struct Output {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub confirms: Vec<String>,
    pub quit: bool,
}

/// Host recording output into a shared [`Output`]
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub output: Rc<RefCell<Output>>,
    /// Answer for confirmations
    pub confirm: bool,
}

impl Host for MemoryHost {
    fn stdout(&mut self, message: &str) {
        self.output.borrow_mut().stdout.push(message.to_string());
    }

    fn stderr(&mut self, error: &ExError) {
        self.output.borrow_mut().stderr.push(error.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.output.borrow_mut().confirms.push(message.to_string());
        self.confirm
    }

    fn quit(&mut self) {
        self.output.borrow_mut().quit = true;
    }
}

/// Files kept in a map, keyed by `directory/file`
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    pub files: Rc<RefCell<HashMap<String, String>>>,
    /// Every write fails when set
    pub fail_writes: bool,
}

impl MemoryPersistence {
    fn key(file: &str, directory: Option<&str>) -> String {
        match directory {
            Some(dir) => format!("{dir}/{file}"),
            None => file.to_string(),
        }
    }

    pub fn insert(&self, file: &str, text: &str) {
        self.files
            .borrow_mut()
            .insert(file.to_string(), text.to_string());
    }

    pub fn get(&self, file: &str) -> Option<String> {
        self.files.borrow().get(file).cloned()
    }
}

#[async_trait(?Send)]
impl Persistence for MemoryPersistence {
    async fn read(&mut self, file: &str, directory: Option<&str>) -> anyhow::Result<String> {
        self.files
            .borrow()
            .get(&Self::key(file, directory))
            .cloned()
            .ok_or_else(|| anyhow!("no such file: {file}"))
    }

    async fn write(&mut self, text: &str, file: &str, directory: Option<&str>) -> anyhow::Result<()> {
        if self.fail_writes {
            return Err(anyhow!("disk full"));
        }
        self.files
            .borrow_mut()
            .insert(Self::key(file, directory), text.to_string());
        Ok(())
    }
}

/// Prompt answering from a script; dismissed once the script runs out
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    pub answers: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Rc::new(RefCell::new(
                answers.iter().rev().map(|a| a.to_string()).collect(),
            )),
        }
    }
}

#[async_trait(?Send)]
impl Prompt for ScriptedPrompt {
    async fn prompt(&mut self, _message: &str) -> Result<String, Cancelled> {
        self.answers.borrow_mut().pop().ok_or(Cancelled)
    }
}

/// Test fixture: one document, a range on it and a session with memory
/// collaborators
pub struct Fixture {
    pub doc: DocumentRef,
    pub range: TextRange,
    pub session: Session,
    pub output: Rc<RefCell<Output>>,
    pub files: MemoryPersistence,
}

impl Fixture {
    pub fn text(&self) -> String {
        self.doc.borrow().text().to_string()
    }

    pub fn lines(&self) -> (usize, usize) {
        self.range.lines()
    }

    pub fn stdout(&self) -> Vec<String> {
        self.output.borrow().stdout.clone()
    }

    pub fn stderr(&self) -> Vec<String> {
        self.output.borrow().stderr.clone()
    }

    pub async fn ex(&mut self, input: &str) -> exrange::ExStatus {
        self.session.ex(&mut self.range, input).await
    }
}

/// Fixture over a plain text control, range on line 1
pub fn fixture(text: &str) -> Fixture {
    fixture_with(text, MemoryHost::default(), MemoryPersistence::default(), ScriptedPrompt::default())
}

pub fn fixture_with(
    text: &str,
    host: MemoryHost,
    files: MemoryPersistence,
    prompt: ScriptedPrompt,
) -> Fixture {
    let doc = input_doc(text);
    let mut range = TextRange::new(&doc);
    range.set_line(1);
    let output = Rc::clone(&host.output);
    let session = Session::new()
        .with_host(host)
        .with_persistence(files.clone())
        .with_prompt(prompt);
    Fixture {
        doc,
        range,
        session,
        output,
        files,
    }
}

pub fn input_doc(text: &str) -> DocumentRef {
    Document::from_element(Element::TextControl {
        value: text.to_string(),
    })
    .shared()
}

pub fn fallback_doc(text: &str) -> DocumentRef {
    Document::new(probe(Element::Static {
        text: text.to_string(),
    }))
    .shared()
}

/// Content surface with each line as a text node separated by breaks
pub fn content_doc(text: &str) -> DocumentRef {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::Break);
        }
        if !line.is_empty() {
            nodes.push(Node::text(line));
        }
    }
    Document::from_element(Element::ContentEditable { nodes }).shared()
}

/// One document of each surface kind holding `text`
pub fn all_surfaces(text: &str) -> Vec<(&'static str, DocumentRef)> {
    vec![
        ("input", input_doc(text)),
        ("content", content_doc(text)),
        ("fallback", fallback_doc(text)),
    ]
}
