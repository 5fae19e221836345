//! Command-line argument parsing and the filesystem persistence the
//! headless host uses
//!
//! Supports:
//! - Loading one file into a buffer
//! - Running ex command lines against it (`-c`, repeatable)
//! - Dry runs that never touch the disk

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;

use crate::host::Persistence;

/// Run ex commands against a file
#[derive(Parser, Debug)]
#[command(
    name = "exrange",
    version,
    about = "Run ex commands against a text file"
)]
pub struct CliArgs {
    /// File to edit
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Ex command line to run; may be given several times
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub commands: Vec<String>,

    /// Never write to disk; print what would be written instead
    #[arg(long)]
    pub dry_run: bool,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Write the buffer back after the last command when it changed
    #[arg(short = 's', long)]
    pub save: bool,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// File loaded into the buffer, if any
    pub file: Option<PathBuf>,
    /// Command lines in the order given
    pub commands: Vec<String>,
    pub dry_run: bool,
    pub assume_yes: bool,
    pub save: bool,
}

impl CliArgs {
    /// Convert parsed CLI args into startup configuration
    pub fn into_config(self) -> Result<StartupConfig, String> {
        if let Some(path) = &self.file {
            if path.is_dir() {
                return Err(format!("{} is a directory", path.display()));
            }
        }
        if self.save && self.file.is_none() {
            return Err("--save needs a FILE".to_string());
        }
        let commands = self
            .commands
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();

        Ok(StartupConfig {
            file: self.file,
            commands,
            dry_run: self.dry_run,
            assume_yes: self.yes,
            save: self.save,
        })
    }
}

/// Reads and writes file ids as paths, relative to the directory id when
/// one is given
#[derive(Debug, Clone, Default)]
pub struct FsPersistence {
    /// Print writes instead of performing them
    pub dry_run: bool,
}

impl FsPersistence {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn resolve(file: &str, directory: Option<&str>) -> PathBuf {
        match directory {
            Some(dir) if Path::new(file).is_relative() => Path::new(dir).join(file),
            _ => PathBuf::from(file),
        }
    }
}

#[async_trait(?Send)]
impl Persistence for FsPersistence {
    async fn read(&mut self, file: &str, directory: Option<&str>) -> anyhow::Result<String> {
        let path = Self::resolve(file, directory);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn write(&mut self, text: &str, file: &str, directory: Option<&str>) -> anyhow::Result<()> {
        let path = Self::resolve(file, directory);
        if self.dry_run {
            tracing::info!("dry run: not writing {}", path.display());
            print!("{text}");
            return Ok(());
        }
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
