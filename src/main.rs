//! Headless ex host: load a file, run command lines against it, write it back.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use exrange::cli::{CliArgs, FsPersistence};
use exrange::config::Config;
use exrange::ex::{OptionName, SaveStatus};
use exrange::host::ConsoleHost;
use exrange::surface::{probe, Element};
use exrange::{Document, ExStatus, Session, TextRange};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    exrange::tracing::init();

    let config = CliArgs::parse()
        .into_config()
        .map_err(anyhow::Error::msg)?;
    let settings = Config::load();

    let text = match &config.file {
        Some(path) if path.exists() => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => String::new(),
    };

    let mut document = Document::with_config(probe(Element::Static { text }), &settings);
    if let Some(path) = &config.file {
        document
            .options_mut()
            .set_text(OptionName::File, path.to_string_lossy())?;
    }
    document.set_status(SaveStatus::Clean);
    let doc = document.shared();
    let mut range = TextRange::new(&doc);

    let mut host = ConsoleHost::new();
    host.assume_yes = config.assume_yes;
    let quit = host.quit_handle();
    let mut session = Session::new()
        .with_host(host)
        .with_persistence(FsPersistence::new(config.dry_run));

    for line in &config.commands {
        match session.ex(&mut range, line).await {
            ExStatus::Completed => {}
            ExStatus::Failed(_) => return Ok(ExitCode::FAILURE),
            ExStatus::Cancelled => {
                tracing::info!("cancelled at {line:?}");
                return Ok(ExitCode::FAILURE);
            }
        }
        if quit.get() {
            return Ok(ExitCode::SUCCESS);
        }
    }

    if config.save && doc.borrow().status().is_dirty() {
        if let ExStatus::Failed(_) = session.ex(&mut range, "w").await {
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}
