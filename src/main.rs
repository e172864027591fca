// citepick - headless driver for the citation picker
//
// Runs one picker session against CSL-JSON bibliography files. Commands are
// read from stdin (see `help`), host notifications are written to stdout as
// JSON lines, and logs go to stderr.
//
// Architecture:
// - stdin reader task: parses commands into PickerEvents
// - run_picker: owns the controller, spawns the bibliography load
// - StdoutHost: receives source changes, load failures and views

mod cli;

use anyhow::{Context, Result};
use citation_picker::config::Config;
use citation_picker::panel::providers_by_name;
use citation_picker::{
    run_picker, BibliographySource, DocumentRef, EditorUi, JsonBibliography, PickerContext,
    PickerController, PickerError, PickerEvent, PickerHost, PickerView,
};
use clap::Parser;
use cli::{Cli, Command, Commands};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Host that prints every notification as one JSON line
struct StdoutHost;

impl StdoutHost {
    fn emit(value: serde_json::Value) {
        println!("{}", value);
    }
}

impl PickerHost for StdoutHost {
    fn on_source_changed(&self, sources: &[BibliographySource]) {
        Self::emit(json!({ "event": "sources_changed", "sources": sources }));
    }

    fn on_load_failed(&self, error: &PickerError) {
        Self::emit(json!({ "event": "load_failed", "error": error.to_string() }));
    }

    fn on_view(&self, view: &PickerView) {
        Self::emit(json!({ "event": "view", "view": view }));
    }
}

/// Forward stdin commands to the picker until EOF or `quit`
async fn read_commands(tx: mpsc::Sender<PickerEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match cli::parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Help)) => eprintln!("{}", cli::HELP),
            Ok(Some(Command::Event(kind))) => {
                let event = kind.into_event();
                let closing = matches!(event, PickerEvent::Close);
                if tx.send(event).await.is_err() || closing {
                    break;
                }
            }
            Err(message) => eprintln!("{}", message),
        }
    }
    Ok(())
}

async fn run_session(config: Config, doc: Option<PathBuf>, extra: Vec<PathBuf>) -> Result<()> {
    let document = doc.map(DocumentRef::new).unwrap_or_default();

    let mut files = config.bibliography_files.clone();
    files.extend(extra);
    let loader = Arc::new(JsonBibliography::with_files(files));

    let context = PickerContext {
        ui: EditorUi::new(),
        document,
        size: config.size,
    };
    let controller = PickerController::new(context, Arc::new(StdoutHost));
    tracing::debug!("Session ID: {}", controller.session_id());

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(read_commands(tx));

    let controller = run_picker(
        controller,
        loader,
        providers_by_name(&config.panel_order),
        rx,
    )
    .await?;

    // The session only ends once the reader sent `quit` or hit EOF
    reader.await.context("Command reader task failed")??;

    tracing::info!("Session {} finished", controller.session_id());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Config { show, path } => {
            cli::handle_config(&config, show, path);
            Ok(())
        }
        Commands::Run { doc, bibliography } => {
            let _file_guard = citation_picker::logging::init(&config.logging);
            run_session(config, doc, bibliography).await
        }
    }
}
