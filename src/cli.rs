// CLI module - command-line argument parsing and the session command language
//
// Subcommands:
// - run: drive a picker session from stdin commands
// - config --show: Display effective configuration
// - config --path: Show config file path

use citation_picker::config::{Config, VERSION};
use citation_picker::{NodeKey, PickerEvent};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// citepick - headless citation picker
#[derive(Parser)]
#[command(name = "citepick")]
#[command(version = VERSION)]
#[command(about = "Browse bibliography sources and collect citations to insert", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a picker session, reading commands from stdin
    Run {
        /// Document the citations are for (its directory resolves relative paths)
        #[arg(long)]
        doc: Option<PathBuf>,

        /// CSL-JSON bibliography file (repeatable)
        #[arg(long = "bib")]
        bibliography: Vec<PathBuf>,
    },
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle the config subcommand
pub fn handle_config(config: &Config, show: bool, path: bool) {
    if path {
        match Config::config_path() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine config path (no home directory)"),
        }
    } else if show {
        print!("{}", config.to_toml());
    } else {
        println!("Usage: citepick config [--show|--path]");
    }
}

/// One line of session input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(PickerEventKind),
    Help,
}

/// Commands that become picker events
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEventKind {
    Select(String),
    Add(String),
    Delete(String),
    Search(String),
    Show,
    Quit,
}

impl PickerEventKind {
    pub fn into_event(self) -> PickerEvent {
        match self {
            PickerEventKind::Select(key) => PickerEvent::KeySelected(NodeKey::new(key)),
            PickerEventKind::Add(id) => PickerEvent::EntryChosen(id),
            PickerEventKind::Delete(key) => PickerEvent::SourceDeleted(key),
            PickerEventKind::Search(text) => PickerEvent::SearchChanged(text),
            PickerEventKind::Show => PickerEvent::Render,
            PickerEventKind::Quit => PickerEvent::Close,
        }
    }
}

pub const HELP: &str = "\
commands:
  select <key>     select a catalog node (e.g. bib, bib/refs, doi)
  add <id>         add a source offered by the active panel
  delete <@id>     remove every source with this display key
  search <text>    set the active panel's search text
  show             print the current view
  quit             close the picker";

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let need_arg = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("'{}' needs {}", verb, what))
        } else {
            Ok(rest.to_string())
        }
    };

    let kind = match verb {
        "select" => PickerEventKind::Select(need_arg("a node key")?),
        "add" => PickerEventKind::Add(need_arg("a source id")?),
        "delete" => PickerEventKind::Delete(need_arg("a display key")?),
        "search" => PickerEventKind::Search(rest.to_string()),
        "show" => PickerEventKind::Show,
        "quit" | "exit" => PickerEventKind::Quit,
        "help" => return Ok(Some(Command::Help)),
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(Command::Event(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(line: &str) -> PickerEventKind {
        match parse_command(line) {
            Ok(Some(Command::Event(kind))) => kind,
            other => panic!("Expected event for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(event("select bib/refs"), PickerEventKind::Select("bib/refs".into()));
        assert_eq!(event("  add smith2020 "), PickerEventKind::Add("smith2020".into()));
        assert_eq!(event("delete @smith2020"), PickerEventKind::Delete("@smith2020".into()));
        assert_eq!(event("search graph theory"), PickerEventKind::Search("graph theory".into()));
        assert_eq!(event("search"), PickerEventKind::Search(String::new()));
        assert_eq!(event("show"), PickerEventKind::Show);
        assert_eq!(event("exit"), PickerEventKind::Quit);
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("# a comment"), Ok(None));
        assert_eq!(parse_command("help"), Ok(Some(Command::Help)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("add").unwrap_err().contains("needs a source id"));
        assert!(parse_command("frobnicate x").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn test_events_map_to_picker_events() {
        match PickerEventKind::Add("smith2020".into()).into_event() {
            PickerEvent::EntryChosen(id) => assert_eq!(id, "smith2020"),
            other => panic!("Expected EntryChosen, got {:?}", other),
        }
        assert!(matches!(PickerEventKind::Quit.into_event(), PickerEvent::Close));
        assert!(matches!(PickerEventKind::Show.into_event(), PickerEvent::Render));
    }
}
