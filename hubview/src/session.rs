// SPDX-License-Identifier: GPL-3.0-only

//! Interactive session
//!
//! Reads one command per line from stdin and prints every change of the
//! device and module lists as it happens, so selection changes, retries
//! and reloads can be watched live.

use std::fmt;

use hubview_contracts::FetchMode;
use hubview_core::CommandOutcome;
use hubview_types::{ChildRecord, LoadState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::{App, describe_state};
use crate::prompt::StaticPrompt;

const HELP: &str = "\
commands:
  hubs            list hubs
  hub <name>      select a hub
  device <id>     select a device of the selected hub
  none            clear the hub selection
  reload          fetch the device list again
  add <name>      create a device in the selected hub
  delete          delete the selected device
  monitor [n]     print n messages of the selected device (default 10, Ctrl-C stops)
  help            show this text
  quit            leave the session";

const DEFAULT_MONITOR_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Hubs,
    Hub(String),
    Device(String),
    ClearHub,
    Reload,
    Add(String),
    Delete,
    Monitor(usize),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    MissingArgument(&'static str),
    InvalidCount(String),
    Unknown(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::MissingArgument(command) => write!(f, "'{command}' needs an argument"),
            Self::InvalidCount(count) => write!(f, "'{count}' is not a message count"),
            Self::Unknown(command) => write!(f, "unknown command '{command}', try 'help'"),
        }
    }
}

pub fn parse_command(line: &str) -> Result<SessionCommand, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = |command: &'static str| {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(command))
        } else {
            Ok(rest.to_string())
        }
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "hubs" => Ok(SessionCommand::Hubs),
        "hub" => argument("hub").map(SessionCommand::Hub),
        "device" => argument("device").map(SessionCommand::Device),
        "none" => Ok(SessionCommand::ClearHub),
        "reload" | "r" => Ok(SessionCommand::Reload),
        "add" => argument("add").map(SessionCommand::Add),
        "delete" | "del" => Ok(SessionCommand::Delete),
        "monitor" | "m" if rest.is_empty() => Ok(SessionCommand::Monitor(DEFAULT_MONITOR_COUNT)),
        "monitor" | "m" => match rest.parse::<usize>() {
            Ok(count) if count > 0 => Ok(SessionCommand::Monitor(count)),
            _ => Err(ParseError::InvalidCount(rest.to_string())),
        },
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

/// Print every state published on `rx` until the sender goes away.
fn spawn_printer<P, T>(label: &'static str, mut rx: watch::Receiver<LoadState<P, T>>) -> JoinHandle<()>
where
    P: fmt::Display + Send + Sync + 'static,
    T: ChildRecord + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            let line = describe_state(label, &*rx.borrow_and_update());
            println!("{line}");
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

pub async fn run(app: &App) -> anyhow::Result<()> {
    let printers = [
        spawn_printer("devices", app.device_list().subscribe()),
        spawn_printer("modules", app.module_list().subscribe()),
    ];

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if command == SessionCommand::Quit {
            break;
        }
        if let Err(e) = execute(app, command).await {
            eprintln!("error: {e:#}");
        }
    }

    app.shutdown();
    for printer in printers {
        printer.abort();
    }
    Ok(())
}

async fn execute(app: &App, command: SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::Hubs => {
            let hubs = app.fetch_hubs(FetchMode::Refresh).await?;
            let names: Vec<_> = hubs.iter().map(|hub| hub.name.as_str()).collect();
            println!("[hubs] {}", names.join(" "));
        }
        SessionCommand::Hub(name) => app.select_hub(Some(&name)),
        SessionCommand::Device(id) => app.select_device(Some(&id))?,
        SessionCommand::ClearHub => app.select_hub(None),
        SessionCommand::Reload => {
            if !app.device_list().reload().is_completed() {
                println!("select a hub first");
            }
        }
        SessionCommand::Add(name) => {
            let prompt = StaticPrompt::with_device_name(name);
            print_outcome("add", app.device_list().create_device(&prompt).await);
        }
        SessionCommand::Delete => {
            let prompt = StaticPrompt::confirming(true);
            print_outcome(
                "delete",
                app.device_list().delete_selected_device(&prompt).await,
            );
        }
        SessionCommand::Monitor(count) => {
            let messages = app.monitor_selected_device().await?;
            let received = app.print_messages(messages, Some(count)).await?;
            println!("[monitor] {received} messages");
        }
        SessionCommand::Help => println!("{HELP}"),
        SessionCommand::Quit => {}
    }
    Ok(())
}

fn print_outcome(action: &str, outcome: CommandOutcome) {
    match outcome {
        CommandOutcome::Completed => {}
        CommandOutcome::Cancelled => println!("{action} cancelled"),
        CommandOutcome::Unavailable => println!("{action}: nothing selected"),
        CommandOutcome::Failed(error) => eprintln!("{action} failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("hub Hub1"), Ok(SessionCommand::Hub("Hub1".into())));
        assert_eq!(
            parse_command("  device   Device 2 "),
            Ok(SessionCommand::Device("Device 2".into()))
        );
        assert_eq!(parse_command("ADD sensor-7"), Ok(SessionCommand::Add("sensor-7".into())));
    }

    #[test]
    fn parses_bare_commands_and_aliases() {
        assert_eq!(parse_command("hubs"), Ok(SessionCommand::Hubs));
        assert_eq!(parse_command("none"), Ok(SessionCommand::ClearHub));
        assert_eq!(parse_command("r"), Ok(SessionCommand::Reload));
        assert_eq!(parse_command("del"), Ok(SessionCommand::Delete));
        assert_eq!(parse_command("?"), Ok(SessionCommand::Help));
        assert_eq!(parse_command("exit"), Ok(SessionCommand::Quit));
        assert_eq!(parse_command("monitor"), Ok(SessionCommand::Monitor(10)));
        assert_eq!(parse_command("m 3"), Ok(SessionCommand::Monitor(3)));
    }

    #[test]
    fn rejects_missing_arguments_and_unknown_words() {
        assert_eq!(parse_command("   "), Err(ParseError::Empty));
        assert_eq!(parse_command("hub"), Err(ParseError::MissingArgument("hub")));
        assert_eq!(parse_command("add   "), Err(ParseError::MissingArgument("add")));
        assert_eq!(
            parse_command("monitor 0"),
            Err(ParseError::InvalidCount("0".into()))
        );
        assert_eq!(
            parse_command("monitor lots"),
            Err(ParseError::InvalidCount("lots".into()))
        );
        assert_eq!(
            parse_command("connect Hub1"),
            Err(ParseError::Unknown("connect".into()))
        );
    }
}
