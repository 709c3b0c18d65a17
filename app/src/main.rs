//! Interactive session shell for the todo service.
//!
//! Connects once at startup, then reads one command per line from stdin and
//! prints the page after each. A configuration failure prints the error page
//! and exits non-zero.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use todo_core::config::{API_KEY_ENV, API_URL_ENV, DEFAULT_NOTIFICATION_MS};
use todo_core::{ClientConfig, HttpRemote, NotificationSettings, Page, PageView, TodoPage};

mod command;
mod view;

use command::Command;

#[derive(Debug, Parser)]
#[command(name = "todo-session", about = "Manage todos on the hosted CRUD service")]
struct Args {
    /// Base URL of the CRUD API.
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// API key for the CRUD API.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// How long notifications stay up, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_NOTIFICATION_MS)]
    notification_ms: u64,

    /// Print the page as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let settings = NotificationSettings {
        duration: Duration::from_millis(args.notification_ms),
        ..NotificationSettings::default()
    };
    let config = ClientConfig::from_values(args.api_key, args.api_url);
    let mut page = Page::connect(config, settings);
    show(&page.view(), args.json);

    let Some(ready) = page.ready_mut() else {
        return ExitCode::FAILURE;
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read stdin");
                return ExitCode::FAILURE;
            }
        };
        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        run(ready, command).await;
        ready.reconcile();
        show(&ready.view(), args.json);
    }
    ExitCode::SUCCESS
}

async fn run(page: &mut TodoPage<HttpRemote>, command: Command) {
    let outcome = match command {
        Command::Add { text, value } => page.add_form().submit(&text, value).await.map(drop),
        Command::Fetch { key } => page.fetch_form().submit(&key).await.map(drop),
        Command::Edit { key, value } => match page.item(&key) {
            Some(item) => {
                // A failed save leaves the item in edit mode with this draft.
                if !item.is_editing() {
                    if let Err(err) = item.begin_edit() {
                        tracing::debug!(error = %err, "cannot edit");
                    }
                }
                item.set_draft(value);
                item.save().await
            }
            None => {
                eprintln!("no todo {key} in this session");
                Ok(())
            }
        },
        Command::Cancel { key } => match page.item(&key) {
            Some(item) => item.cancel_edit(),
            None => Ok(()),
        },
        Command::Delete { key } => match page.item(&key) {
            Some(item) => item.delete().await,
            None => {
                eprintln!("no todo {key} in this session");
                Ok(())
            }
        },
        Command::Dismiss => {
            page.session().dismiss();
            Ok(())
        }
        Command::Help => {
            println!("{}", command::HELP);
            Ok(())
        }
        Command::List | Command::Quit => Ok(()),
    };
    if let Err(err) = outcome {
        tracing::debug!(error = %err, "command did not complete");
    }
}

fn show(view: &PageView, json: bool) {
    if json {
        match serde_json::to_string(view) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(error = %err, "failed to encode page"),
        }
    } else {
        print!("{}", view::render(view));
    }
}

fn init_logging() {
    let debug_enabled = env::var("TODO_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
