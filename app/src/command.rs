//! Line commands understood by the session shell.

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { text: String, value: f64 },
    Fetch { key: String },
    Edit { key: String, value: f64 },
    Cancel { key: String },
    Delete { key: String },
    Dismiss,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  add <txhash> [value]   create a todo (value defaults to 1)
  fetch <txhash>         fetch a todo into the session
  edit <txhash> <value>  change a todo's value
  cancel <txhash>        leave edit mode without saving
  delete <txhash>        delete a todo
  dismiss                dismiss the notification
  list                   show the page
  help                   show this help
  quit                   exit";

/// Unparseable numbers become NaN so the form rejects them as non-positive.
fn number(raw: Option<&str>, default: f64) -> f64 {
    raw.map(|s| s.parse().unwrap_or(f64::NAN)).unwrap_or(default)
}

fn key(raw: Option<&str>) -> String {
    raw.unwrap_or_default().to_string()
}

pub fn parse(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(Command::List);
    };
    let command = match verb {
        "add" => Command::Add {
            text: key(parts.next()),
            value: number(parts.next(), 1.0),
        },
        "fetch" => Command::Fetch { key: key(parts.next()) },
        "edit" => Command::Edit {
            key: key(parts.next()),
            value: number(parts.next(), f64::NAN),
        },
        "cancel" => Command::Cancel { key: key(parts.next()) },
        "delete" | "rm" => Command::Delete { key: key(parts.next()) },
        "dismiss" => Command::Dismiss,
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(command)
}
