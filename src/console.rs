//! Line commands understood by the interactive session.

use chrono::NaiveDate;

use crate::api::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use crate::dates::parse_date;

pub const HELP: &str = "\
Commands:
  level <name>            switch level (location resets to its default)
  location <name>         switch location within the current level
  range <start> <end>     set the reporting window (YYYY-MM-DD)
  show                    re-render the current selection
  export [--gzip]         write the CSV report to the export directory
  meta                    list levels and locations
  api <url>               reconnect to another API base URL (new session)
  timeout <secs>          reconnect with a request timeout of 3-30s (new session)
  help                    show this help
  quit                    end the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Level(String),
    Location(String),
    Range(NaiveDate, NaiveDate),
    Show,
    Export { gzip: bool },
    Meta,
    Api(String),
    Timeout(u64),
    Help,
    Quit,
}

impl Command {
    /// Whether a successful run of this command changes the filter and so
    /// triggers a new evaluation pass.
    pub fn changes_filter(&self) -> bool {
        matches!(
            self,
            Command::Level(_) | Command::Location(_) | Command::Range(..)
        )
    }
}

/// Parses one input line. Names may contain spaces (`location South Korea`).
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(v, r)| (v, r.trim()))
        .unwrap_or((line, ""));

    match verb.to_ascii_lowercase().as_str() {
        "level" => non_empty(rest, "level").map(Command::Level),
        "location" | "loc" => non_empty(rest, "location").map(Command::Location),
        "range" => {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(start), Some(end), None) => Ok(Command::Range(date(start)?, date(end)?)),
                _ => Err("usage: range <start> <end>".to_string()),
            }
        }
        "show" | "" => Ok(Command::Show),
        "export" => match rest {
            "" => Ok(Command::Export { gzip: false }),
            "--gzip" | "gzip" => Ok(Command::Export { gzip: true }),
            other => Err(format!("unknown export option '{other}'")),
        },
        "meta" | "metadata" => Ok(Command::Meta),
        "api" => non_empty(rest, "api").map(Command::Api),
        "timeout" => match rest.parse::<u64>() {
            Ok(secs) if (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&secs) => {
                Ok(Command::Timeout(secs))
            }
            _ => Err(format!(
                "usage: timeout <secs>, between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS}"
            )),
        },
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

fn non_empty(value: &str, what: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("usage: {what} <name>"))
    } else {
        Ok(value.to_string())
    }
}

fn date(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}
