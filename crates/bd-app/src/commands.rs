//! Parsing of interactive commands

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use bd_data::{SourceId, ViewKind};

pub const HELP: &str = "\
Commands:
  list                 list uploaded files
  select <id>          select a file by id
  tab <view>           switch to explorer, insights or annotation
  next | prev          move the explorer one page
  size <n>             set the explorer page size
  column <name>        choose the metadata column for charts and questions
  ask [column]         ask for an annotation of a metadata column
  upload <path>        upload a CSV file
  delete <id>          delete a file
  show                 redraw the active view
  help                 show this text
  quit                 exit";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Select(SourceId),
    Tab(ViewKind),
    Next,
    Prev,
    Size(usize),
    Column(String),
    Ask(Option<String>),
    Upload(PathBuf),
    Delete(SourceId),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let rest: Vec<&str> = parts.collect();
        let argument = |what: &str| -> Result<String> {
            if rest.is_empty() {
                bail!("'{}' needs {}", verb, what);
            }
            Ok(rest.join(" "))
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "select" | "open" => Command::Select(SourceId::new(argument("a file id")?)),
            "tab" | "view" => {
                let name = argument("a view name")?;
                Command::Tab(name.parse().map_err(|e: String| anyhow!(e))?)
            }
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "size" => {
                let size = argument("a page size")?;
                Command::Size(
                    size.parse()
                        .with_context(|| format!("'{}' is not a page size", size))?,
                )
            }
            "column" | "col" => Command::Column(argument("a column name")?),
            "ask" => Command::Ask((!rest.is_empty()).then(|| rest.join(" "))),
            "upload" => Command::Upload(PathBuf::from(argument("a file path")?)),
            "delete" | "rm" => Command::Delete(SourceId::new(argument("a file id")?)),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '{}', try 'help'", other),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_commands() {
        assert_eq!("list".parse::<Command>().unwrap(), Command::List);
        assert_eq!(
            "select 65a1".parse::<Command>().unwrap(),
            Command::Select(SourceId::new("65a1"))
        );
        assert_eq!(
            "tab Explorer".parse::<Command>().unwrap(),
            Command::Tab(ViewKind::Explorer)
        );
        assert_eq!("size 25".parse::<Command>().unwrap(), Command::Size(25));
        assert_eq!("ask".parse::<Command>().unwrap(), Command::Ask(None));
        assert_eq!(
            "ask sales region".parse::<Command>().unwrap(),
            Command::Ask(Some("sales region".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!("".parse::<Command>().is_err());
        assert!("select".parse::<Command>().is_err());
        assert!("size many".parse::<Command>().is_err());
        assert!("tab charts".parse::<Command>().is_err());
        assert!("frobnicate".parse::<Command>().is_err());
    }
}
