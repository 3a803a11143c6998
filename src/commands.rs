//! Available commands and autocomplete logic

use crate::nav::NavState;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Argument placeholder shown in the palette, empty if none
  pub args: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "open",
    aliases: &["o", "go", "url"],
    description: "Open an app URL",
    args: "<url>",
  },
  Command {
    name: "page",
    aliases: &["p"],
    description: "Jump to a list page",
    args: "<n>",
  },
  Command {
    name: "search",
    aliases: &["s", "find", "name"],
    description: "Search characters by name",
    args: "<term>",
  },
  Command {
    name: "character",
    aliases: &["c", "char", "show"],
    description: "Show a character by id",
    args: "<id>",
  },
  Command {
    name: "back",
    aliases: &["b"],
    description: "Go back",
    args: "",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch the current view",
    args: "",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit castly",
    args: "",
  },
];

/// What a submitted command asks the app to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
  Navigate(NavState),
  /// Change page, keeping the current filter
  Page(u32),
  /// Search from page 1; an empty term clears the filter
  Search(String),
  Back,
  Refresh,
  Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("Unknown command: {0}")]
  Unknown(String),
  #[error("Usage: {name} {args}")]
  MissingArgument {
    name: &'static str,
    args: &'static str,
  },
  #[error("Invalid {what}: {value}")]
  InvalidArgument { what: &'static str, value: String },
}

/// Split palette input into the command word and the rest
fn split(input: &str) -> (&str, &str) {
  let input = input.trim();
  match input.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (input, ""),
  }
}

/// Get autocomplete suggestions for a given input.
///
/// Only the command word is matched; anything after it is an argument.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = split(input).0.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Replace the command word of `input` with `command`, keeping arguments
pub fn complete(input: &str, command: &Command) -> String {
  let (_, args) = split(input);
  if args.is_empty() {
    command.name.to_string()
  } else {
    format!("{} {}", command.name, args)
  }
}

/// Parse palette input into an action.
///
/// The command word resolves like autocomplete does, so `char 7` and
/// `character 7` are the same.
pub fn parse(input: &str) -> Result<CommandAction, CommandError> {
  let (word, args) = split(input);
  let command = get_suggestions(word)
    .into_iter()
    .next()
    .filter(|_| !word.is_empty())
    .ok_or_else(|| CommandError::Unknown(word.to_string()))?;

  let require_args = || {
    if args.is_empty() {
      Err(CommandError::MissingArgument {
        name: command.name,
        args: command.args,
      })
    } else {
      Ok(args)
    }
  };

  match command.name {
    "open" => {
      let url = require_args()?;
      NavState::parse(url)
        .map(CommandAction::Navigate)
        .map_err(|_| CommandError::InvalidArgument {
          what: "url",
          value: url.to_string(),
        })
    }
    "page" => {
      let page = require_args()?;
      page
        .parse::<u32>()
        .ok()
        .filter(|p| *p >= 1)
        .map(CommandAction::Page)
        .ok_or_else(|| CommandError::InvalidArgument {
          what: "page",
          value: page.to_string(),
        })
    }
    // No argument clears the filter
    "search" => Ok(CommandAction::Search(args.to_string())),
    "character" => {
      let id = require_args()?;
      Ok(CommandAction::Navigate(NavState::character(id)))
    }
    "back" => Ok(CommandAction::Back),
    "refresh" => Ok(CommandAction::Refresh),
    "quit" => Ok(CommandAction::Quit),
    other => Err(CommandError::Unknown(other.to_string())),
  }
}
