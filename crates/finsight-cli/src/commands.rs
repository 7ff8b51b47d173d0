//! Command parsing for the interactive session

use finsight_core::{CredentialUpdate, SearchProviderKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty input")]
    Empty,

    #[error("Unknown command: /{0}. Type /help for the list")]
    Unknown(String),

    #[error("{0}")]
    Usage(&'static str),

    #[error("Unknown credential '{0}'. Use groq, google, google-cx, serper or finnhub")]
    UnknownCredential(String),

    #[error("Unknown search provider '{0}'. Use google, serper or finnhub")]
    UnknownProvider(String),
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Quote, news and narrative for a ticker
    Analyze { ticker: String },
    /// Free-text news search
    News { query: String },
    /// Replace a credential for the rest of the session
    Key { update: CredentialUpdate },
    /// Switch the search backend
    Provider { kind: SearchProviderKind },
    /// Show the active configuration
    Config,
    Help,
    Exit,
}

impl Command {
    /// Parse a command from user input
    ///
    /// A single bare word is a ticker; anything longer is a news query.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CommandError::Empty);
        }

        let Some(rest) = input.strip_prefix('/') else {
            return Ok(if input.split_whitespace().count() == 1 {
                Command::Analyze {
                    ticker: input.to_uppercase(),
                }
            } else {
                Command::News {
                    query: input.to_string(),
                }
            });
        };

        let (cmd, args) = match rest.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
            None => (rest.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "analyze" | "a" => match args.split_whitespace().collect::<Vec<_>>().as_slice() {
                [ticker] => Ok(Command::Analyze {
                    ticker: ticker.to_uppercase(),
                }),
                _ => Err(CommandError::Usage("Usage: /analyze <ticker>")),
            },
            "news" | "n" => {
                if args.is_empty() {
                    return Err(CommandError::Usage("Usage: /news <query>"));
                }
                Ok(Command::News {
                    query: args.to_string(),
                })
            }
            "key" | "k" => {
                if args.is_empty() {
                    return Err(CommandError::Usage(
                        "Usage: /key <groq|google|google-cx|serper|finnhub> [value]",
                    ));
                }
                // No value clears the credential
                let (name, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                let value = value.trim().to_string();
                let update = match name.to_lowercase().as_str() {
                    "groq" | "llm" => CredentialUpdate::CompletionKey(value),
                    "google" => CredentialUpdate::GoogleKey(value),
                    "google-cx" | "cx" => CredentialUpdate::GoogleEngineId(value),
                    "serper" => CredentialUpdate::SerperKey(value),
                    "finnhub" => CredentialUpdate::FinnhubKey(value),
                    other => return Err(CommandError::UnknownCredential(other.to_string())),
                };
                Ok(Command::Key { update })
            }
            "provider" | "p" => {
                if args.is_empty() {
                    return Err(CommandError::Usage("Usage: /provider <google|serper|finnhub>"));
                }
                args.parse::<SearchProviderKind>()
                    .map(|kind| Command::Provider { kind })
                    .map_err(|_| CommandError::UnknownProvider(args.to_string()))
            }
            "config" | "c" => Ok(Command::Config),
            "help" | "h" | "?" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            _ => Err(CommandError::Unknown(cmd)),
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r"
finsight commands
=================

  <TICKER>                    Quote, news and AI insights (e.g. AAPL)
  <several words>             News search for free text
  /analyze <ticker>           Same as typing the ticker
  /news <query>               News search
  /key <name> [value]         Set a credential for this session, or clear it
                              names: groq, google, google-cx, serper, finnhub
  /provider <name>            Switch search: google, serper, finnhub
  /config                     Show the active configuration
  /help                       Show this help
  /exit                       Exit

Aliases: /a /n /k /p /c /h /q
"
    }
}
