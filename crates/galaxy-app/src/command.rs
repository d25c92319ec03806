//! Consumer commands.
//!
//! One command per input line:
//!
//! ```text
//! @42 hello there          send a text message to user 42
//! /image 42 <uri>          send an image reference
//! /file 42 <uri>           send a file reference
//! /open 42                 attach the transcript with user 42
//! /close 42                detach it again
//! /add <first> <last> <country code> <number>
//! /refresh                 reload the chat list, roster and profile
//! /user 9                  switch the signed-in identity
//! /quit
//! ```

use std::str::FromStr;

use galaxy_client::Contact;
use galaxy_proto::{MessageBody, UserId};
use thiserror::Error;

/// A consumer intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a message.
    Send {
        /// Recipient
        to: UserId,
        /// Message body
        body: MessageBody,
    },
    /// Attach a conversation's transcript.
    OpenChat {
        /// Counterpart
        friend: UserId,
    },
    /// Detach a conversation's transcript.
    CloseChat {
        /// Counterpart
        friend: UserId,
    },
    /// Submit a new contact.
    SaveContact(Contact),
    /// Reload every view that has a refresh request.
    Refresh,
    /// Sign in as someone else.
    SwitchUser(UserId),
    /// Shut down.
    Quit,
}

/// Command parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// Unrecognised command word
    #[error("unknown command: {0}")]
    Unknown(String),

    /// Required argument absent
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command word
        command: &'static str,
        /// Argument name
        argument: &'static str,
    },

    /// Argument is not a user id
    #[error("invalid user id: {0}")]
    InvalidId(String),
}

fn user_id(raw: Option<&str>, command: &'static str) -> Result<UserId, CommandError> {
    let raw = raw.ok_or(CommandError::MissingArgument { command, argument: "user id" })?;
    raw.parse().map_err(|_| CommandError::InvalidId(raw.to_string()))
}

fn rest<'a>(
    raw: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(CommandError::MissingArgument { command, argument })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        if let Some(message) = line.strip_prefix('@') {
            let mut parts = message.splitn(2, char::is_whitespace);
            let to = user_id(parts.next(), "@")?;
            let text = rest(parts.next(), "@", "message")?;
            return Ok(Self::Send { to, body: MessageBody::Text(text.to_string()) });
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let word = parts.next().unwrap_or_default();
        let args = parts.next().unwrap_or_default().trim();

        match word {
            "/image" | "/file" => {
                let command = if word == "/image" { "/image" } else { "/file" };
                let mut args = args.splitn(2, char::is_whitespace);
                let to = user_id(args.next().filter(|s| !s.is_empty()), command)?;
                let uri = rest(args.next(), command, "uri")?.to_string();
                let body = if command == "/image" {
                    MessageBody::Image { uri }
                } else {
                    MessageBody::File { uri }
                };
                Ok(Self::Send { to, body })
            },
            "/open" => Ok(Self::OpenChat { friend: user_id(non_empty(args), "/open")? }),
            "/close" => Ok(Self::CloseChat { friend: user_id(non_empty(args), "/close")? }),
            "/user" => Ok(Self::SwitchUser(user_id(non_empty(args), "/user")?)),
            "/add" => {
                let mut fields = args.split_whitespace();
                let mut next = |argument| {
                    fields
                        .next()
                        .map(str::to_string)
                        .ok_or(CommandError::MissingArgument { command: "/add", argument })
                };
                Ok(Self::SaveContact(Contact {
                    first_name: next("first name")?,
                    last_name: next("last name")?,
                    country_code: next("country code")?,
                    contact_no: next("number")?,
                    ..Contact::default()
                }))
            },
            "/refresh" => Ok(Self::Refresh),
            "/quit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn non_empty(args: &str) -> Option<&str> {
    Some(args).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_message() {
        assert_eq!("@42 hello there".parse(), Ok(Command::Send {
            to: 42,
            body: MessageBody::Text("hello there".to_string())
        }));
    }

    #[test]
    fn parses_attachments_as_tagged_bodies() {
        assert_eq!("/image 3 http://x/y.png".parse(), Ok(Command::Send {
            to: 3,
            body: MessageBody::Image { uri: "http://x/y.png".to_string() }
        }));
        assert_eq!("/file 3 file:///a.pdf".parse(), Ok(Command::Send {
            to: 3,
            body: MessageBody::File { uri: "file:///a.pdf".to_string() }
        }));
    }

    #[test]
    fn parses_contact() {
        let Ok(Command::SaveContact(contact)) = "/add Lyra Vega +94 771234567".parse() else {
            panic!("expected a contact");
        };
        assert_eq!(contact.first_name, "Lyra");
        assert_eq!(contact.country_code, "+94");
        assert_eq!(contact.contact_no, "771234567");
        assert_eq!(contact.id, 0);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("  ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("/dance".parse::<Command>(), Err(CommandError::Unknown("/dance".into())));
        assert_eq!("@x hi".parse::<Command>(), Err(CommandError::InvalidId("x".into())));
        assert_eq!(
            "@42".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "@", argument: "message" })
        );
        assert_eq!(
            "/open".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "/open", argument: "user id" })
        );
        assert_eq!(
            "/add Lyra".parse::<Command>(),
            Err(CommandError::MissingArgument { command: "/add", argument: "last name" })
        );
    }

    #[test]
    fn parses_session_commands() {
        assert_eq!("/user 9".parse(), Ok(Command::SwitchUser(9)));
        assert_eq!("/open 5".parse(), Ok(Command::OpenChat { friend: 5 }));
        assert_eq!("/close 5".parse(), Ok(Command::CloseChat { friend: 5 }));
        assert_eq!("/refresh".parse(), Ok(Command::Refresh));
        assert_eq!("/quit".parse(), Ok(Command::Quit));
    }
}
