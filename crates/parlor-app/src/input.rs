//! User input abstraction.
//!
//! One line of input from whatever front end is attached. Plain text is a
//! message; a leading `/` introduces a command.

use parlor_proto::UserId;

/// A line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Message text to submit.
    Text(String),
    /// `/open <id>`: open a chat with another user.
    Open(UserId),
    /// `/typing`: tell the room we are typing.
    Typing,
    /// `/close`: close the current chat.
    Close,
    /// `/quit`: leave the application.
    Quit,
    /// A command that did not parse.
    Invalid(String),
}

impl UserInput {
    /// Classify one line of input. Surrounding newline characters are ignored;
    /// other whitespace in message text is kept as typed.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        let Some(command) = line.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        let mut words = command.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("open"), Some(id), None) => match id.parse() {
                Ok(id) => Self::Open(id),
                Err(_) => Self::Invalid(format!("not a user id: {id}")),
            },
            (Some("open"), ..) => Self::Invalid("usage: /open <user id>".to_string()),
            (Some("typing"), None, None) => Self::Typing,
            (Some("close"), None, None) => Self::Close,
            (Some("quit"), None, None) => Self::Quit,
            _ => Self::Invalid(format!("unknown command: /{command}")),
        }
    }
}
