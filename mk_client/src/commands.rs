use mindikot::{
    Card, PlayerId, PlayerInput, TrumpDecision, entities::ParseCardError,
    messages::ClientMessage,
};
use std::fmt;

pub const COMMAND_HELP: &str = "\
commands:
  play CARD   play a card, e.g. 'play 10h', 'play qs', 'play a♠'
  reveal      reveal the hidden trump (when asked)
  pass        keep the hidden trump hidden (when asked)
  next        start the next round (host only)
  kick SEAT   remove a player from the lobby (host only)
  show        print the table again
  help        print this message
  quit        leave the session";

/// A line typed at the prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Play(Card),
    Reveal,
    Pass,
    NextRound,
    Kick(PlayerId),
    Show,
    Help,
    Quit,
}

impl Command {
    /// The message to send to the host, if the command needs one. Kicks go
    /// through the session handle on the host rather than the wire.
    #[must_use]
    pub fn to_client_message(self) -> Option<ClientMessage> {
        match self {
            Self::Play(card) => Some(ClientMessage::PlayerAction(PlayerInput::PlayCard { card })),
            Self::Reveal => Some(ClientMessage::PlayerAction(PlayerInput::TrumpDecision {
                decision: TrumpDecision::Reveal,
            })),
            Self::Pass => Some(ClientMessage::PlayerAction(PlayerInput::TrumpDecision {
                decision: TrumpDecision::Pass,
            })),
            Self::NextRound => Some(ClientMessage::StartNextRound),
            Self::Quit => Some(ClientMessage::Disconnect),
            Self::Kick(_) | Self::Show | Self::Help => None,
        }
    }
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `play` without a card.
    MissingCard,
    /// `play` with something that isn't a card.
    InvalidCard(ParseCardError),
    /// `kick` without a seat number.
    MissingSeat,
    InvalidSeat(String),
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCard => write!(f, "Play needs a card (e.g., 'play 10h')"),
            Self::InvalidCard(error) => write!(f, "{error}"),
            Self::MissingSeat => write!(f, "Kick needs a seat number (e.g., 'kick 3')"),
            Self::InvalidSeat(value) => write!(f, "Invalid seat '{value}'"),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one prompt line.
///
/// # Examples
///
/// ```
/// use mk_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("reveal"), Ok(Command::Reveal));
/// assert!(matches!(parse_command("play 10h"), Ok(Command::Play(_))));
/// assert!(parse_command("fold").is_err());
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Err(ParseError::UnrecognizedCommand(String::new()));
    };

    match first.to_ascii_lowercase().as_str() {
        "play" | "p" => {
            let card = parts.get(1).ok_or(ParseError::MissingCard)?;
            card.parse().map(Command::Play).map_err(ParseError::InvalidCard)
        }
        "reveal" => Ok(Command::Reveal),
        "pass" => Ok(Command::Pass),
        "next" => Ok(Command::NextRound),
        "kick" => {
            let seat = parts.get(1).ok_or(ParseError::MissingSeat)?;
            seat.parse()
                .map(Command::Kick)
                .map_err(|_| ParseError::InvalidSeat(seat.to_string()))
        }
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(ParseError::UnrecognizedCommand(input.trim().to_string())),
    }
}
