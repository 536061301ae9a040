//! In-band posting commands.
//!
//! A chat message whose text is exactly one of the command keywords is
//! consumed by the bridge instead of being forwarded.

use std::fmt;

pub const STOP_POSTING: &str = "bot stop posting";
pub const START_POSTING: &str = "bot start posting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Mute the chat the command came from.
    StopPosting,
    /// Unmute it again.
    StartPosting,
}

impl Command {
    /// Exact, case-sensitive match on the whole message text.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            STOP_POSTING => Some(Self::StopPosting),
            START_POSTING => Some(Self::StartPosting),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::StopPosting => STOP_POSTING,
            Self::StartPosting => START_POSTING,
        }
    }

    /// Reply sent to the chat after the command took effect.
    pub fn confirmation(self) -> &'static str {
        match self {
            Self::StopPosting => "Stopped posting to this chat.",
            Self::StartPosting => "Started posting to this chat.",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("bot stop posting", Some(Command::StopPosting))]
    #[case("bot start posting", Some(Command::StartPosting))]
    #[case("Bot stop posting", None)]
    #[case(" bot stop posting", None)]
    #[case("bot stop posting now", None)]
    #[case("bot", None)]
    #[case("", None)]
    fn parses_exact_keywords(#[case] text: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse(text), expected);
    }

    #[test]
    fn keyword_round_trips() {
        for command in [Command::StopPosting, Command::StartPosting] {
            assert_eq!(Command::parse(command.keyword()), Some(command));
        }
    }
}
