//! Line protocol spoken between clients and the intermediary.
//!
//! Every frame carries exactly one line. The command is the text before the
//! first space; anything the intermediary does not recognize is a raw engine
//! command and is forwarded untouched.

use std::fmt;

pub const NAMESPACE: &str = "chesshook-intermediary";
pub const PROTOCOL_VERSION: &str = "1";

/// Which authorization gate a command passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Open,
    Read,
    Write,
}

/// A parsed inbound line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    WhoAreYou,
    WhatEngine,
    /// `auth <key>`. `None` when the key token is missing entirely.
    Auth(Option<&'a str>),
    Sub,
    Unsub,
    Lock,
    Unlock,
    /// Anything else: the full raw line, destined for the engine.
    Engine(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let (head, rest) = match line.split_once(' ') {
            Some((head, rest)) => (head, Some(rest)),
            None => (line, None),
        };

        match head {
            "whoareyou" => Self::WhoAreYou,
            "whatengine" => Self::WhatEngine,
            "auth" => Self::Auth(rest.and_then(|r| r.split(' ').next())),
            "sub" => Self::Sub,
            "unsub" => Self::Unsub,
            "lock" => Self::Lock,
            "unlock" => Self::Unlock,
            _ => Self::Engine(line),
        }
    }

    pub fn gate(&self) -> Gate {
        match self {
            Self::WhoAreYou | Self::Auth(_) => Gate::Open,
            Self::WhatEngine | Self::Sub | Self::Unsub => Gate::Read,
            Self::Lock | Self::Unlock | Self::Engine(_) => Gate::Write,
        }
    }
}

/// A direct reply to the originating client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Iam,
    Engine(String),
    AuthOk,
    AuthErr,
    SubOk,
    SubErr,
    UnsubOk,
    UnsubErr,
    LockOk,
    LockErr,
    UnlockOk,
    UnlockErr,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iam => write!(f, "iam {NAMESPACE}v{PROTOCOL_VERSION}"),
            Self::Engine(name) => write!(f, "engine {name}"),
            Self::AuthOk => f.write_str("authok"),
            Self::AuthErr => f.write_str("autherr"),
            Self::SubOk => f.write_str("subok"),
            Self::SubErr => f.write_str("suberr"),
            Self::UnsubOk => f.write_str("unsubok"),
            Self::UnsubErr => f.write_str("unsuberr"),
            Self::LockOk => f.write_str("lockok"),
            Self::LockErr => f.write_str("lockerr"),
            Self::UnlockOk => f.write_str("unlockok"),
            Self::UnlockErr => f.write_str("unlockerr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(Command::parse("whoareyou"), Command::WhoAreYou);
        assert_eq!(Command::parse("whatengine"), Command::WhatEngine);
        assert_eq!(Command::parse("sub"), Command::Sub);
        assert_eq!(Command::parse("unsub"), Command::Unsub);
        assert_eq!(Command::parse("lock"), Command::Lock);
        assert_eq!(Command::parse("unlock"), Command::Unlock);
    }

    #[test]
    fn trailing_tokens_do_not_change_the_command() {
        assert_eq!(Command::parse("whoareyou please"), Command::WhoAreYou);
        assert_eq!(Command::parse("lock now"), Command::Lock);
    }

    #[test]
    fn auth_takes_the_first_argument_token() {
        assert_eq!(Command::parse("auth abc123"), Command::Auth(Some("abc123")));
        assert_eq!(Command::parse("auth abc123 extra"), Command::Auth(Some("abc123")));
        assert_eq!(Command::parse("auth "), Command::Auth(Some("")));
        assert_eq!(Command::parse("auth"), Command::Auth(None));
    }

    #[test]
    fn unknown_lines_are_forwarded_verbatim() {
        let line = "position startpos moves e2e4 e7e5";
        assert_eq!(Command::parse(line), Command::Engine(line));
        assert_eq!(Command::parse("go depth 20"), Command::Engine("go depth 20"));
        assert_eq!(Command::parse(""), Command::Engine(""));
        // Commands are case sensitive.
        assert_eq!(Command::parse("SUB"), Command::Engine("SUB"));
    }

    #[test]
    fn gates_follow_command_class() {
        assert_eq!(Command::WhoAreYou.gate(), Gate::Open);
        assert_eq!(Command::Auth(None).gate(), Gate::Open);
        assert_eq!(Command::WhatEngine.gate(), Gate::Read);
        assert_eq!(Command::Sub.gate(), Gate::Read);
        assert_eq!(Command::Unsub.gate(), Gate::Read);
        assert_eq!(Command::Lock.gate(), Gate::Write);
        assert_eq!(Command::Unlock.gate(), Gate::Write);
        assert_eq!(Command::Engine("go").gate(), Gate::Write);
    }

    #[test]
    fn replies_render_wire_tokens() {
        assert_eq!(Reply::Iam.to_string(), "iam chesshook-intermediaryv1");
        assert_eq!(Reply::Engine("Stockfish 16".into()).to_string(), "engine Stockfish 16");
        assert_eq!(Reply::Engine(String::new()).to_string(), "engine ");
        assert_eq!(Reply::UnlockErr.to_string(), "unlockerr");
        assert_eq!(Reply::SubOk.to_string(), "subok");
    }
}
