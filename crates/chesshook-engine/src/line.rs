const NAME_PREFIX: &str = "id name ";

/// What to do with one line of engine stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineLine<'a> {
    /// `id name <name>`: records the engine name, never broadcast.
    Name(&'a str),
    /// `bestmove ...` or `info ...`: fanned out to subscribers.
    Broadcast,
    Ignored,
}

impl<'a> EngineLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if let Some(name) = line.strip_prefix(NAME_PREFIX) {
            Self::Name(name)
        } else if line.starts_with("bestmove") || line.starts_with("info") {
            Self::Broadcast
        } else {
            Self::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_line_strips_prefix() {
        assert_eq!(
            EngineLine::classify("id name Stockfish 16.1"),
            EngineLine::Name("Stockfish 16.1")
        );
        assert_eq!(EngineLine::classify("id name "), EngineLine::Name(""));
    }

    #[test]
    fn search_output_is_broadcast() {
        assert_eq!(EngineLine::classify("bestmove e2e4 ponder e7e5"), EngineLine::Broadcast);
        assert_eq!(
            EngineLine::classify("info depth 12 score cp 31 pv e2e4"),
            EngineLine::Broadcast
        );
        assert_eq!(EngineLine::classify("info"), EngineLine::Broadcast);
    }

    #[test]
    fn everything_else_is_ignored() {
        assert_eq!(EngineLine::classify("id author the Stockfish developers"), EngineLine::Ignored);
        assert_eq!(EngineLine::classify("uciok"), EngineLine::Ignored);
        assert_eq!(EngineLine::classify("readyok"), EngineLine::Ignored);
        assert_eq!(EngineLine::classify("option name Hash type spin"), EngineLine::Ignored);
        assert_eq!(EngineLine::classify("id name"), EngineLine::Ignored);
        assert_eq!(EngineLine::classify(" bestmove e2e4"), EngineLine::Ignored);
    }
}
