/// How to launch the engine and what to feed it after the UCI handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Executable followed by whitespace-separated startup arguments.
    pub command: String,
    /// Lines sent after `uci` and `isready`, in order.
    pub init_lines: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "./stockfish".into(),
            init_lines: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new(command: impl Into<String>, init_lines: Vec<String>) -> Self {
        Self {
            command: command.into(),
            init_lines,
        }
    }

    /// Program and arguments, split on whitespace.
    pub fn program_and_args(&self) -> Option<(&str, Vec<&str>)> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next()?;
        Some((program, parts.collect()))
    }

    /// Every line queued on spawn: `uci`, `isready`, then the init lines.
    pub fn startup_lines(&self) -> Vec<String> {
        let mut lines = vec!["uci".to_string(), "isready".to_string()];
        lines.extend(self.init_lines.iter().cloned());
        lines
    }
}

/// Split a `;`-delimited list of init lines, dropping empty segments.
pub fn parse_init_lines(raw: &str) -> Vec<String> {
    raw.split(';')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_program_from_args() {
        let config = EngineConfig::new("/usr/bin/lc0  --weights=net.pb  -t 4", Vec::new());
        let (program, args) = config.program_and_args().unwrap();
        assert_eq!(program, "/usr/bin/lc0");
        assert_eq!(args, vec!["--weights=net.pb", "-t", "4"]);
    }

    #[test]
    fn blank_command_has_no_program() {
        assert!(EngineConfig::new("   ", Vec::new()).program_and_args().is_none());
    }

    #[test]
    fn init_lines_split_on_semicolon() {
        assert_eq!(
            parse_init_lines("setoption name Threads value 4;setoption name Hash value 256"),
            vec!["setoption name Threads value 4", "setoption name Hash value 256"]
        );
        assert!(parse_init_lines("").is_empty());
        assert_eq!(parse_init_lines(";ucinewgame;;"), vec!["ucinewgame"]);
    }

    #[test]
    fn startup_lines_lead_with_handshake() {
        let config = EngineConfig::new("stockfish", vec!["ucinewgame".into()]);
        assert_eq!(config.startup_lines(), vec!["uci", "isready", "ucinewgame"]);
    }
}
