use std::str::FromStr;

use anyhow::{Context, anyhow, bail};

/// A line typed on the interactive console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Resume,
    Pause,
    Next,
    Jump(usize),
    Status,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let cmd = match verb.as_str() {
            "play" | "resume" => Self::Resume,
            "pause" => Self::Pause,
            "next" => Self::Next,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            "jump" => {
                let raw = words
                    .next()
                    .ok_or_else(|| anyhow!("jump needs a zero-based slide index"))?;
                if raw.starts_with('-') {
                    bail!("slide index must not be negative: {raw}");
                }
                let index = raw
                    .parse::<usize>()
                    .with_context(|| format!("invalid slide index `{raw}`"))?;
                Self::Jump(index)
            }
            other => bail!("unknown command `{other}`"),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument `{extra}`");
        }
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!("play".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Resume);
        assert_eq!(" Pause ".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Pause);
        assert_eq!("next".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Next);
        assert_eq!("jump 3".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Jump(3));
        assert_eq!("exit".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn rejects_bad_jumps() {
        let negative = "jump -1".parse::<ConsoleCommand>().unwrap_err();
        assert!(negative.to_string().contains("negative"));
        assert!("jump".parse::<ConsoleCommand>().is_err());
        assert!("jump two".parse::<ConsoleCommand>().is_err());
        assert!("jump 1 2".parse::<ConsoleCommand>().is_err());
    }

    #[test]
    fn rejects_unknown_and_empty_input() {
        assert!("rewind".parse::<ConsoleCommand>().is_err());
        assert!("   ".parse::<ConsoleCommand>().is_err());
    }
}
