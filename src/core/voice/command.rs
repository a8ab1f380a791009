use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Voice command set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    Pause,
}

impl Command {
    /// Enumeration order. Classifier tie-breaks follow this order.
    pub const ALL: [Command; 5] = [
        Command::Up,
        Command::Down,
        Command::Left,
        Command::Right,
        Command::Pause,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Up => "up",
            Command::Down => "down",
            Command::Left => "left",
            Command::Right => "right",
            Command::Pause => "pause",
        }
    }

    /// Directions are the only commands a symbol can expect
    pub fn is_direction(&self) -> bool {
        !matches!(self, Command::Pause)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Command::ALL
            .into_iter()
            .find(|command| command.as_str() == normalized)
            .ok_or_else(|| format!("Unknown command '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("UP".parse::<Command>(), Ok(Command::Up));
        assert_eq!(" Left ".parse::<Command>(), Ok(Command::Left));
        assert_eq!("pause".parse::<Command>(), Ok(Command::Pause));
        assert!("sideways".parse::<Command>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Command::Right).unwrap(), "\"right\"");
        let parsed: Command = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, Command::Down);
    }

    #[test]
    fn test_is_direction() {
        assert!(Command::Up.is_direction());
        assert!(!Command::Pause.is_direction());
    }
}
