//! Ordered vocabulary tables for the voice classifier.
//!
//! Order matters: the first matching entry wins, so both tables are slices,
//! never sets.

use super::command::Command;

/// Whole-utterance phrases, matched against the normalized text
pub const PHRASES: &[(&str, Command)] = &[
    ("go up", Command::Up),
    ("move up", Command::Up),
    ("look up", Command::Up),
    ("go down", Command::Down),
    ("move down", Command::Down),
    ("look down", Command::Down),
    ("to the left", Command::Left),
    ("go left", Command::Left),
    ("turn left", Command::Left),
    ("to the right", Command::Right),
    ("go right", Command::Right),
    ("turn right", Command::Right),
    ("hold on", Command::Pause),
    ("take a break", Command::Pause),
    ("one moment", Command::Pause),
    ("u", Command::Up),
    ("d", Command::Down),
    ("l", Command::Left),
    ("r", Command::Right),
];

/// Accepted single words per command, including common mis-transcriptions.
///
/// "light" is not a `Right` variant: it is a real word users say.
pub const VARIANTS: &[(Command, &[&str])] = &[
    (
        Command::Up,
        &["up", "above", "top", "upper", "upward", "op", "app", "hope", "hub"],
    ),
    (
        Command::Down,
        &["down", "below", "bottom", "downward", "don", "dawn", "town"],
    ),
    (Command::Left, &["left", "lift", "let", "leaf", "laugh"]),
    (
        Command::Right,
        &["right", "write", "rite", "white", "ride", "bright", "alright"],
    ),
    (Command::Pause, &["pause", "stop", "wait", "hold", "break", "paws"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_cover_every_command_in_order() {
        let commands: Vec<Command> = VARIANTS.iter().map(|(command, _)| *command).collect();
        assert_eq!(commands, Command::ALL.to_vec());
    }

    #[test]
    fn test_variants_are_unique_across_commands() {
        let mut seen = std::collections::HashSet::new();
        for (_, words) in VARIANTS {
            for word in *words {
                assert!(seen.insert(*word), "duplicate variant {word}");
            }
        }
        assert!(!seen.contains("light"));
    }

    #[test]
    fn test_phrases_are_normalized() {
        for (phrase, _) in PHRASES {
            assert_eq!(*phrase, phrase.trim().to_lowercase());
        }
    }
}
