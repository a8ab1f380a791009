use serde::Serialize;
use tracing::{debug, info};

use super::classifier::classify;
use super::command::Command;

/// Result of evaluating one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceOutcome {
    Correct,
    Incorrect,
    Unrecognized,
    PauseRequested,
    /// A direction was heard while nothing was expected. No response is sent.
    Ignored,
}

impl VoiceOutcome {
    /// Outcomes that produce a client response
    pub fn is_reported(&self) -> bool {
        !matches!(self, VoiceOutcome::Ignored)
    }
}

/// Per-connection voice state. Never shared between connections.
#[derive(Debug, Clone, Default)]
pub struct VoiceSession {
    expected: Option<Command>,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self { expected: None }
    }

    pub fn expected(&self) -> Option<Command> {
        self.expected
    }

    pub fn expect(&mut self, command: Command) {
        debug!(%command, "Listening for command");
        self.expected = Some(command);
    }

    pub fn stop(&mut self) {
        debug!("Listening stopped");
        self.expected = None;
    }

    /// Classify `text` and compare it against the expected command.
    ///
    /// The expected command is cleared only on a correct answer.
    pub fn evaluate(&mut self, text: &str) -> VoiceOutcome {
        let Some(classification) = classify(text) else {
            return VoiceOutcome::Unrecognized;
        };

        let heard = classification.command;
        if heard == Command::Pause {
            return VoiceOutcome::PauseRequested;
        }

        match self.expected {
            Some(expected) if expected == heard => {
                info!(%heard, "Correct answer");
                self.expected = None;
                VoiceOutcome::Correct
            }
            Some(expected) => {
                info!(%heard, %expected, "Incorrect answer");
                VoiceOutcome::Incorrect
            }
            None => {
                debug!(%heard, "Command heard with nothing expected");
                VoiceOutcome::Ignored
            }
        }
    }
}
