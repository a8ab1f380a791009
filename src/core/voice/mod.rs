//! Voice command classification and per-connection answer checking.

pub mod classifier;
pub mod command;
pub mod session;
pub mod vocabulary;

pub use classifier::{Classification, FUZZY_THRESHOLD, MatchTier, classify, normalize};
pub use command::Command;
pub use session::{VoiceOutcome, VoiceSession};
