use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::state::{CalibrationContext, MeasurementSettings};

/// How calibration state is shared between connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationScope {
    /// Every connection observes and mutates one context
    #[default]
    Shared,
    /// Each connection gets its own context
    #[serde(alias = "per_session", alias = "per-session")]
    Session,
}

impl FromStr for CalibrationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" | "global" => Ok(Self::Shared),
            "session" | "per_session" | "per-session" => Ok(Self::Session),
            other => Err(format!(
                "Invalid calibration scope '{other}'. Expected 'shared' or 'session'"
            )),
        }
    }
}

/// Shared handle to one calibration context
pub type SharedContext = Arc<Mutex<CalibrationContext>>;

/// Hands out calibration contexts according to the configured scope
pub struct CalibrationRegistry {
    scope: CalibrationScope,
    settings: MeasurementSettings,
    shared: SharedContext,
}

impl CalibrationRegistry {
    pub fn new(scope: CalibrationScope, settings: MeasurementSettings) -> Self {
        Self {
            scope,
            settings,
            shared: Arc::new(Mutex::new(CalibrationContext::new(settings))),
        }
    }

    pub fn scope(&self) -> CalibrationScope {
        self.scope
    }

    /// Context for a newly opened session
    pub fn context_for_session(&self) -> SharedContext {
        match self.scope {
            CalibrationScope::Shared => Arc::clone(&self.shared),
            CalibrationScope::Session => {
                Arc::new(Mutex::new(CalibrationContext::new(self.settings)))
            }
        }
    }
}
