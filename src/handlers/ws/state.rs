//! WebSocket connection state
//!
//! Each connection owns its state; only the calibration context may be
//! shared with other connections, depending on the configured scope.

use std::time::{Duration, Instant};

use crate::auth::Auth;
use crate::core::calibration::SharedContext;

/// Which calibration channel a connection was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionProfile {
    /// `/ws`: authenticated, full command set
    Primary,
    /// `/ws/calibration`: unauthenticated, calibration commands only
    Calibration,
}

impl SessionProfile {
    pub fn name(&self) -> &'static str {
        match self {
            SessionProfile::Primary => "primary",
            SessionProfile::Calibration => "calibration",
        }
    }

    /// Measurement commands are only served on the primary channel
    pub fn allows_measurement(&self) -> bool {
        matches!(self, SessionProfile::Primary)
    }
}

/// Drops frames arriving less than `interval` after the last processed one
#[derive(Debug, Clone)]
pub struct FrameRateLimiter {
    interval: Duration,
    last_processed: Option<Instant>,
}

impl FrameRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_processed: None,
        }
    }

    /// Returns true and records `now` if a frame may be processed
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_processed
            && now.saturating_duration_since(last) < self.interval
        {
            return false;
        }
        self.last_processed = Some(now);
        true
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }
}

pub struct ConnectionState {
    /// Unique identifier for this WebSocket session
    pub session_id: String,
    pub profile: SessionProfile,
    /// Auth context for this connection
    pub auth: Auth,
    pub authenticated: bool,
    pub calibration: SharedContext,
    pub rate_limiter: FrameRateLimiter,
}

impl ConnectionState {
    pub fn new(profile: SessionProfile, calibration: SharedContext, frame_interval: Duration) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            profile,
            auth: Auth::empty(),
            authenticated: false,
            calibration,
            rate_limiter: FrameRateLimiter::new(frame_interval),
        }
    }
}
