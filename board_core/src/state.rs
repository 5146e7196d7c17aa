//! Session state cell shared between the control path and the sampling thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Calibrating = 2,
    Streaming = 3,
    Disconnecting = 4,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SessionState::Connecting,
            2 => SessionState::Calibrating,
            3 => SessionState::Streaming,
            4 => SessionState::Disconnecting,
            _ => SessionState::Disconnected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Calibrating => "calibrating",
            SessionState::Streaming => "streaming",
            SessionState::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloneable handle to one atomic state value.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl Default for StateCell {
    fn default() -> Self {
        Self::new(SessionState::Disconnected)
    }
}

impl StateCell {
    pub fn new(s: SessionState) -> Self {
        Self(Arc::new(AtomicU8::new(s as u8)))
    }

    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, s: SessionState) {
        let prev = SessionState::from_u8(self.0.swap(s as u8, Ordering::SeqCst));
        if prev != s {
            tracing::debug!(from = %prev, to = %s, "session state");
        }
    }
}
