//! Live session lifecycle.
//!
//! ```text
//! Connecting → Open → SetupSent → Ready → Closing → Closed
//!      └──────────┴────────┴─────────┴────────┴──→ Errored
//! ```
//!
//! `Closed` and `Errored` are absorbing.

use std::fmt;

/// Lifecycle state of a [`LiveSession`](crate::LiveSession).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Socket requested.
    Connecting,
    /// Socket open, setup not yet sent.
    Open,
    /// `setup` sent, awaiting `setupComplete`.
    SetupSent,
    /// Messages may flow in both directions.
    Ready,
    /// Caller requested close.
    Closing,
    /// Socket closed cleanly.
    Closed,
    /// Unrecoverable failure; only a new session can continue.
    Errored,
}

impl SessionState {
    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }

    /// Whether `next` is a legal successor.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::{Closed, Closing, Connecting, Errored, Open, Ready, SetupSent};
        match (self, next) {
            (Closed | Errored, _) => false,
            (_, Errored)
            | (Connecting, Open)
            | (Open, SetupSent)
            | (SetupSent, Ready)
            | (Connecting | Open | SetupSent | Ready, Closing)
            | (Closing | Ready, Closed) => true,
            _ => false,
        }
    }

    /// Lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::SetupSent => "setup_sent",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
