//! Transport state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of the playback surface.
///
/// ```text
/// Idle -> Loading -> Ready -> Playing <-> Paused
///                               |            |
///                               v            v
///                             Ended        Ended
/// ```
///
/// `Error` is reachable from `Loading`, `Playing`, and `Paused`. Any state
/// may return to `Idle` (close) or `Loading` (a new item was assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error,
}

impl TransportState {
    /// Whether a byte source may currently be held by the engine.
    pub fn holds_source(self) -> bool {
        matches!(
            self,
            TransportState::Ready | TransportState::Playing | TransportState::Paused
        )
    }

    /// Legal direct transitions.
    pub fn can_transition_to(self, next: TransportState) -> bool {
        use TransportState::*;
        // Close and re-load are legal from everywhere.
        if next == Idle || next == Loading {
            return true;
        }
        matches!(
            (self, next),
            (Loading, Ready)
                | (Loading, Error)
                | (Ready, Playing)
                | (Playing, Paused)
                | (Playing, Ended)
                | (Playing, Error)
                | (Paused, Playing)
                | (Paused, Ended)
                | (Paused, Error)
        )
    }
}
