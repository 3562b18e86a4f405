//! Per-target state machine states.

use crate::Error;

/// Target operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetState {
    /// Looking up the platform identifier for the configured name.
    #[default]
    ResolvingId,
    /// Waiting for the channel to go live.
    Polling,
    /// A live session was detected; preparing to capture.
    LiveTransitioning,
    /// The capture subprocess is running.
    Recording,
    /// Moving the finished capture to the archived-raw root.
    Relocating,
    /// Running the repair subprocess over the archived-raw file.
    Repairing,
}

impl TargetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolvingId => "resolving-id",
            Self::Polling => "polling",
            Self::LiveTransitioning => "live-transitioning",
            Self::Recording => "recording",
            Self::Relocating => "relocating",
            Self::Repairing => "repairing",
        }
    }

    /// Whether a finished capture is being moved or repaired.
    pub fn is_archiving(&self) -> bool {
        matches!(self, Self::Relocating | Self::Repairing)
    }

    /// Validate a state transition.
    pub fn can_transition_to(&self, target: TargetState) -> bool {
        use TargetState::*;

        matches!(
            (self, target),
            (ResolvingId, ResolvingId | Polling)
                | (Polling, Polling | LiveTransitioning)
                | (LiveTransitioning, Recording)
                // capture could not be started
                | (Recording, Relocating | Polling)
                | (Relocating, Repairing | Polling)
                | (Repairing, Polling)
        )
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&self, target: TargetState) -> Result<TargetState, Error> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(Error::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle_transitions() {
        let cycle = [
            TargetState::ResolvingId,
            TargetState::Polling,
            TargetState::LiveTransitioning,
            TargetState::Recording,
            TargetState::Relocating,
            TargetState::Repairing,
            TargetState::Polling,
        ];
        for pair in cycle.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_invalid_transitions() {
        // a second capture can never start before the first is relocated
        assert!(!TargetState::Recording.can_transition_to(TargetState::Recording));
        assert!(!TargetState::Recording.can_transition_to(TargetState::LiveTransitioning));
        assert!(!TargetState::Polling.can_transition_to(TargetState::Recording));
        assert!(!TargetState::Polling.can_transition_to(TargetState::ResolvingId));
        assert!(!TargetState::Repairing.can_transition_to(TargetState::Repairing));
    }

    #[test]
    fn test_transition_to_error() {
        let result = TargetState::Polling.transition_to(TargetState::Repairing);
        assert!(matches!(
            result,
            Err(Error::InvalidStateTransition { ref from, ref to })
                if from == "polling" && to == "repairing"
        ));
    }

    #[test]
    fn test_is_archiving() {
        assert!(!TargetState::Polling.is_archiving());
        assert!(!TargetState::Recording.is_archiving());
        assert!(TargetState::Relocating.is_archiving());
        assert!(TargetState::Repairing.is_archiving());
    }
}
