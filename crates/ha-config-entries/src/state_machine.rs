//! Config entry state machine
//!
//! ```text
//! NotLoaded → SetupInProgress → Loaded
//!                             ↘ SetupError → SetupInProgress (manual retry)
//!
//! Loaded/SetupError → UnloadInProgress → NotLoaded
//!                                      ↘ FailedUnload (terminal)
//! ```
//!
//! There is no automatic retry state: a failed setup stays in `SetupError`
//! until the host asks for setup again.

use crate::entry::ConfigEntryState;
use thiserror::Error;

/// Error when an invalid state transition is attempted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid state transition from {from:?} to {to:?}: {reason}")]
pub struct InvalidTransition {
    pub from: ConfigEntryState,
    pub to: ConfigEntryState,
    pub reason: &'static str,
}

impl ConfigEntryState {
    /// Attempt a transition to a new state
    pub fn try_transition(
        self,
        to: ConfigEntryState,
    ) -> Result<ConfigEntryState, InvalidTransition> {
        use ConfigEntryState::*;

        let valid = matches!(
            (self, to),
            (NotLoaded | SetupError, SetupInProgress)
                | (SetupInProgress, Loaded | SetupError)
                | (Loaded | SetupError, UnloadInProgress)
                | (UnloadInProgress, NotLoaded | FailedUnload)
        );

        if valid {
            Ok(to)
        } else {
            Err(InvalidTransition {
                from: self,
                to,
                reason: Self::rejection_reason(self, to),
            })
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition_to(self, to: ConfigEntryState) -> bool {
        self.try_transition(to).is_ok()
    }

    fn rejection_reason(from: ConfigEntryState, to: ConfigEntryState) -> &'static str {
        use ConfigEntryState::*;

        match (from, to) {
            (FailedUnload, _) => "FailedUnload is terminal",
            (SetupInProgress, NotLoaded) => "setup in progress must finish first",
            (UnloadInProgress, Loaded) => "unload in progress cannot go back to Loaded",
            (NotLoaded, Loaded | SetupError) => "setup must go through SetupInProgress",
            (Loaded, NotLoaded) => "unload must go through UnloadInProgress",
            (Loaded, SetupInProgress) => "already loaded, unload first",
            _ => "invalid state transition",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConfigEntryState::*;

    #[test]
    fn test_setup_success_path() {
        let state = NotLoaded
            .try_transition(SetupInProgress)
            .and_then(|s| s.try_transition(Loaded))
            .and_then(|s| s.try_transition(UnloadInProgress))
            .and_then(|s| s.try_transition(NotLoaded));
        assert_eq!(state, Ok(NotLoaded));
    }

    #[test]
    fn test_setup_error_can_be_retried_or_unloaded() {
        assert!(SetupInProgress.can_transition_to(SetupError));
        assert!(SetupError.can_transition_to(SetupInProgress));
        assert!(SetupError.can_transition_to(UnloadInProgress));
    }

    #[test]
    fn test_unload_can_fail() {
        assert!(UnloadInProgress.can_transition_to(FailedUnload));
    }

    #[test]
    fn test_shortcuts_rejected() {
        let err = NotLoaded.try_transition(Loaded).unwrap_err();
        assert_eq!(err.from, NotLoaded);
        assert_eq!(err.to, Loaded);

        assert!(!Loaded.can_transition_to(NotLoaded));
        assert!(!Loaded.can_transition_to(SetupInProgress));
        assert!(!SetupInProgress.can_transition_to(NotLoaded));
        assert!(!UnloadInProgress.can_transition_to(Loaded));
    }

    #[test]
    fn test_failed_unload_is_terminal() {
        for to in [
            NotLoaded,
            SetupInProgress,
            Loaded,
            SetupError,
            UnloadInProgress,
        ] {
            let err = FailedUnload.try_transition(to).unwrap_err();
            assert!(err.reason.contains("terminal"));
        }
    }

    #[test]
    fn test_error_display() {
        let msg = Loaded.try_transition(NotLoaded).unwrap_err().to_string();
        assert!(msg.contains("Loaded"));
        assert!(msg.contains("UnloadInProgress"));
    }
}
