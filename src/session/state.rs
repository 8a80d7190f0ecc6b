//! Session lifecycle phases.

use serde::{Deserialize, Serialize};

/// Where a session is in its lifecycle.
///
/// Derived from the session's `active` / `complete` flags:
/// Inactive → InProgress → Complete, with `reset` returning to Inactive
/// from anywhere and `begin` restarting at InProgress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Inactive,
    InProgress,
    Complete,
}

impl SessionPhase {
    pub fn from_flags(active: bool, complete: bool) -> Self {
        match (active, complete) {
            (_, true) => Self::Complete,
            (true, false) => Self::InProgress,
            (false, false) => Self::Inactive,
        }
    }

    /// Whether the visitor can still answer questions.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inactive => "inactive",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_from_flags() {
        assert_eq!(SessionPhase::from_flags(false, false), SessionPhase::Inactive);
        assert_eq!(SessionPhase::from_flags(true, false), SessionPhase::InProgress);
        assert_eq!(SessionPhase::from_flags(true, true), SessionPhase::Complete);
        // Finalizing a session that never started still counts as complete.
        assert_eq!(SessionPhase::from_flags(false, true), SessionPhase::Complete);
    }

    #[test]
    fn only_in_progress_accepts_answers() {
        assert!(SessionPhase::InProgress.accepts_answers());
        assert!(!SessionPhase::Inactive.accepts_answers());
        assert!(!SessionPhase::Complete.accepts_answers());
        assert!(SessionPhase::Complete.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        for phase in [
            SessionPhase::Inactive,
            SessionPhase::InProgress,
            SessionPhase::Complete,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json, "mismatch for {phase:?}");
        }
    }
}
