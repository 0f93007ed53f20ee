//! Agent activities and the legal transitions between them

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fsm::{Endpoint, StateId, TransitionTable};

/// What an agent is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Activity {
    /// Standing still, playing one of the idle clips
    #[default]
    Idle,
    /// Deciding what to do next; always forwards within the same step
    Thinking,
    /// Walking to the next waypoint
    Walking,
    /// Running to the next waypoint (also the flight response)
    Running,
    /// Playing the attack clip
    Attacking,
}

impl Activity {
    /// Check if this activity moves the agent between waypoints.
    #[must_use]
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Walking | Self::Running)
    }
}

impl StateId for Activity {
    const ALL: &'static [Self] = &[
        Activity::Idle,
        Activity::Thinking,
        Activity::Walking,
        Activity::Running,
        Activity::Attacking,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Thinking => "Thinking",
            Self::Walking => "Walking",
            Self::Running => "Running",
            Self::Attacking => "Attacking",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the agent transition table.
///
/// - Thinking may go anywhere, and anything may go back to Thinking.
/// - Anything may go to Running: fleeing skips the decision step.
/// - Anything may go to Attacking: a click is an external provocation.
#[must_use]
pub fn transition_table() -> TransitionTable<Activity> {
    TransitionTable::new()
        .with(Activity::Thinking, Endpoint::Any)
        .with(Endpoint::Any, Activity::Thinking)
        .with(Endpoint::Any, Activity::Running)
        .with(Endpoint::Any, Activity::Attacking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_default() {
        assert_eq!(Activity::default(), Activity::Idle);
    }

    #[test]
    fn test_activity_is_moving() {
        assert!(Activity::Walking.is_moving());
        assert!(Activity::Running.is_moving());
        assert!(!Activity::Idle.is_moving());
        assert!(!Activity::Attacking.is_moving());
    }

    #[test]
    fn test_thinking_reaches_everything() {
        let table = transition_table();
        for &to in Activity::ALL {
            assert!(table.allows(Activity::Thinking, to), "Thinking -> {to}");
        }
    }

    #[test]
    fn test_everything_reaches_thinking_and_running() {
        let table = transition_table();
        for &from in Activity::ALL {
            assert!(table.allows(from, Activity::Thinking), "{from} -> Thinking");
            assert!(table.allows(from, Activity::Running), "{from} -> Running");
            assert!(table.allows(from, Activity::Attacking), "{from} -> Attacking");
        }
    }

    #[test]
    fn test_idle_cannot_skip_decision() {
        let table = transition_table();
        assert!(!table.allows(Activity::Idle, Activity::Walking));
        assert!(!table.allows(Activity::Walking, Activity::Idle));
        assert!(!table.allows(Activity::Running, Activity::Walking));
        assert!(!table.allows(Activity::Idle, Activity::Idle));
    }

    #[test]
    fn test_table_size() {
        // every state into Thinking, Running and Attacking, plus Thinking -> Idle/Walking
        assert_eq!(transition_table().len(), 17);
    }

    #[test]
    fn test_activity_serde_ron() {
        let text = ron::to_string(&Activity::Walking).unwrap();
        assert_eq!(text, "Walking");
        let parsed: Activity = ron::from_str("Attacking").unwrap();
        assert_eq!(parsed, Activity::Attacking);
    }
}
