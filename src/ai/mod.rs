//! AI and navigation module
//!
//! Provides the guarded state machine, waypoint navigation, and the behavior
//! agent built from them.

mod activity;
mod agent;
mod fsm;
mod navigator;

pub use activity::{Activity, transition_table};
pub use agent::{
    Agent, AgentContext, AgentParams, DEFAULT_ATTACK_DURATION, DEFAULT_IDLE_DURATION,
    DEFAULT_NEXT_STATES, DEFAULT_PERSONAL_SPACE, DEFAULT_RUN_SPEED, DEFAULT_WALK_SPEED, Movement,
};
pub use fsm::{Action, Endpoint, Guard, StateId, StateMachine, TransitionError, TransitionTable};
pub use navigator::{Navigator, Traversal, choose_next};
