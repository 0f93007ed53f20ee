//! Guarded Finite State Machine
//!
//! A generic, table-driven state machine for AI agent behavior. Unlike a
//! state-object machine, the states here are plain identifiers (usually a
//! fieldless enum) and all behavior lives in callbacks registered per state.
//!
//! # Model
//!
//! - **Transition table**: the set of legal `from -> to` edges, declared once
//!   (with optional wildcards) and frozen when handed to the machine.
//! - **Guards**: at most one pure predicate per destination state. A guard
//!   runs after the edge is found legal and may veto the transition.
//! - **Actions**: at most one callback per state, invoked exactly once per
//!   committed transition into that state, with the prior state.
//!
//! Actions receive the machine itself, so an action may request a follow-up
//! transition (a "decision" state forwarding somewhere else). Nesting is
//! bounded by [`StateMachine::MAX_DEPTH`].
//!
//! # Example
//!
//! ```ignore
//! let table = TransitionTable::new()
//!     .with(Mood::Calm, Mood::Angry)
//!     .with(Endpoint::Any, Mood::Calm);
//!
//! let mut fsm = StateMachine::new(Mood::Calm, table);
//! fsm.on(Mood::Angry, |_fsm, ctx: &mut Stats, _prior| ctx.outbursts += 1);
//! fsm.guard(Mood::Angry, |ctx: &Stats| ctx.patience == 0);
//!
//! let committed = fsm.request_transition(Mood::Angry, &mut stats);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

// ============================================================================
// State Identifiers
// ============================================================================

/// A closed set of state identifiers.
///
/// `ALL` lists every member; wildcard edges expand over it.
pub trait StateId: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every state in the set.
    const ALL: &'static [Self];

    /// State name for debugging and logging.
    fn name(&self) -> &'static str;
}

/// One end of a declared edge: a concrete state or the wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<S> {
    /// Every state, including the other end of the edge.
    Any,
    /// A single state.
    State(S),
}

impl<S: StateId> Endpoint<S> {
    fn expand(self) -> Vec<S> {
        match self {
            Self::Any => S::ALL.to_vec(),
            Self::State(state) => vec![state],
        }
    }
}

impl<S: StateId> From<S> for Endpoint<S> {
    fn from(state: S) -> Self {
        Self::State(state)
    }
}

// ============================================================================
// Transition Table
// ============================================================================

/// The set of legal transitions.
///
/// Wildcards are expanded into concrete edges at declaration time, so a
/// legality check is a single set lookup.
#[derive(Debug, Clone)]
pub struct TransitionTable<S: StateId> {
    edges: FxHashSet<(S, S)>,
}

impl<S: StateId> TransitionTable<S> {
    /// Create an empty table (no transition is legal).
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges: FxHashSet::default(),
        }
    }

    /// Declare a legal edge. Either end may be [`Endpoint::Any`].
    pub fn declare(
        &mut self,
        from: impl Into<Endpoint<S>>,
        to: impl Into<Endpoint<S>>,
    ) -> &mut Self {
        let targets = to.into().expand();
        for source in from.into().expand() {
            for &target in &targets {
                self.edges.insert((source, target));
            }
        }
        self
    }

    /// Builder form of [`declare`](Self::declare).
    #[must_use]
    pub fn with(mut self, from: impl Into<Endpoint<S>>, to: impl Into<Endpoint<S>>) -> Self {
        self.declare(from, to);
        self
    }

    /// Check whether `from -> to` is a declared edge.
    #[must_use]
    pub fn allows(&self, from: S, to: S) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Number of concrete edges after wildcard expansion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if no edge has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<S: StateId> Default for TransitionTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why a requested transition was not committed.
///
/// In every case the machine's state is unchanged and no action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError<S> {
    /// No declared edge covers `from -> to`.
    Illegal {
        /// State the machine was in
        from: S,
        /// Requested state
        to: S,
    },
    /// The edge is legal but the guard for `to` rejected it.
    Vetoed {
        /// Requested state
        to: S,
    },
    /// Too many transitions requested from inside nested actions.
    TooDeep {
        /// Requested state
        to: S,
    },
}

impl<S: fmt::Debug> fmt::Display for TransitionError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Illegal { from, to } => write!(f, "illegal transition {from:?} -> {to:?}"),
            Self::Vetoed { to } => write!(f, "transition to {to:?} vetoed by guard"),
            Self::TooDeep { to } => write!(f, "transition to {to:?} exceeds nesting limit"),
        }
    }
}

impl<S: fmt::Debug> std::error::Error for TransitionError<S> {}

// ============================================================================
// State Machine
// ============================================================================

/// Callback run when a transition into its state commits.
///
/// Arguments: the machine (for follow-up requests), the context, and the
/// state the machine was in before the transition.
pub type Action<S, Ctx> = Arc<dyn Fn(&mut StateMachine<S, Ctx>, &mut Ctx, S) + Send + Sync>;

/// Predicate that may veto a transition into its state. Guards only get
/// shared access to the context, so they cannot have side effects on it.
pub type Guard<Ctx> = Arc<dyn Fn(&Ctx) -> bool + Send + Sync>;

/// A guarded state machine over the state set `S`.
///
/// # Type Parameters
///
/// - `S`: state identifiers
/// - `Ctx`: context passed to actions and guards (e.g. the agent's data)
pub struct StateMachine<S: StateId, Ctx> {
    /// Current state
    current: S,
    /// Legal edges, immutable after construction
    table: TransitionTable<S>,
    /// Entry action per state
    actions: FxHashMap<S, Action<S, Ctx>>,
    /// Entry guard per destination state
    guards: FxHashMap<S, Guard<Ctx>>,
    /// Whether the current state's action has run
    entered: bool,
    /// Nesting level of actions currently executing
    depth: u32,
    /// Total committed transitions
    committed: u64,
}

impl<S: StateId, Ctx> StateMachine<S, Ctx> {
    /// Maximum nesting of transitions requested from inside actions.
    pub const MAX_DEPTH: u32 = 8;

    /// Create a machine in `initial` with a frozen transition table.
    ///
    /// The initial state's action does not run until [`start`](Self::start).
    #[must_use]
    pub fn new(initial: S, table: TransitionTable<S>) -> Self {
        Self {
            current: initial,
            table,
            actions: FxHashMap::default(),
            guards: FxHashMap::default(),
            entered: false,
            depth: 0,
            committed: 0,
        }
    }

    /// Register the entry action for `state`, replacing any previous one.
    pub fn on<F>(&mut self, state: S, action: F)
    where
        F: Fn(&mut Self, &mut Ctx, S) + Send + Sync + 'static,
    {
        self.actions.insert(state, Arc::new(action));
    }

    /// Register the entry guard for `state`, replacing any previous one.
    pub fn guard<F>(&mut self, state: S, guard: F)
    where
        F: Fn(&Ctx) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(state, Arc::new(guard));
    }

    /// Remove the guard for `state`, if any.
    pub fn clear_guard(&mut self, state: S) {
        self.guards.remove(&state);
    }

    /// Run the initial state's action once.
    ///
    /// No-op if it already ran or if a transition has already committed.
    pub fn start(&mut self, ctx: &mut Ctx) {
        if self.entered {
            return;
        }
        self.entered = true;
        let state = self.current;
        self.fire(state, state, ctx);
    }

    /// Check whether the current state has been entered.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.entered
    }

    /// Request a transition, returning whether it committed.
    pub fn request_transition(&mut self, to: S, ctx: &mut Ctx) -> bool {
        self.try_transition(to, ctx).is_ok()
    }

    /// Request a transition, returning the prior state on commit.
    ///
    /// Order: legality, nesting limit, guard. On success the state is set
    /// first, then the action for `to` runs synchronously.
    ///
    /// # Errors
    ///
    /// Returns the reason the transition was rejected; the machine is
    /// unchanged in that case.
    pub fn try_transition(&mut self, to: S, ctx: &mut Ctx) -> Result<S, TransitionError<S>> {
        let from = self.current;

        if !self.table.allows(from, to) {
            return Err(TransitionError::Illegal { from, to });
        }

        if self.depth >= Self::MAX_DEPTH {
            return Err(TransitionError::TooDeep { to });
        }

        if let Some(guard) = self.guards.get(&to)
            && !guard(ctx)
        {
            return Err(TransitionError::Vetoed { to });
        }

        self.current = to;
        self.entered = true;
        self.committed += 1;
        log::trace!("fsm: {} -> {}", from.name(), to.name());

        self.fire(to, from, ctx);
        Ok(from)
    }

    fn fire(&mut self, state: S, prior: S, ctx: &mut Ctx) {
        // Cloned out so the action can borrow the machine mutably.
        let Some(action) = self.actions.get(&state).cloned() else {
            return;
        };

        self.depth += 1;
        action(self, ctx, prior);
        self.depth -= 1;
    }

    /// Get the current state.
    #[must_use]
    pub fn current_state(&self) -> S {
        self.current
    }

    /// Check if the machine is in `state`.
    #[must_use]
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Get the transition table.
    #[must_use]
    pub fn table(&self) -> &TransitionTable<S> {
        &self.table
    }

    /// Total number of committed transitions.
    #[must_use]
    pub fn committed_count(&self) -> u64 {
        self.committed
    }
}

impl<S: StateId, Ctx> fmt::Debug for StateMachine<S, Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current.name())
            .field("edges", &self.table.len())
            .field("entered", &self.entered)
            .field("committed", &self.committed)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
