//! Behavior Agent
//!
//! One autonomous character: a [`StateMachine`] over [`Activity`] plus the
//! per-agent data its state actions and guards work on. The agent is driven
//! from outside, once per frame, through [`Agent::tick`].
//!
//! # Design Principles
//!
//! - **Owned State**: everything the actions touch lives in one
//!   [`AgentContext`] passed by reference, never in shared globals
//! - **Pure Guards**: guards only read the context; the entry action does
//!   all mutation and only runs once the transition has committed
//! - **Threat First**: the proximity check runs before anything else in a
//!   tick and pre-empts whatever the agent was doing
//!
//! # Example
//!
//! ```ignore
//! let mut rabbit = Agent::new("rabbit", "rabbit.glb", ClipSet::default(), Transform::default())
//!     .with_seed(7);
//! rabbit.set_waypoints(vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 2.0)]);
//! rabbit.start();
//!
//! loop {
//!     rabbit.tick(dt, camera_position);
//! }
//! ```

use std::fmt;

use glam::Vec3;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

use super::activity::{self, Activity};
use super::fsm::{StateMachine, TransitionError};
use super::navigator::{Navigator, Traversal};
use crate::animation::{ClipController, ClipDuration, ClipId, ClipSet};
use crate::core::EventKind;
use crate::ecs::Transform;

// ============================================================================
// Parameters
// ============================================================================

/// Default walking speed in units per second
pub const DEFAULT_WALK_SPEED: f32 = 1.5;
/// Default running speed in units per second
pub const DEFAULT_RUN_SPEED: f32 = 4.0;
/// Default personal space, as a squared distance
pub const DEFAULT_PERSONAL_SPACE: f32 = 4.0;
/// Default nominal idle clip duration in seconds
pub const DEFAULT_IDLE_DURATION: f32 = 8.0;
/// Default nominal attack clip duration in seconds
pub const DEFAULT_ATTACK_DURATION: f32 = 5.0;
/// Default decision list, biased towards idling
pub const DEFAULT_NEXT_STATES: [Activity; 4] = [
    Activity::Idle,
    Activity::Idle,
    Activity::Walking,
    Activity::Running,
];

/// Tunable movement and timing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct AgentParams {
    /// Walking speed in units per second
    pub walk_speed: f32,
    /// Running speed in units per second
    pub run_speed: f32,
    /// Squared distance below which the viewer is a threat
    pub personal_space: f32,
    /// Nominal idle clip duration in seconds
    pub idle_duration: f32,
    /// Nominal attack clip duration in seconds
    pub attack_duration: f32,
    /// Candidates drawn uniformly when thinking; repeats act as weights
    pub next_states: SmallVec<[Activity; 8]>,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            walk_speed: DEFAULT_WALK_SPEED,
            run_speed: DEFAULT_RUN_SPEED,
            personal_space: DEFAULT_PERSONAL_SPACE,
            idle_duration: DEFAULT_IDLE_DURATION,
            attack_duration: DEFAULT_ATTACK_DURATION,
            next_states: SmallVec::from_slice(&DEFAULT_NEXT_STATES),
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Relative slack on arrival, absorbing rounding in `f32` frame steps
const ARRIVAL_TOLERANCE: f64 = 1e-6;

/// Straight-line trip between two points at constant speed
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Movement {
    /// Where the trip started
    pub origin: Vec3,
    /// Where the trip ends
    pub destination: Vec3,
    /// Total length of the trip
    pub distance: f32,
    /// Length covered so far, never more than `distance`
    pub traveled: f32,
    /// `traveled / distance`
    pub fraction: f32,
    /// Units per second
    pub speed: f32,
    /// Whether the agent is moving along this trip
    pub in_transit: bool,
    /// Whether the destination has been reached
    pub arrived: bool,
    /// Distance covered, summed in double precision
    covered: f64,
}

impl Movement {
    /// Begin a trip from `origin` to `destination`
    #[must_use]
    pub fn towards(origin: Vec3, destination: Vec3, speed: f32) -> Self {
        Self {
            origin,
            destination,
            distance: origin.distance(destination),
            traveled: 0.0,
            fraction: 0.0,
            speed,
            in_transit: true,
            arrived: false,
            covered: 0.0,
        }
    }

    /// Cover `speed * dt` more of the trip and return the new position.
    ///
    /// The step that reaches the end lands exactly on the destination. A trip
    /// of `distance / (speed * dt)` steps arrives on step `ceil` of that, even
    /// when the steps do not sum exactly in floating point.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.covered += f64::from(self.speed) * f64::from(dt);
        self.traveled = self.covered as f32;

        let distance = f64::from(self.distance);
        if self.covered >= distance - distance * ARRIVAL_TOLERANCE {
            self.traveled = self.distance;
            self.fraction = 1.0;
            self.arrived = true;
            return self.destination;
        }

        self.fraction = self.traveled / self.distance;
        self.origin.lerp(self.destination, self.fraction)
    }
}

// ============================================================================
// Agent Context
// ============================================================================

/// Everything an agent's state actions and guards operate on.
pub struct AgentContext {
    /// Display name
    pub name: String,
    /// Opaque model reference, handed to the renderer
    pub model: String,
    /// Position, heading and scale; owned exclusively by this agent
    pub transform: Transform,
    /// Tunables
    pub params: AgentParams,
    /// Waypoints and cursor
    pub navigator: Navigator,
    /// Clip lifecycle
    pub clips: ClipController,
    /// Current trip, if any
    pub movement: Movement,
    /// Set when the viewer got too close; cleared on arrival
    pub too_close: bool,
    /// Cleared for good once the agent attacks
    pub friendly: bool,
    /// Source for idle clip and decision draws
    pub rng: Box<dyn RngCore + Send + Sync>,
    /// Events not yet collected by the owner
    notices: Vec<EventKind>,
}

impl AgentContext {
    fn notify(&mut self, kind: EventKind) {
        self.notices.push(kind);
    }

    fn play(&mut self, id: ClipId, duration: ClipDuration) {
        self.stop_clip();
        if !self.clips.activate(id, duration) {
            log::warn!("{}: no clip {:?} to play", self.name, id);
            return;
        }
        if let Some(clip) = self.clips.active_clip() {
            log::debug!("{}: playing {}", self.name, clip.name);
            let clip = clip.name.clone();
            self.notify(EventKind::ClipActivated { clip });
        }
    }

    fn stop_clip(&mut self) {
        let Some(id) = self.clips.deactivate() else {
            return;
        };
        if let Some(clip) = self.clips.clips().get(id) {
            let clip = clip.name.clone();
            self.notify(EventKind::ClipDeactivated { clip });
        }
    }

    fn begin_travel(&mut self, speed: f32, clip: ClipId) {
        let origin = self.transform.position;
        let destination = match self.navigator.next_destination(&mut self.rng) {
            Some(point) => point,
            None => {
                log::warn!("{}: no waypoints, heading for the origin", self.name);
                Vec3::ZERO
            }
        };

        self.transform.face_towards(destination);
        self.movement = Movement::towards(origin, destination, speed);
        log::debug!(
            "{}: travelling {:.2} from {} to {}",
            self.name,
            self.movement.distance,
            origin,
            destination
        );

        self.play(clip, ClipDuration::Unbounded);
    }

    fn travel(&mut self, dt: f32) {
        self.transform.position = self.movement.advance(dt);
        self.clips.tick(dt);
        log::trace!(
            "{}: at {} ({:.0}%)",
            self.name,
            self.transform.position,
            self.movement.fraction * 100.0
        );

        if self.movement.arrived {
            let position = self.transform.position;
            log::debug!("{}: arrived at {}", self.name, position);
            self.notify(EventKind::Arrived { position });
        }
    }
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("name", &self.name)
            .field("position", &self.transform.position)
            .field("in_transit", &self.movement.in_transit)
            .field("too_close", &self.too_close)
            .field("clip", &self.clips.active())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// State Actions
// ============================================================================

type AgentFsm = StateMachine<Activity, AgentContext>;

fn enter_idle(_fsm: &mut AgentFsm, ctx: &mut AgentContext) {
    let index = ctx.rng.gen_range(0..ctx.clips.clips().idle_count());
    let duration = ClipDuration::Fixed(ctx.params.idle_duration);
    ctx.play(ClipId::Idle(index), duration);
}

fn enter_thinking(fsm: &mut AgentFsm, ctx: &mut AgentContext) {
    ctx.movement.in_transit = false;
    ctx.stop_clip();

    let next = match ctx.params.next_states.len() {
        0 => Activity::Idle,
        len => ctx.params.next_states[ctx.rng.gen_range(0..len)],
    };

    if let Err(err) = fsm.try_transition(next, ctx) {
        log::warn!("{}: {}", ctx.name, err);
    }
}

fn enter_walking(_fsm: &mut AgentFsm, ctx: &mut AgentContext) {
    let speed = ctx.params.walk_speed;
    ctx.begin_travel(speed, ClipId::Walk);
}

fn enter_running(_fsm: &mut AgentFsm, ctx: &mut AgentContext) {
    let speed = ctx.params.run_speed;
    ctx.begin_travel(speed, ClipId::Run);
}

fn enter_attacking(_fsm: &mut AgentFsm, ctx: &mut AgentContext) {
    ctx.movement.in_transit = false;
    ctx.friendly = false;
    let duration = ClipDuration::Fixed(ctx.params.attack_duration);
    ctx.play(ClipId::Attack, duration);
}

fn has_waypoints(ctx: &AgentContext) -> bool {
    !ctx.navigator.is_empty()
}

/// Register `enter` as the action for `state`, reporting the change first.
fn wire(fsm: &mut AgentFsm, state: Activity, enter: fn(&mut AgentFsm, &mut AgentContext)) {
    fsm.on(state, move |fsm, ctx, prior| {
        log::debug!("{}: {} -> {}", ctx.name, prior, state);
        ctx.notify(EventKind::ActivityChanged { from: prior, to: state });
        enter(fsm, ctx);
    });
}

fn build_fsm() -> AgentFsm {
    let mut fsm = StateMachine::new(Activity::Idle, activity::transition_table());

    wire(&mut fsm, Activity::Idle, enter_idle);
    wire(&mut fsm, Activity::Thinking, enter_thinking);
    wire(&mut fsm, Activity::Walking, enter_walking);
    wire(&mut fsm, Activity::Running, enter_running);
    wire(&mut fsm, Activity::Attacking, enter_attacking);

    fsm.guard(Activity::Walking, has_waypoints);
    fsm.guard(Activity::Running, has_waypoints);
    fsm
}

// ============================================================================
// Agent
// ============================================================================

/// An autonomous character with a behavior state machine.
#[derive(Debug)]
pub struct Agent {
    fsm: AgentFsm,
    ctx: AgentContext,
}

impl Agent {
    /// Create an idle agent with default parameters and no waypoints.
    ///
    /// The agent draws from a fixed-seed generator until
    /// [`with_seed`](Self::with_seed) or [`with_rng`](Self::with_rng)
    /// replaces it.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        clips: ClipSet,
        transform: Transform,
    ) -> Self {
        Self {
            fsm: build_fsm(),
            ctx: AgentContext {
                name: name.into(),
                model: model.into(),
                transform,
                params: AgentParams::default(),
                navigator: Navigator::default(),
                clips: ClipController::new(clips),
                movement: Movement::default(),
                too_close: false,
                friendly: false,
                rng: Box::new(ChaCha8Rng::seed_from_u64(0)),
                notices: Vec::new(),
            },
        }
    }

    /// Seed a deterministic generator
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Replace the random source
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.ctx.rng = Box::new(rng);
        self
    }

    /// Replace the tunables
    #[must_use]
    pub fn with_params(mut self, params: AgentParams) -> Self {
        self.ctx.params = params;
        self
    }

    /// Replace the waypoint list.
    ///
    /// Also re-arms the threat check: a flight vetoed for lack of waypoints
    /// never arrives, so nothing else would clear it.
    pub fn set_waypoints(&mut self, waypoints: Vec<Vec3>) {
        self.ctx.navigator.set_waypoints(waypoints);
        self.ctx.too_close = false;
    }

    /// Set the waypoint traversal order
    pub fn set_traversal(&mut self, traversal: Traversal) {
        self.ctx.navigator.set_traversal(traversal);
    }

    /// Replace the decision list
    pub fn set_next_states(&mut self, states: &[Activity]) {
        self.ctx.params.next_states = SmallVec::from_slice(states);
    }

    /// Set whether the agent is friendly
    pub fn set_friendly(&mut self, friendly: bool) {
        self.ctx.friendly = friendly;
    }

    /// Mutable access to the tunables
    pub fn params_mut(&mut self) -> &mut AgentParams {
        &mut self.ctx.params
    }

    /// Enter the initial Idle state. Called by the first tick if needed.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
    }

    /// Advance the agent by `dt` seconds with the viewer at `viewer`.
    ///
    /// In order, the first that applies:
    /// 1. the viewer just came inside personal space: flee
    /// 2. travelling: move, or re-think if the last step arrived
    /// 3. a timed clip is playing: advance it, re-think when it ends
    /// 4. nothing going on: re-think
    pub fn tick(&mut self, dt: f32, viewer: Vec3) {
        self.start();

        let threatened =
            self.ctx.transform.position.distance_squared(viewer) < self.ctx.params.personal_space;

        if threatened && !self.ctx.too_close {
            log::warn!("{}: viewer too close, running", self.ctx.name);
            self.ctx.too_close = true;
            self.ctx.movement.in_transit = false;
            self.ctx.stop_clip();
            self.ctx.notify(EventKind::Threatened { viewer });
            self.request_logged(Activity::Running);
        } else if self.ctx.movement.in_transit {
            if self.ctx.movement.arrived {
                self.ctx.too_close = false;
                self.request_logged(Activity::Thinking);
            } else {
                self.ctx.travel(dt);
            }
        } else if self.ctx.clips.is_animating() {
            if self.ctx.clips.tick(dt) && !self.fsm.is_in(Activity::Thinking) {
                self.request_logged(Activity::Thinking);
            }
        } else {
            log::trace!("{}: nothing to do, thinking again", self.ctx.name);
            self.request_logged(Activity::Thinking);
        }
    }

    /// React to the agent being clicked.
    ///
    /// Returns whether the agent started attacking.
    pub fn on_click(&mut self) -> bool {
        self.start();
        self.ctx.notify(EventKind::Clicked);
        self.request_logged(Activity::Attacking)
    }

    /// Request a transition, returning whether it committed
    pub fn request(&mut self, to: Activity) -> bool {
        self.fsm.request_transition(to, &mut self.ctx)
    }

    /// Request a transition, returning the prior activity on commit
    ///
    /// # Errors
    ///
    /// Returns why the transition was rejected; the agent is unchanged.
    pub fn try_request(&mut self, to: Activity) -> Result<Activity, TransitionError<Activity>> {
        self.fsm.try_transition(to, &mut self.ctx)
    }

    fn request_logged(&mut self, to: Activity) -> bool {
        match self.fsm.try_transition(to, &mut self.ctx) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("{}: {}", self.ctx.name, err);
                false
            }
        }
    }

    /// Take the events reported since the last call
    pub fn drain_notices(&mut self) -> impl Iterator<Item = EventKind> + '_ {
        self.ctx.notices.drain(..)
    }

    /// Get the display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    /// Get the model reference
    #[must_use]
    pub fn model(&self) -> &str {
        &self.ctx.model
    }

    /// Current activity
    #[must_use]
    pub fn activity(&self) -> Activity {
        self.fsm.current_state()
    }

    /// Check if the agent is in `activity`
    #[must_use]
    pub fn is_in(&self, activity: Activity) -> bool {
        self.fsm.is_in(activity)
    }

    /// Get the transform
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.ctx.transform
    }

    /// Get the world-space position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.ctx.transform.position
    }

    /// Current or last trip
    #[must_use]
    pub fn movement(&self) -> &Movement {
        &self.ctx.movement
    }

    /// Check if the agent is travelling
    #[must_use]
    pub fn in_transit(&self) -> bool {
        self.ctx.movement.in_transit
    }

    /// Get the clip controller
    #[must_use]
    pub fn clips(&self) -> &ClipController {
        &self.ctx.clips
    }

    /// Get the waypoint navigator
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.ctx.navigator
    }

    /// Get the tunables
    #[must_use]
    pub fn params(&self) -> &AgentParams {
        &self.ctx.params
    }

    /// Check if a threat was noticed and not yet cleared by arrival or new waypoints
    #[must_use]
    pub fn is_too_close(&self) -> bool {
        self.ctx.too_close
    }

    /// Check if the agent is friendly
    #[must_use]
    pub fn is_friendly(&self) -> bool {
        self.ctx.friendly
    }

    /// Number of committed transitions so far
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.fsm.committed_count()
    }
}

// ============================================================================
// Tests
// ============================================================================
