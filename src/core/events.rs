//! Agent event queue
//!
//! Agents report what happened to them during a tick (activity changes, clip
//! switches, arrivals, threats) and the herd forwards those reports here.
//! Consumers such as a renderer, a sound system or a log read them after
//! the frame boundary without holding a reference to any agent.
//!
//! # Design Principles
//!
//! - **Double Buffering**: events pushed during tick N are readable after
//!   tick N's swap, and stay readable until the next swap
//! - **No Subscriptions**: push and iterate, nothing else
//!
//! # Example
//!
//! ```ignore
//! herd.tick(dt, &viewer);
//! for event in herd.events().iter() {
//!     if let EventKind::ClipActivated { clip } = &event.kind {
//!         renderer.play(event.agent, clip);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::ai::Activity;

// ============================================================================
// Event Types
// ============================================================================

/// Something that happened to a single agent.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EventKind {
    /// A transition committed.
    ActivityChanged {
        /// State before the transition
        from: Activity,
        /// State after the transition
        to: Activity,
    },

    /// A clip started playing.
    ClipActivated {
        /// Full clip name as stored in the model
        clip: String,
    },

    /// A clip was silenced.
    ClipDeactivated {
        /// Full clip name as stored in the model
        clip: String,
    },

    /// The agent reached its destination.
    Arrived {
        /// Where it stopped
        position: Vec3,
    },

    /// The viewer came inside the agent's personal space.
    Threatened {
        /// Viewer position at the time
        viewer: Vec3,
    },

    /// The agent was clicked.
    Clicked,
}

/// An event tagged with the entity it happened to.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEvent {
    /// Agent entity in the herd's world
    pub agent: Entity,
    /// What happened
    pub kind: EventKind,
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered queue of agent events.
///
/// The herd pushes while ticking and swaps once the tick is done, so a
/// reader always sees one complete tick's worth of events.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<AgentEvent>,
    /// Events from the last completed tick
    processing: VecDeque<AgentEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event, readable after the next [`swap`](Self::swap).
    #[inline]
    pub fn push(&mut self, agent: Entity, kind: EventKind) {
        self.pending.push_back(AgentEvent { agent, kind });
    }

    /// Publish this tick's events, discarding the previous tick's.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over the last completed tick's events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AgentEvent> {
        self.processing.iter()
    }

    /// Events from the last completed tick concerning `agent`.
    pub fn for_agent(&self, agent: Entity) -> impl Iterator<Item = &EventKind> {
        self.processing
            .iter()
            .filter(move |event| event.agent == agent)
            .map(|event| &event.kind)
    }

    /// Take the last completed tick's events.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = AgentEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events written since the last swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything, published or not.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entities() -> (Entity, Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    #[test]
    fn test_event_queue_push_and_swap() {
        let (a, _) = two_entities();
        let mut queue = EventQueue::new();

        queue.push(a, EventKind::Clicked);
        assert!(queue.is_empty(), "events must not be visible before swap");
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        let event = queue.iter().next().unwrap();
        assert_eq!(event.agent, a);
        assert_eq!(event.kind, EventKind::Clicked);
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let (a, _) = two_entities();
        let mut queue = EventQueue::new();

        queue.push(a, EventKind::Arrived { position: Vec3::X });
        queue.swap();
        queue.push(a, EventKind::Arrived { position: Vec3::Y });

        let seen: Vec<_> = queue.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(seen, vec![EventKind::Arrived { position: Vec3::X }]);

        queue.swap();
        let seen: Vec<_> = queue.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(seen, vec![EventKind::Arrived { position: Vec3::Y }]);
    }

    #[test]
    fn test_event_queue_for_agent() {
        let (a, b) = two_entities();
        let mut queue = EventQueue::new();

        queue.push(a, EventKind::Clicked);
        queue.push(
            b,
            EventKind::ActivityChanged {
                from: Activity::Idle,
                to: Activity::Thinking,
            },
        );
        queue.push(a, EventKind::Threatened { viewer: Vec3::ZERO });
        queue.swap();

        assert_eq!(queue.for_agent(a).count(), 2);
        assert_eq!(queue.for_agent(b).count(), 1);
    }

    #[test]
    fn test_event_queue_drain_and_clear() {
        let (a, _) = two_entities();
        let mut queue = EventQueue::with_capacity(4);

        queue.push(a, EventKind::ClipActivated { clip: "walk".into() });
        queue.push(a, EventKind::ClipDeactivated { clip: "walk".into() });
        queue.swap();

        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());

        queue.push(a, EventKind::Clicked);
        queue.swap();
        queue.push(a, EventKind::Clicked);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }
}
