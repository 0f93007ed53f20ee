//! Herd tick driver
//!
//! Owns every live agent as a hecs entity and advances them once per frame.
//! Agents never see each other: each tick is independent, in spawn order.

use glam::Vec3;
use hecs::Entity;

use super::config::{AgentConfig, ConfigError, HerdConfig};
use super::events::{AgentEvent, EventQueue};
use crate::ai::Agent;
use crate::ecs::Name;

/// Anything whose position the agents treat as the viewer.
///
/// Queried once per herd tick.
pub trait Viewer {
    /// Current world-space position
    fn position(&self) -> Vec3;
}

impl Viewer for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// A set of agents sharing one world and one event queue
pub struct Herd {
    /// Agents, with a [`Name`] next to each
    world: hecs::World,
    /// Live agents in spawn order
    handles: Vec<Entity>,
    /// Outbound notifications
    events: EventQueue,
    /// Base seed for agents spawned from config
    seed: u64,
    /// Completed ticks
    frame: u64,
}

impl Herd {
    /// Create an empty herd
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            world: hecs::World::new(),
            handles: Vec::new(),
            events: EventQueue::new(),
            seed,
            frame: 0,
        }
    }

    /// Validate `config` and spawn every agent in it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] without spawning anything if the
    /// config does not validate.
    pub fn from_config(config: &HerdConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut herd = Self::new(config.seed);
        for (index, agent) in config.agents.iter().enumerate() {
            herd.spawn(agent.build(config.agent_seed(index)));
        }
        log::info!("Herd '{}' loaded with {} agents", config.name, herd.len());
        Ok(herd)
    }

    /// Start `agent` and add it to the herd
    pub fn spawn(&mut self, mut agent: Agent) -> Entity {
        agent.start();
        log::info!(
            "Spawned {} ({}) at {}",
            agent.name(),
            agent.model(),
            agent.position()
        );

        let name = Name::new(agent.name());
        let entity = self.world.spawn((name, agent));
        self.collect(entity);
        self.handles.push(entity);
        entity
    }

    /// Validate and spawn one configured agent.
    ///
    /// Seeded from the herd seed and spawn index unless the config has its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config does not validate or
    /// the name is already taken.
    pub fn spawn_config(&mut self, config: &AgentConfig) -> Result<Entity, ConfigError> {
        config.validate()?;
        if self.find(&config.name).is_some() {
            return Err(ConfigError::Invalid(format!(
                "duplicate agent name '{}'",
                config.name
            )));
        }

        let seed = self.seed.wrapping_add(self.handles.len() as u64);
        Ok(self.spawn(config.build(seed)))
    }

    /// Remove an agent. Returns whether it was present.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.world.despawn(entity).is_err() {
            return false;
        }
        self.handles.retain(|&handle| handle != entity);
        log::info!("Despawned {entity:?}");
        true
    }

    /// Find an agent by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Entity> {
        self.handles.iter().copied().find(|&entity| {
            self.world
                .get::<&Name>(entity)
                .is_ok_and(|found| found.as_str() == name)
        })
    }

    /// Borrow an agent
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<hecs::Ref<'_, Agent>> {
        self.world.get::<&Agent>(entity).ok()
    }

    /// Mutably borrow an agent
    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, Agent>> {
        self.world.get::<&mut Agent>(entity).ok()
    }

    /// Deliver a click to an agent. Returns whether it started attacking.
    ///
    /// Resulting events are published with the next tick.
    pub fn click(&mut self, entity: Entity) -> bool {
        let attacked = match self.world.get::<&mut Agent>(entity) {
            Ok(mut agent) => agent.on_click(),
            Err(_) => return false,
        };
        self.collect(entity);
        attacked
    }

    /// Advance every agent by `dt` seconds, then publish this tick's events.
    pub fn tick(&mut self, dt: f32, viewer: &impl Viewer) {
        let viewer = viewer.position();

        for &entity in &self.handles {
            let Ok(mut agent) = self.world.get::<&mut Agent>(entity) else {
                continue;
            };
            agent.tick(dt, viewer);
            for kind in agent.drain_notices() {
                self.events.push(entity, kind);
            }
        }

        self.events.swap();
        self.frame += 1;
    }

    /// Move an agent's pending notices into the event queue
    fn collect(&mut self, entity: Entity) {
        if let Ok(mut agent) = self.world.get::<&mut Agent>(entity) {
            for kind in agent.drain_notices() {
                self.events.push(entity, kind);
            }
        }
    }

    /// Events from the last tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take the events from the last tick
    pub fn drain_events(&mut self) -> impl Iterator<Item = AgentEvent> + '_ {
        self.events.drain()
    }

    /// Live agents in spawn order
    #[must_use]
    pub fn handles(&self) -> &[Entity] {
        &self.handles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of completed ticks
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for Herd {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for Herd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Herd")
            .field("agents", &self.handles.len())
            .field("frame", &self.frame)
            .field("events", &self.events.len())
            .finish()
    }
}
