//! Herd configuration
//!
//! Describes a set of agents to spawn, saved and loaded as RON (pretty
//! printed) or JSON. Every field has a default, so a herd file only needs to
//! spell out what differs.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ai::{
    Activity, Agent, AgentParams, DEFAULT_ATTACK_DURATION, DEFAULT_IDLE_DURATION,
    DEFAULT_NEXT_STATES, DEFAULT_PERSONAL_SPACE, DEFAULT_RUN_SPEED, DEFAULT_WALK_SPEED, Traversal,
};
use crate::animation::ClipSet;
use crate::ecs::Transform;

/// Current herd file version
pub const HERD_VERSION: u32 = 1;

/// Construction and setup parameters for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Display name, unique within a herd
    pub name: String,
    /// Opaque model reference
    pub model: String,
    /// Prefix shared by the model's clip names
    pub clip_prefix: String,
    /// Idle clip names without the prefix; empty means the default pair
    pub idle_clips: Vec<String>,
    pub position: Vec3,
    /// Uniform scale
    pub scale: f32,
    pub waypoints: Vec<Vec3>,
    pub traversal: Traversal,
    /// Units per second
    pub walk_speed: f32,
    /// Units per second
    pub run_speed: f32,
    /// Squared distance
    pub personal_space: f32,
    /// Seconds
    pub idle_duration: f32,
    /// Seconds
    pub attack_duration: f32,
    /// Decision list; repeats act as weights
    pub next_states: Vec<Activity>,
    pub friendly: bool,
    /// Overrides the seed derived from the herd
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Create a config with defaults for everything but the name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the agent and the bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |what: &str| Err(ConfigError::Invalid(format!("agent '{}': {what}", self.name)));

        if self.name.is_empty() {
            return Err(ConfigError::Invalid("agent with an empty name".into()));
        }
        if !(self.walk_speed > 0.0 && self.walk_speed.is_finite()) {
            return invalid("walk_speed must be positive");
        }
        if !(self.run_speed > 0.0 && self.run_speed.is_finite()) {
            return invalid("run_speed must be positive");
        }
        if !(self.personal_space >= 0.0) {
            return invalid("personal_space must not be negative");
        }
        if !(self.idle_duration > 0.0) {
            return invalid("idle_duration must be positive");
        }
        if !(self.attack_duration > 0.0) {
            return invalid("attack_duration must be positive");
        }
        if self.next_states.is_empty() {
            return invalid("next_states must not be empty");
        }
        if self.next_states.contains(&Activity::Thinking) {
            return invalid("next_states must not contain Thinking");
        }
        Ok(())
    }

    /// Tunables for the agent
    #[must_use]
    pub fn params(&self) -> AgentParams {
        AgentParams {
            walk_speed: self.walk_speed,
            run_speed: self.run_speed,
            personal_space: self.personal_space,
            idle_duration: self.idle_duration,
            attack_duration: self.attack_duration,
            next_states: self.next_states.iter().copied().collect(),
        }
    }

    /// Construct the agent, seeding it with `seed` unless the config has its own.
    ///
    /// The agent is not started.
    #[must_use]
    pub fn build(&self, seed: u64) -> Agent {
        let clips = ClipSet::with_prefix(&self.clip_prefix, self.idle_clips.as_slice());
        let transform = Transform::from_position(self.position).with_scale(self.scale);

        let mut agent = Agent::new(&self.name, &self.model, clips, transform)
            .with_seed(self.seed.unwrap_or(seed))
            .with_params(self.params());
        agent.set_waypoints(self.waypoints.clone());
        agent.set_traversal(self.traversal);
        agent.set_friendly(self.friendly);
        agent
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "agent".to_string(),
            model: String::new(),
            clip_prefix: String::new(),
            idle_clips: Vec::new(),
            position: Vec3::ZERO,
            scale: 1.0,
            waypoints: Vec::new(),
            traversal: Traversal::Random,
            walk_speed: DEFAULT_WALK_SPEED,
            run_speed: DEFAULT_RUN_SPEED,
            personal_space: DEFAULT_PERSONAL_SPACE,
            idle_duration: DEFAULT_IDLE_DURATION,
            attack_duration: DEFAULT_ATTACK_DURATION,
            next_states: DEFAULT_NEXT_STATES.to_vec(),
            friendly: false,
            seed: None,
        }
    }
}

/// A named set of agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerdConfig {
    /// Herd name
    pub name: String,
    /// File version for compatibility
    pub version: u32,
    /// Base seed; agent `i` defaults to `seed + i`
    pub seed: u64,
    /// Agents in spawn order
    pub agents: Vec<AgentConfig>,
}

impl HerdConfig {
    /// Create a new empty herd
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an agent, returning its spawn index
    pub fn add_agent(&mut self, agent: AgentConfig) -> usize {
        let index = self.agents.len();
        self.agents.push(agent);
        index
    }

    /// Seed for the agent at `index`
    #[must_use]
    pub fn agent_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }

    /// Check the version, every agent, and name uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != HERD_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported herd version {} (expected {HERD_VERSION})",
                self.version
            )));
        }

        let mut names = rustc_hash::FxHashSet::default();
        for agent in &self.agents {
            agent.validate()?;
            if !names.insert(agent.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a herd from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let herd: Self =
            ron::from_str(text).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        herd.validate()?;
        Ok(herd)
    }

    /// Pretty-printed RON text
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save the herd to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = self.to_ron_string()?;
        fs::write(path, text).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load a herd from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the herd to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, text).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load a herd from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let herd: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        herd.validate()?;
        Ok(herd)
    }

    /// Load a herd, choosing the format from the file extension
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for HerdConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            version: HERD_VERSION,
            seed: 0,
            agents: Vec::new(),
        }
    }
}

/// Errors that can occur while loading or saving a herd
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    Io(String),
    /// Serialization error
    Serialize(String),
    /// Deserialization error
    Deserialize(String),
    /// Values out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Serialize(e) => write!(f, "Serialization error: {e}"),
            Self::Deserialize(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
