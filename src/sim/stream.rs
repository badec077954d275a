//! Vertical world streaming
//!
//! A `StreamManager` keeps a window of entities just below the falling
//! player. Generation advances a frontier downward one `spacing` at a time,
//! entities the player has fallen past are retired, and nothing spawns
//! within `stop_generation_buffer` of the ground.
//!
//! The manager decides *when* and *at what height* to spawn; callers supply
//! a spawn closure that builds the entity, so type-specific context (halo
//! list, round number, id allocation) stays with the orchestrator.

use rand::Rng;

use super::entity::{EntityId, Lifecycle, Streamable};
use crate::tuning::StreamConfig;

#[derive(Debug, Clone)]
pub struct StreamManager<T: Streamable> {
    config: StreamConfig,
    initial_frontier: f32,
    /// Lowest slot generated so far; every live entity sits at or above it
    frontier: f32,
    ground_level: f32,
    /// Spawn order, which is also descending height order
    live: Vec<T>,
}

impl<T: Streamable> StreamManager<T> {
    pub fn new(config: StreamConfig, initial_frontier: f32, ground_level: f32) -> Self {
        debug_assert!(config.spacing > 0.0, "stream spacing must be positive");
        Self {
            config,
            initial_frontier,
            frontier: initial_frontier,
            ground_level,
            live: Vec::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn frontier(&self) -> f32 {
        self.frontier
    }

    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    /// Ground can move mid-descent when a round completes
    pub fn set_ground_level(&mut self, ground_level: f32) {
        self.ground_level = ground_level;
    }

    pub fn live(&self) -> &[T] {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut [T] {
        &mut self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.live.iter().find(|e| e.id() == id)
    }

    /// True once the next slot would fall inside the landing zone
    pub fn is_generation_stopped(&self) -> bool {
        self.frontier - self.config.spacing <= self.ground_level + self.config.stop_generation_buffer
    }

    /// True when the player has fallen close enough to the frontier
    pub fn should_generate(&self, player_y: f32) -> bool {
        !self.is_generation_stopped()
            && player_y - self.config.spawn_ahead <= self.frontier - self.config.spacing
    }

    /// Fill the next slot if the player has advanced far enough.
    ///
    /// Returns the entities created this call (empty if none) so the caller
    /// can register them with its collaborators.
    pub fn generate<R, F>(&mut self, player_y: f32, rng: &mut R, spawn: F) -> &mut [T]
    where
        R: Rng,
        F: FnMut(f32, &mut R) -> T,
    {
        let start = self.live.len();
        if self.should_generate(player_y) {
            self.spawn_next(rng, spawn);
        }
        &mut self.live[start..]
    }

    /// Generate every remaining slot down to the stop line
    pub fn fill<R, F>(&mut self, rng: &mut R, mut spawn: F) -> &mut [T]
    where
        R: Rng,
        F: FnMut(f32, &mut R) -> T,
    {
        let start = self.live.len();
        while !self.is_generation_stopped() {
            self.spawn_next(rng, &mut spawn);
        }
        &mut self.live[start..]
    }

    fn spawn_next<R, F>(&mut self, rng: &mut R, mut spawn: F)
    where
        R: Rng,
        F: FnMut(f32, &mut R) -> T,
    {
        let slot = self.frontier - self.config.spacing;
        let count = if self.config.batch_max > self.config.batch_min {
            rng.random_range(self.config.batch_min..=self.config.batch_max)
        } else {
            self.config.batch_min
        };

        for _ in 0..count {
            let jitter = if self.config.jitter > 0.0 {
                rng.random_range(0.0..self.config.jitter)
            } else {
                0.0
            };
            let entity = spawn(slot + jitter, rng);
            log::debug!("{:?} {:?} spawned at y={:.1}", T::KIND, entity.id(), entity.position().y);
            self.live.push(entity);
        }
        self.frontier = slot;
    }

    /// Retire every entity the player has fallen past
    pub fn remove_passed(&mut self, player_y: f32) -> Vec<T> {
        let threshold = player_y + self.config.retire_buffer;
        if self.live.iter().all(|e| e.position().y <= threshold) {
            return Vec::new();
        }

        let (mut passed, live): (Vec<T>, Vec<T>) = std::mem::take(&mut self.live)
            .into_iter()
            .partition(|e| e.position().y > threshold);
        self.live = live;

        for entity in &mut passed {
            entity.set_lifecycle(Lifecycle::Retired);
        }
        passed
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, entity: T) {
        self.live.push(entity);
    }

    /// Remove one entity (collected halo)
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let idx = self.live.iter().position(|e| e.id() == id)?;
        let mut entity = self.live.remove(idx);
        entity.set_lifecycle(Lifecycle::Retired);
        Some(entity)
    }

    /// Clear everything and restart from the initial frontier.
    ///
    /// Eager managers immediately generate their whole descent. Returns the
    /// entities that were live before the reset.
    pub fn reset<R, F>(&mut self, ground_level: f32, rng: &mut R, spawn: F) -> Vec<T>
    where
        R: Rng,
        F: FnMut(f32, &mut R) -> T,
    {
        let mut cleared = std::mem::take(&mut self.live);
        for entity in &mut cleared {
            entity.set_lifecycle(Lifecycle::Retired);
        }
        self.frontier = self.initial_frontier;
        self.ground_level = ground_level;

        if self.config.eager {
            self.fill(rng, spawn);
        }
        cleared
    }
}
