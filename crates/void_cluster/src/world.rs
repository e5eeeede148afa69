//! Physics world - per-instance entry point tying the core together

use crate::body::{ObjectId, ObjectRecord};
use crate::collector::{ContactRecord, PairCacheEntry};
use crate::config::{CollisionMode, PhysicsConfig};
use crate::error::Result;
use crate::island::{self, Island, IslandPolicy};
use crate::stepper::{StepPhase, StepSummary, Stepper};
use crate::store::ObjectStore;

/// One independent simulation instance.
///
/// Objects persist across calls; only the ids passed to [`PhysicsWorld::step`]
/// take part in a step. Pairs, contacts and islands describe the most recent
/// step and are replaced by the next one.
pub struct PhysicsWorld {
    /// Configuration
    config: PhysicsConfig,

    /// Objects and their bodies
    store: ObjectStore,

    /// Pipeline and collision caches
    stepper: Stepper,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            store: ObjectStore::new(&config),
            stepper: Stepper::new(&config),
            config,
        }
    }

    /// Create a world from a validated configuration
    pub fn try_new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Set gravity
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.config.gravity = [x, y, z];
        self.stepper.set_gravity(x, y, z);
    }

    /// Get gravity
    pub fn gravity(&self) -> [f32; 3] {
        self.stepper.gravity()
    }

    /// Switch collision handling for later steps
    pub fn set_collision_mode(&mut self, mode: CollisionMode) {
        self.config.collision_mode = mode;
        self.stepper.set_collision_mode(mode);
    }

    /// Get collision mode
    pub fn collision_mode(&self) -> CollisionMode {
        self.stepper.collision_mode()
    }

    /// Object store
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    // ==================== Objects ====================

    /// Create an object or update the transform and velocities of an existing one
    pub fn upsert_object(&mut self, id: ObjectId, record: &ObjectRecord) {
        self.store.upsert(id, record);
    }

    /// Add a force at a point relative to the object's center of mass
    pub fn apply_force(
        &mut self,
        id: ObjectId,
        force: [f64; 3],
        relative_position: [f64; 3],
    ) -> Result<()> {
        self.store.apply_force(id, force, relative_position)
    }

    /// Replace any pending force with a central force and a torque
    pub fn apply_force_and_torque(
        &mut self,
        id: ObjectId,
        force: [f64; 3],
        torque: [f64; 3],
    ) -> Result<()> {
        self.store.apply_force_and_torque(id, force, torque)
    }

    /// Remove objects, returning how many existed
    pub fn remove_objects(&mut self, ids: &[ObjectId]) -> usize {
        self.store.remove(ids)
    }

    /// Remove every object
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Current state of an object
    pub fn get_object(&self, id: ObjectId) -> Option<ObjectRecord> {
        self.store.get(id)
    }

    /// Check whether an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.store.contains(id)
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.store.len()
    }

    // ==================== Buffers ====================

    /// Encode the records of `ids` into `buf`, 21 slots per object
    pub fn get_object_data(&self, ids: &[ObjectId], buf: &mut [f64]) -> Result<()> {
        self.store.serialize_many(ids, buf)
    }

    /// Upsert one object per id from `buf`, 21 slots per object
    pub fn set_object_data(&mut self, ids: &[ObjectId], buf: &[f64]) -> Result<()> {
        self.store.deserialize_many(ids, buf)
    }

    // ==================== Simulation ====================

    /// Advance `ids` by `dt` seconds using at most `max_substeps` substeps
    pub fn step(&mut self, ids: &[ObjectId], dt: f64, max_substeps: u32) -> Result<StepSummary> {
        self.stepper.step(&mut self.store, ids, dt, max_substeps)
    }

    /// Stepper phase; `Idle` whenever the world is reachable
    pub fn phase(&self) -> StepPhase {
        self.stepper.phase()
    }

    // ==================== Results ====================

    /// Number of pairs found by the last step
    pub fn pair_count(&self) -> usize {
        self.stepper.collector().pair_count()
    }

    /// Pairs found by the last step
    pub fn pairs(&self) -> Vec<PairCacheEntry> {
        self.stepper.collector().pairs()
    }

    /// Copy the raw pair cache into `buf`, returning the bytes written
    pub fn write_pair_cache(&self, buf: &mut [u8]) -> usize {
        self.stepper.collector().write_pair_cache(buf)
    }

    /// Touching contacts found by the last step
    pub fn contacts(&self) -> &[ContactRecord] {
        self.stepper.collector().contacts()
    }

    /// Islands of the last step under the configured policy
    pub fn islands(&self) -> Vec<Island> {
        self.islands_with(self.config.island_policy)
    }

    /// Islands of the last step under `policy`
    pub fn islands_with(&self, policy: IslandPolicy) -> Vec<Island> {
        island::partition_with(
            &self.stepper.collector().pairs(),
            self.stepper.last_stepped(),
            policy,
        )
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
