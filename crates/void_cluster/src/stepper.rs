//! Selective stepper - advances a chosen subset of objects through time

use crate::body::ObjectId;
use crate::collector::CollisionCollector;
use crate::config::{CollisionMode, PhysicsConfig};
use crate::error::{PhysicsError, Result};
use crate::store::{ColliderPoses, ObjectStore};
use rapier3d::prelude as rapier;
use std::num::NonZeroUsize;

/// Where a stepping call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPhase {
    #[default]
    Idle,
    Activating,
    Stepping,
    Deactivating,
}

/// Outcome of one stepping call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepSummary {
    /// Pipeline steps actually run
    pub substeps: u32,
    /// Unique pairs seen by the broad phase
    pub pair_count: usize,
    /// Touching contact points recorded
    pub contact_count: usize,
}

/// Number of substeps used to cover `dt`.
///
/// `dt` is split into steps no longer than `timestep`, capped at
/// `max_substeps`. A cap of zero means a single step; a zero `dt` means none.
pub fn substep_count(dt: f64, timestep: f64, max_substeps: u32) -> u32 {
    if dt <= 0.0 {
        return 0;
    }
    let cap = max_substeps.max(1);
    if timestep <= 0.0 {
        return cap;
    }
    let wanted = (dt / timestep).ceil();
    if wanted >= cap as f64 {
        cap
    } else {
        (wanted as u32).max(1)
    }
}

/// Owns the Rapier pipeline and the collision collector.
///
/// Bodies live in the [`ObjectStore`]; the stepper only enables the ones it
/// was asked to advance and disables them again before returning.
pub struct Stepper {
    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters, `dt` rewritten on every call
    integration_params: rapier::IntegrationParameters,

    /// Timestep used to pick the substep count
    base_timestep: f64,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Pair and contact caches
    collector: CollisionCollector,

    /// Collider poses at the start of the running substep
    poses: ColliderPoses,

    phase: StepPhase,

    /// Objects advanced by the last call
    last_stepped: Vec<ObjectId>,
}

impl Stepper {
    /// Create a stepper
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;
        integration_params.num_solver_iterations =
            NonZeroUsize::new(config.velocity_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            pipeline: rapier::PhysicsPipeline::new(),
            gravity: rapier::Vector::new(config.gravity[0], config.gravity[1], config.gravity[2]),
            integration_params,
            base_timestep: config.timestep as f64,
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            ccd_solver: rapier::CCDSolver::new(),
            collector: CollisionCollector::new(
                config.collision_mode,
                config.pair_cache_capacity,
                config.contact_cache_capacity,
            ),
            poses: ColliderPoses::new(),
            phase: StepPhase::Idle,
            last_stepped: Vec::new(),
        }
    }

    /// Set gravity
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = rapier::Vector::new(x, y, z);
    }

    /// Get gravity
    pub fn gravity(&self) -> [f32; 3] {
        [self.gravity.x, self.gravity.y, self.gravity.z]
    }

    /// Switch between pair discovery and resolution for later calls
    pub fn set_collision_mode(&mut self, mode: CollisionMode) {
        self.collector.set_mode(mode);
    }

    /// Collision mode
    pub fn collision_mode(&self) -> CollisionMode {
        self.collector.mode()
    }

    /// Current phase; always [`StepPhase::Idle`] between calls
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Collector holding the results of the last call
    pub fn collector(&self) -> &CollisionCollector {
        &self.collector
    }

    /// Objects advanced by the last call
    pub fn last_stepped(&self) -> &[ObjectId] {
        &self.last_stepped
    }

    /// Advance the objects `ids` by `dt` seconds.
    ///
    /// Fails before touching the world if `dt` is negative or not finite, or
    /// if any id is missing from `store`. Pairs and contacts from previous
    /// calls are dropped first either way.
    pub fn step(
        &mut self,
        store: &mut ObjectStore,
        ids: &[ObjectId],
        dt: f64,
        max_substeps: u32,
    ) -> Result<StepSummary> {
        self.collector.reset();
        self.last_stepped.clear();

        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidStep(format!(
                "delta must be finite and non-negative, got {dt}"
            )));
        }
        store.ensure_all(ids)?;

        self.enter(StepPhase::Activating);
        for id in ids {
            store.activate(*id);
        }

        self.enter(StepPhase::Stepping);
        let substeps = substep_count(dt, self.base_timestep, max_substeps);
        if substeps > 0 {
            self.integration_params.dt = (dt / substeps as f64) as f32;
        }
        for _ in 0..substeps {
            store.collider_poses(ids, &mut self.poses);
            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut store.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut store.bodies,
                &mut store.colliders,
                &mut store.impulse_joints,
                &mut store.multibody_joints,
                &mut self.ccd_solver,
                None,
                &self.collector,
                &(),
            );
            self.collector
                .collect_contacts(&self.narrow_phase, &store.colliders, &self.poses);
        }

        self.enter(StepPhase::Deactivating);
        for id in ids {
            store.deactivate(*id);
        }
        self.last_stepped.extend_from_slice(ids);
        self.enter(StepPhase::Idle);

        let summary = StepSummary {
            substeps,
            pair_count: self.collector.pair_count(),
            contact_count: self.collector.contacts().len(),
        };
        log::debug!(
            "Stepped {} objects by {}s in {} substeps: {} pairs, {} contacts",
            ids.len(),
            dt,
            summary.substeps,
            summary.pair_count,
            summary.contact_count
        );
        Ok(summary)
    }

    fn enter(&mut self, phase: StepPhase) {
        log::trace!("Stepper {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
