//! Object store - per-identifier simulation state and live bodies

use crate::body::{
    build_collider, build_rigid_body, from_isometry, from_vector, to_isometry, to_vector,
    BodyDefaults, ObjectId, ObjectRecord,
};
use crate::codec::binary;
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::shape::{ShapeBuilder, ShapeDescriptor, SHAPE_PARAM_LEN};
use rapier3d::prelude as rapier;
use std::collections::HashMap;

/// World poses of colliders, keyed by handle
pub(crate) type ColliderPoses = HashMap<rapier::ColliderHandle, rapier::Isometry<f32>>;

/// Immutable part of an object plus handles to its live body
#[derive(Debug, Clone)]
struct StoredObject {
    radius: f64,
    scale: f64,
    /// Effective inverse mass after shape resolution
    inv_mass: f64,
    restitution: f64,
    shape_params: [f64; SHAPE_PARAM_LEN],
    descriptor: ShapeDescriptor,
    body: rapier::RigidBodyHandle,
}

/// Owns every object and the Rapier sets holding their bodies.
///
/// Bodies stay in the sets for their whole lifetime but are disabled unless
/// the stepper has activated them.
pub struct ObjectStore {
    shapes: ShapeBuilder,
    defaults: BodyDefaults,
    objects: HashMap<ObjectId, StoredObject>,
    pub(crate) bodies: rapier::RigidBodySet,
    pub(crate) colliders: rapier::ColliderSet,
    pub(crate) islands: rapier::IslandManager,
    pub(crate) impulse_joints: rapier::ImpulseJointSet,
    pub(crate) multibody_joints: rapier::MultibodyJointSet,
}

impl ObjectStore {
    /// Create an empty store
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            shapes: ShapeBuilder::new(config),
            defaults: BodyDefaults::new(config),
            objects: HashMap::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            islands: rapier::IslandManager::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
        }
    }

    // ==================== Objects ====================

    /// Create an object, or overwrite the transform and velocities of an
    /// existing one. Shape and mass of existing objects never change.
    pub fn upsert(&mut self, id: ObjectId, record: &ObjectRecord) {
        if let Some(stored) = self.objects.get(&id) {
            if let Some(body) = self.bodies.get_mut(stored.body) {
                body.set_position(to_isometry(record.orientation, record.position), false);
                body.set_linvel(to_vector(record.linear_velocity), false);
                body.set_angvel(to_vector(record.angular_velocity), false);
            }
            return;
        }

        let shape = self
            .shapes
            .build(record.radius, record.scale, record.inv_mass, &record.shape_params);
        let mass = self.shapes.mass_properties(&shape);

        let body = self
            .bodies
            .insert(build_rigid_body(id, record, &mass, &self.defaults));
        if let Some(collider) = build_collider(id, record, &shape, &self.defaults) {
            self.colliders.insert_with_parent(collider, body, &mut self.bodies);
        }

        log::debug!(
            "Created object {} ({:?}, mass {})",
            id,
            shape.descriptor.tag(),
            mass.mass
        );

        self.objects.insert(
            id,
            StoredObject {
                radius: record.radius,
                scale: record.scale,
                inv_mass: shape.inv_mass,
                restitution: record.restitution,
                shape_params: record.shape_params,
                descriptor: shape.descriptor,
                body,
            },
        );
    }

    /// Add a force acting at `relative_position` from the center of mass.
    ///
    /// Forces accumulate until the end of the next step.
    pub fn apply_force(
        &mut self,
        id: ObjectId,
        force: [f64; 3],
        relative_position: [f64; 3],
    ) -> Result<()> {
        let body = self.body_mut(id)?;
        let point = *body.center_of_mass() + to_vector(relative_position);
        body.add_force_at_point(to_vector(force), point, false);
        Ok(())
    }

    /// Replace any pending force with a central `force` and a `torque`
    pub fn apply_force_and_torque(
        &mut self,
        id: ObjectId,
        force: [f64; 3],
        torque: [f64; 3],
    ) -> Result<()> {
        let body = self.body_mut(id)?;
        body.reset_forces(false);
        body.reset_torques(false);
        body.add_force(to_vector(force), false);
        body.add_torque(to_vector(torque), false);
        Ok(())
    }

    /// Remove objects, returning how many existed
    pub fn remove(&mut self, ids: &[ObjectId]) -> usize {
        let mut removed = 0;
        for id in ids {
            let Some(stored) = self.objects.remove(id) else {
                continue;
            };
            self.bodies.remove(
                stored.body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true, // Remove attached colliders
            );
            log::debug!("Removed object {}", id);
            removed += 1;
        }
        removed
    }

    /// Remove every object
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        self.remove(&ids);
    }

    /// Current state of an object
    pub fn get(&self, id: ObjectId) -> Option<ObjectRecord> {
        let stored = self.objects.get(&id)?;
        let body = self.bodies.get(stored.body)?;
        let (orientation, position) = from_isometry(body.position());

        Some(ObjectRecord {
            radius: stored.radius,
            scale: stored.scale,
            inv_mass: stored.inv_mass,
            restitution: stored.restitution,
            orientation,
            position,
            linear_velocity: from_vector(body.linvel()),
            angular_velocity: from_vector(body.angvel()),
            shape_params: stored.shape_params,
        })
    }

    /// Resolved shape of an object
    pub fn descriptor(&self, id: ObjectId) -> Option<ShapeDescriptor> {
        self.objects.get(&id).map(|stored| stored.descriptor)
    }

    /// Check whether an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All object identifiers, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    // ==================== Buffers ====================

    /// Write the records of `ids` into `buf`.
    ///
    /// Nothing is written unless the buffer is large enough and every id exists.
    pub fn serialize_many(&self, ids: &[ObjectId], buf: &mut [f64]) -> Result<()> {
        let required = binary::required_len(ids.len());
        if buf.len() < required {
            return Err(PhysicsError::BufferTooShort {
                required,
                actual: buf.len(),
            });
        }

        let records = ids
            .iter()
            .map(|id| self.get(*id).ok_or(PhysicsError::ObjectNotFound(*id)))
            .collect::<Result<Vec<_>>>()?;
        binary::encode_records(&records, buf)
    }

    /// Upsert every record in `buf`, one per id
    pub fn deserialize_many(&mut self, ids: &[ObjectId], buf: &[f64]) -> Result<()> {
        let records = binary::decode_records(buf, ids.len())?;
        for (id, record) in ids.iter().zip(&records) {
            self.upsert(*id, record);
        }
        Ok(())
    }

    // ==================== Activation ====================

    /// Check that every id exists, reporting the first missing one
    pub(crate) fn ensure_all(&self, ids: &[ObjectId]) -> Result<()> {
        match ids.iter().find(|id| !self.objects.contains_key(id)) {
            Some(missing) => Err(PhysicsError::ObjectNotFound(*missing)),
            None => Ok(()),
        }
    }

    /// Put a body into the simulation and wake it up
    pub(crate) fn activate(&mut self, id: ObjectId) {
        if let Ok(body) = self.body_mut(id) {
            body.set_enabled(true);
            body.wake_up(true);
        }
    }

    /// Take a body out of the simulation, dropping pending forces
    pub(crate) fn deactivate(&mut self, id: ObjectId) {
        if let Ok(body) = self.body_mut(id) {
            body.reset_forces(false);
            body.reset_torques(false);
            body.set_enabled(false);
        }
    }

    /// Record the world pose of every collider attached to `ids`.
    ///
    /// Poses come from the bodies, so transforms written since the last step
    /// are already included.
    pub(crate) fn collider_poses(&self, ids: &[ObjectId], poses: &mut ColliderPoses) {
        poses.clear();
        for id in ids {
            let Some(body) = self.objects.get(id).and_then(|s| self.bodies.get(s.body)) else {
                continue;
            };
            for &handle in body.colliders() {
                let Some(collider) = self.colliders.get(handle) else {
                    continue;
                };
                let pose = match collider.position_wrt_parent() {
                    Some(offset) => body.position() * offset,
                    None => *collider.position(),
                };
                poses.insert(handle, pose);
            }
        }
    }

    fn body_mut(&mut self, id: ObjectId) -> Result<&mut rapier::RigidBody> {
        self.objects
            .get(&id)
            .and_then(|stored| self.bodies.get_mut(stored.body))
            .ok_or(PhysicsError::ObjectNotFound(id))
    }
}
