//! Object identifiers, object records and live body construction

use crate::config::PhysicsConfig;
use crate::shape::{BuiltShape, MassProperties, ShapeTag, SHAPE_PARAM_LEN};
use bytemuck::{Pod, Zeroable};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marks user data that carries an [`ObjectId`] in its low 64 bits
const USER_DATA_TAG: u128 = 1 << 64;

/// Externally assigned object identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(transparent)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Encode as Rapier user data
    pub(crate) fn to_user_data(self) -> u128 {
        USER_DATA_TAG | (self.0 as u64 as u128)
    }

    /// Decode Rapier user data, `None` if no identifier was attached
    pub(crate) fn from_user_data(data: u128) -> Option<Self> {
        (data >> 64 == 1).then_some(Self(data as u64 as i64))
    }
}

impl From<i64> for ObjectId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one object as exchanged with callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object radius
    pub radius: f64,
    /// Uniform scale applied to the collision shape
    pub scale: f64,
    /// Inverse mass (0 = immovable)
    pub inv_mass: f64,
    /// Restitution/bounciness
    pub restitution: f64,
    /// Orientation quaternion (x, y, z, w)
    pub orientation: [f64; 4],
    /// Position
    pub position: [f64; 3],
    /// Linear velocity
    pub linear_velocity: [f64; 3],
    /// Angular velocity
    pub angular_velocity: [f64; 3],
    /// Shape tag followed by up to three shape arguments
    pub shape_params: [f64; SHAPE_PARAM_LEN],
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self {
            radius: 1.0,
            scale: 1.0,
            inv_mass: 1.0,
            restitution: 0.0,
            orientation: [0.0, 0.0, 0.0, 1.0],
            position: [0.0; 3],
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            shape_params: [ShapeTag::None.as_raw(), 0.0, 0.0, 0.0],
        }
    }
}

impl ObjectRecord {
    /// Sphere of the given radius
    pub fn sphere(radius: f64) -> Self {
        Self {
            radius,
            shape_params: [ShapeTag::Sphere.as_raw(), 0.0, 0.0, 0.0],
            ..Default::default()
        }
    }

    /// Box from full edge lengths
    pub fn cuboid(width: f64, height: f64, length: f64) -> Self {
        Self {
            shape_params: [ShapeTag::Box.as_raw(), width, height, length],
            ..Default::default()
        }
    }

    /// Immovable plane with the given normal
    pub fn plane(nx: f64, ny: f64, nz: f64) -> Self {
        Self {
            inv_mass: 0.0,
            shape_params: [ShapeTag::StaticPlane.as_raw(), nx, ny, nz],
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set orientation (x, y, z, w)
    pub fn with_orientation(mut self, orientation: [f64; 4]) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set linear velocity
    pub fn with_linear_velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.linear_velocity = [x, y, z];
        self
    }

    /// Set angular velocity
    pub fn with_angular_velocity(mut self, x: f64, y: f64, z: f64) -> Self {
        self.angular_velocity = [x, y, z];
        self
    }

    /// Set inverse mass
    pub fn with_inv_mass(mut self, inv_mass: f64) -> Self {
        self.inv_mass = inv_mass;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set scale
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// Fixed simulation parameters shared by every new body
#[derive(Debug, Clone, Copy)]
pub(crate) struct BodyDefaults {
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub sleep_linear_threshold: f32,
    pub sleep_angular_threshold: f32,
    pub friction: f32,
}

impl BodyDefaults {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
            sleep_linear_threshold: config.sleep_linear_threshold,
            sleep_angular_threshold: config.sleep_angular_threshold,
            friction: config.friction,
        }
    }
}

pub(crate) fn to_vector(v: [f64; 3]) -> rapier::Vector<f32> {
    rapier::Vector::new(v[0] as f32, v[1] as f32, v[2] as f32)
}

pub(crate) fn from_vector(v: &rapier::Vector<f32>) -> [f64; 3] {
    [v.x as f64, v.y as f64, v.z as f64]
}

/// Orientation and position as a Rapier isometry
pub(crate) fn to_isometry(orientation: [f64; 4], position: [f64; 3]) -> rapier::Isometry<f32> {
    let [x, y, z, w] = orientation.map(|c| c as f32);
    let rotation = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), 1.0e-6).unwrap_or_else(|| {
        log::warn!("Degenerate orientation {orientation:?}, using identity");
        UnitQuaternion::identity()
    });
    rapier::Isometry::from_parts(
        rapier::Translation::new(position[0] as f32, position[1] as f32, position[2] as f32),
        rotation,
    )
}

/// Rapier isometry as (orientation, position)
pub(crate) fn from_isometry(iso: &rapier::Isometry<f32>) -> ([f64; 4], [f64; 3]) {
    let rot = iso.rotation;
    let pos = iso.translation.vector;
    (
        [rot.i as f64, rot.j as f64, rot.k as f64, rot.w as f64],
        from_vector(&pos),
    )
}

/// Build the live rigid body for a new object.
///
/// The body starts disabled; the stepper enables it while it is being stepped.
pub(crate) fn build_rigid_body(
    id: ObjectId,
    record: &ObjectRecord,
    mass: &MassProperties,
    defaults: &BodyDefaults,
) -> rapier::RigidBody {
    let builder = if mass.is_immovable() {
        rapier::RigidBodyBuilder::fixed()
    } else {
        rapier::RigidBodyBuilder::dynamic().additional_mass_properties(rapier::MassProperties::new(
            rapier::Point::origin(),
            mass.mass as f32,
            to_vector(mass.inertia),
        ))
    };

    let mut body = builder
        .position(to_isometry(record.orientation, record.position))
        .linvel(to_vector(record.linear_velocity))
        .angvel(to_vector(record.angular_velocity))
        .linear_damping(defaults.linear_damping)
        .angular_damping(defaults.angular_damping)
        .user_data(id.to_user_data())
        .build();

    let activation = body.activation_mut();
    activation.normalized_linear_threshold = defaults.sleep_linear_threshold;
    activation.angular_threshold = defaults.sleep_angular_threshold;

    body.set_enabled(false);
    body
}

/// Build the collider for a new object, `None` for shapes without a volume
pub(crate) fn build_collider(
    id: ObjectId,
    record: &ObjectRecord,
    shape: &BuiltShape,
    defaults: &BodyDefaults,
) -> Option<rapier::Collider> {
    let rapier_shape = shape.descriptor.to_rapier()?;
    let offset = shape.descriptor.collider_offset();

    Some(
        rapier::ColliderBuilder::new(rapier_shape)
            .translation(rapier::Vector::new(offset[0], offset[1], offset[2]))
            .density(0.0)
            .friction(defaults.friction)
            .restitution(record.restitution as f32)
            .active_hooks(rapier::ActiveHooks::FILTER_CONTACT_PAIRS)
            .user_data(id.to_user_data())
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_user_data_round_trip() {
        for raw in [0, 1, -1, i64::MAX, i64::MIN] {
            let id = ObjectId(raw);
            assert_eq!(ObjectId::from_user_data(id.to_user_data()), Some(id));
        }
    }

    #[test]
    fn test_untagged_user_data_has_no_id() {
        assert_eq!(ObjectId::from_user_data(0), None);
        assert_eq!(ObjectId::from_user_data(42), None);
    }

    #[test]
    fn test_isometry_round_trip() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let iso = to_isometry([0.0, 0.0, half, half], [1.0, 2.0, 3.0]);
        let (rot, pos) = from_isometry(&iso);
        assert_relative_eq!(rot[2], half, epsilon = 1e-6);
        assert_relative_eq!(rot[3], half, epsilon = 1e-6);
        assert_eq!(pos, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_degenerate_orientation_is_identity() {
        let iso = to_isometry([0.0; 4], [0.0; 3]);
        let (rot, _) = from_isometry(&iso);
        assert_eq!(rot, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_record_builders() {
        let record = ObjectRecord::cuboid(1.0, 2.0, 3.0).with_position(0.0, 1.0, 0.0);
        assert_eq!(record.shape_params, [4.0, 1.0, 2.0, 3.0]);
        assert_eq!(record.position, [0.0, 1.0, 0.0]);
        assert_eq!(ObjectRecord::plane(0.0, 0.0, 1.0).inv_mass, 0.0);
    }

    #[test]
    fn test_immovable_body_is_fixed() {
        let defaults = BodyDefaults::new(&PhysicsConfig::default());
        let body = build_rigid_body(
            ObjectId(1),
            &ObjectRecord::sphere(1.0),
            &MassProperties::IMMOVABLE,
            &defaults,
        );
        assert!(body.is_fixed());
        assert!(!body.is_enabled());
        assert_eq!(ObjectId::from_user_data(body.user_data), Some(ObjectId(1)));
    }
}
