//! Collision shapes built from tagged parameter lists
//!
//! Callers describe a shape with up to four numbers: slot 0 is the
//! [`ShapeTag`], the remaining slots are tag specific. Anything the builder
//! cannot make sense of degrades to [`ShapeDescriptor::None`] with zero
//! inverse mass, so a bad description never stops the simulation.

use crate::config::PhysicsConfig;
use rapier3d::na::Unit;
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Number of shape parameter slots in an object record
pub const SHAPE_PARAM_LEN: usize = 4;

/// Stable shape tag enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShapeTag {
    /// Collision detection disabled
    None = 0,
    /// Reserved, resolved to a concrete variant before use
    Auto = 1,
    /// Static plane
    StaticPlane = 2,
    /// Sphere
    Sphere = 3,
    /// Box
    Box = 4,
}

impl ShapeTag {
    /// Decode a tag stored in a numeric slot
    pub fn from_raw(raw: f64) -> Option<Self> {
        if !raw.is_finite() || raw.fract() != 0.0 {
            return None;
        }
        match raw as i64 {
            0 => Some(Self::None),
            1 => Some(Self::Auto),
            2 => Some(Self::StaticPlane),
            3 => Some(Self::Sphere),
            4 => Some(Self::Box),
            _ => None,
        }
    }

    /// Numeric slot value for this tag
    pub fn as_raw(self) -> f64 {
        self as u8 as f64
    }
}

/// Resolved collision volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeDescriptor {
    /// No collision volume
    None,
    /// Sphere with radius
    Sphere {
        radius: f64,
    },
    /// Box with half-extents
    Box {
        half_extents: [f64; 3],
    },
    /// Static plane through `normal * thickness`
    StaticPlane {
        normal: [f64; 3],
        thickness: f64,
    },
}

impl ShapeDescriptor {
    /// Tag of this descriptor
    pub fn tag(&self) -> ShapeTag {
        match self {
            Self::None => ShapeTag::None,
            Self::Sphere { .. } => ShapeTag::Sphere,
            Self::Box { .. } => ShapeTag::Box,
            Self::StaticPlane { .. } => ShapeTag::StaticPlane,
        }
    }

    /// Whether this shape can take part in collisions
    pub fn collides(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Principal inertia of the shape for `mass`
    pub fn local_inertia(&self, mass: f64) -> [f64; 3] {
        match *self {
            Self::None | Self::StaticPlane { .. } => [0.0; 3],
            Self::Sphere { radius } => {
                let i = 0.4 * mass * radius * radius;
                [i, i, i]
            }
            Self::Box { half_extents } => {
                let [x, y, z] = half_extents.map(|h| 2.0 * h);
                let k = mass / 12.0;
                [k * (y * y + z * z), k * (x * x + z * z), k * (x * x + y * y)]
            }
        }
    }

    /// Build a Rapier shared shape, `None` for shapes without a volume
    pub(crate) fn to_rapier(&self) -> Option<rapier::SharedShape> {
        match *self {
            Self::None => None,
            Self::Sphere { radius } => Some(rapier::SharedShape::ball(radius as f32)),
            Self::Box { half_extents } => Some(rapier::SharedShape::cuboid(
                half_extents[0] as f32,
                half_extents[1] as f32,
                half_extents[2] as f32,
            )),
            Self::StaticPlane { normal, .. } => {
                let n = rapier::Vector::new(normal[0] as f32, normal[1] as f32, normal[2] as f32);
                Some(rapier::SharedShape::halfspace(Unit::new_normalize(n)))
            }
        }
    }

    /// Offset of the collider from its body
    pub(crate) fn collider_offset(&self) -> [f32; 3] {
        match *self {
            Self::StaticPlane { normal, thickness } => normal.map(|n| (n * thickness) as f32),
            _ => [0.0; 3],
        }
    }
}

/// Shape plus the inverse mass the body must use with it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltShape {
    pub descriptor: ShapeDescriptor,
    /// Zero means immovable
    pub inv_mass: f64,
}

/// Mass and principal inertia of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: [f64; 3],
}

impl MassProperties {
    /// Infinite mass, no rotation
    pub const IMMOVABLE: Self = Self {
        mass: 0.0,
        inertia: [0.0; 3],
    };

    /// Whether the body never moves
    pub fn is_immovable(&self) -> bool {
        self.mass == 0.0
    }

    /// Euclidean length of the inertia diagonal
    pub fn inertia_magnitude(&self) -> f64 {
        self.inertia.iter().map(|i| i * i).sum::<f64>().sqrt()
    }
}

/// Turns shape parameter lists into descriptors and mass properties
#[derive(Debug, Clone, Copy)]
pub struct ShapeBuilder {
    mass_epsilon: f64,
    inertia_warning_range: [f64; 2],
    plane_thickness: f64,
}

impl Default for ShapeBuilder {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl ShapeBuilder {
    /// Create a builder using the limits from `config`
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            mass_epsilon: config.mass_epsilon,
            inertia_warning_range: config.inertia_warning_range,
            plane_thickness: config.plane_thickness,
        }
    }

    /// Resolve `params` into a shape.
    ///
    /// `radius` and `scale` are the object's own fields; spheres use
    /// `scale * radius`, boxes use `scale * params[1..4] / 2` as half-extents
    /// and planes use `params[1..4]` as their normal.
    pub fn build(&self, radius: f64, scale: f64, inv_mass: f64, params: &[f64]) -> BuiltShape {
        let Some(&raw_tag) = params.first() else {
            return BuiltShape {
                descriptor: ShapeDescriptor::None,
                inv_mass: 0.0,
            };
        };

        let descriptor = match ShapeTag::from_raw(raw_tag) {
            Some(ShapeTag::None) => Ok(ShapeDescriptor::None),
            Some(ShapeTag::Sphere) => {
                let r = scale * radius;
                if r.is_finite() && r > 0.0 {
                    Ok(ShapeDescriptor::Sphere { radius: r })
                } else {
                    Err(format!("sphere radius {r} is not positive"))
                }
            }
            Some(ShapeTag::Box) => match Self::args(params) {
                Some(size) => {
                    let half_extents = size.map(|s| scale * s / 2.0);
                    if half_extents.iter().all(|h| h.is_finite() && *h > 0.0) {
                        Ok(ShapeDescriptor::Box { half_extents })
                    } else {
                        Err(format!("box size {size:?} at scale {scale} is not positive"))
                    }
                }
                None => Err("box needs three size parameters".to_string()),
            },
            Some(ShapeTag::StaticPlane) => match Self::args(params) {
                Some(n) => {
                    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                    if len.is_finite() && len > 1e-12 {
                        Ok(ShapeDescriptor::StaticPlane {
                            normal: n.map(|c| c / len),
                            thickness: self.plane_thickness,
                        })
                    } else {
                        Err(format!("plane normal {n:?} has no direction"))
                    }
                }
                None => Err("plane needs three normal parameters".to_string()),
            },
            Some(ShapeTag::Auto) => Err("shape tag Auto is reserved".to_string()),
            None => Err(format!("unrecognised collision shape <{raw_tag}>")),
        };

        match descriptor {
            Ok(descriptor @ (ShapeDescriptor::None | ShapeDescriptor::StaticPlane { .. })) => {
                BuiltShape {
                    descriptor,
                    inv_mass: 0.0,
                }
            }
            Ok(descriptor) => BuiltShape {
                descriptor,
                inv_mass: if inv_mass > self.mass_epsilon { inv_mass } else { 0.0 },
            },
            Err(reason) => {
                log::warn!("{reason}; falling back to an empty, immovable shape");
                BuiltShape {
                    descriptor: ShapeDescriptor::None,
                    inv_mass: 0.0,
                }
            }
        }
    }

    /// Mass and inertia for a built shape.
    ///
    /// Every result goes through the inertia sanity check, immovable bodies
    /// included, whose zero inertia always falls below the range.
    pub fn mass_properties(&self, shape: &BuiltShape) -> MassProperties {
        let props = if !shape.descriptor.collides() || shape.inv_mass <= self.mass_epsilon {
            MassProperties::IMMOVABLE
        } else {
            let mass = 1.0 / shape.inv_mass;
            MassProperties {
                mass,
                inertia: shape.descriptor.local_inertia(mass),
            }
        };

        if self.is_suspicious(&props) {
            log::warn!(
                "Suspicious inertia {} for {:?} with mass {}",
                props.inertia_magnitude(),
                shape.descriptor.tag(),
                props.mass
            );
        }
        props
    }

    /// Whether the inertia magnitude lies outside the configured range
    pub fn is_suspicious(&self, props: &MassProperties) -> bool {
        let [low, high] = self.inertia_warning_range;
        !(low..=high).contains(&props.inertia_magnitude())
    }

    fn args(params: &[f64]) -> Option<[f64; 3]> {
        match params {
            [_, a, b, c, ..] => Some([*a, *b, *c]),
            _ => None,
        }
    }
}
