//! Void Cluster - selective rigid-body stepping and collision islands
//!
//! This crate keeps a pool of rigid bodies keyed by external identifiers,
//! advances any subset of them on demand using Rapier 3D, records which pairs
//! touched during the step, and groups those pairs into islands that can be
//! resolved independently elsewhere.
//!
//! # Features
//!
//! - Object store with sphere, box, static plane and collision-less shapes
//! - Selective stepping with substep control
//! - Broad-phase pair discovery with optional collision response
//! - Narrow-phase contact points
//! - Island partitioning of the pair graph
//! - Flat `f64` record buffers and bracketed text encoding
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  PhysicsWorld                     │
//! │  ┌─────────────────────┐  ┌─────────────────────┐ │
//! │  │     ObjectStore     │  │       Stepper       │ │
//! │  │ ShapeBuilder        │  │ PhysicsPipeline     │ │
//! │  │ RigidBodySet        │◄─┤ Broad/NarrowPhase   │ │
//! │  │ ColliderSet         │  │ CollisionCollector  │ │
//! │  └─────────────────────┘  └─────────────────────┘ │
//! └──────────────────────────────────────────────────┘
//!            ▲                          │
//!            │                          ▼
//!     ┌─────────────┐           ┌──────────────┐
//!     │ codec       │           │ island       │
//!     │ binary/text │           │ partition    │
//!     └─────────────┘           └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_cluster::prelude::*;
//!
//! let mut world = PhysicsWorld::new(PhysicsConfig::default());
//!
//! world.upsert_object(ObjectId(1), &ObjectRecord::sphere(1.0));
//! world.upsert_object(ObjectId(2), &ObjectRecord::sphere(1.0).with_position(0.0, 0.0, 1.5));
//!
//! world.step(&[ObjectId(1), ObjectId(2)], 0.1, 10)?;
//!
//! for island in world.islands() {
//!     println!("{:?}", island.members());
//! }
//! ```

pub mod body;
pub mod codec;
pub mod collector;
pub mod config;
pub mod error;
pub mod island;
pub mod shape;
pub mod stepper;
pub mod store;
pub mod world;

pub mod prelude {
    //! Common imports for cluster physics
    pub use crate::body::{ObjectId, ObjectRecord};
    pub use crate::codec::{decode_nested, decode_vec, encode_nested, encode_vec, RECORD_LEN};
    pub use crate::collector::{CollisionCollector, ContactRecord, PairCacheEntry};
    pub use crate::config::{CollisionMode, PhysicsConfig};
    pub use crate::error::{PhysicsError, Result};
    pub use crate::island::{partition, partition_with, Island, IslandPolicy};
    pub use crate::shape::{ShapeDescriptor, ShapeTag};
    pub use crate::stepper::{StepPhase, StepSummary, Stepper};
    pub use crate::store::ObjectStore;
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
