//! Collision pair collection
//!
//! The collector observes Rapier's collision pipeline from two sides:
//!
//! - as a [`rapier::PhysicsHooks`] contact-pair filter it sees every pair
//!   the broad phase hands to the narrow phase, records it, and vetoes the
//!   response in [`CollisionMode::PairDiscovery`];
//! - after every substep it sweeps the narrow phase's contact manifolds and
//!   records touching contact points.
//!
//! Both caches belong to one collector, and one collector belongs to one
//! stepper, so independent worlds never see each other's pairs.

use crate::body::{from_vector, ObjectId};
use crate::config::CollisionMode;
use crate::store::ColliderPoses;
use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use rapier3d::prelude as rapier;
use std::collections::HashSet;

/// Two objects whose bounding volumes overlapped during one step.
///
/// `low <= high` always holds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
pub struct PairCacheEntry {
    pub low: ObjectId,
    pub high: ObjectId,
}

impl PairCacheEntry {
    /// Create a normalized pair
    pub fn new(a: ObjectId, b: ObjectId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

impl From<(i64, i64)> for PairCacheEntry {
    fn from((a, b): (i64, i64)) -> Self {
        Self::new(ObjectId(a), ObjectId(b))
    }
}

/// A touching contact point between two objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// First object
    pub id_a: ObjectId,
    /// Second object
    pub id_b: ObjectId,
    /// Contact point on the first object, world space
    pub point_a: [f64; 3],
    /// Contact point on the second object, world space
    pub point_b: [f64; 3],
    /// Contact normal, world space, pointing toward the second object
    pub normal: [f64; 3],
}

/// Pairs of the current step, unique
#[derive(Debug, Default)]
struct PairCache {
    entries: Vec<PairCacheEntry>,
    seen: HashSet<PairCacheEntry>,
}

impl PairCache {
    fn reset(&mut self, capacity: usize) {
        self.entries.clear();
        self.seen.clear();
        self.entries.reserve(capacity);
        self.seen.reserve(capacity);
    }

    fn push(&mut self, pair: PairCacheEntry) {
        if self.seen.insert(pair) {
            self.entries.push(pair);
        }
    }
}

/// Per-instance broad- and narrow-phase observer
pub struct CollisionCollector {
    mode: CollisionMode,
    pair_capacity: usize,
    contact_capacity: usize,
    pairs: Mutex<PairCache>,
    contacts: Vec<ContactRecord>,
}

impl CollisionCollector {
    /// Create a collector with pre-sized caches
    pub fn new(mode: CollisionMode, pair_capacity: usize, contact_capacity: usize) -> Self {
        let mut collector = Self {
            mode,
            pair_capacity,
            contact_capacity,
            pairs: Mutex::new(PairCache::default()),
            contacts: Vec::new(),
        };
        collector.reset();
        collector
    }

    /// Collision mode
    pub fn mode(&self) -> CollisionMode {
        self.mode
    }

    /// Switch between pair discovery and resolution
    pub fn set_mode(&mut self, mode: CollisionMode) {
        self.mode = mode;
    }

    /// Drop everything recorded so far and re-reserve the caches
    pub fn reset(&mut self) {
        self.pairs.get_mut().reset(self.pair_capacity);
        self.contacts.clear();
        self.contacts.reserve(self.contact_capacity);
    }

    /// Record a pair of objects
    pub fn record_pair(&self, a: ObjectId, b: ObjectId) {
        self.pairs.lock().push(PairCacheEntry::new(a, b));
    }

    /// Number of recorded pairs
    pub fn pair_count(&self) -> usize {
        self.pairs.lock().entries.len()
    }

    /// Recorded pairs, in discovery order
    pub fn pairs(&self) -> Vec<PairCacheEntry> {
        self.pairs.lock().entries.clone()
    }

    /// Copy the raw pair cache into `buf`.
    ///
    /// Each entry is two native-endian `i64`s. At most `buf.len()` bytes are
    /// copied; the return value is the number of bytes written, so a result
    /// below `pair_count() * 16` means the buffer was too small.
    pub fn write_pair_cache(&self, buf: &mut [u8]) -> usize {
        let cache = self.pairs.lock();
        let bytes: &[u8] = bytemuck::cast_slice(&cache.entries);
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        len
    }

    /// Touching contacts recorded so far
    pub fn contacts(&self) -> &[ContactRecord] {
        &self.contacts
    }

    /// Sweep the narrow phase after a substep and keep touching points.
    ///
    /// Manifold points are local to each collider, so they are placed with
    /// `poses`, the collider poses the substep ran its detection at. Colliders
    /// missing from `poses` use their current position.
    pub(crate) fn collect_contacts(
        &mut self,
        narrow_phase: &rapier::NarrowPhase,
        colliders: &rapier::ColliderSet,
        poses: &ColliderPoses,
    ) {
        for pair in narrow_phase.contact_pairs() {
            let (Some(co1), Some(co2)) = (colliders.get(pair.collider1), colliders.get(pair.collider2))
            else {
                continue;
            };
            let (Some(id_a), Some(id_b)) = (
                ObjectId::from_user_data(co1.user_data),
                ObjectId::from_user_data(co2.user_data),
            ) else {
                continue;
            };

            let pose1 = poses.get(&pair.collider1).unwrap_or(co1.position());
            let pose2 = poses.get(&pair.collider2).unwrap_or(co2.position());

            for manifold in &pair.manifolds {
                let normal = from_vector(&manifold.data.normal);
                for point in &manifold.points {
                    // Close but not touching
                    if point.dist > 0.0 {
                        continue;
                    }
                    let world_a = pose1 * point.local_p1;
                    let world_b = pose2 * point.local_p2;
                    self.contacts.push(ContactRecord {
                        id_a,
                        id_b,
                        point_a: from_vector(&world_a.coords),
                        point_b: from_vector(&world_b.coords),
                        normal,
                    });
                }
            }
        }
    }
}

impl rapier::PhysicsHooks for CollisionCollector {
    fn filter_contact_pair(&self, context: &rapier::PairFilterContext) -> Option<rapier::SolverFlags> {
        let id1 = context
            .colliders
            .get(context.collider1)
            .and_then(|c| ObjectId::from_user_data(c.user_data));
        let id2 = context
            .colliders
            .get(context.collider2)
            .and_then(|c| ObjectId::from_user_data(c.user_data));

        if let (Some(a), Some(b)) = (id1, id2) {
            self.record_pair(a, b);
        }

        match self.mode {
            CollisionMode::PairDiscovery => None,
            CollisionMode::Resolve => Some(rapier::SolverFlags::COMPUTE_IMPULSES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> CollisionCollector {
        CollisionCollector::new(CollisionMode::PairDiscovery, 16, 16)
    }

    #[test]
    fn test_pairs_are_normalized() {
        assert_eq!(
            PairCacheEntry::new(ObjectId(5), ObjectId(2)),
            PairCacheEntry::new(ObjectId(2), ObjectId(5))
        );
        assert_eq!(PairCacheEntry::from((9, 3)).low, ObjectId(3));
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let collector = collector();
        collector.record_pair(ObjectId(1), ObjectId(2));
        collector.record_pair(ObjectId(2), ObjectId(1));
        collector.record_pair(ObjectId(1), ObjectId(3));
        assert_eq!(collector.pair_count(), 2);
        assert_eq!(
            collector.pairs(),
            vec![PairCacheEntry::from((1, 2)), PairCacheEntry::from((1, 3))]
        );
    }

    #[test]
    fn test_reset_clears() {
        let mut collector = collector();
        collector.record_pair(ObjectId(1), ObjectId(2));
        collector.reset();
        assert_eq!(collector.pair_count(), 0);
        assert!(collector.contacts().is_empty());
        collector.record_pair(ObjectId(1), ObjectId(2));
        assert_eq!(collector.pair_count(), 1);
    }

    #[test]
    fn test_write_pair_cache() {
        let collector = collector();
        collector.record_pair(ObjectId(4), ObjectId(3));
        collector.record_pair(ObjectId(7), ObjectId(8));

        let mut buf = [0u8; 32];
        assert_eq!(collector.write_pair_cache(&mut buf), 32);
        let ids: Vec<i64> = buf
            .chunks_exact(8)
            .map(|b| i64::from_ne_bytes(b.try_into().unwrap()))
            .collect();
        assert_eq!(ids, vec![3, 4, 7, 8]);
    }

    #[test]
    fn test_write_pair_cache_truncates() {
        let collector = collector();
        collector.record_pair(ObjectId(1), ObjectId(2));
        collector.record_pair(ObjectId(3), ObjectId(4));

        let mut buf = [0xffu8; 20];
        let written = collector.write_pair_cache(&mut buf);
        assert_eq!(written, 20);
        assert!(written < collector.pair_count() * 2 * std::mem::size_of::<i64>());
        assert_eq!(&buf[..8], &1i64.to_ne_bytes());
    }

    #[test]
    fn test_mode_switch() {
        let mut collector = collector();
        assert_eq!(collector.mode(), CollisionMode::PairDiscovery);
        collector.set_mode(CollisionMode::Resolve);
        assert_eq!(collector.mode(), CollisionMode::Resolve);
    }
}
