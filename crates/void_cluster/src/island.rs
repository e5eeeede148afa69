//! Island partitioning
//!
//! Treats the pairs of one step as edges of an undirected graph and splits
//! the graph into connected components. The result is canonical: members are
//! sorted and islands are ordered by their smallest member, so the same pair
//! set always yields the same partition whatever order it arrives in.

use crate::body::ObjectId;
use crate::collector::PairCacheEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which identifiers become islands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IslandPolicy {
    /// Only identifiers that appear in at least one pair
    #[default]
    PairsOnly,
    /// Also every other stepped identifier, as a one-element island
    IncludeIsolated,
}

/// One connected cluster of touching objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Island {
    members: Vec<ObjectId>,
}

impl Island {
    /// Members in ascending order
    pub fn members(&self) -> &[ObjectId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Smallest member
    pub fn root(&self) -> Option<ObjectId> {
        self.members.first().copied()
    }
}

impl IntoIterator for Island {
    type Item = ObjectId;
    type IntoIter = std::vec::IntoIter<ObjectId>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

/// Connected components of `pairs`
pub fn partition(pairs: &[PairCacheEntry]) -> Vec<Island> {
    partition_with(pairs, &[], IslandPolicy::PairsOnly)
}

/// Connected components of `pairs`, with `objects` contributing singleton
/// islands under [`IslandPolicy::IncludeIsolated`]
pub fn partition_with(
    pairs: &[PairCacheEntry],
    objects: &[ObjectId],
    policy: IslandPolicy,
) -> Vec<Island> {
    let mut adjacency: BTreeMap<ObjectId, BTreeSet<ObjectId>> = BTreeMap::new();
    for pair in pairs {
        adjacency.entry(pair.low).or_default().insert(pair.high);
        adjacency.entry(pair.high).or_default().insert(pair.low);
    }
    if policy == IslandPolicy::IncludeIsolated {
        for id in objects {
            adjacency.entry(*id).or_default();
        }
    }

    let mut visited = BTreeSet::new();
    let mut islands = Vec::new();
    let mut stack = Vec::new();

    // BTreeMap keys ascend, so each root is its island's smallest member
    for &root in adjacency.keys() {
        if !visited.insert(root) {
            continue;
        }
        let mut members = vec![root];
        stack.push(root);

        while let Some(id) = stack.pop() {
            let Some(neighbors) = adjacency.get(&id) else {
                continue;
            };
            for &next in neighbors {
                if visited.insert(next) {
                    members.push(next);
                    stack.push(next);
                }
            }
        }

        members.sort_unstable();
        islands.push(Island { members });
    }

    log::trace!(
        "Partitioned {} pairs into {} islands",
        pairs.len(),
        islands.len()
    );
    islands
}
