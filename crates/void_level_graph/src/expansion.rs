//! Neighbour expansion - depth-limited breadth-first traversal
//!
//! Produces the set of levels that should be resident around a root level.
//! The traversal owns its scratch buffers so repeated calls do not allocate;
//! nothing else survives between calls.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::catalog::LevelCatalog;
use crate::record::LevelId;

/// Smallest accepted traversal depth
pub const MIN_DEPTH: u32 = 1;

/// Largest accepted traversal depth
pub const MAX_DEPTH: u32 = 10;

/// Clamp a configured depth into `[MIN_DEPTH, MAX_DEPTH]`
pub fn clamp_depth(depth: u32) -> u32 {
    depth.clamp(MIN_DEPTH, MAX_DEPTH)
}

/// Breadth-first neighbour traversal with reusable scratch storage
#[derive(Debug, Default)]
pub struct NeighborExpansion {
    queue: VecDeque<(LevelId, u32)>,
    visited: HashSet<LevelId>,
}

impl NeighborExpansion {
    /// Create a new traversal
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels reachable from `root` within `depth` hops, root first, in
    /// breadth-first order. Unknown neighbours are skipped; an unknown root
    /// yields an empty result.
    pub fn expand(&mut self, catalog: &LevelCatalog, root: &LevelId, depth: u32) -> Vec<LevelId> {
        self.queue.clear();
        self.visited.clear();

        let depth = clamp_depth(depth);
        let mut order = Vec::new();

        if !catalog.contains(root) {
            log::warn!("NeighborExpansion: root level {} is not in the catalog", root);
            return order;
        }

        self.visited.insert(root.clone());
        self.queue.push_back((root.clone(), 0));

        while let Some((id, hops)) = self.queue.pop_front() {
            let Some(record) = catalog.get(&id) else {
                continue;
            };
            order.push(id);

            if hops == depth {
                continue;
            }

            for neighbor in &record.neighbor_ids {
                if self.visited.contains(neighbor) {
                    continue;
                }
                if !catalog.contains(neighbor) {
                    log::warn!(
                        "NeighborExpansion: level {} lists unknown neighbour {}",
                        record.id,
                        neighbor
                    );
                    continue;
                }
                self.visited.insert(neighbor.clone());
                self.queue.push_back((neighbor.clone(), hops + 1));
            }
        }

        self.queue.clear();
        self.visited.clear();
        order
    }

    /// Same traversal, collected into a set
    pub fn expand_set(&mut self, catalog: &LevelCatalog, root: &LevelId, depth: u32) -> BTreeSet<LevelId> {
        self.expand(catalog, root, depth).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LevelRecord;

    fn ids(names: &[&str]) -> BTreeSet<LevelId> {
        names.iter().map(|n| LevelId::from(*n)).collect()
    }

    fn chain() -> LevelCatalog {
        LevelCatalog::new([
            LevelRecord::new("A", "w").with_neighbor("B"),
            LevelRecord::new("B", "w").with_neighbors(["A", "C"]),
            LevelRecord::new("C", "w").with_neighbor("B"),
        ])
    }

    #[test]
    fn test_middle_root_depth_one() {
        let mut expansion = NeighborExpansion::new();
        let result = expansion.expand(&chain(), &"B".into(), 1);

        assert_eq!(result[0], LevelId::from("B"));
        assert_eq!(result.into_iter().collect::<BTreeSet<_>>(), ids(&["A", "B", "C"]));
    }

    #[test]
    fn test_end_root_depth_one() {
        let mut expansion = NeighborExpansion::new();
        let result = expansion.expand_set(&chain(), &"A".into(), 1);

        assert_eq!(result, ids(&["A", "B"]));
    }

    #[test]
    fn test_depth_is_clamped() {
        assert_eq!(clamp_depth(0), 1);
        assert_eq!(clamp_depth(4), 4);
        assert_eq!(clamp_depth(500), 10);

        let mut expansion = NeighborExpansion::new();
        // depth 0 behaves like depth 1
        let result = expansion.expand_set(&chain(), &"A".into(), 0);
        assert_eq!(result, ids(&["A", "B"]));
    }

    #[test]
    fn test_long_chain_capped_at_max_depth() {
        let records = (0..20).map(|i| {
            let mut record = LevelRecord::new(format!("L{i}"), "w");
            if i > 0 {
                record = record.with_neighbor(format!("L{}", i - 1));
            }
            record.with_neighbor(format!("L{}", i + 1))
        });
        let catalog = LevelCatalog::new(records);

        let mut expansion = NeighborExpansion::new();
        let result = expansion.expand(&catalog, &"L0".into(), 50);

        // root plus ten hops; L20 does not exist and is skipped
        assert_eq!(result.len(), 11);
        assert_eq!(result.last(), Some(&LevelId::from("L10")));
    }

    #[test]
    fn test_unknown_ids() {
        let catalog = LevelCatalog::new([
            LevelRecord::new("A", "w").with_neighbors(["B", "ghost"]),
            LevelRecord::new("B", "w").with_neighbor("A"),
        ]);
        let mut expansion = NeighborExpansion::new();

        assert_eq!(expansion.expand_set(&catalog, &"A".into(), 3), ids(&["A", "B"]));
        assert!(expansion.expand(&catalog, &"nowhere".into(), 3).is_empty());
    }

    #[test]
    fn test_cycle_and_restart() {
        let catalog = LevelCatalog::new([
            LevelRecord::new("A", "w").with_neighbors(["B", "C"]),
            LevelRecord::new("B", "w").with_neighbors(["A", "C"]),
            LevelRecord::new("C", "w").with_neighbors(["A", "B", "D"]),
            LevelRecord::new("D", "w").with_neighbor("C"),
        ]);
        let mut expansion = NeighborExpansion::new();

        let first = expansion.expand(&catalog, &"A".into(), 1);
        let second = expansion.expand(&catalog, &"A".into(), 1);
        assert_eq!(first, second);
        assert_eq!(first, vec![LevelId::from("A"), LevelId::from("B"), LevelId::from("C")]);

        assert_eq!(expansion.expand_set(&catalog, &"A".into(), 2), ids(&["A", "B", "C", "D"]));
    }
}
