//! Integration tests for void_level_graph
//!
//! Checks the reachable-set property of neighbour expansion on a grid world,
//! where hop distance equals Manhattan distance.

use std::collections::BTreeSet;

use void_level_graph::*;

const SIZE: i32 = 6;

fn cell(x: i32, y: i32) -> LevelId {
    LevelId::new(format!("cell_{x}_{y}"))
}

fn grid_catalog() -> LevelCatalog {
    let mut records = Vec::new();
    for x in 0..SIZE {
        for y in 0..SIZE {
            let mut record = LevelRecord::new(cell(x, y), "grid");
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (x + dx, y + dy);
                if (0..SIZE).contains(&nx) && (0..SIZE).contains(&ny) {
                    record = record.with_neighbor(cell(nx, ny));
                }
            }
            records.push(record);
        }
    }
    LevelCatalog::new(records)
}

fn cells_within(cx: i32, cy: i32, depth: i32) -> BTreeSet<LevelId> {
    let mut expected = BTreeSet::new();
    for x in 0..SIZE {
        for y in 0..SIZE {
            if (x - cx).abs() + (y - cy).abs() <= depth {
                expected.insert(cell(x, y));
            }
        }
    }
    expected
}

#[test]
fn test_grid_reachability_for_every_depth() {
    let catalog = grid_catalog();
    let mut expansion = NeighborExpansion::new();

    for depth in MIN_DEPTH..=MAX_DEPTH {
        for (cx, cy) in [(0, 0), (2, 3), (5, 5)] {
            let result = expansion.expand(&catalog, &cell(cx, cy), depth);

            assert_eq!(result[0], cell(cx, cy));
            let unique: BTreeSet<_> = result.iter().cloned().collect();
            assert_eq!(unique.len(), result.len(), "no level visited twice");
            assert_eq!(unique, cells_within(cx, cy, depth as i32));
            assert!(unique.iter().all(|id| catalog.contains(id)));
        }
    }
}

#[test]
fn test_breadth_first_order() {
    let catalog = grid_catalog();
    let mut expansion = NeighborExpansion::new();

    let result = expansion.expand(&catalog, &cell(2, 2), 3);
    let distances: Vec<i32> = result
        .iter()
        .map(|id| {
            let parts: Vec<i32> = id
                .as_str()
                .trim_start_matches("cell_")
                .split('_')
                .map(|p| p.parse().unwrap())
                .collect();
            (parts[0] - 2).abs() + (parts[1] - 2).abs()
        })
        .collect();

    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_asymmetric_lists_are_tolerated() {
    // one-way link: A -> B, B lists nobody
    let catalog = LevelCatalog::new([
        LevelRecord::new("A", "w").with_neighbor("B"),
        LevelRecord::new("B", "w"),
    ]);
    let mut expansion = NeighborExpansion::new();

    assert_eq!(expansion.expand(&catalog, &"A".into(), 2).len(), 2);
    assert_eq!(expansion.expand(&catalog, &"B".into(), 2), vec![LevelId::from("B")]);
    assert_eq!(catalog.asymmetric_links().len(), 1);
}
