#![allow(dead_code)]

use dyadic_stream::{DynamicStream, LieIncrementPath, TruncatedLie};

pub const TOLERANCE: f64 = 1e-9;

/// Deterministic path of `count` increments spread evenly over [0, 1)
pub fn sample_path(count: usize, width: usize, depth: u8) -> LieIncrementPath {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 2000) as f64 / 1000.0 - 1.0
    };

    let params = (0..count).map(|i| i as f64 / count as f64).collect();
    let data: Vec<f64> = (0..count * width).map(|_| next()).collect();
    LieIncrementPath::new(width, depth, params, &data).expect("sample path is valid")
}

/// Sample path whose split children are computed from the data
pub fn exact_path(count: usize) -> LieIncrementPath {
    sample_path(count, 3, 2).with_exact_refinement(true)
}

pub fn assert_lie_close(actual: &TruncatedLie, expected: &TruncatedLie) {
    assert!(
        actual.approx_eq(expected, TOLERANCE),
        "log-signatures differ:\n  actual:   {}\n  expected: {}",
        actual,
        expected
    );
}

/// Root contains every node; every linked node sits inside its parent,
/// next to its geometric sibling
pub fn assert_tree_invariants(stream: &DynamicStream<TruncatedLie>) {
    stream.inspect(|tree| {
        let Some(root) = tree.root() else {
            return;
        };
        for (key, node) in tree.iter() {
            assert!(root.contains(key), "root {} does not contain {}", root, key);
            match node.parent() {
                Some(parent) => {
                    assert!(tree.contains(&parent), "dangling parent of {}", key);
                    assert!(parent.contains(key), "{} not inside parent {}", key, parent);
                    assert_eq!(node.sibling(), Some(key.sibling()));
                    assert_eq!(parent, key.parent());
                }
                None => assert_eq!(*key, root, "unlinked non-root node {}", key),
            }
            if !tree.is_leaf(key) {
                let (left, right) = key.children();
                let below = tree
                    .accuracy(&left)
                    .min(tree.accuracy(&right))
                    .expect("children cached in pairs");
                assert!(
                    node.accuracy() <= below,
                    "{} claims accuracy {} above its children ({})",
                    key,
                    node.accuracy(),
                    below
                );
            }
        }
    });
}
