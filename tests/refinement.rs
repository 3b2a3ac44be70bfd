mod common;

use std::collections::BTreeMap;

use common::{assert_lie_close, assert_tree_invariants, exact_path, sample_path};
use dyadic_stream::{
    AlgebraContext, Alignment, DyadicInterval, DynamicStream, RealInterval, Resolution,
    StreamConfig, StreamError, TruncatedLie,
};

fn accuracies(stream: &DynamicStream<TruncatedLie>) -> BTreeMap<DyadicInterval, Resolution> {
    stream.inspect(|tree| {
        tree.iter()
            .map(|(key, node)| (*key, node.accuracy()))
            .collect()
    })
}

#[test]
fn unit_interval_on_empty_cache_splits_two_levels() {
    let path = sample_path(16, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    let unit = DyadicInterval::new(0, 0);

    let lsig = stream.log_signature(unit, 2, &path).expect("query succeeds");

    let stats = stream.stats();
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.fresh_computations, 1, "only the root is computed fresh");
    assert_eq!(stats.root_expansions, 0);
    assert_eq!(stats.splits, 3);

    assert_eq!(stream.root(), Some(unit));
    assert_eq!(stream.len(), 7);
    assert_eq!(stream.accuracy_of(&unit), Some(2));
    for offset in 0..4 {
        let leaf = DyadicInterval::new(offset, 2);
        assert_eq!(stream.accuracy_of(&leaf), Some(2), "leaf {}", leaf);
    }

    // Halving then recombining leaves the root value intact.
    assert_lie_close(&lsig, &path.log_signature_over(0.0, 1.0));
    assert_tree_invariants(&stream);
}

#[test]
fn zero_resolution_needs_no_splitting() {
    let path = sample_path(8, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    let unit = DyadicInterval::new(0, 0);

    stream.log_signature(unit, 0, &path).unwrap();
    assert_eq!(stream.len(), 1);
    assert_eq!(stream.stats().splits, 0);

    stream.log_signature(unit, 0, &path).unwrap();
    assert_eq!(stream.stats().hits, 1);
    assert_eq!(stream.len(), 1);
}

#[test]
fn repeated_query_is_a_pure_hit() {
    let path = sample_path(32, 3, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    let interval = DyadicInterval::new(5, 3);

    let first = stream.log_signature(interval, 6, &path).unwrap();
    let fingerprint = stream.fingerprint();
    let before = stream.stats();

    let second = stream.log_signature(interval, 6, &path).unwrap();
    let delta = stream.stats().since(&before);

    assert_eq!(first, second);
    assert_eq!(fingerprint, stream.fingerprint());
    assert_eq!(delta.queries, 1);
    assert_eq!(delta.hits, 1);
    assert_eq!(delta.mutations(), 0);
    assert_eq!(delta.fresh_computations, 0);

    // A coarser request is satisfied by the same node.
    let coarser = stream.log_signature(interval, 4, &path).unwrap();
    assert_eq!(coarser, first);
    assert_eq!(fingerprint, stream.fingerprint());
}

#[test]
fn accuracy_never_decreases() {
    let path = sample_path(64, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    let queries = [
        (DyadicInterval::new(3, 3), 5),
        (DyadicInterval::new(0, 0), 2),
        (DyadicInterval::new(1, 1), 6),
        (DyadicInterval::new(0, 2), 3),
        (DyadicInterval::new(12, 4), 4),
        (DyadicInterval::new(0, 0), 7),
    ];

    let mut previous = BTreeMap::new();
    for (interval, resolution) in queries {
        stream.log_signature(interval, resolution, &path).unwrap();
        let current = accuracies(&stream);
        for (key, accuracy) in &previous {
            let now = current.get(key).copied().expect("nodes are never removed");
            assert!(now >= *accuracy, "{} regressed from {} to {}", key, accuracy, now);
        }
        assert!(current[&interval] >= resolution.max(interval.power()));
        previous = current;
    }
}

#[test]
fn root_contains_every_queried_interval() {
    let path = exact_path(40);
    let stream = DynamicStream::new(StreamConfig::default());
    let queried = [
        DyadicInterval::new(5, 4),
        DyadicInterval::new(0, 3),
        DyadicInterval::new(3, 2),
        DyadicInterval::new(1, 0),
        DyadicInterval::new(9, 5),
    ];

    for (i, interval) in queried.iter().enumerate() {
        stream.log_signature(*interval, 5, &path).unwrap();
        let root = stream.root().expect("root exists after a query");
        for earlier in &queried[..=i] {
            assert!(root.contains(earlier), "root {} lost {}", root, earlier);
        }
        assert_tree_invariants(&stream);
    }
}

#[test]
fn expansion_to_the_right_adds_one_neighbour_per_step() {
    let path = exact_path(32);
    let stream = DynamicStream::new(StreamConfig::default());
    stream
        .log_signature(DyadicInterval::new(0, 3), 3, &path)
        .unwrap();
    assert_eq!(stream.root(), Some(DyadicInterval::new(0, 3)));

    let before = stream.stats();
    let nodes_before = stream.len();
    let target = DyadicInterval::new(3, 2);
    let lsig = stream.log_signature(target, 2, &path).unwrap();
    let delta = stream.stats().since(&before);

    assert_eq!(delta.root_expansions, 3);
    assert_eq!(delta.splits, 1);
    // Each expansion adds a neighbour and a new root; the final split adds two.
    assert_eq!(stream.len(), nodes_before + 2 * 3 + 2);
    assert_eq!(delta.fresh_computations, 3);
    assert_eq!(stream.root(), Some(DyadicInterval::new(0, 0)));
    for neighbour in [(1, 3), (1, 2), (1, 1)] {
        let key = DyadicInterval::new(neighbour.0, neighbour.1);
        assert!(stream.value_of(&key).is_some(), "missing neighbour {}", key);
    }

    assert_lie_close(&lsig, &path.log_signature_over(0.75, 1.0));
    assert_lie_close(
        &stream.value_of(&DyadicInterval::new(0, 0)).unwrap(),
        &path.log_signature_over(0.0, 1.0),
    );
    assert_tree_invariants(&stream);
}

#[test]
fn expansion_to_the_left_orders_the_combine() {
    let path = exact_path(32);
    let stream = DynamicStream::new(StreamConfig::default());
    stream
        .log_signature(DyadicInterval::new(3, 2), 2, &path)
        .unwrap();

    let lsig = stream
        .log_signature(DyadicInterval::new(0, 2), 2, &path)
        .unwrap();

    assert_eq!(stream.stats().root_expansions, 2);
    assert_eq!(stream.root(), Some(DyadicInterval::new(0, 0)));
    assert_lie_close(&lsig, &path.log_signature_over(0.0, 0.25));
    assert_lie_close(
        &stream.value_of(&DyadicInterval::new(1, 1)).unwrap(),
        &path.log_signature_over(0.5, 1.0),
    );
    assert_tree_invariants(&stream);
}

#[test]
fn negative_half_line_cannot_join_positive_root() {
    let path = sample_path(8, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    stream
        .log_signature(DyadicInterval::new(0, 0), 1, &path)
        .unwrap();
    let fingerprint = stream.fingerprint();

    let result = stream.log_signature(DyadicInterval::new(-1, 0), 1, &path);
    assert!(matches!(result, Err(StreamError::RootUnreachable { .. })));
    assert_eq!(fingerprint, stream.fingerprint());

    // A fresh stream may live entirely below zero.
    let negative = DynamicStream::new(StreamConfig::default());
    let lsig = negative
        .log_signature(DyadicInterval::new(-3, 2), 3, &path)
        .unwrap();
    assert_eq!(lsig, TruncatedLie::zero(2, 2));
}

#[test]
fn non_dyadic_query_combines_pieces_without_caching_the_result() {
    let path = exact_path(24);
    let stream = DynamicStream::new(StreamConfig::default());
    let interval = RealInterval::new(0.25, 0.75).unwrap();

    let first = stream.log_signature(interval, 2, &path).unwrap();
    assert_eq!(stream.stats().queries, 2);
    assert_eq!(stream.stats().hits, 0);
    assert!(stream.value_of(&DyadicInterval::new(1, 2)).is_some());
    assert!(stream.value_of(&DyadicInterval::new(2, 2)).is_some());
    assert_lie_close(&first, &path.log_signature_over(0.25, 0.75));

    let nodes = stream.len();
    let before = stream.stats();
    let second = stream.log_signature(interval, 2, &path).unwrap();
    let delta = stream.stats().since(&before);

    assert_eq!(first, second);
    assert_eq!(delta.queries, 2);
    assert_eq!(delta.hits, 2);
    assert_eq!(delta.mutations(), 0);
    assert_eq!(stream.len(), nodes);
}

#[test]
fn skipping_accurate_subtrees_does_not_change_results() {
    let path = sample_path(50, 2, 2);
    let skipping = DynamicStream::new(StreamConfig::default());
    let walking = DynamicStream::new(StreamConfig::default().with_subtree_skipping(false));

    let dyadic = [
        (DyadicInterval::new(1, 2), 4),
        (DyadicInterval::new(0, 0), 3),
        (DyadicInterval::new(0, 0), 6),
        (DyadicInterval::new(7, 3), 5),
        (DyadicInterval::new(0, 1), 6),
    ];
    for (interval, resolution) in dyadic {
        let a = skipping.log_signature(interval, resolution, &path).unwrap();
        let b = walking.log_signature(interval, resolution, &path).unwrap();
        assert_eq!(a, b, "diverged at {}", interval);
    }

    for (inf, sup) in [(0.1, 0.9), (0.3, 0.35), (0.0, 0.5)] {
        let interval = RealInterval::new(inf, sup).unwrap();
        let a = skipping.log_signature(interval, 6, &path).unwrap();
        let b = walking.log_signature(interval, 6, &path).unwrap();
        assert_eq!(a, b, "diverged at {}", interval);
    }

    assert_eq!(skipping.fingerprint(), walking.fingerprint());
}

#[test]
fn split_children_recombine_to_the_parent() {
    let path = sample_path(37, 3, 2);
    for (offset, power) in [(0, 0), (1, 1), (5, 3), (2, 2)] {
        let parent = DyadicInterval::new(offset, power);
        let (left, right) = parent.children();
        let whole = path.compute_leaf_increment(&parent).unwrap();
        let l = path.compute_leaf_increment(&left).unwrap();
        let r = path.compute_leaf_increment(&right).unwrap();

        assert_lie_close(&path.combine(&l, &r, Alignment::Aligned), &whole);
        assert_lie_close(&path.combine(&r, &l, Alignment::NotAligned), &whole);
    }
}

#[test]
fn halving_refinement_preserves_the_root_value() {
    let path = sample_path(20, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());
    let unit = DyadicInterval::new(0, 0);

    let coarse = stream.log_signature(unit, 0, &path).unwrap();
    let fine = stream.log_signature(unit, 4, &path).unwrap();

    assert_eq!(stream.len(), 31);
    assert_lie_close(&fine, &coarse);
}

#[test]
fn exact_refinement_matches_direct_computation() {
    let path = exact_path(100);
    let stream = DynamicStream::new(StreamConfig::default());

    for (offset, power) in [(0, 0), (3, 3), (6, 4), (1, 1)] {
        let interval = DyadicInterval::new(offset, power);
        let lsig = stream.log_signature(interval, 7, &path).unwrap();
        assert_lie_close(&lsig, &path.log_signature_over(interval.inf(), interval.sup()));
    }
    assert_tree_invariants(&stream);
}

#[test]
fn resolution_limit_is_enforced() {
    let path = sample_path(4, 2, 2);
    let config = StreamConfig::default().with_max_resolution(4).unwrap();
    let stream = DynamicStream::new(config);

    let too_fine = stream.log_signature(DyadicInterval::new(0, 0), 5, &path);
    assert!(matches!(
        too_fine,
        Err(StreamError::ResolutionTooFine { requested: 5, max: 4 })
    ));

    let too_small = stream.log_signature(DyadicInterval::new(0, 6), 2, &path);
    assert!(matches!(too_small, Err(StreamError::ResolutionTooFine { .. })));

    let real = RealInterval::new(0.0, 0.3).unwrap();
    assert!(stream.log_signature(real, 9, &path).is_err());
    assert!(stream.is_empty());
}

#[test]
fn distant_offsets_are_rejected_before_refinement() {
    let path = sample_path(8, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());

    // t ≈ 2.1e9 refined to 2^-32 would need offsets near 2^63.
    let distant = DyadicInterval::new(1i64 << 31, 0);
    let result = stream.log_signature(distant, 32, &path);
    assert!(matches!(
        result,
        Err(StreamError::OffsetOutOfRange { interval, resolution: 32 }) if interval == distant
    ));
    assert!(stream.is_empty());

    let negative = DyadicInterval::new(-(1i64 << 40), 0);
    assert!(matches!(
        stream.log_signature(negative, 13, &path),
        Err(StreamError::OffsetOutOfRange { .. })
    ));

    // The same point at a coarse resolution stays within range.
    let lsig = stream.log_signature(distant, 4, &path).unwrap();
    assert_eq!(lsig, TruncatedLie::zero(2, 2));
    assert_eq!(stream.accuracy_of(&distant), Some(4));
}

#[test]
fn offset_limit_matches_the_dissection_grid() {
    let path = sample_path(8, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());

    // Last grid cell below 2^52 is allowed; the next one is not.
    let last = DyadicInterval::new((1i64 << 52) - 1, 0);
    assert!(stream.log_signature(last, 0, &path).is_ok());

    let beyond = DyadicInterval::new(1i64 << 52, 0);
    assert!(matches!(
        stream.log_signature(beyond, 0, &path),
        Err(StreamError::OffsetOutOfRange { .. })
    ));
}

#[test]
fn failed_leaf_computation_leaves_the_cache_empty() {
    let path = sample_path(8, 2, 2);
    let stream = DynamicStream::new(StreamConfig::default());

    let unbounded = DyadicInterval::new(1, -1100);
    let result = stream.log_signature(unbounded, -1100, &path);
    assert!(matches!(result, Err(StreamError::Computation { .. })));
    assert!(stream.is_empty());
    assert_eq!(stream.stats().fresh_computations, 0);
}
