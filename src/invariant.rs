//! Majority-SCC invariant evaluator
//!
//! The server tracks a single derived boolean: does any strongly
//! connected component hold a strict majority of the graph's vertices?

/// True iff the largest component holds strictly more than half of the
/// `n` vertices.
///
/// Strict majority: a component of exactly `n / 2` vertices does not
/// count (n = 4 with a largest component of 2 is `false`). The check is
/// `2 * max > n` to keep the boundary exact over integers.
pub fn majority_exists(partition: &[Vec<usize>], n: usize) -> bool {
    partition
        .iter()
        .map(Vec::len)
        .max()
        .is_some_and(|max| 2 * max > n)
}
