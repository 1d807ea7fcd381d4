#![forbid(unsafe_code)]

//! Array and set helpers: ranges, shuffling, circular moves, zipping.
//!
//! These are internal-helper grade: they assume well-formed input from this
//! core's own consumers and do not defensively validate.

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use rand::{Rng, RngExt};

/// Index sequence `[0, len)` for a slice.
#[must_use]
pub fn index_range<T>(items: &[T]) -> Vec<i64> {
    (0..items.len() as i64).collect()
}

/// `[0, to)` stepping toward `to`: `range_to(3)` is `[0, 1, 2]`,
/// `range_to(-3)` is `[0, -1, -2]`.
#[must_use]
pub fn range_to(to: i64) -> Vec<i64> {
    range_between(0, to)
}

/// `[from, to)` with the step direction inferred: `range_between(0, 5)` is
/// `[0, 1, 2, 3, 4]`, `range_between(5, 0)` is `[5, 4, 3, 2, 1]`.
#[must_use]
pub fn range_between(from: i64, to: i64) -> Vec<i64> {
    let step = if to >= from { 1 } else { -1 };
    range_stepped(from, to, step)
}

/// `[from, to)` with an explicit step. The sign of `step` is taken as
/// given: when it opposes the direction from `from` to `to` (or is zero),
/// the sequence is empty.
#[must_use]
pub fn range_stepped(from: i64, to: i64, step: i64) -> Vec<i64> {
    let mut out = Vec::new();
    if step == 0 {
        return out;
    }
    let mut v = from;
    while (step > 0 && v < to) || (step < 0 && v > to) {
        out.push(v);
        v += step;
    }
    out
}

/// In-place Fisher–Yates shuffle. Every permutation is equally likely given
/// a uniform `rng`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// True iff both sets have the same cardinality and membership.
#[must_use]
pub fn are_sets_equal<T: Eq + Hash, S: BuildHasher>(a: &HashSet<T, S>, b: &HashSet<T, S>) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

/// Move the element at `from` to immediately before position `to`, treating
/// both as positions on a circular index space: `from` wraps modulo `len`,
/// `to` wraps modulo `len + 1`. No-op when the positions coincide after
/// wrapping.
pub fn shift<T>(items: &mut [T], from: i64, to: i64) {
    let len = items.len() as i64;
    if len == 0 {
        return;
    }
    let from = from.rem_euclid(len) as usize;
    let to = to.rem_euclid(len + 1) as usize;
    if from == to {
        return;
    }
    if from < to {
        // Element travels right; the insertion point shifts left by one
        // once the element is removed.
        items[from..to].rotate_left(1);
    } else {
        items[to..=from].rotate_right(1);
    }
}

/// Pair up two sequences index-by-index, stopping at the shorter one.
pub fn zip2<A, B>(
    a: impl IntoIterator<Item = A>,
    b: impl IntoIterator<Item = B>,
) -> impl Iterator<Item = (A, B)> {
    a.into_iter().zip(b)
}

/// Triple up three sequences index-by-index, stopping at the shortest.
pub fn zip3<A, B, C>(
    a: impl IntoIterator<Item = A>,
    b: impl IntoIterator<Item = B>,
    c: impl IntoIterator<Item = C>,
) -> impl Iterator<Item = (A, B, C)> {
    a.into_iter()
        .zip(b.into_iter().zip(c))
        .map(|(a, (b, c))| (a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn range_family() {
        assert_eq!(range_between(0, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(range_between(5, 0), vec![5, 4, 3, 2, 1]);
        assert_eq!(index_range(&[1, 2, 3]), vec![0, 1, 2]);
        assert_eq!(range_to(3), vec![0, 1, 2]);
        assert_eq!(range_to(-3), vec![0, -1, -2]);
        assert_eq!(range_stepped(0, 10, 3), vec![0, 3, 6, 9]);
        assert_eq!(range_stepped(10, 0, -4), vec![10, 6, 2]);
    }

    #[test]
    fn range_wrong_step_sign_is_empty() {
        assert!(range_stepped(0, 5, -1).is_empty());
        assert!(range_stepped(5, 0, 1).is_empty());
        assert!(range_stepped(0, 5, 0).is_empty());
    }

    #[test]
    fn range_empty_when_bounds_equal() {
        assert!(range_between(3, 3).is_empty());
        assert!(range_to(0).is_empty());
        assert!(index_range::<i32>(&[]).is_empty());
    }

    #[test]
    fn shift_documented_examples() {
        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, 2, 4);
        assert_eq!(a, [1, 2, 4, 3, 5]);

        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, 4, 0);
        assert_eq!(a, [5, 1, 2, 3, 4]);

        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, 1, 5);
        assert_eq!(a, [1, 3, 4, 5, 2]);

        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, 1, 4);
        assert_eq!(a, [1, 3, 4, 2, 5]);
    }

    #[test]
    fn shift_wraps_negative_and_oversized_indices() {
        // from = -3 wraps to 2, to = 4: same as the first documented example.
        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, -3, 4);
        assert_eq!(a, [1, 2, 4, 3, 5]);

        // to = 10 wraps modulo len + 1 = 6 to 4.
        let mut a = [1, 2, 3, 4, 5];
        shift(&mut a, 1, 10);
        assert_eq!(a, [1, 3, 4, 2, 5]);
    }

    #[test]
    fn shift_noop_cases() {
        let mut a = [1, 2, 3];
        shift(&mut a, 1, 1);
        assert_eq!(a, [1, 2, 3]);

        let mut empty: [i32; 0] = [];
        shift(&mut empty, 0, 5);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut items: Vec<u32> = (0..100).collect();
        shuffle(&mut items, &mut rng);
        assert_eq!(items.len(), 100);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_trivial_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<i32> = vec![];
        shuffle(&mut empty, &mut rng);
        let mut one = vec![9];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![9]);
    }

    #[test]
    fn set_equality() {
        use ahash::AHashSet;
        let a: AHashSet<i32> = [1, 2].into_iter().collect();
        let b: AHashSet<i32> = [2, 1].into_iter().collect();
        let c: AHashSet<i32> = [1].into_iter().collect();
        assert!(are_sets_equal(&a, &b));
        assert!(!are_sets_equal(&c, &a));
        assert!(!are_sets_equal(&a, &c));
    }

    #[test]
    fn zip_stops_at_shortest() {
        let pairs: Vec<_> = zip2([1, 2, 3], ["a", "b"]).collect();
        assert_eq!(pairs, vec![(1, "a"), (2, "b")]);

        let triples: Vec<_> = zip3([1, 2], ["a", "b", "c"], [true]).collect();
        assert_eq!(triples, vec![(1, "a", true)]);
    }
}
