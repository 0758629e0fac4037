use crate::random::RandomSource;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::hash::Hash;

/// Remove duplicates, keeping the first occurrence of each item.
///
/// # Examples
///
/// ```
/// use grabbag_util::array::unique;
///
/// assert_eq!(unique(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
/// ```
pub fn unique<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().filter(|item| seen.insert(*item)).cloned().collect()
}

/// Split into chunks of `size` items; the last chunk may be shorter.
///
/// A `size` of zero yields no chunks.
///
/// # Examples
///
/// ```
/// use grabbag_util::array::chunk;
///
/// assert_eq!(chunk(&[1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
/// assert!(chunk(&[1, 2, 3], 0).is_empty());
/// ```
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Shuffled copy using the thread-local RNG.
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(&mut rand::thread_rng());
    out
}

/// Shuffled copy using the given source.
pub fn shuffle_with<T: Clone>(items: &[T], source: &RandomSource) -> Vec<T> {
    let mut out = items.to_vec();
    source.shuffle(&mut out);
    out
}

/// A random item, `None` when empty.
pub fn sample<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

pub fn sample_with<'a, T>(items: &'a [T], source: &RandomSource) -> Option<&'a T> {
    source.index(items.len()).map(|i| &items[i])
}
