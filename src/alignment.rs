//! Levenshtein alignment over symbol sequences.
//!
//! All variants use unit costs for insertion, deletion and substitution and
//! report `max(dp[len1][len2], |len1 - len2|)`.

use crate::symbols::Symbol;

/// Edit distance between two arbitrary equatable sequences.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j]
            } else {
                let replace = prev[j] + 1;
                let insert = prev[j + 1] + 1;
                let delete = curr[j] + 1;
                replace.min(insert).min(delete)
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()].max(a.len().abs_diff(b.len()))
}

/// Distance between the whole query and `log[start..end)`.
///
/// `end` is clamped to the log length and `start` to `end`, so callers may
/// pass windows that run off the end of the log.
pub fn window_edit_distance(query: &[Symbol], log: &[Symbol], start: usize, end: usize) -> usize {
    let end = end.min(log.len());
    let start = start.min(end);
    edit_distance(query, &log[start..end])
}

/// Distance between `a[start1..end1)` and `b[start2..end2)`.
///
/// Both end bounds are clamped to the first sequence's clamped end as well as
/// to their own lengths.
pub fn vector_edit_distance<T: PartialEq>(
    a: &[T],
    b: &[T],
    start1: usize,
    end1: usize,
    start2: usize,
    end2: usize,
) -> usize {
    let end1 = end1.min(a.len());
    let end2 = end2.min(end1).min(b.len());
    let start1 = start1.min(end1);
    let start2 = start2.min(end2);
    edit_distance(&a[start1..end1], &b[start2..end2])
}
