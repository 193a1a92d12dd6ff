// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module defines the most basic data types that are used throughout all
//! the code of our solver (both at the abstraction and implementation levels).

use std::ops::Range;

use smallbitset::Set32;

/// The maximum number of cities an instance may comprise. Every fixed-size
/// buffer in the solver (tour prefixes, visited masks) is dimensioned against
/// this constant, and the instance parser rejects anything larger.
pub const MAX_CITIES: usize = 18;

/// A city is identified by an integer in `[0, N)`. City 0 is the fixed origin
/// of every tour.
pub type City = usize;

/// The cost of an edge, of a partial tour, or of a complete tour. Distances
/// are non-negative integers, so any sum of at most `MAX_CITIES` of them fits
/// comfortably in an `isize`.
pub type Cost = isize;

/// The sentinel standing for "no tour known yet". Every best-cost cell starts
/// at this value and only ever decreases.
pub const INFINITY: Cost = Cost::MAX;

// ----------------------------------------------------------------------------
// --- TASK -------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A task is the root of a search subtree: a partial tour starting at the
/// origin which some worker must extend in every possible way. Root-level
/// tasks commit to one "first hop" city (they have depth 2); deeper tasks may
/// appear when a search is re-seeded.
///
/// # Invariants
/// Whenever a task is handed to the search engine the following must hold:
///   + `visited.len() == depth`,
///   + the set bits of `visited` are exactly `{path[0], .., path[depth-1]}`,
///   + `cost` is the sum of the `depth - 1` edges implied by `path`,
///   + `lower_bound >= cost` (it underestimates any completion of the tour).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// The number of cities on the tour prefix (the origin included).
    pub depth: usize,
    /// The cumulated cost of the prefix.
    pub cost: Cost,
    /// The last city of the prefix (`path[depth - 1]`).
    pub city: City,
    /// The set of cities already placed on the prefix.
    pub visited: Set32,
    /// The explicit prefix, so that complete tours can be reconstructed.
    /// Only the first `depth` slots are meaningful.
    pub path: [City; MAX_CITIES],
    /// An admissible lower bound on the cost of any tour extending this
    /// prefix, as computed by the bound in use for the current search.
    pub lower_bound: Cost,
}

// ----------------------------------------------------------------------------
// --- PARTITIONING -----------------------------------------------------------
// ----------------------------------------------------------------------------
/// Returns the contiguous range of indices owned by `index` when `total` items
/// are split across `parts` owners in the standard balanced way: the first
/// `total % parts` owners receive one extra item and nobody receives more than
/// `ceil(total / parts)`.
///
/// This single rule is used both to assign first-hop tasks to workers and to
/// assign a worker's tasks to its threads, which makes the work distribution
/// fully deterministic. Owners whose range is empty simply have nothing to do
/// (this naturally happens when `parts > total`).
pub fn balanced_range(total: usize, parts: usize, index: usize) -> Range<usize> {
    let base = total / parts;
    let extra = total % parts;
    let start = index * base + index.min(extra);
    let length = base + usize::from(index < extra);
    start..(start + length)
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_balanced_range {
    use super::balanced_range;

    fn sizes(total: usize, parts: usize) -> Vec<usize> {
        (0..parts).map(|i| balanced_range(total, parts, i).len()).collect()
    }

    #[test]
    fn covers_every_item_exactly_once() {
        for total in 0..20 {
            for parts in 1..10 {
                let mut owned = vec![];
                for i in 0..parts {
                    owned.extend(balanced_range(total, parts, i));
                }
                assert_eq!(owned, (0..total).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn first_ranks_get_the_extra_items() {
        assert_eq!(vec![3, 3, 2, 2], sizes(10, 4));
        assert_eq!(vec![1, 1, 1], sizes(3, 3));
        assert_eq!(vec![5], sizes(5, 1));
    }

    #[test]
    fn surplus_ranks_get_an_empty_range() {
        assert_eq!(vec![1, 1, 0, 0, 0], sizes(2, 5));
        assert!(balanced_range(2, 5, 4).is_empty());
    }

    #[test]
    fn nobody_exceeds_the_ceiling() {
        for total in 0..30usize {
            for parts in 1..12usize {
                let ceil = total.div_ceil(parts);
                assert!(sizes(total, parts).iter().all(|&s| s <= ceil));
            }
        }
    }
}
