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

//! This module provides the search engine proper: a branch-and-bound
//! depth-first enumeration over an explicit stack, pruned against a best-cost
//! cell shared by all the threads of a worker.

use std::sync::atomic::{AtomicIsize, Ordering};

use parking_lot::Mutex;
use smallbitset::Set32;

use crate::{City, Cost, DistanceMatrix, LowerBound, Task, INFINITY, MAX_CITIES};

/// The initial capacity of each thread's stack. The stack grows by doubling
/// when this does not suffice; should that allocation ever fail the whole
/// process aborts, which is this solver's (documented) answer to running out
/// of memory mid-search.
const INIT_STACK_CAPACITY: usize = 1 << 15;

// ----------------------------------------------------------------------------
// --- SHARED BEST ------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The best solution found so far by any thread of this worker. This is the
/// only mutable state the search threads share, and the discipline around it
/// is asymmetric on purpose:
///
///   + the pruning fast path reads the cost through a relaxed atomic. A stale
///     value merely lets a thread explore a few nodes that a fresher value
///     would have pruned; it can never make the result wrong.
///   + improving writes take the mutex, *re-check* that they still improve,
///     and only then commit the cost together with its tour. Readers of the
///     locked pair therefore never observe a torn tour, and the cost is
///     monotonically non-increasing for the lifetime of the search.
#[derive(Debug)]
pub struct SharedBest {
    cost: AtomicIsize,
    critical: Mutex<Incumbent>,
}

/// The data that may only be manipulated within critical sections: the cost
/// of the best tour and the tour itself, which must be updated as one.
#[derive(Debug)]
struct Incumbent {
    cost: Cost,
    tour: Vec<City>,
}

impl Default for SharedBest {
    fn default() -> Self {
        Self {
            cost: AtomicIsize::new(INFINITY),
            critical: Mutex::new(Incumbent {
                cost: INFINITY,
                tour: vec![],
            }),
        }
    }
}

impl SharedBest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cost of the incumbent, possibly slightly stale. This is an upper
    /// bound on the optimum, and the value every pruning test compares
    /// against.
    #[inline]
    pub fn upper_bound(&self) -> Cost {
        self.cost.load(Ordering::Relaxed)
    }

    /// Commits `(cost, tour)` if it still improves on the incumbent at the
    /// time the lock is held. Returns true when the commit took place. Racing
    /// improvements may interleave in any order; the re-check under the lock
    /// guarantees the cell only ever gets better.
    pub fn try_improve(&self, cost: Cost, tour: &[City]) -> bool {
        let mut critical = self.critical.lock();
        if cost < critical.cost {
            critical.cost = cost;
            critical.tour.clear();
            critical.tour.extend_from_slice(tour);
            self.cost.store(cost, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// The incumbent as a consistent pair. The tour is empty as long as no
    /// complete tour has been committed (in which case the cost is the
    /// `INFINITY` sentinel).
    pub fn snapshot(&self) -> (Cost, Vec<City>) {
        let critical = self.critical.lock();
        (critical.cost, critical.tour.clone())
    }
}

// ----------------------------------------------------------------------------
// --- SEARCH CONTEXT ---------------------------------------------------------
// ----------------------------------------------------------------------------
/// A node of the search tree as it lives on the explicit stack. It carries
/// the same information as a `Task` (of which it is merely the in-search
/// representation); keeping it `Copy` is what makes pushing children cheap.
#[derive(Debug, Clone, Copy)]
struct Node {
    city: City,
    depth: usize,
    cost: Cost,
    visited: Set32,
    lower_bound: Cost,
    path: [City; MAX_CITIES],
}

impl From<&Task> for Node {
    fn from(t: &Task) -> Self {
        Node {
            city: t.city,
            depth: t.depth,
            cost: t.cost,
            visited: t.visited,
            lower_bound: t.lower_bound,
            path: t.path,
        }
    }
}

/// Everything a search thread needs to enumerate tours: the (read-only)
/// distance model, the pruning bound, and the worker's shared best cell.
/// One context is built per worker and borrowed by each of its threads;
/// the stack itself is thread-local and lives inside `explore`.
#[derive(Debug)]
pub struct SearchContext<'a, B> {
    instance: &'a DistanceMatrix,
    bound: &'a B,
    best: &'a SharedBest,
}

impl<'a, B> Clone for SearchContext<'a, B> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, B> Copy for SearchContext<'a, B> {}

impl<'a, B: LowerBound> SearchContext<'a, B> {
    pub fn new(instance: &'a DistanceMatrix, bound: &'a B, best: &'a SharedBest) -> Self {
        Self {
            instance,
            bound,
            best,
        }
    }

    /// Exhausts the subtrees rooted at the given seeds, committing every
    /// strictly improving complete tour to the shared cell along the way.
    /// Seeds must satisfy the `Task` invariants and have `depth >= 2`.
    pub fn explore(&self, seeds: &[Task]) {
        let n = self.instance.nb_cities();
        let mut stack = Vec::with_capacity(INIT_STACK_CAPACITY);

        // pushed in reverse so the first seed is explored first
        for task in seeds.iter().rev() {
            debug_assert!(task.depth >= 2);
            debug_assert_eq!(task.depth, task.visited.len());
            stack.push(Node::from(task));
        }

        while let Some(node) = stack.pop() {
            let incumbent = self.best.upper_bound();
            if node.cost >= incumbent || node.lower_bound >= incumbent {
                continue;
            }
            if node.depth == n {
                self.close_tour(&node);
            } else {
                self.expand(&node, incumbent, &mut stack);
            }
        }
    }

    /// The tour is complete except for the closing edge back to the origin.
    /// Pay it, and commit when the total still improves.
    fn close_tour(&self, node: &Node) {
        let n = self.instance.nb_cities();
        let total = node.cost + self.instance.between(node.city, 0);
        if total < self.best.upper_bound() {
            let mut tour = Vec::with_capacity(n + 1);
            tour.extend_from_slice(&node.path[..n]);
            tour.push(0);
            self.best.try_improve(total, &tour);
        }
    }

    /// Pushes the children of `node` that survive the bound tests, cheapest
    /// outgoing edge last so that it is popped first. Visiting siblings in
    /// non-decreasing edge order finds short tours early, which tightens the
    /// incumbent and deepens all subsequent pruning.
    fn expand(&self, node: &Node, incumbent: Cost, stack: &mut Vec<Node>) {
        let n = self.instance.nb_cities();

        let mut children = [(0 as Cost, 0 as City); MAX_CITIES];
        let mut nb_children = 0;
        for next in 0..n {
            if !node.visited.contains(next) {
                children[nb_children] = (self.instance.between(node.city, next), next);
                nb_children += 1;
            }
        }
        // ties broken by city index since the edge cost comes first
        children[..nb_children].sort_unstable();

        for &(edge, next) in children[..nb_children].iter().rev() {
            let cost = node.cost + edge;
            if cost >= incumbent {
                continue;
            }
            let mut visited = node.visited;
            visited.add_inplace(next);
            let lower_bound = self
                .bound
                .on_extension(node.lower_bound, node.city, next)
                .unwrap_or_else(|| self.bound.from_scratch(cost, visited));
            if lower_bound >= incumbent {
                continue;
            }
            // at the last level the only child is the closing edge: no point
            // pushing a node whose completion is already too expensive
            if node.depth == n - 1 && cost + self.instance.between(next, 0) >= incumbent {
                continue;
            }

            let mut child = *node;
            child.city = next;
            child.depth = node.depth + 1;
            child.cost = cost;
            child.visited = visited;
            child.lower_bound = lower_bound;
            child.path[node.depth] = next;
            stack.push(child);
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_shared_best {
    use super::*;

    #[test]
    fn starts_at_the_sentinel_with_no_tour() {
        let best = SharedBest::new();
        assert_eq!(INFINITY, best.upper_bound());
        assert_eq!((INFINITY, vec![]), best.snapshot());
    }

    #[test]
    fn commits_strict_improvements_only() {
        let best = SharedBest::new();
        assert!(best.try_improve(10, &[0, 1, 2, 0]));
        assert!(!best.try_improve(10, &[0, 2, 1, 0]));
        assert!(!best.try_improve(12, &[0, 2, 1, 0]));
        assert!(best.try_improve(9, &[0, 2, 1, 0]));
        assert_eq!((9, vec![0, 2, 1, 0]), best.snapshot());
    }

    #[test]
    fn cost_and_tour_always_move_together() {
        let best = SharedBest::new();
        best.try_improve(42, &[0, 1, 0]);
        let (cost, tour) = best.snapshot();
        assert_eq!(42, cost);
        assert_eq!(vec![0, 1, 0], tour);
        assert_eq!(cost, best.upper_bound());
    }
}

#[cfg(test)]
mod test_engine {
    use smallbitset::Set32;

    use crate::*;

    fn first_hop(inst: &DistanceMatrix, bound: &impl LowerBound, city: City) -> Task {
        let mut visited = Set32::empty();
        visited.add_inplace(0);
        visited.add_inplace(city);
        let mut path = [0; MAX_CITIES];
        path[1] = city;
        let cost = inst.between(0, city);
        Task {
            depth: 2,
            cost,
            city,
            visited,
            path,
            lower_bound: bound.from_scratch(cost, visited),
        }
    }

    fn solve_alone<B: LowerBound + for<'a> From<&'a DistanceMatrix>>(
        text: &str,
    ) -> (Cost, Vec<City>) {
        let inst: DistanceMatrix = text.parse().unwrap();
        let bound = B::from(&inst);
        let best = SharedBest::new();
        let seeds = (1..inst.nb_cities())
            .map(|city| first_hop(&inst, &bound, city))
            .collect::<Vec<_>>();
        SearchContext::new(&inst, &bound, &best).explore(&seeds);
        best.snapshot()
    }

    #[test]
    fn finds_the_optimum_of_the_triangular_instance() {
        let (cost, tour) = solve_alone::<AveragedTwoEdgeBound>("3\n1\n2 3");
        assert_eq!(6, cost);
        assert!(tour == vec![0, 1, 2, 0] || tour == vec![0, 2, 1, 0]);
    }

    #[test]
    fn finds_the_optimum_of_the_square_instance() {
        let text = "4\n0 10 15 20\n10 0 35 25\n15 35 0 30\n20 25 30 0";
        let (cost, tour) = solve_alone::<AveragedTwoEdgeBound>(text);
        assert_eq!(80, cost);
        assert_eq!(5, tour.len());
        assert_eq!(0, tour[0]);
        assert_eq!(0, tour[4]);
    }

    #[test]
    fn both_bound_schemes_agree_on_the_optimum() {
        let text = "5\n0 2 9 10 7\n2 0 6 4 3\n9 6 0 8 5\n10 4 8 0 6\n7 3 5 6 0";
        let (a, _) = solve_alone::<CheapestEdgeBound>(text);
        let (b, _) = solve_alone::<AveragedTwoEdgeBound>(text);
        assert_eq!(a, b);
    }

    #[test]
    fn two_cities_pay_the_edge_both_ways() {
        let (cost, tour) = solve_alone::<AveragedTwoEdgeBound>("2\n7");
        assert_eq!(14, cost);
        assert_eq!(vec![0, 1, 0], tour);
    }

    #[test]
    fn all_equal_distances_cost_one_edge_per_city() {
        let (cost, tour) = solve_alone::<AveragedTwoEdgeBound>("4\n1\n1 1\n1 1 1");
        assert_eq!(4, cost);
        // any hamiltonian cycle through the 4 cities is optimal
        assert_eq!(5, tour.len());
        let mut seen = tour[..4].to_vec();
        seen.sort_unstable();
        assert_eq!(vec![0, 1, 2, 3], seen);
        assert_eq!(0, tour[4]);
    }

    #[test]
    fn a_tight_incumbent_prunes_everything() {
        let inst: DistanceMatrix = "3\n1\n2 3".parse().unwrap();
        let bound = AveragedTwoEdgeBound::from(&inst);
        let best = SharedBest::new();
        best.try_improve(6, &[0, 1, 2, 0]);
        let seeds = (1..3).map(|c| first_hop(&inst, &bound, c)).collect::<Vec<_>>();
        SearchContext::new(&inst, &bound, &best).explore(&seeds);
        // the optimum was already known: nothing strictly better exists and
        // the pre-seeded tour must survive untouched
        assert_eq!((6, vec![0, 1, 2, 0]), best.snapshot());
    }

    #[test]
    fn empty_seed_list_is_a_no_op() {
        let inst: DistanceMatrix = "3\n1\n2 3".parse().unwrap();
        let bound = AveragedTwoEdgeBound::from(&inst);
        let best = SharedBest::new();
        SearchContext::new(&inst, &bound, &best).explore(&[]);
        assert_eq!(INFINITY, best.upper_bound());
    }
}
