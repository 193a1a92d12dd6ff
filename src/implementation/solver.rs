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

//! This module provides the distributed coordinator: the per-worker facade
//! which seeds the search, drives the intra-worker threads, and combines the
//! workers' results into the global optimum.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use log::{debug, info};
use smallbitset::Set32;

use crate::{
    balanced_range, City, Communicator, Cost, DistanceMatrix, LowerBound, ParallelDriver,
    SearchContext, SharedBest, Task, MAX_CITIES,
};

/// The outcome of a distributed search, as seen by one worker. The cost and
/// timing are known to everyone; the winning tour only reaches rank 0, which
/// is the one rank supposed to report.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The globally optimal tour cost (the `INFINITY` sentinel when no tour
    /// was found, which cannot happen on a well-formed instance).
    pub best_cost: Cost,
    /// The optimal tour, origin to origin. `Some` on rank 0 only (provided a
    /// tour exists). When several workers tie on the optimum, the tour of
    /// the lowest ranked one is retained.
    pub tour: Option<Vec<City>>,
    /// Wall-clock time from just before seeding to just after the results
    /// were combined.
    pub elapsed: Duration,
    /// The number of cooperating workers.
    pub ranks: usize,
}

/// One worker of the distributed branch-and-bound search. Every rank of the
/// world runs its own instance of this solver; they cooperate in exactly
/// three points: the initial broadcast of the instance, the final minimum
/// reduction, and the final gathering of the winning tour. In between, each
/// worker expands only the first-hop subtrees it owns, with no exchange of
/// best costs (the final reduction is authoritative; on instances this size
/// the searches are too short for mid-flight tightening to pay off).
pub struct DistributedSolver<'a, B, C> {
    comm: &'a C,
    driver: ParallelDriver,
    _phantom: PhantomData<B>,
}

impl<'a, B, C> DistributedSolver<'a, B, C>
where
    B: LowerBound + Sync + for<'b> From<&'b DistanceMatrix>,
    C: Communicator,
{
    /// Creates a worker tied to the given communication handle, using one
    /// search thread per hardware thread.
    pub fn new(comm: &'a C) -> Self {
        Self {
            comm,
            driver: ParallelDriver::new(),
            _phantom: PhantomData,
        }
    }

    /// Creates a worker tied to the given communication handle, using
    /// exactly `nb_threads` search threads.
    pub fn custom(comm: &'a C, nb_threads: usize) -> Self {
        Self {
            comm,
            driver: ParallelDriver::custom(nb_threads),
            _phantom: PhantomData,
        }
    }

    /// Runs the whole distributed search. Rank 0 passes the instance it
    /// parsed, every other rank passes `None` and receives its copy through
    /// the broadcast. All ranks return the same optimal cost; the optimal
    /// tour itself is returned on rank 0 only.
    pub fn minimize(&self, matrix: Option<DistanceMatrix>) -> Completion {
        let instance = self.comm.broadcast_matrix(matrix);
        let bound = B::from(&instance);
        let best = SharedBest::new();

        let start = Instant::now();
        let seeds = self.own_seeds(&instance, &bound);
        if self.comm.rank() == 0 {
            info!(
                "distributed search: {} ranks, {} threads per rank, {} first-hop tasks",
                self.comm.world_size(),
                self.driver.nb_threads(),
                instance.nb_cities().saturating_sub(1)
            );
            if instance.nb_cities() == 1 {
                // nowhere to go: the only tour stays home for free
                best.try_improve(0, &[0, 0]);
            }
        }

        let context = SearchContext::new(&instance, &bound, &best);
        self.driver.search(&context, &seeds);

        let (local_cost, local_tour) = best.snapshot();
        debug!("rank {} done, local best {}", self.comm.rank(), local_cost);
        let best_cost = self.comm.reduce_min(local_cost);
        let tour = self.comm.gather_winner(local_cost, &local_tour, best_cost);
        let elapsed = start.elapsed();

        Completion {
            best_cost,
            tour,
            elapsed,
            ranks: self.comm.world_size(),
        }
    }

    /// The first-hop tasks this worker owns. The `N - 1` possible first hops
    /// are numbered `1..N` and split across the world in balanced contiguous
    /// ranges, so every task has exactly one owner and the assignment needs
    /// no negotiation. Workers beyond the task count own an empty range.
    fn own_seeds(&self, instance: &DistanceMatrix, bound: &B) -> Vec<Task> {
        let n = instance.nb_cities();
        if n <= 1 {
            return vec![];
        }
        balanced_range(n - 1, self.comm.world_size(), self.comm.rank())
            .map(|i| Self::first_hop(instance, bound, i + 1))
            .collect()
    }

    /// The root-level task committing to `0 -> city` as first edge.
    fn first_hop(instance: &DistanceMatrix, bound: &B, city: City) -> Task {
        let mut visited = Set32::empty();
        visited.add_inplace(0);
        visited.add_inplace(city);
        let mut path = [0; MAX_CITIES];
        path[1] = city;
        let cost = instance.between(0, city);
        Task {
            depth: 2,
            cost,
            city,
            visited,
            path,
            lower_bound: bound.from_scratch(cost, visited),
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
