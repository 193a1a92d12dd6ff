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

//! This module provides the intra-worker parallel driver. That is the piece
//! that will run the search engine using as many threads as requested. By
//! default, it uses as many threads as the number of hardware threads
//! available on the machine.

use log::debug;

use crate::{balanced_range, LowerBound, SearchContext, Task};

/// Fans the search engine out across a fixed pool of threads within one
/// worker. The worker's seed tasks are split into balanced contiguous ranges,
/// one per thread; each thread then runs the engine over its share with a
/// private stack, racing against its siblings through the shared best cell
/// only. There is no work redistribution: a thread whose share empties first
/// simply exits, and the driver returns once every thread has.
#[derive(Debug, Clone)]
pub struct ParallelDriver {
    nb_threads: usize,
}

impl Default for ParallelDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelDriver {
    /// Creates a driver using one thread per hardware thread of the machine.
    pub fn new() -> Self {
        Self::custom(num_cpus::get())
    }

    /// Creates a driver using exactly `nb_threads` threads (at least one).
    pub fn custom(nb_threads: usize) -> Self {
        Self {
            nb_threads: nb_threads.max(1),
        }
    }

    /// The number of threads this driver fans out to.
    pub fn nb_threads(&self) -> usize {
        self.nb_threads
    }

    /// Runs the engine over the given seeds, spreading them across the
    /// thread pool. A single-threaded driver runs the engine inline.
    pub fn search<B>(&self, context: &SearchContext<B>, seeds: &[Task])
    where
        B: LowerBound + Sync,
    {
        if self.nb_threads == 1 {
            context.explore(seeds);
            return;
        }

        debug!("fanning {} seeds out over {} threads", seeds.len(), self.nb_threads);
        std::thread::scope(|s| {
            for i in 0..self.nb_threads {
                let share = &seeds[balanced_range(seeds.len(), self.nb_threads, i)];
                let context = *context;
                s.spawn(move || context.explore(share));
            }
        });
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_driver {
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

    fn solve_with_threads(text: &str, nb_threads: usize) -> Cost {
        let inst: DistanceMatrix = text.parse().unwrap();
        let bound = AveragedTwoEdgeBound::from(&inst);
        let best = SharedBest::new();
        let seeds = (1..inst.nb_cities())
            .map(|city| first_hop(&inst, &bound, city))
            .collect::<Vec<_>>();
        let context = SearchContext::new(&inst, &bound, &best);
        ParallelDriver::custom(nb_threads).search(&context, &seeds);
        best.snapshot().0
    }

    const FIVE: &str = "5\n0 2 9 10 7\n2 0 6 4 3\n9 6 0 8 5\n10 4 8 0 6\n7 3 5 6 0";

    #[test]
    fn the_thread_count_does_not_change_the_optimum() {
        let reference = solve_with_threads(FIVE, 1);
        for nb_threads in [2, 4] {
            assert_eq!(reference, solve_with_threads(FIVE, nb_threads));
        }
    }

    #[test]
    fn more_threads_than_seeds_is_fine() {
        assert_eq!(6, solve_with_threads("3\n1\n2 3", 8));
    }

    #[test]
    fn zero_requested_threads_degrades_to_one() {
        let driver = ParallelDriver::custom(0);
        assert_eq!(1, driver.nb_threads());
    }

    #[test]
    fn by_default_it_uses_all_hw_threads() {
        let driver = ParallelDriver::new();
        assert_eq!(num_cpus::get(), driver.nb_threads());
    }
}
