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

//! This module provides `ThreadComm`, an in-process implementation of the
//! `Communicator` collectives where each rank runs on its own thread of one
//! process. Ranks synchronize on a shared monitor; there is no message
//! passing, only deposit slots read back once everyone has arrived.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{City, Communicator, Cost, DistanceMatrix, INFINITY};

/// One rank's handle on the world. All the handles of a world are created at
/// once by `split`, then each is moved to the thread that will play that
/// rank. Every collective comprises a deposit phase and a read phase, both
/// closed by a full barrier, so a rank can never race ahead and clobber a
/// slot its peers are still reading.
pub struct ThreadComm {
    rank: usize,
    shared: Arc<Shared>,
}

/// The state shared by every rank of the world: the monitor threads park on
/// while waiting for the rest of the world, and the slot data manipulated
/// within critical sections.
struct Shared {
    world: usize,
    monitor: Condvar,
    critical: Mutex<Critical>,
}

/// The data that may only be manipulated within critical sections.
struct Critical {
    /// How many ranks have reached the current barrier.
    arrived: usize,
    /// The generation counter that lets a barrier be reused: waiters sleep
    /// until the generation moves on, which the last arriving rank triggers.
    generation: usize,
    /// Deposit slot for the broadcast collective (written by rank 0).
    matrix: Option<DistanceMatrix>,
    /// Deposit slots for the reduction collective, one per rank.
    costs: Vec<Cost>,
    /// Deposit slots for the gather collective, one per rank.
    tours: Vec<Vec<City>>,
}

impl ThreadComm {
    /// Creates the communication handles for a world of `world` ranks.
    /// The handle at index `r` is the one to hand to rank `r`.
    pub fn split(world: usize) -> Vec<ThreadComm> {
        assert!(world >= 1, "a world holds at least one rank");
        let shared = Arc::new(Shared {
            world,
            monitor: Condvar::new(),
            critical: Mutex::new(Critical {
                arrived: 0,
                generation: 0,
                matrix: None,
                costs: vec![INFINITY; world],
                tours: vec![vec![]; world],
            }),
        });
        (0..world)
            .map(|rank| ThreadComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Parks the calling rank until every rank of the world has arrived.
    fn barrier(&self) {
        let mut critical = self.shared.critical.lock();
        critical.arrived += 1;
        if critical.arrived == self.shared.world {
            critical.arrived = 0;
            critical.generation = critical.generation.wrapping_add(1);
            self.shared.monitor.notify_all();
        } else {
            let generation = critical.generation;
            while critical.generation == generation {
                self.shared.monitor.wait(&mut critical);
            }
        }
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.shared.world
    }

    fn broadcast_matrix(&self, matrix: Option<DistanceMatrix>) -> DistanceMatrix {
        if self.rank == 0 {
            self.shared.critical.lock().matrix = matrix;
        }
        self.barrier();
        let received = self
            .shared
            .critical
            .lock()
            .matrix
            .clone()
            .expect("rank 0 must provide the instance to broadcast");
        self.barrier();
        received
    }

    fn reduce_min(&self, cost: Cost) -> Cost {
        {
            self.shared.critical.lock().costs[self.rank] = cost;
        }
        self.barrier();
        let minimum = {
            let critical = self.shared.critical.lock();
            // the world has at least one rank
            *critical.costs.iter().min().unwrap()
        };
        self.barrier();
        minimum
    }

    fn gather_winner(&self, cost: Cost, tour: &[City], global_best: Cost) -> Option<Vec<City>> {
        {
            let mut critical = self.shared.critical.lock();
            critical.costs[self.rank] = cost;
            critical.tours[self.rank] = tour.to_vec();
        }
        self.barrier();
        let winner = if self.rank == 0 && global_best != INFINITY {
            let critical = self.shared.critical.lock();
            (0..self.shared.world)
                .find(|&r| critical.costs[r] == global_best)
                .map(|r| critical.tours[r].clone())
        } else {
            None
        };
        self.barrier();
        winner
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_thread_comm {
    use crate::*;

    /// Runs `f` once per rank of a fresh world, each rank on its own thread,
    /// and returns the per-rank results in rank order.
    fn on_world<T, F>(world: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&ThreadComm) -> T + Sync,
    {
        let comms = ThreadComm::split(world);
        let f = &f;
        std::thread::scope(|s| {
            let handles = comms
                .iter()
                .map(|comm| s.spawn(move || f(comm)))
                .collect::<Vec<_>>();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn ranks_are_handed_out_in_order() {
        let comms = ThreadComm::split(3);
        assert_eq!(vec![0, 1, 2], comms.iter().map(|c| c.rank()).collect::<Vec<_>>());
        assert!(comms.iter().all(|c| c.world_size() == 3));
    }

    #[test]
    fn broadcast_hands_every_rank_the_matrix_of_rank_0() {
        let received = on_world(4, |comm| {
            let mine = if comm.rank() == 0 {
                Some("3\n1\n2 3".parse::<DistanceMatrix>().unwrap())
            } else {
                None
            };
            comm.broadcast_matrix(mine)
        });
        let reference = "3\n1\n2 3".parse::<DistanceMatrix>().unwrap();
        assert!(received.iter().all(|m| *m == reference));
    }

    #[test]
    fn reduce_min_agrees_on_every_rank() {
        let result = on_world(5, |comm| comm.reduce_min(10 + comm.rank() as Cost));
        assert_eq!(vec![10; 5], result);

        let result = on_world(5, |comm| {
            let cost = if comm.rank() == 3 { 7 } else { INFINITY };
            comm.reduce_min(cost)
        });
        assert_eq!(vec![7; 5], result);
    }

    #[test]
    fn gather_winner_selects_the_lowest_matching_rank() {
        // ranks 1 and 2 both hold the optimum: rank 1 must win
        let result = on_world(3, |comm| {
            let (cost, tour) = match comm.rank() {
                0 => (9, vec![0, 2, 1, 0]),
                _ => (6, vec![0, comm.rank(), 3 - comm.rank(), 0]),
            };
            comm.gather_winner(cost, &tour, 6)
        });
        assert_eq!(Some(vec![0, 1, 2, 0]), result[0]);
        assert_eq!(None, result[1]);
        assert_eq!(None, result[2]);
    }

    #[test]
    fn gather_winner_yields_none_when_nobody_found_a_tour() {
        let result = on_world(2, |comm| comm.gather_winner(INFINITY, &[], INFINITY));
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn collectives_can_be_chained() {
        let result = on_world(3, |comm| {
            let matrix = if comm.rank() == 0 {
                Some("2\n7".parse::<DistanceMatrix>().unwrap())
            } else {
                None
            };
            let matrix = comm.broadcast_matrix(matrix);
            let local = 14 + comm.rank() as Cost;
            let global = comm.reduce_min(local);
            let tour = comm.gather_winner(local, &[0, 1, 0], global);
            (matrix.nb_cities(), global, tour)
        });
        assert_eq!((2, 14, Some(vec![0, 1, 0])), result[0].clone());
        assert_eq!((2, 14, None), result[1].clone());
        assert_eq!((2, 14, None), result[2].clone());
    }
}
