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

//! This module defines the `Communicator` trait: the few collective
//! operations the distributed solver needs from whatever substrate ties its
//! workers together.

use crate::{City, Cost, DistanceMatrix};

/// The coordination surface between the cooperating workers of a distributed
/// search. Workers are peers identified by a `rank` in `[0, world_size)`;
/// rank 0 has no search privileges, it merely owns the instance and the
/// final result.
///
/// All three collectives must be called by *every* rank of the world, in the
/// same order. Beyond that, the trait makes no assumption about the
/// substrate: an in-process implementation where each rank is a thread
/// (see `ThreadComm`) behaves exactly like one where each rank is a process
/// on a different machine.
pub trait Communicator {
    /// The identity of this worker within the world.
    fn rank(&self) -> usize;
    /// The total number of cooperating workers.
    fn world_size(&self) -> usize;

    /// Distributes the instance owned by rank 0 to every worker. Rank 0
    /// passes `Some(matrix)`, every other rank passes `None`; all of them
    /// return (a copy of) rank 0's matrix.
    fn broadcast_matrix(&self, matrix: Option<DistanceMatrix>) -> DistanceMatrix;

    /// Reduces the workers' local best costs to their global minimum, which
    /// is returned on every rank.
    fn reduce_min(&self, cost: Cost) -> Cost;

    /// Brings the winning tour to rank 0. Each rank deposits its local best
    /// `(cost, tour)`; the tour retained is that of the *lowest* rank whose
    /// cost equals `global_best`. Rank 0 gets `Some(tour)` (or `None` when no
    /// rank found any tour); every other rank gets `None`.
    fn gather_winner(&self, cost: Cost, tour: &[City], global_best: Cost) -> Option<Vec<City>>;
}
