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

//! # WSP
//! WSP is a parallel *exact* solver for the symmetric travelling salesman
//! problem on small instances (up to 18 cities). It enumerates tours with a
//! branch-and-bound depth-first search over an explicit stack, prunes against
//! an admissible lower bound, and exploits two levels of parallelism: the
//! first-hop subtrees of the search are split across a fixed set of
//! cooperating workers ("ranks"), and each worker fans its share out over a
//! pool of threads racing on one shared best-cost cell.
//!
//! ## Quick Example
//! The following solves a 3-city instance on a single worker. The instance
//! text is the on-disk format: the number of cities followed by either the
//! full distance matrix or its strict lower triangle.
//!
//! ```
//! use wsp::*;
//!
//! // the lower triangle of [[0,1,2],[1,0,3],[2,3,0]]
//! let matrix: DistanceMatrix = "3\n1\n2 3".parse().unwrap();
//!
//! // a world of one rank, searching with two threads and the averaged
//! // two-edge pruning bound
//! let comms = ThreadComm::split(1);
//! let solver = DistributedSolver::<AveragedTwoEdgeBound, _>::custom(&comms[0], 2);
//! let completion = solver.minimize(Some(matrix));
//!
//! assert_eq!(6, completion.best_cost);
//! let tour = completion.tour.unwrap();
//! assert!(tour == vec![0, 1, 2, 0] || tour == vec![0, 2, 1, 0]);
//! ```
//!
//! Multi-worker searches run one `DistributedSolver` per handle returned by
//! `ThreadComm::split`, each on its own thread; rank 0 supplies the instance
//! and collects the optimal tour. The `wsp` binary is a thin wrapper doing
//! exactly that around a distance file given on the command line.

mod common;
mod abstraction;
mod implementation;

pub use common::*;
pub use abstraction::*;
pub use implementation::*;
