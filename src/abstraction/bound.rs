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

//! This module defines the `LowerBound` trait: the capability which lets the
//! search engine prune subtrees that cannot contain an improving tour.

use smallbitset::Set32;

use crate::{City, Cost};

/// An admissible estimate of the cost of completing a partial tour. For the
/// pruning to be safe, any implementation must guarantee that the value it
/// returns never exceeds the true cost of *any* complete tour extending the
/// given prefix. Subject to that single contract, the tighter the estimate,
/// the more of the search tree gets pruned.
///
/// Implementations are built from a distance matrix (they typically snapshot
/// a few per-city tables) and are then shared read-only by every search
/// thread of a worker. A given search uses one and the same bound from start
/// to finish.
pub trait LowerBound {
    /// Computes the bound for a partial tour of cost `cost` whose set of
    /// already-placed cities is `visited`, from scratch. This is how the
    /// bound of a seed task is obtained, and the fallback for every child
    /// node when `on_extension` is unsupported.
    fn from_scratch(&self, cost: Cost, visited: Set32) -> Cost;

    /// Refreshes a parent's bound when its partial tour is extended by the
    /// edge `prev -> next`. Schemes which support it return the child's bound
    /// in O(1); the default implementation returns `None`, telling the caller
    /// to fall back on `from_scratch` instead.
    fn on_extension(&self, parent_lb: Cost, prev: City, next: City) -> Option<Cost> {
        let _ = (parent_lb, prev, next);
        None
    }
}
