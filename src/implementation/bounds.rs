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

//! This module provides the two admissible lower bounds the solver can prune
//! with. Both rest on the same observation: every city the tour has not
//! reached yet must still be *entered* through one of its edges, so summing a
//! per-city underestimate of that edge over the unvisited cities can never
//! overshoot the cost of any completion.

use smallbitset::Set32;

use crate::{City, Cost, DistanceMatrix, LowerBound};

/// The cheapest-outgoing-edge bound: the cost of the prefix plus, for every
/// unvisited city, the cheapest edge incident to it. Simple and obviously
/// admissible, but it must be recomputed in O(N) for every node.
#[derive(Debug, Clone)]
pub struct CheapestEdgeBound {
    nb_cities: usize,
    cheapest: Vec<Cost>,
}

impl From<&DistanceMatrix> for CheapestEdgeBound {
    fn from(inst: &DistanceMatrix) -> Self {
        Self {
            nb_cities: inst.nb_cities(),
            cheapest: (0..inst.nb_cities()).map(|i| inst.cheapest(i)).collect(),
        }
    }
}

impl LowerBound for CheapestEdgeBound {
    fn from_scratch(&self, cost: Cost, visited: Set32) -> Cost {
        let mut lb = cost;
        for i in 0..self.nb_cities {
            if !visited.contains(i) {
                lb += self.cheapest[i];
            }
        }
        lb
    }
}

/// The averaged two-edge bound: the cost of the prefix plus, for every
/// unvisited city `i`, `(cheapest(i) + second_cheapest(i)) / 2`. Still
/// admissible (a tour enters *and* leaves every city, so it pays at least the
/// average of its two cheapest edges), a bit tighter than the single-edge
/// variant, and above all refreshable in O(1) when a tour is extended:
/// the new end city stops contributing its averaged term and the actual
/// incoming edge is paid instead, while every other unvisited city
/// contributes exactly as it did in the parent.
#[derive(Debug, Clone)]
pub struct AveragedTwoEdgeBound {
    nb_cities: usize,
    averaged: Vec<Cost>,
    distances: Vec<Vec<Cost>>,
}

impl From<&DistanceMatrix> for AveragedTwoEdgeBound {
    fn from(inst: &DistanceMatrix) -> Self {
        let n = inst.nb_cities();
        Self {
            nb_cities: n,
            averaged: (0..n)
                .map(|i| (inst.cheapest(i) + inst.second_cheapest(i)) / 2)
                .collect(),
            distances: (0..n)
                .map(|i| (0..n).map(|j| inst.between(i, j)).collect())
                .collect(),
        }
    }
}

impl LowerBound for AveragedTwoEdgeBound {
    fn from_scratch(&self, cost: Cost, visited: Set32) -> Cost {
        let mut lb = cost;
        for i in 0..self.nb_cities {
            if !visited.contains(i) {
                lb += self.averaged[i];
            }
        }
        lb
    }

    fn on_extension(&self, parent_lb: Cost, prev: City, next: City) -> Option<Cost> {
        Some(parent_lb + self.distances[prev][next] - self.averaged[next])
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
