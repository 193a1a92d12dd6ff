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

//! End-to-end validation of the distributed search against a brute-force
//! oracle and across every combination of world size and thread count that
//! matters. The instances live in the `resources` directory.

use std::path::PathBuf;

use wsp::*;

fn locate(id: &str) -> PathBuf {
    PathBuf::new()
        .join(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join(id)
}

fn load(id: &str) -> DistanceMatrix {
    DistanceMatrix::from_file(locate(id)).expect("instance not found")
}

/// Solves the given instance on a world of `ranks` workers, each rank on its
/// own thread and searching with `threads` threads, and returns rank 0's
/// completion.
fn solve<B>(matrix: &DistanceMatrix, ranks: usize, threads: usize) -> Completion
where
    B: LowerBound + Sync + for<'a> From<&'a DistanceMatrix>,
{
    let mut comms = ThreadComm::split(ranks);
    let root = comms.remove(0);
    std::thread::scope(|s| {
        for comm in &comms {
            s.spawn(move || DistributedSolver::<B, _>::custom(comm, threads).minimize(None));
        }
        DistributedSolver::<B, _>::custom(&root, threads).minimize(Some(matrix.clone()))
    })
}

/// The true optimum, by enumerating every permutation of the non-origin
/// cities. Only meant for the small instances of the test suite.
fn brute_force(inst: &DistanceMatrix) -> Cost {
    fn recurse(inst: &DistanceMatrix, remaining: &mut Vec<City>, last: City, cost: Cost) -> Cost {
        if remaining.is_empty() {
            return cost + inst.between(last, 0);
        }
        let mut best = INFINITY;
        for i in 0..remaining.len() {
            let next = remaining.remove(i);
            let sub = recurse(inst, remaining, next, cost + inst.between(last, next));
            best = best.min(sub);
            remaining.insert(i, next);
        }
        best
    }
    let mut remaining = (1..inst.nb_cities()).collect::<Vec<_>>();
    recurse(inst, &mut remaining, 0, 0)
}

fn tour_cost(inst: &DistanceMatrix, tour: &[City]) -> Cost {
    tour.windows(2).map(|w| inst.between(w[0], w[1])).sum()
}

/// A tour is valid when it starts and ends at the origin and visits every
/// city exactly once in between.
fn assert_valid_tour(inst: &DistanceMatrix, tour: &[City]) {
    let n = inst.nb_cities();
    assert_eq!(n + 1, tour.len());
    assert_eq!(0, tour[0]);
    assert_eq!(0, tour[n]);
    let mut cities = tour[..n].to_vec();
    cities.sort_unstable();
    assert_eq!((0..n).collect::<Vec<_>>(), cities);
}

#[test]
fn triangular_three_cities() {
    let inst = load("dist3");
    let completion = solve::<AveragedTwoEdgeBound>(&inst, 1, 1);
    assert_eq!(6, completion.best_cost);
    let tour = completion.tour.unwrap();
    assert!(tour == vec![0, 1, 2, 0] || tour == vec![0, 2, 1, 0]);
}

#[test]
fn square_four_cities() {
    let inst = load("dist4");
    let completion = solve::<AveragedTwoEdgeBound>(&inst, 2, 2);
    assert_eq!(80, completion.best_cost);
    let tour = completion.tour.unwrap();
    assert_valid_tour(&inst, &tour);
    assert_eq!(80, tour_cost(&inst, &tour));
}

#[test]
fn five_cities_against_the_oracle_for_every_world_size() {
    let inst = load("dist5");
    let expected = brute_force(&inst);
    for ranks in [1, 2, 3, 5, 8] {
        let completion = solve::<AveragedTwoEdgeBound>(&inst, ranks, 1);
        assert_eq!(expected, completion.best_cost);
        let tour = completion.tour.unwrap();
        assert_valid_tour(&inst, &tour);
        assert_eq!(expected, tour_cost(&inst, &tour));
    }
}

#[test]
fn eight_cities_against_the_oracle() {
    let inst = load("dist8");
    let expected = brute_force(&inst);
    for ranks in [1, 2, 4, 8] {
        for threads in [1, 2, 4] {
            let completion = solve::<AveragedTwoEdgeBound>(&inst, ranks, threads);
            assert_eq!(expected, completion.best_cost);
            let tour = completion.tour.unwrap();
            assert_valid_tour(&inst, &tour);
            assert_eq!(expected, tour_cost(&inst, &tour));
        }
    }
}

#[test]
fn both_bounds_reach_the_same_optimum() {
    let inst = load("dist8");
    let averaged = solve::<AveragedTwoEdgeBound>(&inst, 2, 2);
    let cheapest = solve::<CheapestEdgeBound>(&inst, 2, 2);
    assert_eq!(averaged.best_cost, cheapest.best_cost);
}

#[test]
fn empty_seed_ranks_do_not_disturb_the_result() {
    // 8 ranks for only 2 first-hop tasks
    let inst = load("dist3");
    let completion = solve::<AveragedTwoEdgeBound>(&inst, 8, 1);
    assert_eq!(6, completion.best_cost);
    assert_eq!(8, completion.ranks);
    let tour = completion.tour.unwrap();
    assert_valid_tour(&inst, &tour);
}

#[test]
fn single_city_stays_home() {
    let inst = load("dist1");
    let completion = solve::<AveragedTwoEdgeBound>(&inst, 1, 1);
    assert_eq!(0, completion.best_cost);
    assert_eq!(Some(vec![0, 0]), completion.tour);
}

#[test]
fn two_cities_ride_the_only_edge_twice() {
    let inst = load("dist2");
    let completion = solve::<AveragedTwoEdgeBound>(&inst, 1, 1);
    assert_eq!(14, completion.best_cost);
    assert_eq!(Some(vec![0, 1, 0]), completion.tour);
}

#[test]
fn malformed_instances_do_not_parse() {
    let res = DistanceMatrix::from_file(locate("dist4-malformed"));
    assert!(matches!(
        res,
        Err(Error::UnsupportedFormat { got: 3, square: 16, triangle: 6 })
    ));
}

#[test]
fn square_and_triangular_files_yield_the_same_model() {
    let tri = load("dist3");
    let sq: DistanceMatrix = "3\n0 1 2\n1 0 3\n2 3 0".parse().unwrap();
    assert_eq!(tri, sq);
}
