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

//! This module contains everything that is necessary to parse a distance file
//! and turn it into the immutable distance model every worker computes on.

use std::fs;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;

use crate::{City, Cost, INFINITY, MAX_CITIES};

/// This enumeration simply groups the kinds of errors that might occur when
/// reading an instance from file. There can be io errors (file unavailable ?),
/// parse int errors (the file contains something else than numbers), or
/// format errors (the numbers do not describe a distance matrix we know how
/// to interpret).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected to read an integer but got ... something else
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// The file does not even declare how many cities there are
    #[error("missing city count")]
    MissingCityCount,
    /// The declared number of cities is not something we can solve
    #[error("invalid city count {0} (must be 1-18)")]
    CityCount(usize),
    /// The number of distances matches neither recognized layout
    #[error("unsupported format: {got} ints read, need {square} (square) or {triangle} (triangular)")]
    UnsupportedFormat {
        got: usize,
        square: usize,
        triangle: usize,
    },
    /// Distances must be non-negative for the pruning bounds to be admissible
    #[error("negative distance {0}")]
    NegativeDistance(Cost),
}

/// The immutable distance model: a symmetric `N x N` matrix of non-negative
/// integer costs with a zero diagonal, together with the two per-city tables
/// derived from it once at construction (the cheapest and second cheapest
/// outgoing edge of every city). It must be byte-identical on every worker,
/// which the coordinator guarantees by broadcasting it from rank 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    /// The number of cities, in `[1, MAX_CITIES]`.
    nb_cities: usize,
    /// The distances between any two cities.
    distances: Vec<Vec<Cost>>,
    /// For each city, the smallest `distances[i][j]` over `j != i`
    /// (0 when the city has no neighbor at all).
    cheapest: Vec<Cost>,
    /// For each city, the second smallest `distances[i][j]` over `j != i`
    /// (0 when the city has fewer than two neighbors).
    second_cheapest: Vec<Cost>,
}

impl DistanceMatrix {
    /// Reads an instance from the given file. The expected layout is a
    /// leading city count `N` followed by either `N * N` integers (the full
    /// matrix, row major) or `N * (N-1) / 2` integers (the strict lower
    /// triangle, row major, interpreted symmetrically). Any amount and mix
    /// of spaces and newlines separates the numbers.
    pub fn from_file<P: AsRef<Path>>(fname: P) -> Result<Self, Error> {
        fs::read_to_string(fname)?.parse()
    }

    /// Builds the matrix from the declared city count and the flat sequence
    /// of distances read from the file, auto-detecting the layout from the
    /// number of values.
    fn from_values(nb_cities: usize, values: &[Cost]) -> Result<Self, Error> {
        if !(1..=MAX_CITIES).contains(&nb_cities) {
            return Err(Error::CityCount(nb_cities));
        }
        if let Some(&neg) = values.iter().find(|&&v| v < 0) {
            return Err(Error::NegativeDistance(neg));
        }

        let square = nb_cities * nb_cities;
        let triangle = nb_cities * (nb_cities - 1) / 2;

        let mut distances = vec![vec![0; nb_cities]; nb_cities];
        if values.len() == square {
            for i in 0..nb_cities {
                for j in 0..nb_cities {
                    distances[i][j] = values[i * nb_cities + j];
                }
            }
        } else if values.len() == triangle {
            let mut k = 0;
            for i in 1..nb_cities {
                for j in 0..i {
                    distances[i][j] = values[k];
                    distances[j][i] = values[k];
                    k += 1;
                }
            }
        } else {
            return Err(Error::UnsupportedFormat {
                got: values.len(),
                square,
                triangle,
            });
        }
        // the diagonal is zero whatever the file says
        for (i, row) in distances.iter_mut().enumerate() {
            row[i] = 0;
        }

        Ok(Self::with_derived_tables(nb_cities, distances))
    }

    /// Computes the cheapest / second cheapest outgoing edge of every city in
    /// one pass per row. Missing values (cities with fewer than two
    /// neighbors) default to 0, which keeps the bounds admissible.
    fn with_derived_tables(nb_cities: usize, distances: Vec<Vec<Cost>>) -> Self {
        let mut cheapest = vec![0; nb_cities];
        let mut second_cheapest = vec![0; nb_cities];

        for i in 0..nb_cities {
            let mut min1 = INFINITY;
            let mut min2 = INFINITY;
            for j in 0..nb_cities {
                if i == j {
                    continue;
                }
                let d = distances[i][j];
                if d < min1 {
                    min2 = min1;
                    min1 = d;
                } else if d < min2 {
                    min2 = d;
                }
            }
            cheapest[i] = if min1 == INFINITY { 0 } else { min1 };
            second_cheapest[i] = if min2 == INFINITY { 0 } else { min2 };
        }

        Self {
            nb_cities,
            distances,
            cheapest,
            second_cheapest,
        }
    }

    /// The number of cities of the instance.
    pub fn nb_cities(&self) -> usize {
        self.nb_cities
    }

    /// The cost of travelling from `i` to `j` (zero when `i == j`).
    #[inline]
    pub fn between(&self, i: City, j: City) -> Cost {
        self.distances[i][j]
    }

    /// The cost of the cheapest edge leaving city `i`.
    #[inline]
    pub fn cheapest(&self, i: City) -> Cost {
        self.cheapest[i]
    }

    /// The cost of the second cheapest edge leaving city `i`.
    #[inline]
    pub fn second_cheapest(&self, i: City) -> Cost {
        self.second_cheapest[i]
    }
}

impl FromStr for DistanceMatrix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let nb_cities = tokens
            .next()
            .ok_or(Error::MissingCityCount)?
            .parse::<usize>()?;
        let values = tokens
            .map(str::parse)
            .collect::<Result<Vec<Cost>, ParseIntError>>()?;
        Self::from_values(nb_cities, &values)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
