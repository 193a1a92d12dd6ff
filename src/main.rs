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

//! This is the main entry point of the program. This is what gets compiled to
//! the wsp binary.

use clap::Parser;

use wsp::{
    AveragedTwoEdgeBound, CheapestEdgeBound, Completion, DistanceMatrix, DistributedSolver,
    Error, LowerBound, ThreadComm, INFINITY,
};

/// WSP is an exact solver for the symmetric travelling salesman problem on
/// up to 18 cities. It runs a branch-and-bound depth-first search whose
/// first-hop subtrees are split across a set of cooperating workers, each of
/// which searches with a pool of threads.
///
/// The distance file starts with the number of cities, followed by either
/// the full distance matrix or its strict lower triangle (whitespace
/// separated; the layout is auto-detected).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the distance file of the instance that needs to be solved.
    instance: String,
    /// How many cooperating workers (ranks) take part in the search ?
    #[clap(short, long, default_value_t = 1)]
    ranks: usize,
    /// How many threads does each worker search with ? Defaults to the
    /// number of hardware threads available on the machine.
    #[clap(short, long)]
    threads: Option<usize>,
    /// The lower bound used to prune the search.
    #[clap(short, long, value_enum, default_value = "averaged")]
    bound: Bound,
}

/// The pruning bounds one can pick from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Bound {
    /// Cheapest outgoing edge of every unvisited city.
    Cheapest,
    /// Average of the two cheapest edges of every unvisited city,
    /// refreshed incrementally.
    Averaged,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(completion) => print_completion(&completion),
        Err(e) => {
            eprintln!("wsp: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Completion, Error> {
    let matrix = DistanceMatrix::from_file(&args.instance)?;
    let ranks = args.ranks.max(1);
    let threads = args.threads.unwrap_or_else(num_cpus::get).max(1);

    let completion = match args.bound {
        Bound::Cheapest => solve::<CheapestEdgeBound>(matrix, ranks, threads),
        Bound::Averaged => solve::<AveragedTwoEdgeBound>(matrix, ranks, threads),
    };
    Ok(completion)
}

/// Spins up one worker per rank (each on its own thread) and returns the
/// completion observed by rank 0, the one holding the optimal tour.
fn solve<B>(matrix: DistanceMatrix, ranks: usize, threads: usize) -> Completion
where
    B: LowerBound + Sync + for<'a> From<&'a DistanceMatrix>,
{
    let mut comms = ThreadComm::split(ranks);
    let root = comms.remove(0);
    std::thread::scope(|s| {
        for comm in &comms {
            s.spawn(move || DistributedSolver::<B, _>::custom(comm, threads).minimize(None));
        }
        DistributedSolver::<B, _>::custom(&root, threads).minimize(Some(matrix))
    })
}

fn print_completion(completion: &Completion) {
    if completion.best_cost == INFINITY {
        println!("No solution found!");
        return;
    }
    println!(
        "Optimal tour cost: {}   time: {:.3} s   ranks: {}",
        completion.best_cost,
        completion.elapsed.as_secs_f64(),
        completion.ranks
    );
    if let Some(tour) = &completion.tour {
        let cities = tour
            .iter()
            .map(|city| city.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("Optimal path: {cities}");
    }
}
