#![doc = include_str!("../README.md")]

use fifteen::puzzle_sliding16::additive::{PatternDatabase, PatternPreset};
use fifteen::pattern_db::UseFPMap;
use fifteen::puzzle_sliding16::heuristic::Heuristic;
use fifteen::puzzle_sliding16::manhattan::ManhattanDistance;
use fifteen::puzzle_sliding16::walking::WalkingDistance;
use fifteen::reference::ReferenceAccumulator;
use fifteen::reference::service::ReferenceConnection;
use fifteen::{Board, SolveStatus, Solver, SolverConfig};
use cpu_time::ProcessTime;
use fsum::FSum;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::env;

struct TestBoardSolution {
    who_solved: String,
    moves: usize
}

/// Board to be tested.
struct TestBoard {
    board: Board,
    solution: Option<TestBoardSolution>
}

impl TestBoard {
    pub fn new(board: Board) -> Self { Self{ board, solution: None } }
}

struct Test {
    side: u8,
    config: SolverConfig,
    test_boards: Vec<TestBoard>
}

// https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance
fn sdev(sum: f64, sqrsum: f64, n: usize) -> f64 {
    if n < 2 { return 0.0; }
    ((sqrsum - sum * sum / n as f64) / (n-1) as f64).sqrt()
}

impl Test {
    fn new(side: u8, config: SolverConfig) -> Self {
        Self { side, config, test_boards: Vec::new() }
    }

    fn add_random_test_boards(&mut self, rng: &mut ChaCha8Rng, how_many: usize) {
        for _ in 0..how_many { self.test_boards.push(TestBoard::new(Board::random(self.side, rng))); }
    }

    fn add_random_walk_test_boards(&mut self, rng: &mut ChaCha8Rng, how_many: usize, moves: u16) {
        for _ in 0..how_many { self.test_boards.push(TestBoard::new(Board::random_walk(self.side, moves, rng))); }
    }

    /// Reads boards, one per line: index followed by tiles (blank as 0).
    fn add_test_boards_from_file(&mut self, file_name: &str) -> io::Result<()> {
        let f = BufReader::new(File::open(file_name)?);
        for line in f.lines() {
            let line = line?;
            let tiles: Result<Vec<u8>, _> = line.split_whitespace().skip(1).map(|s| s.parse()).collect();
            let Ok(tiles) = tiles else {
                eprintln!("skipping malformed line: {}", line);
                continue
            };
            if tiles.is_empty() { continue; }
            match Board::new(&tiles) {
                Ok(board) if board.side() == self.side => self.test_boards.push(TestBoard::new(board)),
                Ok(board) => eprintln!("skipping {:?} of side {}", board, board.side()),
                Err(e) => eprintln!("skipping line `{}`: {}", line, e),
            }
        }
        Ok(())
    }

    fn test_solver<H: Heuristic>(&mut self, name: &str, solver: &mut Solver<H>) {
        let mut nodes = Vec::with_capacity(self.test_boards.len());
        let mut seconds = Vec::with_capacity(self.test_boards.len());
        let mut timeouts = 0;
        for test in self.test_boards.iter_mut() {
            let start_moment = ProcessTime::now();
            let report = match solver.solve(&test.board) {
                Ok(report) => report,
                Err(e) => { eprintln!("{}: {}", name, e); continue; }
            };
            seconds.push(start_moment.elapsed().as_secs_f64());
            nodes.push(report.nodes as f64);
            match report.status {
                SolveStatus::Solved => {
                    let moves = report.moves.len();
                    if let Some(ref solution) = test.solution {
                        if moves != solution.moves {
                            eprintln!("{}: wrong answer given for {:?}: {} (got) != {} (by {})",
                                      name, test.board, moves, solution.moves, solution.who_solved);
                        }
                    } else {
                        test.solution = Some(TestBoardSolution { who_solved: name.to_owned(), moves });
                    }
                }
                SolveStatus::Timeout => timeouts += 1,
                status => eprintln!("{}: {:?} is {}", name, test.board, status),
            }
        }
        let n = nodes.len();
        if n == 0 { return; }
        let nodes_sum = FSum::with_all(nodes.iter().copied()).value();
        let nodes_sqr_sum = FSum::with_all(nodes.iter().map(|v| v*v)).value();
        let seconds_sum = FSum::with_all(seconds.iter().copied()).value();
        println!("  {}: {:.0} (sdev {:.0}) nodes/case expanded, {:.6} sec/case, {} timeouts.",
                 name, nodes_sum / n as f64, sdev(nodes_sum, nodes_sqr_sum, n),
                 seconds_sum / n as f64, timeouts);
    }

    fn print_solution_stats(&self) {
        let solved: Vec<f64> = self.test_boards.iter().filter_map(|t| t.solution.as_ref()).map(|s| s.moves as f64).collect();
        if solved.is_empty() { return; }
        println!("{} of {} boards solved, {:.2} moves on average.",
                 solved.len(), self.test_boards.len(), FSum::with_all(solved.iter().copied()).value() / solved.len() as f64);
    }
}

enum Args {
    Run(HashMap<String, bool>),
    Help(Vec<String>)
}

impl Args {
    fn new() -> Self {
        let args: HashMap<String, bool> = env::args().skip(1).map(|s| (s, false)).collect();
        if args.is_empty() { Self::Help(Vec::new()) } else { Self::Run(args) }
    }

    fn case(&mut self, s: &str) -> bool {
        match self {
            &mut Self::Run(ref mut set) => {
                if let Some(used) = set.get_mut(s) {
                    *used = true;
                    println!("---=== run {} ===---", s);
                    true
                } else { false }
            }
            &mut Self::Help(ref mut v) => { v.push(s.to_string()); false }
        }
    }

    /// Like `case`, but for options that do not start a benchmark.
    fn flag(&mut self, s: &str) -> bool {
        match self {
            &mut Self::Run(ref mut set) => set.get_mut(s).map(|used| { *used = true; true }).unwrap_or(false),
            &mut Self::Help(ref mut v) => { v.push(s.to_string()); false }
        }
    }
}

impl Drop for Args {
    fn drop(&mut self) {
        match self {
            Self::Run(ref set) => {
                for (k, used) in set {
                    if !used { eprintln!("Unrecognized argument: {}", k); }
                }
            }
            Self::Help(ref v) => {
                println!("Acceptable arguments:");
                for a in v { println!(" {}", a); }
            }
        }
    }
}

/// Prints log records to the standard error.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool { true }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let mut args = Args::new();

    if args.flag("-v") {
        if log::set_logger(&LOGGER).is_ok() { log::set_max_level(log::LevelFilter::Debug); }
    } else if args.flag("-i") {
        if log::set_logger(&LOGGER).is_ok() { log::set_max_level(log::LevelFilter::Info); }
    }

    let mut config = SolverConfig::default();
    if args.flag("no-timeout") { config.timeout = None; }
    if args.flag("663") { config.pattern_preset = PatternPreset::SixSixThree; }
    let side = if args.flag("3x3") { 3 } else { 4 };

    let mut test = Test::new(side, config.clone());
    if args.flag("korf100") {
        if let Err(e) = test.add_test_boards_from_file("korf100.txt") {
            eprintln!("cannot read korf100.txt: {}", e);
        }
    } else if side == 3 {
        test.add_random_test_boards(&mut ChaCha8Rng::seed_from_u64(123), 1000);
    } else {
        test.add_random_walk_test_boards(&mut ChaCha8Rng::seed_from_u64(123), 50, 80);
    }
    println!("{} boards of side {}, timeout {:?}.", test.test_boards.len(), test.side, test.config.timeout);

    if args.case("md") {
        test.test_solver("md", &mut Solver::with_config(ManhattanDistance::without_linear_conflict(side), &config));
    }
    if args.case("lc") {
        test.test_solver("lc", &mut Solver::with_config(ManhattanDistance::from_config(side, &config), &config));
    }
    if args.case("wd") {
        let start_moment = ProcessTime::now();
        let wd = WalkingDistance::new(side);
        println!("  walking distance table: {} entries, built in {:.3} sec.", wd.len(), start_moment.elapsed().as_secs_f64());
        test.test_solver("wd", &mut Solver::with_config((wd, ManhattanDistance::new(side)), &config));
    }

    let pdb_cases = ["pdb", "pdb update", "pdb advanced"];
    let selected: Vec<&str> = pdb_cases.iter().copied().filter(|c| args.case(c)).collect();
    if !selected.is_empty() {
        let partition = match config.partition(side) {
            Ok(partition) => partition,
            Err(e) => { eprintln!("{}", e); return; }
        };
        let start_moment = ProcessTime::now();
        let pdb = Arc::new(PatternDatabase::new(partition));
        println!("  pattern databases: {} bytes, built in {:.3} sec.", pdb.size_bytes(), start_moment.elapsed().as_secs_f64());
        let accumulator = Arc::new(ReferenceAccumulator::from_config(&config));
        for case in selected {
            let mut solver = Solver::with_config(pdb.clone(), &config);
            match case {
                "pdb advanced" => {
                    solver.set_reference(ReferenceConnection::standalone(accumulator.clone()));
                    solver.set_advanced(true);
                }
                "pdb update" => {
                    solver.set_reference(ReferenceConnection::standalone(accumulator.clone()));
                    solver.set_auto_update_reference(true);
                }
                _ => {}
            }
            test.test_solver(case, &mut solver);
            println!("  {} boards in the reference cache.", accumulator.len());
        }
    }

    if args.case("pdb fp") {
        match config.partition(side) {
            Ok(partition) => {
                let start_moment = ProcessTime::now();
                let pdb = PatternDatabase::with_store(partition, UseFPMap::default());
                println!("  compressed pattern databases: {} bytes, built in {:.3} sec.", pdb.size_bytes(), start_moment.elapsed().as_secs_f64());
                test.test_solver("pdb fp", &mut Solver::with_config(pdb, &config));
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    test.print_solution_stats();
}
