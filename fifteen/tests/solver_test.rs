//! Solvers compared with breadth-first search over complete state spaces of small boards.

use fifteen::puzzle_sliding16::additive::{PatternDatabase, PatternPartition, PatternPreset};
use fifteen::puzzle_sliding16::heuristic::Heuristic;
use fifteen::puzzle_sliding16::manhattan::ManhattanDistance;
use fifteen::puzzle_sliding16::walking::WalkingDistance;
use fifteen::{Board, Direction, SolveStatus, Solver, SolverConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, VecDeque};

/// Returns the distances to the goal of all boards reachable from the goal of given `side`.
fn distances(side: u8) -> HashMap<Board, u8> {
    let goal = Board::goal(side);
    let mut result = HashMap::from([(goal, 0u8)]);
    let mut queue = VecDeque::from([goal]);
    while let Some(board) = queue.pop_front() {
        let next = result[&board] + 1;
        for d in board.valid_moves() {
            let neighbor = board.shift(d).unwrap();
            if !result.contains_key(&neighbor) {
                result.insert(neighbor, next);
                queue.push_back(neighbor);
            }
        }
    }
    result
}

fn solve<H: Heuristic>(solver: &mut Solver<H>, board: &Board) -> Vec<Direction> {
    let report = solver.solve(board).unwrap();
    assert_eq!(report.status, SolveStatus::Solved, "{:?} not solved by {}", board, solver.kind());
    assert!(board.apply(&report.moves).unwrap().is_goal());
    report.moves
}

fn untimed_config() -> SolverConfig {
    SolverConfig { timeout: None, ..Default::default() }
}

#[test]
fn test_state_space_3x3() {
    let distances = distances(3);
    assert_eq!(distances.len(), 181440);
    assert_eq!(distances.values().copied().max(), Some(31));
    for (board, distance) in &distances {
        assert!(board.is_solvable());
        assert!(board.symmetric().is_solvable());
        assert_eq!(distances.get(&board.symmetric()), Some(distance));
    }
}

#[test]
fn test_heuristics_are_admissible_3x3() {
    let md = ManhattanDistance::without_linear_conflict(3);
    let lc = ManhattanDistance::new(3);
    let wd = WalkingDistance::new(3);
    let pdb = PatternDatabase::new(PatternPartition::default_for_side(3).unwrap());
    for (board, distance) in distances(3) {
        let md_estimate = md.estimate(&board);
        assert!(md_estimate <= distance);
        assert_eq!(md_estimate % 2, distance % 2);
        assert!(md_estimate <= lc.estimate(&board));
        assert!(lc.estimate(&board) <= distance, "linear conflict overestimates {:?}", board);
        assert!(wd.estimate(&board) <= distance, "walking distance overestimates {:?}", board);
        assert!(pdb.estimate(&board) <= distance, "pattern database overestimates {:?}", board);
    }
}

#[test]
fn test_solvers_find_optimal_solutions_3x3() {
    let config = untimed_config();
    let mut md = Solver::with_config(ManhattanDistance::without_linear_conflict(3), &config);
    let mut lc = Solver::with_config(ManhattanDistance::new(3), &config);
    let mut wd = Solver::with_config((WalkingDistance::new(3), ManhattanDistance::new(3)), &config);
    let mut pdb = Solver::with_config(PatternDatabase::new(config.partition(3).unwrap()), &config);
    let mut unordered = Solver::with_config(ManhattanDistance::new(3), &SolverConfig { first_move_ordering: false, ..config.clone() });
    let mut hardest = 0;
    for (index, (board, distance)) in distances(3).into_iter().enumerate() {
        if index % 1009 != 0 && distance < 31 { continue; }
        hardest = hardest.max(distance);
        let expected = distance as usize;
        assert_eq!(solve(&mut md, &board).len(), expected);
        assert_eq!(solve(&mut lc, &board).len(), expected);
        assert_eq!(solve(&mut wd, &board).len(), expected);
        assert_eq!(solve(&mut pdb, &board).len(), expected);
        assert_eq!(solve(&mut unordered, &board).len(), expected);
    }
    assert_eq!(hardest, 31);
}

#[test]
fn test_all_boards_2x2() {
    let distances = distances(2);
    assert_eq!(distances.len(), 12);
    let mut solver = Solver::with_config(PatternDatabase::new(PatternPartition::default_for_side(2).unwrap()), &untimed_config());
    let mut md = Solver::with_config(ManhattanDistance::new(2), &untimed_config());
    let mut unsolvable = 0;
    for a in 0..4u8 {
        for b in 0..4u8 {
            for c in 0..4u8 {
                let Some(d) = 6u8.checked_sub(a + b + c) else { continue };
                let tiles = [a, b, c, d];
                let Ok(board) = Board::new(&tiles) else { continue };
                assert_eq!(board.is_solvable(), distances.contains_key(&board));
                match distances.get(&board) {
                    Some(distance) => {
                        assert_eq!(solve(&mut solver, &board).len(), *distance as usize);
                        assert_eq!(solve(&mut md, &board).len(), *distance as usize);
                    }
                    None => {
                        unsolvable += 1;
                        let report = solver.solve(&board).unwrap();
                        assert_eq!(report.status, SolveStatus::Unsolvable);
                        assert_eq!(report.estimate, -1);
                        assert!(report.iterations.is_empty());
                    }
                }
            }
        }
    }
    assert_eq!(unsolvable, 12);
}

#[test]
fn test_random_walks_4x4() {
    let config = untimed_config();
    let mut lc = Solver::with_config(ManhattanDistance::new(4), &config);
    let mut wd = Solver::with_config((WalkingDistance::new(4), ManhattanDistance::new(4)), &config);
    let mut pdb = Solver::with_config(PatternDatabase::new(config.partition(4).unwrap()), &config);
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    for _ in 0..5 {
        let board = Board::random_walk(4, 30, &mut rng);
        let expected = solve(&mut pdb, &board).len();
        assert!(expected <= 30);
        assert_eq!(solve(&mut lc, &board).len(), expected);
        assert_eq!(solve(&mut wd, &board).len(), expected);
    }
}

#[test]
fn test_korf_6() {
    let config = SolverConfig { timeout: None, pattern_preset: PatternPreset::Fives, ..Default::default() };
    let mut solver = Solver::with_config(PatternDatabase::new(config.partition(4).unwrap()), &config);
    let board = Board::new(&[14, 7, 1, 9, 12, 3, 6, 15, 8, 11, 2, 5, 10, 0, 4, 13]).unwrap();
    let report = solver.solve(&board).unwrap();
    assert_eq!(report.steps(), Some(52));
    assert_eq!(report.depth, 52);
    assert!(board.apply(&report.moves).unwrap().is_goal());
}
