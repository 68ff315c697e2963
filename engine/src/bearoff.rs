/*
 * bearoff.rs
 * Part of the byte-gammon project
 * Created Date: Thursday, March 20th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 1 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::board::Board;
use gammon::definitions::{HOME_TOP, MOVER, NUM_CHEQUERS, OPPONENT};
use gammon::dice::ALL_ROLLS;

use crate::defs::{
    Outputs, OUTPUT_LOSE_BACKGAMMON, OUTPUT_LOSE_GAMMON, OUTPUT_WIN, OUTPUT_WIN_BACKGAMMON,
    OUTPUT_WIN_GAMMON,
};

/// Points of a home board.
const HOME_POINTS: usize = HOME_TOP + 1;

/// Distributions are truncated at this many rolls; the tail mass is folded
/// into the last bin.
const MAX_ROLLS: usize = 32;

/// Home-board counts of one side, index 0 = ace point.
type HomeCounts = [u8; HOME_POINTS];

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let mut result: usize = 1;
    for i in 0..k.min(n - k) {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Number of ways to place at most `chequers` chequers on `points` points.
fn distributions(points: usize, chequers: usize) -> usize {
    binomial(chequers + points, points)
}

/// Ranks a home-board distribution into `0..distributions(6, max_chequers)`.
/// The ranking is a plain mixed-radix combinatorial number system; encode
/// and lookup always go through this same function.
fn position_index(counts: &HomeCounts, max_chequers: usize) -> usize {
    let mut index = 0;
    let mut remaining = max_chequers;
    let mut points_left = HOME_POINTS;
    for &count in counts.iter() {
        for v in 0..count as usize {
            index += distributions(points_left - 1, remaining - v);
        }
        remaining -= count as usize;
        points_left -= 1;
    }
    index
}

fn total(counts: &HomeCounts) -> u8 {
    counts.iter().sum()
}

fn home_counts(board: &Board, side: usize) -> HomeCounts {
    let mut counts = [0u8; HOME_POINTS];
    counts.copy_from_slice(&board.counts(side)[..HOME_POINTS]);
    counts
}

/// Enumerates the distinct results of playing one die in a one-sided
/// bearoff position. With no opponent every die is playable while chequers
/// remain, so plays are always maximal.
fn apply_die(counts: &HomeCounts, die: u8, out: &mut Vec<HomeCounts>) {
    for from in (0..HOME_POINTS).rev() {
        if counts[from] == 0 {
            continue;
        }
        let die = die as usize;
        if from >= die {
            let mut next = *counts;
            next[from] -= 1;
            next[from - die] += 1;
            out.push(next);
        } else {
            // bear off: exact pip, or any higher die from the highest point
            let exact = from + 1 == die;
            let highest = counts[from + 1..].iter().all(|&c| c == 0);
            if exact || highest {
                let mut next = *counts;
                next[from] -= 1;
                out.push(next);
            }
        }
    }
}

/// All distinct positions reachable by playing the full roll.
fn roll_successors(counts: &HomeCounts, d0: u8, d1: u8) -> Vec<HomeCounts> {
    let doubles = [d0; 4];
    let mixed = [d0, d1];
    let dice: &[u8] = if d0 == d1 { &doubles } else { &mixed };
    let mut current = vec![*counts];
    for &die in dice {
        let mut next = Vec::with_capacity(current.len() * 4);
        for counts in &current {
            if total(counts) == 0 {
                next.push(*counts);
            } else {
                apply_die(counts, die, &mut next);
            }
        }
        next.sort_unstable();
        next.dedup();
        current = next;
    }
    current
}

#[derive(Debug)]
struct BearoffEntry {
    /// Probability distribution of the number of rolls to bear off all
    /// chequers under rolls-minimising play.
    dist: [f32; MAX_ROLLS],
    /// Distribution of the number of rolls to bear off the first chequer,
    /// under the same play policy.
    first: [f32; MAX_ROLLS],
    expected: f32,
}

/// One-sided bearoff database: exact roll distributions for every position
/// of up to 15 chequers on the six home points, generated at init.
#[derive(Debug)]
pub struct BearoffOneSided {
    entries: Vec<BearoffEntry>,
    extended: bool,
}

impl BearoffOneSided {
    /// Generates the full database (54264 positions).
    pub fn generate() -> Self {
        let size = distributions(HOME_POINTS, NUM_CHEQUERS as usize);
        let mut db = BearoffOneSided {
            entries: Vec::new(),
            extended: false,
        };
        let mut entries: Vec<Option<BearoffEntry>> = (0..size).map(|_| None).collect();
        let mut counts = [0u8; HOME_POINTS];
        Self::enumerate(&mut counts, 0, NUM_CHEQUERS as usize, &mut entries);
        db.entries = entries
            .into_iter()
            .map(|entry| match entry {
                Some(entry) => entry,
                // unreachable: enumerate visits every index
                None => BearoffEntry {
                    dist: [0.0; MAX_ROLLS],
                    first: [0.0; MAX_ROLLS],
                    expected: 0.0,
                },
            })
            .collect();
        db
    }

    fn enumerate(
        counts: &mut HomeCounts,
        point: usize,
        left: usize,
        entries: &mut Vec<Option<BearoffEntry>>,
    ) {
        if point == HOME_POINTS {
            Self::solve(counts, entries);
            return;
        }
        for c in 0..=left {
            counts[point] = c as u8;
            Self::enumerate(counts, point + 1, left - c, entries);
        }
        counts[point] = 0;
    }

    fn solve(counts: &HomeCounts, entries: &mut Vec<Option<BearoffEntry>>) -> usize {
        let index = position_index(counts, NUM_CHEQUERS as usize);
        if entries[index].is_some() {
            return index;
        }

        if total(counts) == 0 {
            let mut dist = [0.0; MAX_ROLLS];
            dist[0] = 1.0;
            let mut first = [0.0; MAX_ROLLS];
            first[0] = 1.0;
            entries[index] = Some(BearoffEntry {
                dist,
                first,
                expected: 0.0,
            });
            return index;
        }

        let full_army = total(counts) == NUM_CHEQUERS;
        let mut dist = [0.0f32; MAX_ROLLS];
        let mut first = [0.0f32; MAX_ROLLS];
        let mut expected = 1.0f32;

        for (dice, weight) in ALL_ROLLS {
            let successors = roll_successors(counts, dice.0, dice.1);
            // best play minimises the expected number of remaining rolls
            let mut best: Option<usize> = None;
            let mut best_expected = f32::INFINITY;
            let mut best_total = 0u8;
            for succ in &successors {
                let idx = Self::solve(succ, entries);
                let e = entries[idx].as_ref().map(|s| s.expected).unwrap_or(0.0);
                if e < best_expected {
                    best_expected = e;
                    best = Some(idx);
                    best_total = total(succ);
                }
            }
            let Some(best) = best else { continue };
            let p = weight as f32 / 36.0;
            expected += p * best_expected;

            if let Some(succ_entry) = entries[best].as_ref() {
                for n in 0..MAX_ROLLS - 1 {
                    dist[n + 1] += p * succ_entry.dist[n];
                }
                dist[MAX_ROLLS - 1] += p * succ_entry.dist[MAX_ROLLS - 1];

                // rolls until the first chequer comes off, for gammons
                if full_army {
                    if best_total < NUM_CHEQUERS {
                        first[1] += p;
                    } else {
                        for n in 0..MAX_ROLLS - 1 {
                            first[n + 1] += p * succ_entry.first[n];
                        }
                        first[MAX_ROLLS - 1] += p * succ_entry.first[MAX_ROLLS - 1];
                    }
                }
            }
        }

        if !full_army {
            first[0] = 1.0;
        }

        entries[index] = Some(BearoffEntry {
            dist,
            first,
            expected,
        });
        index
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Expected rolls to bear off for one side's home board.
    pub fn expected_rolls(&self, board: &Board, side: usize) -> f32 {
        let counts = home_counts(board, side);
        self.entries[position_index(&counts, NUM_CHEQUERS as usize)].expected
    }

    /// Evaluates a one-sided bearoff position: the mover is on roll and wins
    /// when their roll count does not exceed the opponent's. Gammons use the
    /// first-chequer distributions; backgammons are impossible with both
    /// armies home.
    pub fn evaluate(&self, board: &Board, outputs: &mut Outputs) {
        let mover = &self.entries[position_index(&home_counts(board, MOVER), 15)];
        let opp = &self.entries[position_index(&home_counts(board, OPPONENT), 15)];

        // tail[k] = P(opponent needs >= k rolls)
        let mut opp_tail = [0.0f32; MAX_ROLLS + 1];
        let mut opp_first_tail = [0.0f32; MAX_ROLLS + 1];
        for k in (0..MAX_ROLLS).rev() {
            opp_tail[k] = opp_tail[k + 1] + opp.dist[k];
            opp_first_tail[k] = opp_first_tail[k + 1] + opp.first[k];
        }
        let mut mover_first_tail = [0.0f32; MAX_ROLLS + 1];
        for k in (0..MAX_ROLLS).rev() {
            mover_first_tail[k] = mover_first_tail[k + 1] + mover.first[k];
        }

        let mut win = 0.0f32;
        let mut win_gammon = 0.0f32;
        for n in 1..MAX_ROLLS {
            win += mover.dist[n] * opp_tail[n];
            win_gammon += mover.dist[n] * opp_first_tail[n];
        }
        let mut lose_gammon = 0.0f32;
        for k in 1..MAX_ROLLS {
            lose_gammon += opp.dist[k] * mover_first_tail[k + 1];
        }

        outputs[OUTPUT_WIN] = win.clamp(0.0, 1.0);
        outputs[OUTPUT_WIN_GAMMON] = if board.borne_off(OPPONENT) == 0 {
            win_gammon.clamp(0.0, 1.0)
        } else {
            0.0
        };
        outputs[OUTPUT_LOSE_GAMMON] = if board.borne_off(MOVER) == 0 {
            lose_gammon.clamp(0.0, 1.0)
        } else {
            0.0
        };
        outputs[OUTPUT_WIN_BACKGAMMON] = 0.0;
        outputs[OUTPUT_LOSE_BACKGAMMON] = 0.0;
    }
}

/// Two-sided bearoff database: exact cubeless equities for positions with
/// at most `max_chequers` per side, solved by retrograde expectation over
/// the 21 rolls.
#[derive(Debug)]
pub struct BearoffTwoSided {
    max_chequers: u8,
    side_size: usize,
    equities: Vec<f32>,
    cubeful: bool,
}

impl BearoffTwoSided {
    pub fn generate(max_chequers: u8) -> Self {
        let side_size = distributions(HOME_POINTS, max_chequers as usize);
        let mut db = BearoffTwoSided {
            max_chequers,
            side_size,
            equities: Vec::new(),
            cubeful: false,
        };
        let mut memo: Vec<Option<f32>> = vec![None; side_size * side_size];
        let mut mover = [0u8; HOME_POINTS];
        let mut opp = [0u8; HOME_POINTS];
        Self::enumerate_pairs(
            &mut mover,
            &mut opp,
            0,
            max_chequers as usize,
            &mut memo,
            max_chequers as usize,
        );
        db.equities = memo.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        db
    }

    fn enumerate_pairs(
        mover: &mut HomeCounts,
        opp: &mut HomeCounts,
        point: usize,
        left: usize,
        memo: &mut Vec<Option<f32>>,
        max: usize,
    ) {
        if point == HOME_POINTS {
            Self::enumerate_opp(mover, opp, 0, max, memo, max);
            return;
        }
        for c in 0..=left {
            mover[point] = c as u8;
            Self::enumerate_pairs(mover, opp, point + 1, left - c, memo, max);
        }
        mover[point] = 0;
    }

    fn enumerate_opp(
        mover: &mut HomeCounts,
        opp: &mut HomeCounts,
        point: usize,
        left: usize,
        memo: &mut Vec<Option<f32>>,
        max: usize,
    ) {
        if point == HOME_POINTS {
            Self::solve(mover, opp, memo, max);
            return;
        }
        for c in 0..=left {
            opp[point] = c as u8;
            Self::enumerate_opp(mover, opp, point + 1, left - c, memo, max);
        }
        opp[point] = 0;
    }

    /// Equity for the side on roll; `mover` and `opp` are the two home
    /// boards.
    fn solve(mover: &HomeCounts, opp: &HomeCounts, memo: &mut Vec<Option<f32>>, max: usize) -> f32 {
        let side_size = distributions(HOME_POINTS, max);
        let index = position_index(mover, max) * side_size + position_index(opp, max);
        if let Some(value) = memo[index] {
            return value;
        }
        if total(mover) == 0 {
            memo[index] = Some(1.0);
            return 1.0;
        }
        if total(opp) == 0 {
            memo[index] = Some(-1.0);
            return -1.0;
        }

        let mut value = 0.0f32;
        for (dice, weight) in ALL_ROLLS {
            let successors = roll_successors(mover, dice.0, dice.1);
            let mut best = f32::NEG_INFINITY;
            for succ in &successors {
                let v = if total(succ) == 0 {
                    1.0
                } else {
                    -Self::solve(opp, succ, memo, max)
                };
                if v > best {
                    best = v;
                }
            }
            value += weight as f32 / 36.0 * best;
        }

        memo[index] = Some(value);
        value
    }

    pub fn is_cubeful(&self) -> bool {
        self.cubeful
    }

    /// True if both sides are within this database's capacity.
    pub fn covers(&self, board: &Board) -> bool {
        board.chequers_on_board(MOVER) <= self.max_chequers
            && board.chequers_on_board(OPPONENT) <= self.max_chequers
    }

    /// Evaluates from the exact equity. Positions inside the database have
    /// at least nine chequers borne off per side, so gammons are impossible.
    pub fn evaluate(&self, board: &Board, outputs: &mut Outputs) {
        let mover = home_counts(board, MOVER);
        let opp = home_counts(board, OPPONENT);
        let max = self.max_chequers as usize;
        let index = position_index(&mover, max) * self.side_size + position_index(&opp, max);
        let equity = self.equities[index];
        outputs[OUTPUT_WIN] = ((equity + 1.0) / 2.0).clamp(0.0, 1.0);
        outputs[OUTPUT_WIN_GAMMON] = 0.0;
        outputs[OUTPUT_WIN_BACKGAMMON] = 0.0;
        outputs[OUTPUT_LOSE_GAMMON] = 0.0;
        outputs[OUTPUT_LOSE_BACKGAMMON] = 0.0;
    }
}

/// The bearoff databases available to the classifier and evaluator. Absent
/// databases make the corresponding classes degrade to the next class in
/// order.
#[derive(Default, Debug)]
pub struct BearoffSet {
    pub one_sided: Option<BearoffOneSided>,
    pub two_sided: Option<BearoffTwoSided>,
}

impl BearoffSet {
    /// No databases at all: every no-contact position races on the net.
    pub fn empty() -> Self {
        BearoffSet {
            one_sided: None,
            two_sided: None,
        }
    }

    /// The default configuration: the generated one-sided database only.
    pub fn with_one_sided() -> Self {
        BearoffSet {
            one_sided: Some(BearoffOneSided::generate()),
            two_sided: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammon::definitions::{MOVER, OPPONENT};

    #[test]
    fn binomials() {
        assert_eq!(binomial(21, 6), 54264);
        assert_eq!(distributions(HOME_POINTS, 15), 54264);
        assert_eq!(distributions(HOME_POINTS, 3), 84);
    }

    #[test]
    fn position_index_is_injective_for_small_boards() {
        let mut seen = std::collections::HashSet::new();
        for a in 0..=3u8 {
            for b in 0..=3 - a {
                for c in 0..=3 - a - b {
                    let counts = [a, b, c, 0, 0, 0];
                    assert!(seen.insert(position_index(&counts, 3)));
                }
            }
        }
        for index in &seen {
            assert!(*index < distributions(HOME_POINTS, 3));
        }
    }

    #[test]
    fn one_sided_expected_rolls_are_sane() {
        let db = BearoffOneSided::generate();

        // a single chequer on the ace point comes off in exactly one roll
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 1;
        assert!((db.expected_rolls(&board, MOVER) - 1.0).abs() < 1e-6);

        // fifteen chequers on the six point take at least eight rolls
        let mut board = Board::empty();
        board.counts_mut(MOVER)[5] = 15;
        assert!(db.expected_rolls(&board, MOVER) >= 8.0);
    }

    #[test]
    fn one_sided_eval_certain_win() {
        let db = BearoffOneSided::generate();
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 1;
        board.counts_mut(OPPONENT)[5] = 6;
        let mut outputs = [0.0; 5];
        db.evaluate(&board, &mut outputs);
        // mover bears off with any roll before the opponent can finish
        assert!((outputs[OUTPUT_WIN] - 1.0).abs() < 1e-5);
        assert_eq!(outputs[OUTPUT_WIN_BACKGAMMON], 0.0);
    }

    #[test]
    fn one_sided_eval_four_on_the_ace() {
        let db = BearoffOneSided::generate();
        // mover needs two rolls unless a double comes up; the opponent is
        // certain to finish on their next roll.
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 4;
        board.counts_mut(OPPONENT)[0] = 1;
        let mut outputs = [0.0; 5];
        db.evaluate(&board, &mut outputs);
        // mover wins only by rolling a double now: 6/36
        assert!((outputs[OUTPUT_WIN] - 6.0 / 36.0).abs() < 1e-5);
    }

    #[test]
    fn one_sided_symmetry() {
        let db = BearoffOneSided::generate();
        let mut board = Board::empty();
        board.counts_mut(MOVER)[2] = 2;
        board.counts_mut(MOVER)[4] = 1;
        board.counts_mut(OPPONENT)[2] = 2;
        board.counts_mut(OPPONENT)[4] = 1;

        let mut outputs = [0.0; 5];
        db.evaluate(&board, &mut outputs);
        let mut swapped = [0.0; 5];
        db.evaluate(&board.swapped(), &mut swapped);
        // identical armies: win for one side equals loss for the other
        assert!((outputs[OUTPUT_WIN] - swapped[OUTPUT_WIN]).abs() < 1e-5);
    }

    #[test]
    fn two_sided_small_database() {
        let db = BearoffTwoSided::generate(2);

        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 1;
        board.counts_mut(OPPONENT)[0] = 1;
        assert!(db.covers(&board));

        let mut outputs = [0.0; 5];
        db.evaluate(&board, &mut outputs);
        // mover bears off first with certainty
        assert!((outputs[OUTPUT_WIN] - 1.0).abs() < 1e-6);

        // two chequers each on high points: mover is favoured but not certain
        let mut board = Board::empty();
        board.counts_mut(MOVER)[5] = 2;
        board.counts_mut(OPPONENT)[5] = 2;
        db.evaluate(&board, &mut outputs);
        assert!(outputs[OUTPUT_WIN] > 0.5);
        assert!(outputs[OUTPUT_WIN] < 1.0);
    }

    #[test]
    fn two_sided_capacity() {
        let db = BearoffTwoSided::generate(2);
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 3;
        board.counts_mut(OPPONENT)[0] = 1;
        assert!(!db.covers(&board));
    }
}
