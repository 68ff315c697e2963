/*
 * move_generation.rs
 * Part of the byte-gammon project
 * Created Date: Friday, March 7th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Mon Jun 23 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use arrayvec::ArrayVec;

use crate::board::Board;
use crate::definitions::{BAR, HOME_TOP, MAX_SUBMOVES, MOVER, NUM_POINTS};
use crate::dice::Dice;
use crate::move_list::PlayList;
use crate::moves::{Play, SubMove, OFF};
use crate::position_key::PositionKey;

/// Generates all distinct legal complete plays for a dice roll.
///
/// Rules enforced:
/// - chequers on the bar must re-enter before anything else moves;
/// - a point held by two or more opposing chequers cannot be occupied, and a
///   lone opposing chequer on a landed point is hit to the bar;
/// - bearing off requires the whole army home and uses the exact pip, or a
///   higher die from the highest occupied point;
/// - doubles allow up to four moves of the die value;
/// - a play must use as many dice as possible, and when only one die can be
///   played the higher one is preferred where a choice exists.
///
/// Plays that reach the same board are coalesced, keeping the
/// lexicographically smallest canonical encoding, and the output is sorted
/// in canonical play order.
pub struct MoveGenerator;

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator
    }

    /// Enumerates the legal plays for `dice` into `list`. An empty result is
    /// a dance: the mover cannot move at all.
    pub fn generate(&self, board: &Board, dice: Dice, list: &mut PlayList) {
        let mut raw: Vec<Play> = Vec::new();
        let mut current: ArrayVec<SubMove, MAX_SUBMOVES> = ArrayVec::new();

        if dice.is_double() {
            let rolls = [dice.0; MAX_SUBMOVES];
            Self::generate_recursive(board, &rolls, 0, BAR, true, &mut current, &mut raw);
        } else {
            Self::generate_recursive(
                board,
                &[dice.0, dice.1],
                0,
                BAR,
                false,
                &mut current,
                &mut raw,
            );
            Self::generate_recursive(
                board,
                &[dice.1, dice.0],
                0,
                BAR,
                false,
                &mut current,
                &mut raw,
            );
        }

        let max_len = raw.iter().map(Play::len).max().unwrap_or(0);
        if max_len == 0 {
            list.clear();
            return;
        }
        raw.retain(|play| play.len() == max_len);

        // When only a single die can be played the higher one is mandatory
        // if it can be played at all.
        if !dice.is_double() && max_len == 1 {
            let hi = dice.hi();
            if raw.iter().any(|play| Self::single_uses_die(board, play, hi)) {
                raw.retain(|play| Self::single_uses_die(board, play, hi));
            }
        }

        let mut best: HashMap<PositionKey, Play> = HashMap::with_capacity(raw.len());
        for play in raw {
            let key = PositionKey::from_board(play.board());
            match best.entry(key) {
                Entry::Occupied(mut entry) => {
                    if play.cmp_encoding(entry.get()) == Ordering::Less {
                        entry.insert(play);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(play);
                }
            }
        }

        let mut plays: Vec<Play> = best.into_values().collect();
        plays.sort_unstable_by(Play::cmp_encoding);
        list.replace(plays);
    }

    /// Depth-first expansion of one die order. For doubles the source point
    /// is bounded by the previous submove's source; every double play has a
    /// non-increasing-source reordering, and the bound prunes the
    /// permutation blow-up before deduplication.
    fn generate_recursive(
        board: &Board,
        rolls: &[u8],
        depth: usize,
        max_from: usize,
        restrict_sources: bool,
        current: &mut ArrayVec<SubMove, MAX_SUBMOVES>,
        out: &mut Vec<Play>,
    ) {
        if depth == rolls.len() {
            out.push(Play::new(current.clone(), *board));
            return;
        }

        let die = rolls[depth];
        let mut moved = false;

        if board.mover_bar() > 0 {
            let to = BAR as i8 - die as i8;
            if !board.is_blocked(to as usize) {
                let sub = SubMove {
                    from: BAR as i8,
                    to,
                };
                let mut next = *board;
                next.apply_submove(sub);
                current.push(sub);
                Self::generate_recursive(
                    &next,
                    rolls,
                    depth + 1,
                    BAR,
                    restrict_sources,
                    current,
                    out,
                );
                current.pop();
                moved = true;
            }
        } else {
            let top = if restrict_sources {
                max_from.min(NUM_POINTS - 1)
            } else {
                NUM_POINTS - 1
            };
            for from in (0..=top).rev() {
                if board.mover()[from] == 0 {
                    continue;
                }
                if let Some(sub) = Self::legal_submove(board, from, die) {
                    let mut next = *board;
                    next.apply_submove(sub);
                    current.push(sub);
                    Self::generate_recursive(
                        &next,
                        rolls,
                        depth + 1,
                        from,
                        restrict_sources,
                        current,
                        out,
                    );
                    current.pop();
                    moved = true;
                }
            }
        }

        if !moved && !current.is_empty() {
            out.push(Play::new(current.clone(), *board));
        }
    }

    fn legal_submove(board: &Board, from: usize, die: u8) -> Option<SubMove> {
        let to = from as i8 - die as i8;
        if to >= 0 {
            if board.is_blocked(to as usize) {
                return None;
            }
            return Some(SubMove {
                from: from as i8,
                to,
            });
        }

        if !board.all_home(MOVER) {
            return None;
        }
        let exact = from + 1 == die as usize;
        let from_highest = board.mover()[from + 1..=HOME_TOP].iter().all(|&c| c == 0);
        if exact || from_highest {
            Some(SubMove {
                from: from as i8,
                to: OFF,
            })
        } else {
            None
        }
    }

    /// True if a one-move play could have consumed the given die on the
    /// original board.
    fn single_uses_die(board: &Board, play: &Play, die: u8) -> bool {
        let sub = play.submoves()[0];
        if sub.is_bear_off() {
            sub.from + 1 == die as i8
                || board.mover()[sub.from as usize + 1..=HOME_TOP]
                    .iter()
                    .all(|&c| c == 0)
        } else {
            sub.from - sub.to == die as i8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::OPPONENT;

    fn generate(board: &Board, dice: Dice) -> PlayList {
        let mut list = PlayList::new();
        MoveGenerator::new().generate(board, dice, &mut list);
        list
    }

    fn replay(board: &Board, play: &Play) -> Board {
        let mut next = *board;
        for &sub in play.submoves() {
            next.apply_submove(sub);
        }
        next
    }

    #[test]
    fn opening_six_five_contains_the_run() {
        let board = Board::starting_position();
        let list = generate(&board, Dice(6, 5));

        assert!(!list.is_empty());
        assert!(list.iter().all(|play| play.len() == 2));

        // 24/18 18/13 must be among the plays.
        let run = list.iter().any(|play| {
            play.submoves() == [SubMove { from: 23, to: 17 }, SubMove { from: 17, to: 12 }]
        });
        assert!(run);
    }

    #[test]
    fn dance_on_closed_board() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[BAR] = 1;
        board.counts_mut(MOVER)[12] = 14;
        // opponent home board completely closed
        for point in 0..=HOME_TOP {
            board.counts_mut(OPPONENT)[point] = 2;
        }
        board.counts_mut(OPPONENT)[10] = 3;

        let list = generate(&board, Dice(6, 3));
        assert!(list.is_empty());
    }

    #[test]
    fn bar_chequer_enters_first() {
        let mut board = Board::starting_position();
        board.counts_mut(MOVER)[23] -= 1;
        board.counts_mut(MOVER)[BAR] += 1;

        let list = generate(&board, Dice(2, 4));
        for play in list.iter() {
            assert_eq!(play.submoves()[0].from, BAR as i8);
        }
    }

    #[test]
    fn higher_die_preferred_when_only_one_playable() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[23] = 1;
        // Block the continuation square so only one die can ever be played.
        board.counts_mut(OPPONENT)[NUM_POINTS - 1 - 12] = 2;

        let list = generate(&board, Dice(6, 5));
        assert_eq!(list.len(), 1);
        let play = list.at(0).unwrap();
        assert_eq!(play.submoves(), [SubMove { from: 23, to: 17 }]);
    }

    #[test]
    fn doubles_bear_off_four_chequers() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 4;
        board.counts_mut(OPPONENT)[0] = 2;

        let list = generate(&board, Dice(1, 1));
        assert_eq!(list.len(), 1);
        let play = list.at(0).unwrap();
        assert_eq!(play.len(), 4);
        assert!(play.submoves().iter().all(SubMove::is_bear_off));
        assert_eq!(play.board().borne_off(MOVER), 15);
    }

    #[test]
    fn bear_off_higher_die_from_highest_point() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[3] = 1;
        board.counts_mut(MOVER)[1] = 1;

        let list = generate(&board, Dice(6, 5));
        // 6 bears off the chequer on the 4 point (highest), 5 cannot play
        // afterwards from the deuce except as another bear-off.
        assert!(!list.is_empty());
        for play in list.iter() {
            assert_eq!(play.len(), 2);
        }
    }

    #[test]
    fn all_rolls_produce_distinct_reachable_boards() {
        use crate::dice::ALL_ROLLS;

        let board = Board::starting_position();
        for (dice, _) in ALL_ROLLS {
            let list = generate(&board, dice);
            let mut seen = std::collections::HashSet::new();
            for play in list.iter() {
                // every returned board is reachable by replaying the play
                assert_eq!(replay(&board, play), *play.board(), "roll {}", dice);
                // and no two plays share a resulting board
                assert!(
                    seen.insert(PositionKey::from_board(play.board())),
                    "duplicate board for roll {}",
                    dice
                );
            }
            assert!(!list.is_empty());
        }
    }

    #[test]
    fn blocked_points_cannot_be_landed_on() {
        let board = Board::starting_position();
        // 6-point (index 18 for the opponent) is held by five opposing
        // chequers; a 6-5 cannot land there.
        let list = generate(&board, Dice(6, 5));
        for play in list.iter() {
            for sub in play.submoves() {
                assert!(!board.is_blocked(sub.to as usize) || sub.is_bear_off());
            }
        }
    }
}
