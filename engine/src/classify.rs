/*
 * classify.rs
 * Part of the byte-gammon project
 * Created Date: Tuesday, March 18th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Fri Jun 27 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::board::Board;
use gammon::definitions::{MOVER, NUM_SIDES, OPPONENT};

use crate::bearoff::BearoffSet;

/// Position classes in decision order: the first matching class wins.
///
/// The three learned classes ([`Race`], [`Crashed`], [`Contact`]) each map
/// to their own network; the others are closed-form or database lookups.
///
/// [`Race`]: PositionClass::Race
/// [`Crashed`]: PositionClass::Crashed
/// [`Contact`]: PositionClass::Contact
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionClass {
    /// One side has borne off all 15 chequers.
    Over,
    /// Exact two-sided bearoff database.
    Bearoff2,
    /// Two-sided bearoff database with cubeful equities.
    BearoffTs,
    /// One-sided bearoff database.
    Bearoff1,
    /// Extended one-sided bearoff database.
    BearoffOs,
    Race,
    Crashed,
    Contact,
}

impl PositionClass {
    /// True for classes evaluated by a database rather than a net.
    pub fn is_bearoff(&self) -> bool {
        matches!(
            self,
            PositionClass::Bearoff2
                | PositionClass::BearoffTs
                | PositionClass::Bearoff1
                | PositionClass::BearoffOs
        )
    }
}

/// Classifies a board. Pure in the board and the set of available bearoff
/// databases: a bearoff class is only reported when a database that covers
/// the position is actually loaded, otherwise the position falls through to
/// the race net.
pub fn classify(board: &Board, bearoff: &BearoffSet) -> PositionClass {
    if !board.is_playing() {
        return PositionClass::Over;
    }

    if !board.has_contact() {
        if board.all_home(MOVER) && board.all_home(OPPONENT) {
            if let Some(ts) = &bearoff.two_sided {
                if ts.covers(board) {
                    return if ts.is_cubeful() {
                        PositionClass::BearoffTs
                    } else {
                        PositionClass::Bearoff2
                    };
                }
            }
            if let Some(os) = &bearoff.one_sided {
                return if os.is_extended() {
                    PositionClass::BearoffOs
                } else {
                    PositionClass::Bearoff1
                };
            }
        }
        return PositionClass::Race;
    }

    for side in 0..NUM_SIDES {
        if side_is_crashed(board, side) {
            return PositionClass::Crashed;
        }
    }
    PositionClass::Contact
}

/// Crashed heuristic: seven or more of the side's chequers are out of the
/// game, either borne off or buried as spares on the ace and deuce points.
fn side_is_crashed(board: &Board, side: usize) -> bool {
    let counts = board.counts(side);
    let remaining = board.chequers_on_board(side);
    let borne_off = gammon::definitions::NUM_CHEQUERS - remaining;
    let dead_spares = counts[0].saturating_sub(1) + counts[1].saturating_sub(1);
    borne_off + dead_spares >= 7
}
