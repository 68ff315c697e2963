/*
 * inputs.rs
 * Part of the byte-gammon project
 * Created Date: Wednesday, March 19th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Thu Jun 26 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use arrayvec::ArrayVec;
use gammon::board::Board;
use gammon::definitions::{BAR, MOVER, NUM_POINTS, NUM_SIDES, OPPONENT};

use crate::classify::PositionClass;

/// Four features per count slot, two sides, 25 slots.
pub const NUM_BASE_INPUTS: usize = NUM_SIDES * 25 * 4;

/// Race net: base features plus pip counts and borne-off counts.
pub const NUM_RACE_INPUTS: usize = NUM_BASE_INPUTS + 4;

/// Contact and crashed nets: the race features plus blot counts.
pub const NUM_CONTACT_INPUTS: usize = NUM_BASE_INPUTS + 6;

/// Widest input vector any net consumes.
pub const MAX_NET_INPUTS: usize = NUM_CONTACT_INPUTS;

pub type InputVector = ArrayVec<f32, MAX_NET_INPUTS>;

/// Features for a regular point holding `n` chequers:
/// `[n>=1, n>=2, n>=3, max(0, n-3)/2]`.
#[rustfmt::skip]
const INPUT_VEC: [[f32; 4]; 16] = [
    /*  0 */ [0.0, 0.0, 0.0, 0.0],
    /*  1 */ [1.0, 0.0, 0.0, 0.0],
    /*  2 */ [0.0, 1.0, 0.0, 0.0],
    /*  3 */ [0.0, 0.0, 1.0, 0.0],
    /*  4 */ [0.0, 0.0, 1.0, 0.5],
    /*  5 */ [0.0, 0.0, 1.0, 1.0],
    /*  6 */ [0.0, 0.0, 1.0, 1.5],
    /*  7 */ [0.0, 0.0, 1.0, 2.0],
    /*  8 */ [0.0, 0.0, 1.0, 2.5],
    /*  9 */ [0.0, 0.0, 1.0, 3.0],
    /* 10 */ [0.0, 0.0, 1.0, 3.5],
    /* 11 */ [0.0, 0.0, 1.0, 4.0],
    /* 12 */ [0.0, 0.0, 1.0, 4.5],
    /* 13 */ [0.0, 0.0, 1.0, 5.0],
    /* 14 */ [0.0, 0.0, 1.0, 5.5],
    /* 15 */ [0.0, 0.0, 1.0, 6.0],
];

/// Cumulative variant used for the bar, where all lower thresholds stay set.
#[rustfmt::skip]
const INPUT_VEC_BAR: [[f32; 4]; 16] = [
    /*  0 */ [0.0, 0.0, 0.0, 0.0],
    /*  1 */ [1.0, 0.0, 0.0, 0.0],
    /*  2 */ [1.0, 1.0, 0.0, 0.0],
    /*  3 */ [1.0, 1.0, 1.0, 0.0],
    /*  4 */ [1.0, 1.0, 1.0, 0.5],
    /*  5 */ [1.0, 1.0, 1.0, 1.0],
    /*  6 */ [1.0, 1.0, 1.0, 1.5],
    /*  7 */ [1.0, 1.0, 1.0, 2.0],
    /*  8 */ [1.0, 1.0, 1.0, 2.5],
    /*  9 */ [1.0, 1.0, 1.0, 3.0],
    /* 10 */ [1.0, 1.0, 1.0, 3.5],
    /* 11 */ [1.0, 1.0, 1.0, 4.0],
    /* 12 */ [1.0, 1.0, 1.0, 4.5],
    /* 13 */ [1.0, 1.0, 1.0, 5.0],
    /* 14 */ [1.0, 1.0, 1.0, 5.5],
    /* 15 */ [1.0, 1.0, 1.0, 6.0],
];

/// Pip count of the starting position, used to normalise pip features.
const PIP_NORM: f32 = 167.0;

/// Encodes the class-appropriate feature vector for a board, always from
/// the mover's viewpoint. Deterministic and side-effect-free.
pub fn encode(board: &Board, class: PositionClass) -> InputVector {
    let mut inputs = InputVector::new();
    base_inputs(board, &mut inputs);
    let pips = board.pip_counts();
    inputs.push(pips[MOVER] as f32 / PIP_NORM);
    inputs.push(pips[OPPONENT] as f32 / PIP_NORM);
    inputs.push(board.borne_off(MOVER) as f32 / 15.0);
    inputs.push(board.borne_off(OPPONENT) as f32 / 15.0);
    if class != PositionClass::Race {
        inputs.push(blots(board, MOVER) as f32 / 15.0);
        inputs.push(blots(board, OPPONENT) as f32 / 15.0);
    }
    inputs
}

/// The 200 base features: per side, four features for each of the 24 points
/// from the point table and for the bar from the cumulative table.
fn base_inputs(board: &Board, inputs: &mut InputVector) {
    for side in [OPPONENT, MOVER] {
        let counts = board.counts(side);
        for &count in counts[..NUM_POINTS].iter() {
            inputs.extend(INPUT_VEC[count as usize]);
        }
        inputs.extend(INPUT_VEC_BAR[counts[BAR] as usize]);
    }
}

fn blots(board: &Board, side: usize) -> u32 {
    board.counts(side)[..NUM_POINTS]
        .iter()
        .filter(|&&c| c == 1)
        .count() as u32
}
