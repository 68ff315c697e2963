/*
 * xgid.rs
 * Part of the byte-gammon project
 * Created Date: Wednesday, March 12th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Fri Jun 27 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use thiserror::Error;

use crate::board::Board;
use crate::definitions::{BAR, MAX_CUBE, MAX_SCORE, MOVER, NUM_POINTS, OPPONENT};
use crate::dice::Dice;
use crate::match_state::{GameState, MatchState, Variation};

/// Number of characters in the board field: one bar per side plus 24 points.
const BOARD_FIELD_LEN: usize = 26;

/// Number of `:`-separated fields following the board.
const NUM_FIELDS: usize = 9;

/// Errors raised while parsing an XGID position identifier. Each variant
/// maps to a distinct negative code at the engine boundary.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum XgidError {
    #[error("position id does not start with XGID=")]
    MissingPrefix,
    #[error("invalid board field")]
    InvalidBoard,
    #[error("missing or malformed field")]
    InvalidField,
    #[error("unsupported dice field")]
    UnsupportedDice,
    #[error("field value out of range")]
    OutOfRange,
}

impl XgidError {
    pub fn code(&self) -> i32 {
        match self {
            XgidError::MissingPrefix => -1,
            XgidError::InvalidBoard => -2,
            XgidError::InvalidField => -3,
            XgidError::UnsupportedDice => -4,
            XgidError::OutOfRange => -5,
        }
    }
}

/// Parses an XGID string into a [`MatchState`].
///
/// The format is `XGID=<board>:<cube-log2>:<cube-owner>:<on-roll>:<dice>:
/// <score0>:<score1>:<rules>:<match-to>:<cube-use>`. The board field encodes
/// one character per slot — the opponent's bar, the 24 points as seen by
/// player 1, then player 1's bar — with `a..o` for opposing chequer counts,
/// `A..O` for player 1's and `-` for an empty slot. The returned board is
/// always relative to the player on roll: when the on-roll field is negative
/// the sides are swapped during decoding.
pub fn parse_xgid(xgid: &str) -> Result<MatchState, XgidError> {
    let body = xgid.strip_prefix("XGID=").ok_or(XgidError::MissingPrefix)?;

    let mut parts = body.split(':');
    let board_field = parts.next().ok_or(XgidError::InvalidField)?;
    let fields: Vec<&str> = parts.collect();
    if fields.len() < NUM_FIELDS {
        return Err(XgidError::InvalidField);
    }

    let board = decode_board(board_field)?;

    let cube_log2 = parse_int(fields[0])?;
    if !(0..=12).contains(&cube_log2) {
        return Err(XgidError::OutOfRange);
    }
    let cube = 1u32 << cube_log2;

    let cube_owner = match parse_int(fields[1])? {
        1 => 1,
        -1 => 0,
        _ => -1,
    };

    let on_roll = if parse_int(fields[2])? > 0 { 1 } else { 0 };

    let (dice, doubled) = parse_dice(fields[3])?;

    let score0 = parse_int(fields[4])?;
    let score1 = parse_int(fields[5])?;
    let rules = parse_int(fields[6])?;
    let match_to = parse_int(fields[7])?;
    let cube_use = parse_int(fields[8])? > 0;

    if score0 < 0 || score1 < 0 || match_to < 0 {
        return Err(XgidError::OutOfRange);
    }
    let scores = [score0 as u32, score1 as u32];
    let match_to = match_to as u32;

    if cube > MAX_CUBE || match_to > MAX_SCORE {
        return Err(XgidError::OutOfRange);
    }
    if match_to > 0 && (scores[0] >= match_to || scores[1] >= match_to) {
        return Err(XgidError::OutOfRange);
    }

    let (crawford, jacoby) = if match_to > 0 {
        (rules != 0, false)
    } else {
        (false, rules & 1 != 0)
    };
    let post_crawford = !crawford
        && match_to > 0
        && (scores[0] == match_to - 1 || scores[1] == match_to - 1);

    // The board field is in player 1's frame; the engine wants it relative
    // to the player on roll.
    let board = if on_roll == 0 { board.swapped() } else { board };

    Ok(MatchState {
        board,
        dice,
        cube,
        cube_owner,
        on_roll,
        turn: if doubled { on_roll ^ 1 } else { on_roll },
        doubled,
        resigned: 0,
        scores,
        match_to,
        crawford,
        post_crawford,
        jacoby,
        cube_use,
        game_state: GameState::Playing,
        variation: Variation::Standard,
    })
}

fn parse_int(field: &str) -> Result<i64, XgidError> {
    field.trim().parse::<i64>().map_err(|_| XgidError::InvalidField)
}

fn parse_dice(field: &str) -> Result<(Option<Dice>, bool), XgidError> {
    if field == "D" {
        return Ok((None, true));
    }
    let digits: Vec<u8> = field
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
        .ok_or(XgidError::UnsupportedDice)?;
    if digits.len() != 2 {
        return Err(XgidError::UnsupportedDice);
    }
    match (digits[0], digits[1]) {
        (0, 0) => Ok((None, false)),
        (d0, d1) => {
            let dice = Dice::new(d0, d1).ok_or(XgidError::OutOfRange)?;
            Ok((Some(dice), false))
        }
    }
}

fn decode_board(field: &str) -> Result<Board, XgidError> {
    let chars: Vec<char> = field.chars().collect();
    if chars.len() != BOARD_FIELD_LEN {
        return Err(XgidError::InvalidBoard);
    }

    let mut board = Board::empty();
    for (i, &c) in chars.iter().enumerate() {
        let (side, count) = match c {
            '-' => continue,
            'a'..='o' => (OPPONENT, c as u8 - b'a' + 1),
            'A'..='O' => (MOVER, c as u8 - b'A' + 1),
            _ => return Err(XgidError::InvalidBoard),
        };
        match i {
            0 => {
                if side != OPPONENT {
                    return Err(XgidError::InvalidBoard);
                }
                board.counts_mut(OPPONENT)[BAR] = count;
            }
            25 => {
                if side != MOVER {
                    return Err(XgidError::InvalidBoard);
                }
                board.counts_mut(MOVER)[BAR] = count;
            }
            point => {
                let slot = if side == MOVER {
                    point - 1
                } else {
                    NUM_POINTS - point
                };
                board.counts_mut(side)[slot] = count;
            }
        }
    }

    if !board.is_legal() {
        return Err(XgidError::InvalidBoard);
    }
    Ok(board)
}
