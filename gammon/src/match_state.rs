/*
 * match_state.rs
 * Part of the byte-gammon project
 * Created Date: Tuesday, March 11th 2025
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
use crate::definitions::{MAX_CUBE, MAX_SCORE};
use crate::dice::Dice;

/// Default beaver limit used when none is configured.
pub const DEFAULT_BEAVERS: u32 = 3;

/// Game variations. Only the standard game is supported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variation {
    #[default]
    Standard,
}

/// Lifecycle of a single game within a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameState {
    #[default]
    NotStarted,
    Playing,
    Over,
    Resigned,
    Dropped,
}

/// Errors raised when assembling a [`CubeInfo`] from inconsistent data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CubeError {
    #[error("cube value {0} is not a power of two in 1..={MAX_CUBE}")]
    InvalidCube(u32),
    #[error("cube owner {0} is not -1, 0 or 1")]
    InvalidOwner(i8),
    #[error("match length {0} exceeds the supported maximum of {MAX_SCORE}")]
    MatchTooLong(u32),
    #[error("scores {0:?} do not fit in a match to {1}")]
    InvalidScore([u32; 2], u32),
}

/// Everything the equity layers need to know about the cube and the score.
///
/// `owner` is a player index (0 or 1) or -1 for a centred cube; `on_roll` is
/// the player the board's mover side belongs to. `match_to == 0` denotes a
/// money game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CubeInfo {
    pub cube: u32,
    pub owner: i8,
    pub on_roll: usize,
    pub match_to: u32,
    pub scores: [u32; 2],
    pub crawford: bool,
    pub jacoby: bool,
    pub beavers: u32,
    pub variation: Variation,
}

impl CubeInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cube: u32,
        owner: i8,
        on_roll: usize,
        match_to: u32,
        scores: [u32; 2],
        crawford: bool,
        jacoby: bool,
        beavers: u32,
        variation: Variation,
    ) -> Result<CubeInfo, CubeError> {
        if cube == 0 || cube > MAX_CUBE || !cube.is_power_of_two() {
            return Err(CubeError::InvalidCube(cube));
        }
        if !(-1..=1).contains(&owner) {
            return Err(CubeError::InvalidOwner(owner));
        }
        if match_to > MAX_SCORE {
            return Err(CubeError::MatchTooLong(match_to));
        }
        if match_to > 0 && (scores[0] >= match_to || scores[1] >= match_to) {
            return Err(CubeError::InvalidScore(scores, match_to));
        }
        Ok(CubeInfo {
            cube,
            owner,
            on_roll: on_roll & 1,
            match_to,
            scores,
            crawford: crawford && match_to > 0,
            jacoby: jacoby && match_to == 0,
            beavers,
            variation,
        })
    }

    /// Cube info for a money game with a centred cube.
    pub fn money(jacoby: bool, beavers: u32) -> CubeInfo {
        CubeInfo {
            cube: 1,
            owner: -1,
            on_roll: 1,
            match_to: 0,
            scores: [0, 0],
            crawford: false,
            jacoby,
            beavers,
            variation: Variation::Standard,
        }
    }

    pub fn is_money(&self) -> bool {
        self.match_to == 0
    }

    pub fn is_centred(&self) -> bool {
        self.owner < 0
    }

    /// Points the player still needs to win the match.
    pub fn away(&self, player: usize) -> u32 {
        self.match_to.saturating_sub(self.scores[player & 1])
    }

    /// The same cube seen with the other player on roll. Owner and scores
    /// are absolute player indices and do not change.
    pub fn for_opponent(&self) -> CubeInfo {
        CubeInfo {
            on_roll: self.on_roll ^ 1,
            ..*self
        }
    }

    /// A hypothetical state after the player on roll doubles and the
    /// opponent takes.
    pub fn after_double_take(&self) -> CubeInfo {
        CubeInfo {
            cube: self.cube * 2,
            owner: (self.on_roll ^ 1) as i8,
            ..*self
        }
    }

    /// True if the player on roll may currently offer the cube.
    pub fn mover_may_double(&self) -> bool {
        !self.crawford
            && self.cube < MAX_CUBE
            && (self.is_centred() || self.owner == self.on_roll as i8)
    }

    /// True if doubling can no longer change the match outcome: the cube
    /// already covers what either player needs.
    pub fn cube_is_dead(&self) -> bool {
        !self.is_money() && self.cube >= self.away(0) && self.cube >= self.away(1)
    }
}

/// Full description of a position within a money session or match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchState {
    pub board: Board,
    pub dice: Option<Dice>,
    pub cube: u32,
    pub cube_owner: i8,
    pub on_roll: usize,
    pub turn: usize,
    pub doubled: bool,
    /// 0 = no resignation pending, otherwise 1..=3 for the offered stake.
    pub resigned: u8,
    pub scores: [u32; 2],
    pub match_to: u32,
    pub crawford: bool,
    pub post_crawford: bool,
    pub jacoby: bool,
    pub cube_use: bool,
    pub game_state: GameState,
    pub variation: Variation,
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState {
            board: Board::starting_position(),
            dice: None,
            cube: 1,
            cube_owner: -1,
            on_roll: 1,
            turn: 1,
            doubled: false,
            resigned: 0,
            scores: [0, 0],
            match_to: 0,
            crawford: false,
            post_crawford: false,
            jacoby: false,
            cube_use: true,
            game_state: GameState::Playing,
            variation: Variation::Standard,
        }
    }
}

impl MatchState {
    /// Builds the cube info for this state with the default beaver limit.
    pub fn cube_info(&self) -> Result<CubeInfo, CubeError> {
        self.cube_info_with_beavers(DEFAULT_BEAVERS)
    }

    pub fn cube_info_with_beavers(&self, beavers: u32) -> Result<CubeInfo, CubeError> {
        CubeInfo::new(
            self.cube,
            self.cube_owner,
            self.on_roll,
            self.match_to,
            self.scores,
            self.crawford,
            self.jacoby,
            beavers,
            self.variation,
        )
    }
}
