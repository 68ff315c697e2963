/*
 * match_equity.rs
 * Part of the byte-gammon project
 * Created Date: Wednesday, March 26th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jul 2 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use thiserror::Error;

use gammon::match_state::CubeInfo;

use crate::defs::{
    Outputs, OUTPUT_LOSE_BACKGAMMON, OUTPUT_LOSE_GAMMON, OUTPUT_WIN, OUTPUT_WIN_BACKGAMMON,
    OUTPUT_WIN_GAMMON,
};

/// Longest match the tables cover.
pub const MAX_SCORE: usize = 64;

/// Cube levels with precomputed gammon prices (1 through 64).
pub const MAX_CUBE_LEVEL: usize = 7;

/// Gammon rate used by the Zadeh post-Crawford recurrence.
const GAMMON_RATE: f32 = 0.25;

/// Free-drop corrections at 1-away/2-away and 1-away/4-away.
const FREE_DROP_2AWAY: f32 = 0.015;
const FREE_DROP_4AWAY: f32 = 0.004;

/// Per-away standard deviations for the table extension; beyond 10-away a
/// flat 1.77 applies.
const STDDEV_TABLE: [f32; 12] = [
    0.0, 1.24, 1.27, 1.47, 1.50, 1.60, 1.61, 1.66, 1.68, 1.70, 1.72, 1.77,
];

/// Result-row indices for [`MatchEquityTable::me_outcomes`]. The first five
/// entries of a block are wins of 1, 2, 3, 4 and 6 times the cube, the next
/// five the corresponding losses; blocks 2 and 3 repeat the pattern for the
/// two cube-prime values.
pub const DP: usize = 0; // win 1·cube: the double-pass cash
pub const DTW: usize = 1; // win 2·cube: plain double-take win
pub const NDWB: usize = 2; // win 3·cube
pub const DTWG: usize = 3; // win 4·cube
pub const DTWB: usize = 4; // win 6·cube
pub const NDL: usize = 5; // lose 1·cube (also the block offset)
pub const DTL: usize = 6; // lose 2·cube
pub const NDLB: usize = 7; // lose 3·cube
pub const DTLG: usize = 8; // lose 4·cube
pub const DTLB: usize = 9; // lose 6·cube
const BLOCK: usize = 10;
pub const NUM_ME_OUTCOMES: usize = 3 * BLOCK;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetError {
    #[error("native table is empty")]
    Empty,
    #[error("native table must be square")]
    NotSquare,
    #[error("native table exceeds {MAX_SCORE} points")]
    TooLarge,
}

/// Abramowitz & Stegun 7.1.26, good to ~1.5e-7 — plenty for the extension.
fn erf(x: f32) -> f32 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly =
        ((((1.061405429 * t - 1.453152027) * t + 1.421413741) * t - 0.284496736) * t + 0.254829592)
            * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Area under a normal distribution with the given mean and deviation,
/// integrated from `min` to `max`.
fn normal_dist_area(min: f32, max: f32, mu: f32, sigma: f32) -> f32 {
    let t_min = (min - mu) / sigma;
    let t_max = (max - mu) / sigma;
    let int1 = (erf(t_min / std::f32::consts::SQRT_2) + 1.0) / 2.0;
    let int2 = (erf(t_max / std::f32::consts::SQRT_2) + 1.0) / 2.0;
    int2 - int1
}

/// Accounts for the opponent's automatic redouble when a cube would be
/// dead for one side only.
fn cube_prime_value(i: i32, j: i32, cube: i32) -> i32 {
    if i < 2 * cube && j >= 2 * cube {
        2 * cube
    } else {
        cube
    }
}

type PreTable = [[f32; MAX_SCORE]; MAX_SCORE];
type PostTable = [[f32; MAX_SCORE]; 2];
type GammonPrices = [[[[f32; 4]; MAX_SCORE]; MAX_SCORE]; MAX_CUBE_LEVEL];
type GammonPricesPc = [[[[f32; 4]; 2]; MAX_SCORE]; MAX_CUBE_LEVEL];

/// Pre- and post-Crawford match equity tables extended to [`MAX_SCORE`],
/// with the gammon-price tables precomputed per cube level.
///
/// The two post-Crawford vectors are stored and read independently per
/// trailing side, preserving the original tables' asymmetry.
#[derive(Debug)]
pub struct MatchEquityTable {
    pre: Box<PreTable>,
    post: Box<PostTable>,
    gammon_prices: Box<GammonPrices>,
    gammon_prices_pc: Box<GammonPricesPc>,
}

impl MatchEquityTable {
    /// Builds the default table. The native seed is the single exact value
    /// `ME(1-away, 1-away) = 0.5`; everything else comes from the Zadeh
    /// post-Crawford recurrence and the normal-model extension, so the
    /// result is symmetric by construction.
    pub fn builtin() -> Self {
        Self::build(&[vec![0.5]], &[])
    }

    /// Builds from a native table: a square pre-Crawford matrix and a
    /// post-Crawford vector of length `n - 1`, both extended to
    /// [`MAX_SCORE`].
    pub fn from_tables(pre: &[Vec<f32>], post: &[f32]) -> Result<Self, MetError> {
        let n = pre.len();
        if n == 0 {
            return Err(MetError::Empty);
        }
        if n > MAX_SCORE {
            return Err(MetError::TooLarge);
        }
        if pre.iter().any(|row| row.len() != n) {
            return Err(MetError::NotSquare);
        }
        Ok(Self::build(pre, post))
    }

    fn build(native_pre: &[Vec<f32>], native_post: &[f32]) -> Self {
        let n = native_pre.len();

        // The post-Crawford vector extends from n - 1: a native table of
        // size n may not include the n-away entry, since the first legal
        // post-Crawford score is (n-1)-away.
        let mut post = Box::new([[0.0f32; MAX_SCORE]; 2]);
        for side in post.iter_mut() {
            for (slot, &value) in side.iter_mut().zip(native_post.iter()).take(n - 1) {
                *slot = value;
            }
            init_post_crawford(side, native_post.len().min(n - 1));
        }

        let mut pre = Box::new([[0.0f32; MAX_SCORE]; MAX_SCORE]);
        for (i, row) in native_pre.iter().enumerate() {
            pre[i][..n].copy_from_slice(row);
        }
        extend_met(&mut pre, n);

        let mut table = MatchEquityTable {
            pre,
            post,
            gammon_prices: Box::new([[[[0.0; 4]; MAX_SCORE]; MAX_SCORE]; MAX_CUBE_LEVEL]),
            gammon_prices_pc: Box::new([[[[0.0; 4]; 2]; MAX_SCORE]; MAX_CUBE_LEVEL]),
        };
        table.calc_gammon_prices();
        table
    }

    /// Match-winning chance for `player` assuming `who_wins` takes `points`
    /// now. Reads the post-Crawford vector of the trailing side when the
    /// next game will be post-Crawford.
    #[allow(clippy::too_many_arguments)]
    pub fn me(
        &self,
        score0: i32,
        score1: i32,
        match_to: i32,
        player: usize,
        points: i32,
        who_wins: usize,
        crawford: bool,
    ) -> f32 {
        let n0 = match_to - (score0 + if who_wins == 0 { points } else { 0 }) - 1;
        let n1 = match_to - (score1 + if who_wins == 1 { points } else { 0 }) - 1;

        if n0 < 0 {
            // player 0 has won the match
            return if player == 1 { 0.0 } else { 1.0 };
        }
        if n1 < 0 {
            return if player == 1 { 1.0 } else { 0.0 };
        }

        if crawford || match_to - score0 == 1 || match_to - score1 == 1 {
            // the next game will be post-Crawford
            if n0 == 0 {
                // player 0 leads the match
                let trailer = self.post[1][n1 as usize];
                return if player == 1 { trailer } else { 1.0 - trailer };
            }
            let trailer = self.post[0][n0 as usize];
            return if player == 1 { 1.0 - trailer } else { trailer };
        }

        let mwc0 = self.pre[n0 as usize][n1 as usize];
        if player == 1 {
            1.0 - mwc0
        } else {
            mwc0
        }
    }

    /// Match-winning chance for `player` at the given score, with no
    /// further result applied.
    pub fn me_at_score(
        &self,
        score0: i32,
        score1: i32,
        match_to: i32,
        player: usize,
        crawford: bool,
    ) -> f32 {
        let n0 = match_to - score0 - 1;
        let n1 = match_to - score1 - 1;

        if n0 < 0 {
            return if player == 1 { 0.0 } else { 1.0 };
        }
        if n1 < 0 {
            return if player == 1 { 1.0 } else { 0.0 };
        }

        if !crawford && (match_to - score0 == 1 || match_to - score1 == 1) {
            // this game is already post-Crawford
            if n0 == 0 {
                let trailer = self.post[1][n1 as usize];
                return if player == 1 { trailer } else { 1.0 - trailer };
            }
            let trailer = self.post[0][n0 as usize];
            return if player == 1 { 1.0 - trailer } else { trailer };
        }

        let mwc0 = self.pre[n0 as usize][n1 as usize];
        if player == 1 {
            1.0 - mwc0
        } else {
            mwc0
        }
    }

    /// Batched equities for both players winning or losing 1, 2, 3, 4 and 6
    /// times the cube, plus the same for up to two cube-prime values.
    /// Every row is ordered wins-then-losses for its own player.
    #[allow(clippy::too_many_arguments)]
    pub fn me_outcomes(
        &self,
        score0: i32,
        score1: i32,
        match_to: i32,
        cube: i32,
        cube_prime0: i32,
        cube_prime1: i32,
        crawford: bool,
    ) -> [[f32; NUM_ME_OUTCOMES]; 2] {
        const MULT: [i32; 5] = [1, 2, 3, 4, 6];

        let away0 = match_to - score0 - 1;
        let away1 = match_to - score1 - 1;
        let crawf = crawford || match_to - score0 == 1 || match_to - score1 == 1;

        let blocks: usize = if cube_prime0 < 0 {
            1
        } else if cube_prime1 < 0 {
            2
        } else {
            3
        };

        let mut scores = [[0i32; NUM_ME_OUTCOMES]; 2];
        let cubes = [cube, cube_prime0, cube_prime1];
        for (b, &cube_value) in cubes.iter().enumerate().take(blocks) {
            for (i, &mult) in MULT.iter().enumerate() {
                // player 0 wins 1, 2, 3, 4, 6 times the cube value
                scores[0][b * BLOCK + i] = away0 - mult * cube_value;
                scores[1][b * BLOCK + i] = away1;
                // player 1 wins the same amounts
                scores[0][b * BLOCK + NDL + i] = away0;
                scores[1][b * BLOCK + NDL + i] = away1 - mult * cube_value;
            }
        }

        let mut results = [[0.0f32; NUM_ME_OUTCOMES]; 2];
        for slot in 0..blocks * BLOCK {
            let s0 = scores[0][slot];
            let s1 = scores[1][slot];
            let mwc0 = if s0 < 0 {
                1.0
            } else if s1 < 0 {
                0.0
            } else if crawf {
                if s0 == 0 {
                    // player 0 leads
                    1.0 - self.post[1][s1 as usize]
                } else {
                    self.post[0][s0 as usize]
                }
            } else {
                self.pre[s0 as usize][s1 as usize]
            };
            results[0][slot] = mwc0;
            results[1][slot] = 1.0 - mwc0;
        }

        // player 1's row has its losses in the win columns; swap the half
        // blocks so both rows read wins-then-losses
        for b in 0..blocks {
            for i in 0..NDL {
                results[1].swap(b * BLOCK + i, b * BLOCK + NDL + i);
            }
        }

        results
    }

    /// Live-cube cash points for both players, by the recurrence over the
    /// chain of possible cube levels.
    pub fn get_points(&self, outputs: &Outputs, ci: &CubeInfo) -> [f32; 2] {
        let i = ci.away(0) as i32 - 1;
        let j = ci.away(1) as i32 - 1;
        let cube = ci.cube as i32;

        let (gammon, backgammon) = gammon_ratios(outputs, ci.on_roll);

        // cube value when either side holds a dead cube, counting the
        // opponent's automatic redouble
        let mut dead = cube;
        let mut max_level = 0usize;
        while i >= 2 * dead && j >= 2 * dead {
            max_level += 1;
            dead *= 2;
        }

        let mut live = [[0.0f32; MAX_CUBE_LEVEL]; 2];
        let mut cube_value = dead;
        for n in (0..=max_level).rev() {
            let met = self.me_outcomes(
                ci.scores[0] as i32,
                ci.scores[1] as i32,
                ci.match_to as i32,
                cube_value,
                cube_prime_value(i, j, cube_value),
                cube_prime_value(j, i, cube_value),
                ci.crawford,
            );

            for k in 0..2 {
                let other = 1 - k;
                let prime = (k + 1) * BLOCK; // player k reads its own prime block
                let row = &met[k];

                if i < 2 * cube_value || j < 2 * cube_value {
                    // the doubled cube is dead
                    let dtl = (1.0 - gammon[other] - backgammon[other]) * row[prime + DTL]
                        + gammon[other] * row[prime + DTLG]
                        + backgammon[other] * row[prime + DTLB];
                    let dp = row[DP];
                    let dtw = (1.0 - gammon[k] - backgammon[k]) * row[prime + DTW]
                        + gammon[k] * row[prime + DTWG]
                        + backgammon[k] * row[prime + DTWB];
                    live[k][n] = (dtl - dp) / (dtl - dtw);
                } else {
                    // the doubled cube is alive
                    let rdp = row[DTL];
                    let dp = row[DP];
                    let dtw = (1.0 - gammon[k] - backgammon[k]) * row[DTW]
                        + gammon[k] * row[DTWG]
                        + backgammon[k] * row[DTWB];
                    live[k][n] = 1.0 - live[other][n + 1] * (dp - dtw) / (rdp - dtw);
                }
            }
            cube_value >>= 1;
        }

        [live[0][0], live[1][0]]
    }

    /// Doubling point against a dead cube: the Janowski closed form at
    /// money play, the risk/gain ratio from the tables at match play.
    pub fn double_point_dead_cube(&self, outputs: &Outputs, ci: &CubeInfo) -> f32 {
        if ci.is_money() {
            let win = outputs[OUTPUT_WIN];
            let w = if win > 0.0 {
                1.0 + (outputs[OUTPUT_WIN_GAMMON] + outputs[OUTPUT_WIN_BACKGAMMON]) / win
            } else {
                1.0
            };
            let l = if win < 1.0 {
                1.0 + (outputs[OUTPUT_LOSE_GAMMON] + outputs[OUTPUT_LOSE_BACKGAMMON]) / (1.0 - win)
            } else {
                1.0
            };

            if ci.is_centred() && ci.jacoby {
                if ci.beavers > 0 {
                    (l - 0.25) / (w + l - 0.5)
                } else {
                    (l - 0.5) / (w + l - 1.0)
                }
            } else {
                l / (l + w)
            }
        } else {
            let player = ci.on_roll;
            let (gammon, backgammon) = gammon_ratios(outputs, player);

            let met = self.me_outcomes(
                ci.scores[0] as i32,
                ci.scores[1] as i32,
                ci.match_to as i32,
                ci.cube as i32,
                -1,
                -1,
                ci.crawford,
            );
            let row = &met[player];
            let other = 1 - player;

            let dtw = (1.0 - gammon[player] - backgammon[player]) * row[DTW]
                + gammon[player] * row[DTWG]
                + backgammon[player] * row[DTWB];
            let ndw = (1.0 - gammon[player] - backgammon[player]) * row[DP]
                + gammon[player] * row[DTW]
                + backgammon[player] * row[NDWB];
            let dtl = (1.0 - gammon[other] - backgammon[other]) * row[DTL]
                + gammon[other] * row[DTLG]
                + backgammon[other] * row[DTLB];
            let ndl = (1.0 - gammon[other] - backgammon[other]) * row[NDL]
                + gammon[other] * row[DTL]
                + backgammon[other] * row[NDLB];

            let risk = ndl - dtl;
            let gain = dtw - ndw;
            risk / (risk + gain)
        }
    }

    /// Gammon-price coefficients for the cube level and score in `ci`.
    pub fn gammon_prices_for(&self, ci: &CubeInfo) -> [f32; 4] {
        if ci.is_money() {
            if ci.jacoby && ci.is_centred() {
                return [0.0; 4];
            }
            return [1.0, 1.0, 1.0, 1.0];
        }

        let level = (31 - ci.cube.leading_zeros()).min(MAX_CUBE_LEVEL as u32 - 1) as usize;
        let away0 = ci.away(0) as usize;
        let away1 = ci.away(1) as usize;

        if !ci.crawford && (away0 == 1 || away1 == 1) {
            if away0 == 1 {
                return self.gammon_prices_pc[level][away1 - 1][0];
            }
            return self.gammon_prices_pc[level][away0 - 1][1];
        }
        self.gammon_prices[level][away0 - 1][away1 - 1]
    }

    /// Cubeless equity, normalised so a plain win at the current cube is
    /// +1. At money play with Jacoby and a centred cube the gammon terms
    /// vanish.
    pub fn cubeless_utility(&self, outputs: &Outputs, ci: &CubeInfo) -> f32 {
        let price = self.gammon_prices_for(ci);
        outputs[OUTPUT_WIN] * 2.0 - 1.0 + outputs[OUTPUT_WIN_GAMMON] * price[0]
            - outputs[OUTPUT_LOSE_GAMMON] * price[1]
            + outputs[OUTPUT_WIN_BACKGAMMON] * price[2]
            - outputs[OUTPUT_LOSE_BACKGAMMON] * price[3]
    }

    /// MWC anchors for the linear equity/MWC maps: winning and losing
    /// exactly the current cube for the player on roll.
    fn mwc_anchors(&self, ci: &CubeInfo) -> (f32, f32) {
        let mover = ci.on_roll;
        let win = self.me(
            ci.scores[0] as i32,
            ci.scores[1] as i32,
            ci.match_to as i32,
            mover,
            ci.cube as i32,
            mover,
            ci.crawford,
        );
        let lose = self.me(
            ci.scores[0] as i32,
            ci.scores[1] as i32,
            ci.match_to as i32,
            mover,
            ci.cube as i32,
            1 - mover,
            ci.crawford,
        );
        (win, lose)
    }

    pub fn equity_to_mwc(&self, equity: f32, ci: &CubeInfo) -> f32 {
        let (win, lose) = self.mwc_anchors(ci);
        lose + (equity + 1.0) / 2.0 * (win - lose)
    }

    pub fn mwc_to_equity(&self, mwc: f32, ci: &CubeInfo) -> f32 {
        let (win, lose) = self.mwc_anchors(ci);
        2.0 * (mwc - lose) / (win - lose) - 1.0
    }

    fn calc_gammon_prices(&mut self) {
        let mut cube = 1i32;
        for level in 0..MAX_CUBE_LEVEL {
            for j in 0..MAX_SCORE {
                for k in 0..MAX_SCORE {
                    self.gammon_prices[level][j][k] = self.gammon_price(
                        (MAX_SCORE - j - 1) as i32,
                        (MAX_SCORE - k - 1) as i32,
                        MAX_SCORE as i32,
                        cube,
                        false,
                    );
                }
            }
            for j in 0..MAX_SCORE {
                self.gammon_prices_pc[level][j][0] = self.gammon_price(
                    (MAX_SCORE - 1) as i32,
                    (MAX_SCORE - j - 1) as i32,
                    MAX_SCORE as i32,
                    cube,
                    false,
                );
                self.gammon_prices_pc[level][j][1] = self.gammon_price(
                    (MAX_SCORE - j - 1) as i32,
                    (MAX_SCORE - 1) as i32,
                    MAX_SCORE as i32,
                    cube,
                    false,
                );
            }
            cube *= 2;
        }
    }

    /// Coefficients converting gammon and backgammon rates into match
    /// equity at the given score and cube.
    fn gammon_price(
        &self,
        score0: i32,
        score1: i32,
        match_to: i32,
        cube: i32,
        crawford: bool,
    ) -> [f32; 4] {
        const EPSILON: f32 = 1.0e-7;

        let win = self.me(score0, score1, match_to, 0, cube, 0, crawford);
        let win_gammon = self.me(score0, score1, match_to, 0, 2 * cube, 0, crawford);
        let win_bg = self.me(score0, score1, match_to, 0, 3 * cube, 0, crawford);
        let lose = self.me(score0, score1, match_to, 0, cube, 1, crawford);
        let lose_gammon = self.me(score0, score1, match_to, 0, 2 * cube, 1, crawford);
        let lose_bg = self.me(score0, score1, match_to, 0, 3 * cube, 1, crawford);

        let center = (win + lose) / 2.0;

        let mut price = [0.0f32; 4];
        if (win - center).abs() > EPSILON {
            price[0] = (win_gammon - center) / (win - center) - 1.0;
            price[1] = (center - lose_gammon) / (win - center) - 1.0;
            price[2] = (win_bg - center) / (win - center) - (price[0] + 1.0);
            price[3] = (center - lose_bg) / (win - center) - (price[1] + 1.0);
        }

        // a dead cube can produce tiny negative prices; clamp them away
        for p in price.iter_mut() {
            if *p < 0.0 {
                *p = 0.0;
            }
        }
        price
    }
}

/// Gammon and backgammon ratios for both players, guarding the extreme
/// win probabilities. `outputs` is evaluated for `on_roll`.
fn gammon_ratios(outputs: &Outputs, on_roll: usize) -> ([f32; 2], [f32; 2]) {
    let mut gammon = [0.0f32; 2];
    let mut backgammon = [0.0f32; 2];
    let win = outputs[OUTPUT_WIN];

    let (winner, loser) = (on_roll, 1 - on_roll);
    if win > 0.0 {
        gammon[winner] = (outputs[OUTPUT_WIN_GAMMON] - outputs[OUTPUT_WIN_BACKGAMMON]) / win;
        backgammon[winner] = outputs[OUTPUT_WIN_BACKGAMMON] / win;
    }
    if win < 1.0 {
        gammon[loser] =
            (outputs[OUTPUT_LOSE_GAMMON] - outputs[OUTPUT_LOSE_BACKGAMMON]) / (1.0 - win);
        backgammon[loser] = outputs[OUTPUT_LOSE_BACKGAMMON] / (1.0 - win);
    }
    (gammon, backgammon)
}

/// Zadeh's post-Crawford recurrence with the free-drop corrections.
fn init_post_crawford(table: &mut [f32; MAX_SCORE], start: usize) {
    for i in start..MAX_SCORE {
        table[i] = GAMMON_RATE * 0.5 * if i >= 4 { table[i - 4] } else { 1.0 }
            + (1.0 - GAMMON_RATE) * 0.5 * if i >= 2 { table[i - 2] } else { 1.0 };

        // free drops at 1-away/2-away and 1-away/4-away
        if i == 1 {
            table[i] -= FREE_DROP_2AWAY;
        }
        if i == 3 {
            table[i] -= FREE_DROP_4AWAY;
        }
    }
}

/// David Montgomery's extension: scores beyond the native table follow a
/// normal model whose deviation depends on the games remaining. The
/// formula is independent of the native values.
fn extend_met(table: &mut PreTable, native_size: usize) {
    let stddev = |away: usize| -> f32 {
        if away > 10 {
            1.77
        } else {
            STDDEV_TABLE[away]
        }
    };

    for i in native_size..MAX_SCORE {
        let score0 = i + 1;
        let stddev0 = stddev(score0);
        for j in 0..=i {
            let score1 = j + 1;
            let games = (score0 + score1) as f32 / 2.0;
            let sigma =
                (stddev0 * stddev0 + stddev(score1) * stddev(score1)).sqrt() * games.sqrt();
            let diff = (score0 - score1) as f32;
            table[i][j] = if 6.0 * sigma > diff {
                normal_dist_area(diff, 6.0 * sigma, 0.0, sigma)
            } else {
                0.0
            };
        }
    }

    // mirror the j > i half
    for i in 0..MAX_SCORE {
        let start = if i < native_size { native_size } else { i + 1 };
        for j in start..MAX_SCORE {
            table[i][j] = 1.0 - table[j][i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gammon::match_state::{CubeInfo, Variation, DEFAULT_BEAVERS};

    fn match_cube(
        cube: u32,
        owner: i8,
        match_to: u32,
        scores: [u32; 2],
        crawford: bool,
    ) -> CubeInfo {
        CubeInfo::new(
            cube,
            owner,
            1,
            match_to,
            scores,
            crawford,
            false,
            DEFAULT_BEAVERS,
            Variation::Standard,
        )
        .unwrap()
    }

    #[test]
    fn one_away_one_away_is_even() {
        let met = MatchEquityTable::builtin();
        assert!((met.me_at_score(0, 0, 1, 0, true) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn symmetry_within_tolerance() {
        let met = MatchEquityTable::builtin();
        for match_to in [3, 5, 7, 9, 25] {
            for a in 0..match_to {
                for b in 0..match_to {
                    let me0 = met.me_at_score(a, b, match_to, 0, false);
                    let me1 = met.me_at_score(b, a, match_to, 0, false);
                    assert!(
                        (me0 + me1 - 1.0).abs() < 1e-6,
                        "asymmetric at {}-{} to {}",
                        a,
                        b,
                        match_to
                    );
                }
            }
        }
    }

    #[test]
    fn leader_is_favoured() {
        let met = MatchEquityTable::builtin();
        // 1 point from victory vs 8 away
        let leading = met.me_at_score(8, 1, 9, 0, true);
        let level = met.me_at_score(3, 3, 7, 0, false);
        let trailing = met.me_at_score(1, 8, 9, 0, true);
        assert!(leading > 0.9);
        assert!((level - 0.5).abs() < 1e-6);
        assert!(trailing < 0.1);
        assert!(leading + trailing <= 2.0); // sanity
    }

    #[test]
    fn monotone_in_the_leaders_favour() {
        let met = MatchEquityTable::builtin();
        let mut previous = 0.0;
        for score in 0..9 {
            let mwc = met.me_at_score(score, 0, 9, 0, score == 8);
            assert!(mwc >= previous, "not monotone at score {}", score);
            previous = mwc;
        }
    }

    #[test]
    fn winning_the_match_is_certain() {
        let met = MatchEquityTable::builtin();
        assert_eq!(met.me(3, 0, 5, 0, 4, 0, false), 1.0);
        assert_eq!(met.me(3, 0, 5, 1, 4, 0, false), 0.0);
    }

    #[test]
    fn me_outcomes_rows_are_consistent() {
        let met = MatchEquityTable::builtin();
        let rows = met.me_outcomes(0, 0, 7, 1, -1, -1, false);
        // each player's plain-win entry is their MWC after winning 1 point
        let p0_win = met.me(0, 0, 7, 0, 1, 0, false);
        let p1_win = met.me(0, 0, 7, 1, 1, 1, false);
        assert!((rows[0][DP] - p0_win).abs() < 1e-6);
        assert!((rows[1][DP] - p1_win).abs() < 1e-6);
        // bigger wins are worth at least as much
        assert!(rows[0][DTW] >= rows[0][DP]);
        assert!(rows[0][DTWB] >= rows[0][DTWG]);
        // losses mirror wins
        assert!(rows[0][NDL] <= rows[0][DP]);
    }

    #[test]
    fn gammon_prices_are_non_negative() {
        let met = MatchEquityTable::builtin();
        let ci = match_cube(1, -1, 7, [2, 3], false);
        for price in met.gammon_prices_for(&ci) {
            assert!(price >= 0.0);
        }
    }

    #[test]
    fn money_gammon_prices() {
        let met = MatchEquityTable::builtin();
        let money = CubeInfo::money(false, DEFAULT_BEAVERS);
        assert_eq!(met.gammon_prices_for(&money), [1.0, 1.0, 1.0, 1.0]);

        let jacoby = CubeInfo::money(true, DEFAULT_BEAVERS);
        assert_eq!(met.gammon_prices_for(&jacoby), [0.0; 4]);
    }

    #[test]
    fn mwc_equity_round_trip() {
        let met = MatchEquityTable::builtin();
        let ci = match_cube(2, 1, 9, [3, 5], false);
        for equity in [-1.0, -0.25, 0.0, 0.6, 1.0] {
            let mwc = met.equity_to_mwc(equity, &ci);
            let back = met.mwc_to_equity(mwc, &ci);
            assert!((back - equity).abs() < 1e-5);
        }
        // equity +1 corresponds to winning the cube's points
        let mwc = met.equity_to_mwc(1.0, &ci);
        let direct = met.me(3, 5, 9, 1, 2, 1, false);
        assert!((mwc - direct).abs() < 1e-6);
    }

    #[test]
    fn cubeless_utility_money() {
        let met = MatchEquityTable::builtin();
        let money = CubeInfo::money(false, DEFAULT_BEAVERS);
        // certain plain win
        assert!((met.cubeless_utility(&[1.0, 0.0, 0.0, 0.0, 0.0], &money) - 1.0).abs() < 1e-6);
        // certain gammon win
        assert!((met.cubeless_utility(&[1.0, 1.0, 0.0, 0.0, 0.0], &money) - 2.0).abs() < 1e-6);
        // coin flip
        assert!(met.cubeless_utility(&[0.5, 0.0, 0.0, 0.0, 0.0], &money).abs() < 1e-6);
    }

    #[test]
    fn get_points_are_probabilities() {
        let met = MatchEquityTable::builtin();
        let outputs = [0.6, 0.2, 0.05, 0.1, 0.02];
        let ci = match_cube(1, -1, 7, [0, 0], false);
        let points = met.get_points(&outputs, &ci);
        for cp in points {
            assert!(cp > 0.0 && cp < 1.0, "cash point {} out of range", cp);
        }
    }

    #[test]
    fn double_point_money_gammonless() {
        let met = MatchEquityTable::builtin();
        let ci = CubeInfo::money(false, DEFAULT_BEAVERS);
        // no gammons: dead-cube double point of a centred cube is 50%
        let outputs = [0.5, 0.0, 0.0, 0.0, 0.0];
        let dp = met.double_point_dead_cube(&outputs, &ci);
        assert!((dp - 0.5).abs() < 1e-6);
    }

    #[test]
    fn native_table_is_respected_and_extended() {
        let pre = vec![
            vec![0.5, 0.7, 0.75],
            vec![0.3, 0.5, 0.6],
            vec![0.25, 0.4, 0.5],
        ];
        let post = vec![0.52, 0.35];
        let met = MatchEquityTable::from_tables(&pre, &post).unwrap();
        assert!((met.me_at_score(0, 0, 3, 0, false) - 0.5).abs() < 1e-6);
        assert!((met.me_at_score(0, 1, 3, 0, false) - 0.7).abs() < 1e-6);
        // extension fills scores beyond the native size
        let extended = met.me_at_score(0, 0, 11, 0, false);
        assert!((extended - 0.5).abs() < 0.02);
    }

    #[test]
    fn from_tables_validates() {
        assert_eq!(
            MatchEquityTable::from_tables(&[], &[]).unwrap_err(),
            MetError::Empty
        );
        let ragged = vec![vec![0.5, 0.6], vec![0.4]];
        assert_eq!(
            MatchEquityTable::from_tables(&ragged, &[]).unwrap_err(),
            MetError::NotSquare
        );
    }
}
