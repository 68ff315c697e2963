/*
 * defs.rs
 * Part of the byte-gammon project
 * Created Date: Monday, March 17th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jun 11 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

#[rustfmt::skip]
const BANNER: &str = r#"
 _         _
| |__ _  _| |_ ___ ___ __ _ __ _ _ __  _ __  ___ _ _
| '_ \ || |  _/ -_)___/ _` / _` | '  \| '  \/ _ \ ' \
|_.__/\_, |\__\___|   \__, \__,_|_|_|_|_|_|_\___/_||_|
      |__/            |___/
"#;

pub struct About;
impl About {
    pub const NAME: &'static str = "byte-gammon";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
    pub const EMAIL: &'static str = "developer.paul.123@gmail.com";
    pub const SHORT_DESCRIPTION: &'static str =
        "byte-gammon is a neural-net backgammon position advisor.";
    pub const AUTHORS: &'static str = "Paul T. (DeveloperPaul123)";
    pub const BANNER: &'static str = BANNER;
}

/// Indices into the five-output evaluation vector.
pub const OUTPUT_WIN: usize = 0;
pub const OUTPUT_WIN_GAMMON: usize = 1;
pub const OUTPUT_WIN_BACKGAMMON: usize = 2;
pub const OUTPUT_LOSE_GAMMON: usize = 3;
pub const OUTPUT_LOSE_BACKGAMMON: usize = 4;

/// Number of probability outputs of an evaluation.
pub const NUM_OUTPUTS: usize = 5;

/// Slot used for the cubeful equity in cached evaluations.
pub const OUTPUT_CUBEFUL: usize = 5;

/// Probability outputs plus the cubeful slot.
pub const NUM_EVAL_OUTPUTS: usize = 6;

/// Indices into the four cube-decision equities.
pub const OUTPUT_NO_DOUBLE: usize = 0;
pub const OUTPUT_TAKE: usize = 1;
pub const OUTPUT_DROP: usize = 2;
pub const OUTPUT_OPTIMAL: usize = 3;
pub const NUM_CUBEFUL_OUTPUTS: usize = 4;

/// Deepest supported search.
pub const MAX_PLIES: u32 = 3;

/// Default number of evaluation-cache entries.
pub const DEFAULT_CACHE_SIZE: u32 = 1 << 19;

/// Most plays returned by a single recommendation.
pub const MAX_PLAYER_MOVES: usize = 40;

/// Probabilities from the mover's viewpoint, `[win, winG, winBG, loseG,
/// loseBG]`.
pub type Outputs = [f32; NUM_OUTPUTS];

/// [`Outputs`] plus the cubeful-equity slot.
pub type EvalOutputs = [f32; NUM_EVAL_OUTPUTS];
