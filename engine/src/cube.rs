/*
 * cube.rs
 * Part of the byte-gammon project
 * Created Date: Thursday, March 27th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jul 2 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::board::Board;
use gammon::definitions::MOVER;
use gammon::match_state::CubeInfo;

use crate::classify::PositionClass;
use crate::defs::{
    Outputs, NUM_CUBEFUL_OUTPUTS, OUTPUT_LOSE_BACKGAMMON, OUTPUT_LOSE_GAMMON, OUTPUT_WIN,
    OUTPUT_WIN_BACKGAMMON, OUTPUT_WIN_GAMMON,
};
use crate::match_equity::{MatchEquityTable, DP, DTL, DTW, NDL, NDLB, NDWB};

/// Comparison tolerance for the optional decision classes.
const EPS: f32 = 1e-5;

/// Cube decisions, in the order used by the `cd` field of the JSON output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeDecision {
    DoubleTake = 0,
    DoublePass = 1,
    DoubleBeaver = 2,
    NoDoubleTake = 3,
    NoDoubleBeaver = 4,
    TooGoodTake = 5,
    TooGoodPass = 6,
    RedoubleTake = 7,
    RedoublePass = 8,
    NoRedoubleTake = 9,
    NoRedoubleBeaver = 10,
    TooGoodReTake = 11,
    TooGoodRePass = 12,
    NoDoubleDeadCube = 13,
    NoRedoubleDeadCube = 14,
    NotAvailable = 15,
    OptionalDoubleTake = 16,
    OptionalRedoubleTake = 17,
    OptionalDoubleBeaver = 18,
    OptionalDoublePass = 19,
    OptionalRedoublePass = 20,
}

impl CubeDecision {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// A complete cube verdict: the decision class and the four equities
/// `[no_double, double_take, double_drop, optimal]`.
#[derive(Clone, Copy, Debug)]
pub struct CubeAnalysis {
    pub decision: CubeDecision,
    pub equities: [f32; NUM_CUBEFUL_OUTPUTS],
}

/// Cube efficiency by position class: how much of the fully-live cube
/// value the holder can realistically extract. Races scale with the pip
/// count; contact positions use a flat value.
pub fn cube_efficiency(board: &Board, class: PositionClass) -> f32 {
    match class {
        PositionClass::Over => 0.0,
        PositionClass::Contact | PositionClass::Crashed => 0.68,
        _ => {
            let pips = board.pip_counts()[MOVER] as f32;
            (0.6 + (pips - 12.0) / 760.0).clamp(0.6, 0.7)
        }
    }
}

/// Average points won and lost per game, from the gammon mix.
fn stake_sizes(outputs: &Outputs) -> (f32, f32) {
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
    (w, l)
}

/// Piecewise-linear interpolation through anchors with increasing x.
fn interpolate(anchors: &[(f32, f32)], p: f32) -> f32 {
    let Some(&(first_x, first_y)) = anchors.first() else {
        return 0.0;
    };
    if p <= first_x {
        return first_y;
    }
    for pair in anchors.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if p <= x1 {
            if x1 - x0 <= 0.0 {
                return y1;
            }
            return y0 + (p - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    anchors.last().map(|&(_, y)| y).unwrap_or(0.0)
}

/// Drops anchors that would make the x coordinates non-increasing. Extreme
/// gammon mixes can push the take point past the cash point; the live
/// curve then degenerates towards the dead one.
fn push_anchor(anchors: &mut Vec<(f32, f32)>, anchor: (f32, f32)) {
    if anchors.last().map(|&(x, _)| anchor.0 > x).unwrap_or(true) {
        anchors.push(anchor);
    }
}

/// Money cubeful equity: Janowski interpolation between the dead-cube
/// (cubeless) equity and the fully-live piecewise-linear curve through the
/// cube-state-dependent take and cash points.
pub fn cubeful_money_equity(
    met: &MatchEquityTable,
    outputs: &Outputs,
    ci: &CubeInfo,
    efficiency: f32,
) -> f32 {
    let p = outputs[OUTPUT_WIN];
    let (w, l) = stake_sizes(outputs);
    let dead = met.cubeless_utility(outputs, ci);

    let take_point = (l - 0.5) / (w + l + 0.5);
    let cash_point = (l + 1.0) / (w + l + 0.5);

    let mut anchors: Vec<(f32, f32)> = vec![(0.0, -l)];
    if ci.is_centred() || ci.owner != ci.on_roll as i8 {
        // the opponent can double the mover out
        push_anchor(&mut anchors, (take_point, -1.0));
    }
    if ci.is_centred() || ci.owner == ci.on_roll as i8 {
        // the mover can cash
        push_anchor(&mut anchors, (cash_point, 1.0));
    }
    push_anchor(&mut anchors, (1.0, w));

    let live = interpolate(&anchors, p);
    efficiency * live + (1.0 - efficiency) * dead
}

/// Match-play cubeful equity in MWC space: the same interpolation, with
/// the live cash points taken from the match-equity recurrences and the
/// endpoint values weighted by the gammon mix.
pub fn cubeful_match_mwc(
    met: &MatchEquityTable,
    outputs: &Outputs,
    ci: &CubeInfo,
    efficiency: f32,
) -> f32 {
    let dead = met.equity_to_mwc(met.cubeless_utility(outputs, ci), ci);
    if ci.crawford || ci.cube_is_dead() {
        return dead;
    }

    let p = outputs[OUTPUT_WIN];
    let mover = ci.on_roll;
    let opponent = 1 - mover;

    let rows = met.me_outcomes(
        ci.scores[0] as i32,
        ci.scores[1] as i32,
        ci.match_to as i32,
        ci.cube as i32,
        -1,
        -1,
        ci.crawford,
    );
    let row = &rows[mover];

    let win = outputs[OUTPUT_WIN].max(1e-6);
    let lose = (1.0 - outputs[OUTPUT_WIN]).max(1e-6);
    let g_win = (outputs[OUTPUT_WIN_GAMMON] - outputs[OUTPUT_WIN_BACKGAMMON]) / win;
    let bg_win = outputs[OUTPUT_WIN_BACKGAMMON] / win;
    let g_lose = (outputs[OUTPUT_LOSE_GAMMON] - outputs[OUTPUT_LOSE_BACKGAMMON]) / lose;
    let bg_lose = outputs[OUTPUT_LOSE_BACKGAMMON] / lose;

    let mwc_win =
        (1.0 - g_win - bg_win) * row[DP] + g_win * row[DTW] + bg_win * row[NDWB];
    let mwc_lose =
        (1.0 - g_lose - bg_lose) * row[NDL] + g_lose * row[DTL] + bg_lose * row[NDLB];

    let cash_points = met.get_points(outputs, ci);

    let mut anchors: Vec<(f32, f32)> = vec![(0.0, mwc_lose)];
    if ci.is_centred() || ci.owner != ci.on_roll as i8 {
        // doubled out at the opponent's cash point
        push_anchor(&mut anchors, (1.0 - cash_points[opponent], row[NDL]));
    }
    if ci.is_centred() || ci.owner == ci.on_roll as i8 {
        push_anchor(&mut anchors, (cash_points[mover], row[DP]));
    }
    push_anchor(&mut anchors, (1.0, mwc_win));

    let live = interpolate(&anchors, p);
    efficiency * live + (1.0 - efficiency) * dead
}

/// Cubeful equity normalised to the current cube, for either play mode.
pub fn cubeful_equity(
    met: &MatchEquityTable,
    outputs: &Outputs,
    ci: &CubeInfo,
    efficiency: f32,
) -> f32 {
    if ci.is_money() {
        cubeful_money_equity(met, outputs, ci, efficiency)
    } else {
        met.mwc_to_equity(cubeful_match_mwc(met, outputs, ci, efficiency), ci)
    }
}

/// Computes the no-double / double-take / double-drop equities from the
/// cubeless outputs and classifies the cube decision. `cube_available`
/// reflects both the session's cube-use flag and the mover's right to
/// double.
pub fn find_cube_decision(
    met: &MatchEquityTable,
    outputs: &Outputs,
    ci: &CubeInfo,
    cube_available: bool,
    efficiency: f32,
) -> CubeAnalysis {
    let no_double = cubeful_equity(met, outputs, ci, efficiency);

    let doubled = ci.after_double_take();
    let double_take = if ci.is_money() {
        2.0 * cubeful_money_equity(met, outputs, &doubled, efficiency)
    } else {
        // convert through the original cube so all equities share a scale
        met.mwc_to_equity(cubeful_match_mwc(met, outputs, &doubled, efficiency), ci)
    };
    let double_drop = 1.0;

    let best_double = double_take.min(double_drop);
    let optimal = no_double.max(best_double);
    let equities = [no_double, double_take, double_drop, optimal];

    if !cube_available || !ci.mover_may_double() {
        return CubeAnalysis {
            decision: CubeDecision::NotAvailable,
            equities: [no_double, double_take, double_drop, no_double],
        };
    }

    let redouble = !ci.is_centred();
    let beavers = ci.is_money() && ci.beavers > 0;

    if ci.cube_is_dead() {
        let decision = if redouble {
            CubeDecision::NoRedoubleDeadCube
        } else {
            CubeDecision::NoDoubleDeadCube
        };
        return CubeAnalysis {
            decision,
            equities: [no_double, double_take, double_drop, no_double],
        };
    }

    let decision = if best_double > no_double + EPS {
        // doubling gains
        if double_take >= double_drop {
            if redouble {
                CubeDecision::RedoublePass
            } else {
                CubeDecision::DoublePass
            }
        } else if beavers && double_take < 0.0 {
            CubeDecision::DoubleBeaver
        } else if redouble {
            CubeDecision::RedoubleTake
        } else {
            CubeDecision::DoubleTake
        }
    } else if (best_double - no_double).abs() <= EPS {
        if double_take >= double_drop {
            if redouble {
                CubeDecision::OptionalRedoublePass
            } else {
                CubeDecision::OptionalDoublePass
            }
        } else if beavers && double_take < 0.0 {
            CubeDecision::OptionalDoubleBeaver
        } else if redouble {
            CubeDecision::OptionalRedoubleTake
        } else {
            CubeDecision::OptionalDoubleTake
        }
    } else if no_double > double_drop + EPS {
        // playing on beats even a cashed double
        if double_take >= double_drop {
            if redouble {
                CubeDecision::TooGoodRePass
            } else {
                CubeDecision::TooGoodPass
            }
        } else if redouble {
            CubeDecision::TooGoodReTake
        } else {
            CubeDecision::TooGoodTake
        }
    } else if beavers && double_take < 0.0 {
        if redouble {
            CubeDecision::NoRedoubleBeaver
        } else {
            CubeDecision::NoDoubleBeaver
        }
    } else if redouble {
        CubeDecision::NoRedoubleTake
    } else {
        CubeDecision::NoDoubleTake
    };

    CubeAnalysis { decision, equities }
}
