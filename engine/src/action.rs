/*
 * action.rs
 * Part of the byte-gammon project
 * Created Date: Tuesday, April 1st 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Thu Jul 3 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use serde::Serialize;

use crate::cube::CubeDecision;
use crate::defs::NUM_CUBEFUL_OUTPUTS;

/// The actions a recommendation can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    Move,
    Roll,
    Double,
    Take,
    Drop,
    Beaver,
    AcceptResignation,
    RejectResignation,
}

impl PlayerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerAction::Move => "play",
            PlayerAction::Roll => "roll",
            PlayerAction::Double => "double",
            PlayerAction::Take => "take",
            PlayerAction::Drop => "drop",
            PlayerAction::Beaver => "beaver",
            PlayerAction::AcceptResignation => "accept resignation",
            PlayerAction::RejectResignation => "reject resignation",
        }
    }
}

/// Maps a cube decision to the action the player should announce. The
/// decision is always analysed from the would-be doubler's side; when the
/// opponent has already doubled the answer is for the player responding to
/// the cube, otherwise for the player contemplating it. Optional classes
/// map to Roll and Take respectively.
pub fn action_from_cube_decision(decision: CubeDecision, doubled: bool) -> PlayerAction {
    if doubled {
        match decision {
            CubeDecision::DoubleTake
            | CubeDecision::NoDoubleTake
            | CubeDecision::TooGoodTake
            | CubeDecision::RedoubleTake
            | CubeDecision::NoRedoubleTake
            | CubeDecision::TooGoodReTake
            | CubeDecision::NoDoubleDeadCube
            | CubeDecision::NoRedoubleDeadCube
            | CubeDecision::OptionalDoubleTake
            | CubeDecision::OptionalRedoubleTake => PlayerAction::Take,

            CubeDecision::DoublePass
            | CubeDecision::TooGoodPass
            | CubeDecision::RedoublePass
            | CubeDecision::TooGoodRePass
            | CubeDecision::OptionalDoublePass
            | CubeDecision::OptionalRedoublePass => PlayerAction::Drop,

            CubeDecision::NoDoubleBeaver
            | CubeDecision::DoubleBeaver
            | CubeDecision::NoRedoubleBeaver
            | CubeDecision::OptionalDoubleBeaver => PlayerAction::Beaver,

            _ => PlayerAction::Take,
        }
    } else {
        match decision {
            CubeDecision::DoubleTake
            | CubeDecision::DoublePass
            | CubeDecision::DoubleBeaver
            | CubeDecision::RedoubleTake
            | CubeDecision::RedoublePass => PlayerAction::Double,

            CubeDecision::NoDoubleTake
            | CubeDecision::TooGoodTake
            | CubeDecision::NoRedoubleTake
            | CubeDecision::TooGoodReTake
            | CubeDecision::TooGoodPass
            | CubeDecision::TooGoodRePass
            | CubeDecision::NoDoubleBeaver
            | CubeDecision::NoRedoubleBeaver
            | CubeDecision::NoDoubleDeadCube
            | CubeDecision::NoRedoubleDeadCube => PlayerAction::Roll,

            CubeDecision::OptionalDoubleBeaver
            | CubeDecision::OptionalDoubleTake
            | CubeDecision::OptionalRedoubleTake
            | CubeDecision::OptionalDoublePass
            | CubeDecision::OptionalRedoublePass => PlayerAction::Roll,

            _ => PlayerAction::Roll,
        }
    }
}

/// Cube recommendation payload: the decision code and the four equities
/// `[no_double, take, drop, optimal]`.
#[derive(Clone, Debug, Serialize)]
pub struct CubeData {
    pub cd: i32,
    pub equity: [f32; NUM_CUBEFUL_OUTPUTS],
}

/// One recommended play with its equities and evaluation.
#[derive(Clone, Debug, Serialize)]
pub struct MoveData {
    #[serde(rename = "move")]
    pub play: String,
    /// `[cubeful, cubeless]`
    pub equity: [f32; 2],
    /// `[win, winG, winBG, loseG, loseBG]`
    pub eval: [f32; 5],
}

/// The engine's answer for one position.
#[derive(Clone, Debug)]
pub enum Recommendation {
    Cube {
        action: PlayerAction,
        data: CubeData,
    },
    Play {
        moves: Vec<MoveData>,
    },
    Resignation {
        accept: bool,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum ResponseData<'a> {
    Cube(&'a CubeData),
    Moves(&'a [MoveData]),
}

#[derive(Serialize)]
struct Response<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData<'a>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: i32,
}

impl Recommendation {
    pub fn action(&self) -> PlayerAction {
        match self {
            Recommendation::Cube { action, .. } => *action,
            Recommendation::Play { .. } => PlayerAction::Move,
            Recommendation::Resignation { accept } => {
                if *accept {
                    PlayerAction::AcceptResignation
                } else {
                    PlayerAction::RejectResignation
                }
            }
        }
    }

    /// Renders the JSON response body.
    pub fn to_json(&self) -> String {
        let response = Response {
            action: self.action().as_str(),
            data: match self {
                Recommendation::Cube { data, .. } => Some(ResponseData::Cube(data)),
                Recommendation::Play { moves } => Some(ResponseData::Moves(moves)),
                Recommendation::Resignation { .. } => None,
            },
        };
        serde_json::to_string(&response).unwrap_or_else(|_| error_json(-7))
    }
}

/// `{"error": n}` with no action and no partial data.
pub fn error_json(code: i32) -> String {
    serde_json::to_string(&ErrorResponse { error: code })
        .unwrap_or_else(|_| format!("{{\"error\": {}}}", code))
}

/// Rounds an equity for presentation, matching the four decimal places of
/// the original output.
pub fn round_equity(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubled_mapping() {
        assert_eq!(
            action_from_cube_decision(CubeDecision::DoublePass, true),
            PlayerAction::Drop
        );
        assert_eq!(
            action_from_cube_decision(CubeDecision::DoubleTake, true),
            PlayerAction::Take
        );
        assert_eq!(
            action_from_cube_decision(CubeDecision::NoDoubleBeaver, true),
            PlayerAction::Beaver
        );
        // optional classes answer Take
        assert_eq!(
            action_from_cube_decision(CubeDecision::OptionalDoubleTake, true),
            PlayerAction::Take
        );
    }

    #[test]
    fn doubling_mapping() {
        assert_eq!(
            action_from_cube_decision(CubeDecision::DoublePass, false),
            PlayerAction::Double
        );
        assert_eq!(
            action_from_cube_decision(CubeDecision::NoDoubleTake, false),
            PlayerAction::Roll
        );
        assert_eq!(
            action_from_cube_decision(CubeDecision::TooGoodPass, false),
            PlayerAction::Roll
        );
        // optional classes map to Roll
        assert_eq!(
            action_from_cube_decision(CubeDecision::OptionalDoublePass, false),
            PlayerAction::Roll
        );
    }

    #[test]
    fn cube_json_shape() {
        let rec = Recommendation::Cube {
            action: PlayerAction::Double,
            data: CubeData {
                cd: CubeDecision::DoublePass.code(),
                equity: [0.4, 1.2, 1.0, 1.0],
            },
        };
        let json = rec.to_json();
        assert!(json.starts_with("{\"action\":\"double\""));
        assert!(json.contains("\"cd\":1"));
        assert!(json.contains("\"equity\":[0.4,1.2,1.0,1.0]"));
    }

    #[test]
    fn play_json_shape() {
        let rec = Recommendation::Play {
            moves: vec![MoveData {
                play: "24/18* 18/13".to_string(),
                equity: [0.21, 0.2],
                eval: [0.55, 0.15, 0.01, 0.1, 0.005],
            }],
        };
        let json = rec.to_json();
        assert!(json.starts_with("{\"action\":\"play\",\"data\":["));
        assert!(json.contains("\"move\":\"24/18* 18/13\""));
    }

    #[test]
    fn resignation_json_has_no_data() {
        let rec = Recommendation::Resignation { accept: true };
        assert_eq!(rec.to_json(), "{\"action\":\"accept resignation\"}");
    }

    #[test]
    fn error_json_shape() {
        assert_eq!(error_json(-4), "{\"error\":-4}");
    }

    #[test]
    fn equity_rounding() {
        assert_eq!(round_equity(0.123456), 0.1235);
        assert_eq!(round_equity(-0.00004), -0.0);
    }
}
