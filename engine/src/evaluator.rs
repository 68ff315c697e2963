/*
 * evaluator.rs
 * Part of the byte-gammon project
 * Created Date: Friday, March 28th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jul 2 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::board::{Board, GameResult};
use gammon::definitions::{BAR, MOVER, NUM_POINTS, OPPONENT};
use gammon::position_key::PositionKey;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bearoff::BearoffSet;
use crate::classify::{classify, PositionClass};
use crate::defs::{
    Outputs, OUTPUT_LOSE_BACKGAMMON, OUTPUT_LOSE_GAMMON, OUTPUT_WIN, OUTPUT_WIN_BACKGAMMON,
    OUTPUT_WIN_GAMMON,
};
use crate::inputs::encode;
use crate::neural_net::NetState;
use crate::search::EvalContext;
use crate::weights::WeightSet;

/// Per-search incremental-evaluation state, one slot per learned class.
/// Private to one search; never shared.
#[derive(Default)]
pub struct NetScratchSet {
    contact: NetState,
    race: NetState,
    crashed: NetState,
}

impl NetScratchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh run of sibling evaluations for every net.
    pub fn begin_branch(&mut self) {
        self.contact.begin_branch();
        self.race.begin_branch();
        self.crashed.begin_branch();
    }

    pub fn reset(&mut self) {
        self.contact.reset();
        self.race.reset();
        self.crashed.reset();
    }

    fn state_for(&mut self, class: PositionClass) -> &mut NetState {
        match class {
            PositionClass::Race => &mut self.race,
            PositionClass::Crashed => &mut self.crashed,
            _ => &mut self.contact,
        }
    }
}

/// Static (0-ply) evaluation: classify, then dispatch to the closed form,
/// a bearoff database or the class net, and normalise the outputs.
pub struct PositionEvaluator<'a> {
    nets: &'a WeightSet,
    bearoff: &'a BearoffSet,
}

impl<'a> PositionEvaluator<'a> {
    pub fn new(nets: &'a WeightSet, bearoff: &'a BearoffSet) -> Self {
        PositionEvaluator { nets, bearoff }
    }

    /// Classifies a board against the loaded databases.
    pub fn classify(&self, board: &Board) -> PositionClass {
        classify(board, self.bearoff)
    }

    /// Evaluates a board from the mover's viewpoint, writing the five
    /// probability outputs. Returns the position class that was used.
    pub fn evaluate_static(
        &self,
        board: &Board,
        ec: &EvalContext,
        scratch: &mut NetScratchSet,
        outputs: &mut Outputs,
    ) -> PositionClass {
        let class = classify(board, self.bearoff);
        match class {
            PositionClass::Over => eval_over(board, outputs),
            PositionClass::Bearoff2 | PositionClass::BearoffTs => {
                if let Some(db) = &self.bearoff.two_sided {
                    db.evaluate(board, outputs);
                } else {
                    self.eval_net(PositionClass::Race, board, scratch, outputs);
                }
            }
            PositionClass::Bearoff1 | PositionClass::BearoffOs => {
                if let Some(db) = &self.bearoff.one_sided {
                    db.evaluate(board, outputs);
                } else {
                    self.eval_net(PositionClass::Race, board, scratch, outputs);
                }
            }
            _ => self.eval_net(class, board, scratch, outputs),
        }

        if ec.noise > 0.0 && class != PositionClass::Over {
            apply_noise(board, ec, outputs);
        }
        sanity_check(board, outputs);
        class
    }

    fn eval_net(
        &self,
        class: PositionClass,
        board: &Board,
        scratch: &mut NetScratchSet,
        outputs: &mut Outputs,
    ) {
        let net = match class {
            PositionClass::Race => &self.nets.race,
            PositionClass::Crashed => &self.nets.crashed,
            _ => &self.nets.contact,
        };
        let inputs = encode(board, class);
        net.evaluate_with(&inputs, outputs, scratch.state_for(class));
    }
}

/// Closed-form outputs for a finished game.
fn eval_over(board: &Board, outputs: &mut Outputs) {
    *outputs = [0.0; 5];
    let Some((mover_won, result)) = board.game_result() else {
        return;
    };
    if mover_won {
        outputs[OUTPUT_WIN] = 1.0;
        outputs[OUTPUT_WIN_GAMMON] = if result != GameResult::Single { 1.0 } else { 0.0 };
        outputs[OUTPUT_WIN_BACKGAMMON] = if result == GameResult::Backgammon { 1.0 } else { 0.0 };
    } else {
        outputs[OUTPUT_LOSE_GAMMON] = if result != GameResult::Single { 1.0 } else { 0.0 };
        outputs[OUTPUT_LOSE_BACKGAMMON] = if result == GameResult::Backgammon { 1.0 } else { 0.0 };
    }
}

/// Clamps raw net outputs into a coherent probability vector: everything in
/// [0, 1], gammons bounded by wins, backgammons by gammons, and outcomes
/// the borne-off counts have already ruled out forced to zero.
pub(crate) fn sanity_check(board: &Board, outputs: &mut Outputs) {
    for o in outputs.iter_mut() {
        *o = o.clamp(0.0, 1.0);
    }

    if board.borne_off(OPPONENT) > 0 {
        outputs[OUTPUT_WIN_GAMMON] = 0.0;
        outputs[OUTPUT_WIN_BACKGAMMON] = 0.0;
    } else if !side_reaches_home(board, OPPONENT) {
        outputs[OUTPUT_WIN_BACKGAMMON] = 0.0;
    }

    if board.borne_off(MOVER) > 0 {
        outputs[OUTPUT_LOSE_GAMMON] = 0.0;
        outputs[OUTPUT_LOSE_BACKGAMMON] = 0.0;
    } else if !side_reaches_home(board, MOVER) {
        outputs[OUTPUT_LOSE_BACKGAMMON] = 0.0;
    }

    let win = outputs[OUTPUT_WIN];
    outputs[OUTPUT_WIN_GAMMON] = outputs[OUTPUT_WIN_GAMMON].min(win);
    outputs[OUTPUT_WIN_BACKGAMMON] = outputs[OUTPUT_WIN_BACKGAMMON].min(outputs[OUTPUT_WIN_GAMMON]);
    outputs[OUTPUT_LOSE_GAMMON] = outputs[OUTPUT_LOSE_GAMMON].min(1.0 - win);
    outputs[OUTPUT_LOSE_BACKGAMMON] =
        outputs[OUTPUT_LOSE_BACKGAMMON].min(outputs[OUTPUT_LOSE_GAMMON]);
}

/// A side can still be backgammoned only while it has a chequer in the
/// opponent's home board or on the bar; chequers never move backwards.
fn side_reaches_home(board: &Board, side: usize) -> bool {
    board.counts(side)[BAR] > 0
        || board.counts(side)[NUM_POINTS - 6..NUM_POINTS]
            .iter()
            .any(|&c| c > 0)
}

/// Gaussian evaluation noise. With the determinism flag the generator is
/// seeded from the position key, so the same position always gets the same
/// perturbation.
fn apply_noise(board: &Board, ec: &EvalContext, outputs: &mut Outputs) {
    let mut rng = if ec.deterministic {
        let key = PositionKey::from_board(board);
        SmallRng::seed_from_u64(key.hash(0x9e37_79b9) as u64)
    } else {
        SmallRng::from_rng(&mut rand::rng())
    };

    for o in outputs.iter_mut() {
        // Box-Muller from two uniforms in (0, 1]
        let u1: f32 = 1.0 - rng.random::<f32>();
        let u2: f32 = rng.random();
        let gauss = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
        *o += gauss * ec.noise;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::test_weight_set;

    fn evaluate(board: &Board, ec: &EvalContext) -> (Outputs, PositionClass) {
        let nets = test_weight_set();
        let bearoff = BearoffSet::empty();
        let evaluator = PositionEvaluator::new(&nets, &bearoff);
        let mut scratch = NetScratchSet::new();
        let mut outputs = [0.0; 5];
        let class = evaluator.evaluate_static(board, ec, &mut scratch, &mut outputs);
        (outputs, class)
    }

    #[test]
    fn finished_game_closed_form() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[2] = 3; // opponent has borne off all 15
        let (outputs, class) = evaluate(&board, &EvalContext::default());
        assert_eq!(class, PositionClass::Over);
        assert_eq!(outputs[OUTPUT_WIN], 0.0);
        assert_eq!(outputs[OUTPUT_LOSE_GAMMON], 0.0);

        let mut board = Board::empty();
        board.counts_mut(OPPONENT)[10] = 15; // gammon win for the mover
        let (outputs, _) = evaluate(&board, &EvalContext::default());
        assert_eq!(outputs[OUTPUT_WIN], 1.0);
        assert_eq!(outputs[OUTPUT_WIN_GAMMON], 1.0);
        assert_eq!(outputs[OUTPUT_WIN_BACKGAMMON], 0.0);
    }

    #[test]
    fn outputs_are_coherent() {
        let (outputs, class) = evaluate(&Board::starting_position(), &EvalContext::default());
        assert_eq!(class, PositionClass::Contact);
        assert!(outputs[OUTPUT_WIN_BACKGAMMON] <= outputs[OUTPUT_WIN_GAMMON]);
        assert!(outputs[OUTPUT_WIN_GAMMON] <= outputs[OUTPUT_WIN]);
        assert!(outputs[OUTPUT_LOSE_BACKGAMMON] <= outputs[OUTPUT_LOSE_GAMMON]);
        assert!(outputs[OUTPUT_LOSE_GAMMON] <= 1.0 - outputs[OUTPUT_WIN]);
    }

    #[test]
    fn impossible_gammons_are_zeroed() {
        let mut outputs = [0.5, 0.4, 0.3, 0.4, 0.3];
        let mut board = Board::starting_position();
        board.counts_mut(OPPONENT)[5] -= 1; // opponent has borne one off
        sanity_check(&board, &mut outputs);
        assert_eq!(outputs[OUTPUT_WIN_GAMMON], 0.0);
        assert_eq!(outputs[OUTPUT_WIN_BACKGAMMON], 0.0);
        assert!(outputs[OUTPUT_LOSE_GAMMON] > 0.0);
    }

    #[test]
    fn backgammon_requires_a_rear_chequer() {
        let mut outputs = [0.5, 0.4, 0.3, 0.4, 0.3];
        let mut board = Board::empty();
        // both armies past each other's home boards, nothing borne off
        board.counts_mut(MOVER)[10] = 15;
        board.counts_mut(OPPONENT)[9] = 15;
        sanity_check(&board, &mut outputs);
        assert_eq!(outputs[OUTPUT_WIN_BACKGAMMON], 0.0);
        assert_eq!(outputs[OUTPUT_LOSE_BACKGAMMON], 0.0);
        assert!(outputs[OUTPUT_WIN_GAMMON] > 0.0);
    }

    #[test]
    fn deterministic_noise_is_repeatable() {
        let ec = EvalContext {
            noise: 0.05,
            deterministic: true,
            ..Default::default()
        };
        let (a, _) = evaluate(&Board::starting_position(), &ec);
        let (b, _) = evaluate(&Board::starting_position(), &ec);
        assert_eq!(a, b);

        let clean = EvalContext::default();
        let (c, _) = evaluate(&Board::starting_position(), &clean);
        assert_ne!(a, c);
    }

    #[test]
    fn closed_form_side_symmetry() {
        // a finished game reads the same from either viewpoint, with the
        // win and loss outputs exchanged
        let mut board = Board::empty();
        board.counts_mut(MOVER)[23] = 15;

        let (outputs, _) = evaluate(&board, &EvalContext::default());
        let (swapped, _) = evaluate(&board.swapped(), &EvalContext::default());

        assert_eq!(outputs[OUTPUT_WIN], 1.0 - swapped[OUTPUT_WIN]);
        assert_eq!(outputs[OUTPUT_LOSE_GAMMON], swapped[OUTPUT_WIN_GAMMON]);
        assert_eq!(outputs[OUTPUT_LOSE_BACKGAMMON], swapped[OUTPUT_WIN_BACKGAMMON]);
    }
}
