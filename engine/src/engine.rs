/*
 * engine.rs
 * Part of the byte-gammon project
 * Created Date: Wednesday, April 2nd 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Fri Jul 4 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::path::PathBuf;
use std::time::Instant;

use gammon::match_state::MatchState;
use gammon::notation::format_play;
use gammon::xgid::parse_xgid;
use tracing::{debug, info};

use crate::action::{
    action_from_cube_decision, error_json, round_equity, CubeData, MoveData, Recommendation,
};
use crate::bearoff::{BearoffOneSided, BearoffSet, BearoffTwoSided};
use crate::cache::EvalCache;
use crate::classify::classify;
use crate::cube::{cube_efficiency, find_cube_decision};
use crate::defs::{DEFAULT_CACHE_SIZE, MAX_PLAYER_MOVES, MAX_PLIES, NUM_OUTPUTS};
use crate::error::{EngineError, EngineResult};
use crate::match_equity::MatchEquityTable;
use crate::search::{EvalContext, Searcher};
use crate::weights::WeightSet;

/// Engine construction parameters. The defaults mirror a stock
/// installation: weights under `./data`, half-a-million cache entries, one
/// thread, the generated one-sided bearoff database.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub weights_path: PathBuf,
    pub binary_weights_path: Option<PathBuf>,
    pub cache_size: u32,
    pub threads: usize,
    /// Generate the one-sided bearoff database at init.
    pub bearoff: bool,
    /// Generate a two-sided bearoff database for up to this many chequers
    /// per side. Expensive; off by default.
    pub two_sided_bearoff: Option<u8>,
    pub beavers: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            weights_path: PathBuf::from("./data/gammon.weights"),
            binary_weights_path: Some(PathBuf::from("./data/gammon.wd")),
            cache_size: DEFAULT_CACHE_SIZE,
            threads: 1,
            bearoff: true,
            two_sided_bearoff: None,
            beavers: 3,
        }
    }
}

/// The complete advisor: owns the nets, the match-equity tables, the
/// bearoff databases and the evaluation cache. All resources are loaded by
/// [`init`] and are read-only afterwards except the cache.
///
/// [`init`]: Engine::init
#[derive(Debug)]
pub struct Engine {
    nets: WeightSet,
    met: MatchEquityTable,
    bearoff: BearoffSet,
    cache: EvalCache,
    config: EngineConfig,
}

impl Engine {
    /// Loads every resource or fails without leaving partial state behind.
    pub fn init(config: EngineConfig) -> EngineResult<Engine> {
        if config.threads != 1 {
            return Err(EngineError::OutOfRange(format!(
                "unsupported thread count {}",
                config.threads
            )));
        }

        let started = Instant::now();

        let nets = match &config.binary_weights_path {
            Some(path) if path.exists() => WeightSet::load_binary(path),
            _ => WeightSet::load_text(&config.weights_path),
        }
        .map_err(|err| EngineError::ResourceUnavailable(format!("weights: {}", err)))?;

        let met = MatchEquityTable::builtin();

        let mut bearoff = BearoffSet::empty();
        if config.bearoff {
            bearoff.one_sided = Some(BearoffOneSided::generate());
        }
        if let Some(max_chequers) = config.two_sided_bearoff {
            bearoff.two_sided = Some(BearoffTwoSided::generate(max_chequers));
        }

        let cache = EvalCache::new(config.cache_size);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            cache_entries = cache.size(),
            bearoff = config.bearoff,
            "engine initialised"
        );

        Ok(Engine {
            nets,
            met,
            bearoff,
            cache,
            config,
        })
    }

    /// Builds an engine from preloaded resources; used by tests and
    /// embedders that manage their own files.
    pub fn with_resources(
        nets: WeightSet,
        met: MatchEquityTable,
        bearoff: BearoffSet,
        config: EngineConfig,
    ) -> Engine {
        let cache = EvalCache::new(config.cache_size);
        Engine {
            nets,
            met,
            bearoff,
            cache,
            config,
        }
    }

    /// Releases all resources. Nothing may be called afterwards; the move
    /// semantics enforce it.
    pub fn shutdown(self) {}

    /// Discards all cached evaluations.
    pub fn flush_cache(&mut self) {
        self.cache.flush();
    }

    pub fn resize_cache(&mut self, entries: u32) {
        self.cache.resize(entries);
    }

    /// Recommends an action for an XGID position at the given depth.
    pub fn recommend(&mut self, xgid: &str, plies: u32) -> EngineResult<Recommendation> {
        let state = parse_xgid(xgid)?;
        self.recommend_state(&state, plies)
    }

    /// The JSON entry point: the recommendation body, or `{"error": n}`.
    pub fn hint(&mut self, xgid: &str, plies: u32) -> String {
        match self.recommend(xgid, plies) {
            Ok(recommendation) => recommendation.to_json(),
            Err(err) => error_json(err.code()),
        }
    }

    /// Recommends an action for an already-parsed state: a resignation
    /// answer, a cube action, or the ranked chequer plays.
    pub fn recommend_state(
        &mut self,
        state: &MatchState,
        plies: u32,
    ) -> EngineResult<Recommendation> {
        if plies > MAX_PLIES {
            return Err(EngineError::OutOfRange(format!(
                "plies {} exceeds the supported maximum of {}",
                plies, MAX_PLIES
            )));
        }

        let ci = state.cube_info_with_beavers(self.config.beavers)?;
        let ec = EvalContext {
            plies,
            cubeful: state.cube_use,
            ..Default::default()
        };

        let recommendation = if state.resigned > 0 {
            self.answer_resignation(state, &ci, &ec, plies)?
        } else if state.dice.is_none() {
            // no dice: either we may double, or we answer the cube
            let mut searcher =
                Searcher::new(&self.nets, &self.bearoff, &self.met, &mut self.cache);
            let outputs = searcher.evaluate(&state.board, &ci, &ec, plies)?;
            let mut probs = [0.0f32; NUM_OUTPUTS];
            probs.copy_from_slice(&outputs[..NUM_OUTPUTS]);

            let class = classify(&state.board, &self.bearoff);
            let efficiency = cube_efficiency(&state.board, class);
            let analysis =
                find_cube_decision(&self.met, &probs, &ci, state.cube_use, efficiency);

            Recommendation::Cube {
                action: action_from_cube_decision(analysis.decision, state.doubled),
                data: CubeData {
                    cd: analysis.decision.code(),
                    equity: analysis.equities.map(round_equity),
                },
            }
        } else {
            let dice = state
                .dice
                .ok_or_else(|| EngineError::InternalInvariant("dice vanished".into()))?;
            let mut searcher =
                Searcher::new(&self.nets, &self.bearoff, &self.met, &mut self.cache);
            let mut plays = searcher.find_best_plays(&state.board, dice, &ci, &ec)?;
            plays.truncate(MAX_PLAYER_MOVES);

            let moves = plays
                .iter()
                .map(|scored| MoveData {
                    play: format_play(&state.board, &scored.play),
                    equity: [round_equity(scored.equity), round_equity(scored.cubeless)],
                    eval: scored.outputs.map(round_equity),
                })
                .collect();
            Recommendation::Play { moves }
        };

        debug!(
            action = recommendation.action().as_str(),
            cache_lookups = self.cache.lookups(),
            cache_hits = self.cache.hits(),
            "recommendation ready"
        );
        Ok(recommendation)
    }

    /// Accept or reject a pending resignation by comparing its value with
    /// the equity of playing on.
    fn answer_resignation(
        &mut self,
        state: &MatchState,
        ci: &gammon::match_state::CubeInfo,
        ec: &EvalContext,
        plies: u32,
    ) -> EngineResult<Recommendation> {
        let mut searcher = Searcher::new(&self.nets, &self.bearoff, &self.met, &mut self.cache);
        let outputs = searcher.evaluate(&state.board, ci, ec, plies)?;
        let mut probs = [0.0f32; NUM_OUTPUTS];
        probs.copy_from_slice(&outputs[..NUM_OUTPUTS]);
        let play_equity = self.met.cubeless_utility(&probs, ci);

        let accept = if ci.is_money() {
            state.resigned as f32 >= play_equity - 1e-6
        } else {
            let mover = ci.on_roll;
            let accept_mwc = self.met.me(
                ci.scores[0] as i32,
                ci.scores[1] as i32,
                ci.match_to as i32,
                mover,
                state.resigned as i32 * ci.cube as i32,
                mover,
                ci.crawford,
            );
            let play_mwc = self.met.equity_to_mwc(play_equity, ci);
            accept_mwc >= play_mwc - 1e-6
        };

        Ok(Recommendation::Resignation { accept })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::PlayerAction;
    use crate::weights::test_weight_set;
    use gammon::board::Board;
    use gammon::definitions::{MOVER, OPPONENT};

    fn test_config() -> EngineConfig {
        EngineConfig {
            cache_size: 1 << 14,
            bearoff: false,
            ..Default::default()
        }
    }

    fn net_engine() -> Engine {
        Engine::with_resources(
            test_weight_set(),
            MatchEquityTable::builtin(),
            BearoffSet::empty(),
            test_config(),
        )
    }

    fn bearoff_engine() -> Engine {
        Engine::with_resources(
            test_weight_set(),
            MatchEquityTable::builtin(),
            BearoffSet::with_one_sided(),
            test_config(),
        )
    }

    /// Money-game state with the given home boards, no dice rolled.
    fn bearoff_state(mover: &[(usize, u8)], opponent: &[(usize, u8)]) -> MatchState {
        let mut board = Board::empty();
        for &(point, count) in mover {
            board.counts_mut(MOVER)[point] = count;
        }
        for &(point, count) in opponent {
            board.counts_mut(OPPONENT)[point] = count;
        }
        MatchState {
            board,
            ..Default::default()
        }
    }

    #[test]
    fn init_without_weights_fails_cleanly() {
        let config = EngineConfig {
            weights_path: PathBuf::from("./no/such/file.weights"),
            binary_weights_path: None,
            bearoff: false,
            ..Default::default()
        };
        let err = Engine::init(config).unwrap_err();
        assert_eq!(err.code(), -6);
    }

    #[test]
    fn init_rejects_multiple_threads() {
        let config = EngineConfig {
            threads: 4,
            ..test_config()
        };
        let err = Engine::init(config).unwrap_err();
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn plies_are_bounded() {
        let mut engine = net_engine();
        let state = MatchState::default();
        let err = engine.recommend_state(&state, 9).unwrap_err();
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn parse_errors_surface_their_codes() {
        let mut engine = net_engine();
        assert_eq!(engine.hint("garbage", 0), "{\"error\":-1}");
        assert_eq!(
            engine.hint("XGID=-b----E-C---eE---c-e----B-:0:0:1:B:0:0:0:0:10", 0),
            "{\"error\":-4}"
        );
    }

    #[test]
    fn rolled_dice_produce_plays() {
        let mut engine = net_engine();
        let rec = engine
            .recommend("XGID=-b----E-C---eE---c-e----B-:0:0:1:65:0:0:0:0:10", 0)
            .unwrap();
        assert_eq!(rec.action(), PlayerAction::Move);
        let Recommendation::Play { moves } = rec else {
            unreachable!("dice always lead to a play recommendation");
        };
        assert!(!moves.is_empty());
        assert!(moves.len() <= MAX_PLAYER_MOVES);
        // the lover's leap is a legal candidate somewhere in the list
        assert!(moves.iter().any(|m| m.play == "24/18 18/13"));
    }

    #[test]
    fn no_dice_produces_a_cube_recommendation() {
        let mut engine = net_engine();
        let rec = engine
            .recommend("XGID=-b----E-C---eE---c-e----B-:0:0:1:00:0:0:0:0:10", 0)
            .unwrap();
        let Recommendation::Cube { action, data } = rec else {
            unreachable!("no dice means a cube decision");
        };
        assert!(matches!(
            action,
            PlayerAction::Roll | PlayerAction::Double | PlayerAction::Beaver
        ));
        assert_eq!(data.equity[2], 1.0); // drop is always the stake
    }

    #[test]
    fn strong_favourite_doubles_out() {
        let mut engine = bearoff_engine();
        // four on the ace each, mover on roll: 31 wins in 36, past the
        // cash point
        let state = bearoff_state(&[(0, 4)], &[(0, 4)]);
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::Double);
    }

    #[test]
    fn doubled_underdog_drops() {
        let mut engine = bearoff_engine();
        // board from the doubler's side: the doubled player wins too
        // rarely to take
        let mut state = bearoff_state(&[(0, 4)], &[(0, 4)]);
        state.doubled = true;
        state.turn = 0;
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::Drop);
    }

    #[test]
    fn doubled_favourite_beavers() {
        let mut engine = bearoff_engine();
        // the doubler wins only with an immediate double: 1 roll in 6
        let mut state = bearoff_state(&[(0, 4)], &[(0, 1)]);
        state.doubled = true;
        state.turn = 0;
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::Beaver);
    }

    #[test]
    fn underdog_rolls_without_doubling() {
        let mut engine = bearoff_engine();
        let state = bearoff_state(&[(0, 6)], &[(0, 4)]);
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::Roll);
    }

    #[test]
    fn resignation_for_a_plain_loss_is_accepted() {
        let mut engine = bearoff_engine();
        // mover is certain to win a single game; one point is fair
        let mut state = bearoff_state(&[(0, 1)], &[(0, 4)]);
        state.resigned = 1;
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::AcceptResignation);
    }

    #[test]
    fn resignation_is_rejected_when_a_gammon_looms() {
        let mut engine = bearoff_engine();
        // the opponent has borne nothing off and the mover wins this roll:
        // a certain gammon, so a single-game resignation is not enough
        let mut state = bearoff_state(&[(0, 1)], &[(5, 15)]);
        state.resigned = 1;
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::RejectResignation);

        // offering the gammon is enough
        state.resigned = 2;
        let rec = engine.recommend_state(&state, 0).unwrap();
        assert_eq!(rec.action(), PlayerAction::AcceptResignation);
    }

    #[test]
    fn race_action_is_stable_in_depth() {
        let mut engine = bearoff_engine();
        let state = bearoff_state(&[(0, 6)], &[(0, 4)]);
        let shallow = engine.recommend_state(&state, 0).unwrap();
        let deep = engine.recommend_state(&state, 2).unwrap();
        assert_eq!(shallow.action(), deep.action());
    }

    #[test]
    fn shutdown_consumes_the_engine() {
        let engine = net_engine();
        engine.shutdown();
    }
}
