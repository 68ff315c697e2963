/*
 * search.rs
 * Part of the byte-gammon project
 * Created Date: Monday, March 31st 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Thu Jul 3 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::cmp::Ordering;

use itertools::Itertools;

use gammon::board::Board;
use gammon::dice::{Dice, ALL_ROLLS};
use gammon::match_state::CubeInfo;
use gammon::move_generation::MoveGenerator;
use gammon::move_list::PlayList;
use gammon::moves::Play;
use gammon::position_key::PositionKey;

use crate::bearoff::BearoffSet;
use crate::cache::{CacheLookup, CacheNodeDetail, EvalCache};
use crate::cube::{cube_efficiency, cubeful_equity};
use crate::defs::{EvalOutputs, Outputs, NUM_OUTPUTS, OUTPUT_CUBEFUL};
use crate::error::{EngineError, EngineResult};
use crate::evaluator::{NetScratchSet, PositionEvaluator};
use crate::match_equity::MatchEquityTable;
use crate::weights::WeightSet;

/// Move filters cover searches up to this many plies.
pub const MAX_FILTER_PLIES: usize = 4;

/// One filter step: always keep the best `accept` candidates, plus up to
/// `extra` more whose first-pass score is within `threshold` of the best.
/// A negative `accept` keeps everything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveFilter {
    pub accept: i32,
    pub extra: u32,
    pub threshold: f32,
}

/// Filter grid: `filters[n - 1][ply]` is applied at `ply` during an n-ply
/// search.
pub type MoveFilterTable = [[MoveFilter; MAX_FILTER_PLIES]; MAX_FILTER_PLIES];

const KEEP_ALL: MoveFilter = MoveFilter {
    accept: -1,
    extra: 0,
    threshold: 0.0,
};

const fn preset(extra: u32, threshold: f32) -> MoveFilterTable {
    let f = MoveFilter {
        accept: 0,
        extra,
        threshold,
    };
    [
        [f, KEEP_ALL, KEEP_ALL, KEEP_ALL],
        [f, KEEP_ALL, KEEP_ALL, KEEP_ALL],
        [f, KEEP_ALL, f, KEEP_ALL],
        [f, KEEP_ALL, f, KEEP_ALL],
    ]
}

pub const MOVEFILTER_TINY: MoveFilterTable = preset(5, 0.08);
pub const MOVEFILTER_NARROW: MoveFilterTable = preset(8, 0.12);
pub const MOVEFILTER_NORMAL: MoveFilterTable = preset(8, 0.16);
pub const MOVEFILTER_LARGE: MoveFilterTable = preset(16, 0.32);
pub const MOVEFILTER_HUGE: MoveFilterTable = preset(20, 0.44);

/// Everything that parameterises one evaluation request.
#[derive(Clone, Debug)]
pub struct EvalContext {
    /// Plies to search below the position being evaluated.
    pub plies: u32,
    /// Compute the cubeful equity alongside the probabilities.
    pub cubeful: bool,
    /// Disable the cheap pre-filter pass entirely.
    pub no_prune: bool,
    /// Seed evaluation noise from the position instead of the clock.
    pub deterministic: bool,
    /// Sigma of the Gaussian evaluation noise; 0 for exact play.
    pub noise: f32,
    pub filters: MoveFilterTable,
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext {
            plies: 0,
            cubeful: false,
            no_prune: false,
            deterministic: true,
            noise: 0.0,
            filters: MOVEFILTER_NORMAL,
        }
    }
}

impl EvalContext {
    /// Digest identifying this context at a given remaining depth. Folded
    /// into the cache key next to the position key. When the cubeful
    /// equity is cached the cube state is part of the digest as well.
    pub fn digest_at(&self, plies: u32, ci: &CubeInfo) -> u32 {
        let mut hash = fnv(0x811c_9dc5, plies);
        hash = fnv(hash, self.cubeful as u32);
        hash = fnv(hash, self.no_prune as u32);
        hash = fnv(hash, self.deterministic as u32);
        hash = fnv(hash, self.noise.to_bits());
        for row in &self.filters {
            for filter in row {
                hash = fnv(hash, filter.accept as u32);
                hash = fnv(hash, filter.extra);
                hash = fnv(hash, filter.threshold.to_bits());
            }
        }
        if self.cubeful {
            hash = fnv(hash, ci.cube);
            hash = fnv(hash, ci.owner as u32);
            hash = fnv(hash, ci.on_roll as u32);
            hash = fnv(hash, ci.match_to);
            hash = fnv(hash, ci.scores[0]);
            hash = fnv(hash, ci.scores[1]);
            hash = fnv(hash, ci.crawford as u32);
            hash = fnv(hash, ci.jacoby as u32);
        }
        hash
    }
}

fn fnv(hash: u32, value: u32) -> u32 {
    let mut hash = hash;
    for byte in value.to_le_bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// A candidate play with its evaluation.
#[derive(Clone, Debug)]
pub struct ScoredPlay {
    pub play: Play,
    /// Selection equity: cubeful when the context asks for it.
    pub equity: f32,
    pub cubeless: f32,
    pub outputs: Outputs,
}

/// n-ply expectation search over dice rolls, with candidate filtering and
/// the evaluation cache. One searcher serves one request; its net scratch
/// state must not be shared.
pub struct Searcher<'a> {
    evaluator: PositionEvaluator<'a>,
    met: &'a MatchEquityTable,
    cache: &'a mut EvalCache,
    movegen: MoveGenerator,
    scratch: NetScratchSet,
}

impl<'a> Searcher<'a> {
    pub fn new(
        nets: &'a WeightSet,
        bearoff: &'a BearoffSet,
        met: &'a MatchEquityTable,
        cache: &'a mut EvalCache,
    ) -> Self {
        Searcher {
            evaluator: PositionEvaluator::new(nets, bearoff),
            met,
            cache,
            movegen: MoveGenerator::new(),
            scratch: NetScratchSet::new(),
        }
    }

    /// Evaluates a position to the given depth, going through the cache.
    /// The board is from the viewpoint of the player on roll described by
    /// `ci`.
    pub fn evaluate(
        &mut self,
        board: &Board,
        ci: &CubeInfo,
        ec: &EvalContext,
        plies: u32,
    ) -> EngineResult<EvalOutputs> {
        let key = PositionKey::from_board(board);
        let digest = ec.digest_at(plies, ci);
        let bucket = match self.cache.lookup(&key, digest) {
            CacheLookup::Hit(outputs) => return Ok(outputs),
            CacheLookup::Miss(bucket) => bucket,
        };

        // finished games and exactly-solved database positions gain
        // nothing from expansion
        let class = self.evaluator.classify(board);
        let exact = matches!(
            class,
            crate::classify::PositionClass::Over
                | crate::classify::PositionClass::Bearoff2
                | crate::classify::PositionClass::BearoffTs
        );

        let outputs = if plies == 0 || exact {
            self.static_eval(board, ci, ec)
        } else {
            self.expand(board, ci, ec, plies)?
        };

        self.cache.insert(
            bucket,
            CacheNodeDetail {
                key,
                eval_context: digest,
                outputs,
            },
        );
        Ok(outputs)
    }

    /// Scores all legal plays for a roll: a cheap 0-ply ordering pass, then
    /// progressively deeper evaluation of the filter's survivors. The
    /// result is sorted by final equity; filtered-out plays keep their
    /// first-pass scores at the tail.
    pub fn find_best_plays(
        &mut self,
        board: &Board,
        dice: Dice,
        ci: &CubeInfo,
        ec: &EvalContext,
    ) -> EngineResult<Vec<ScoredPlay>> {
        let mut list = PlayList::new();
        self.movegen.generate(board, dice, &mut list);
        if list.is_empty() {
            return Ok(Vec::new());
        }

        let opp_ci = ci.for_opponent();

        // first pass: 0 ply, incremental net evaluation across siblings
        self.scratch.begin_branch();
        let mut scored: Vec<ScoredPlay> = Vec::with_capacity(list.len());
        for play in list.iter() {
            let child = play.board().swapped();
            let child_outputs = self.evaluate(&child, &opp_ci, ec, 0)?;
            scored.push(self.scored_play(play.clone(), &child_outputs, ci, ec));
        }
        sort_candidates(&mut scored);

        let depth_row = (ec.plies as usize).clamp(1, MAX_FILTER_PLIES) - 1;
        for target_ply in 1..=ec.plies {
            let filter = if ec.no_prune {
                KEEP_ALL
            } else {
                ec.filters[depth_row][(target_ply - 1) as usize]
            };
            let keep = filter_count(&filter, &scored);
            let tail = scored.split_off(keep);

            for candidate in scored.iter_mut() {
                let child = candidate.play.board().swapped();
                let child_outputs = self.evaluate(&child, &opp_ci, ec, target_ply)?;
                *candidate = self.scored_play(candidate.play.clone(), &child_outputs, ci, ec);
            }
            sort_candidates(&mut scored);
            scored.extend(tail);
        }

        Ok(scored)
    }

    fn scored_play(
        &self,
        play: Play,
        child_outputs: &EvalOutputs,
        ci: &CubeInfo,
        ec: &EvalContext,
    ) -> ScoredPlay {
        let outputs = invert_outputs(child_outputs);
        let mut probs = [0.0f32; NUM_OUTPUTS];
        probs.copy_from_slice(&outputs[..NUM_OUTPUTS]);
        let cubeless = self.met.cubeless_utility(&probs, ci);
        let equity = if ec.cubeful {
            outputs[OUTPUT_CUBEFUL]
        } else {
            cubeless
        };
        ScoredPlay {
            play,
            equity,
            cubeless,
            outputs: probs,
        }
    }

    fn static_eval(&mut self, board: &Board, ci: &CubeInfo, ec: &EvalContext) -> EvalOutputs {
        let mut probs = [0.0f32; NUM_OUTPUTS];
        let class = self
            .evaluator
            .evaluate_static(board, ec, &mut self.scratch, &mut probs);

        let mut outputs = [0.0f32; 6];
        outputs[..NUM_OUTPUTS].copy_from_slice(&probs);
        if ec.cubeful {
            let efficiency = cube_efficiency(board, class);
            outputs[OUTPUT_CUBEFUL] = cubeful_equity(self.met, &probs, ci, efficiency);
        }
        outputs
    }

    /// Expectation over the 21 rolls: for each roll the opponent-to-be
    /// plays, the best reply is found among the filter's survivors, and its
    /// evaluation is inverted back to the mover's viewpoint.
    fn expand(
        &mut self,
        board: &Board,
        ci: &CubeInfo,
        ec: &EvalContext,
        plies: u32,
    ) -> EngineResult<EvalOutputs> {
        let opp_ci = ci.for_opponent();
        let filter = if ec.no_prune {
            KEEP_ALL
        } else {
            ec.filters[(plies as usize).clamp(1, MAX_FILTER_PLIES) - 1][0]
        };

        let mut total = [0.0f32; 6];
        for (dice, weight) in ALL_ROLLS {
            let mut list = PlayList::new();
            self.movegen.generate(board, dice, &mut list);

            let best = if list.is_empty() {
                // dance: the same position from the other side
                let child = board.swapped();
                invert_outputs(&self.evaluate(&child, &opp_ci, ec, plies - 1)?)
            } else {
                // order candidates with a cheap 0-ply pass
                self.scratch.begin_branch();
                let mut ranked: Vec<(usize, f32)> = Vec::with_capacity(list.len());
                for (index, play) in list.iter().enumerate() {
                    let child = play.board().swapped();
                    let child_outputs = self.evaluate(&child, &opp_ci, ec, 0)?;
                    ranked.push((index, -self.selection_equity(&child_outputs, &opp_ci, ec)));
                }
                let ranked = ranked
                    .into_iter()
                    .sorted_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(Ordering::Equal)
                            .then(a.0.cmp(&b.0))
                    })
                    .collect_vec();
                let keep = filter_count_scores(&filter, &ranked);

                let mut best_equity = f32::NEG_INFINITY;
                let mut best_outputs = None;
                for &(index, _) in ranked.iter().take(keep) {
                    let play = list.at(index).ok_or_else(|| {
                        EngineError::InternalInvariant("candidate index out of range".into())
                    })?;
                    let child = play.board().swapped();
                    let child_outputs = self.evaluate(&child, &opp_ci, ec, plies - 1)?;
                    let equity = -self.selection_equity(&child_outputs, &opp_ci, ec);
                    if equity > best_equity {
                        best_equity = equity;
                        best_outputs = Some(invert_outputs(&child_outputs));
                    }
                }
                best_outputs.ok_or_else(|| {
                    EngineError::InternalInvariant("no candidate survived filtering".into())
                })?
            };

            let p = weight as f32 / 36.0;
            for (slot, value) in total.iter_mut().zip(best.iter()) {
                *slot += p * value;
            }
        }
        Ok(total)
    }

    fn selection_equity(&self, outputs: &EvalOutputs, ci: &CubeInfo, ec: &EvalContext) -> f32 {
        if ec.cubeful {
            outputs[OUTPUT_CUBEFUL]
        } else {
            let mut probs = [0.0f32; NUM_OUTPUTS];
            probs.copy_from_slice(&outputs[..NUM_OUTPUTS]);
            self.met.cubeless_utility(&probs, ci)
        }
    }
}

/// Flips an evaluation to the other player's viewpoint: wins become losses
/// and the cubeful equity changes sign.
pub fn invert_outputs(outputs: &EvalOutputs) -> EvalOutputs {
    [
        1.0 - outputs[0],
        outputs[3],
        outputs[4],
        outputs[1],
        outputs[2],
        -outputs[5],
    ]
}

fn sort_candidates(scored: &mut [ScoredPlay]) {
    // stable: equal equities keep the canonical play order
    scored.sort_by(|a, b| {
        b.equity
            .partial_cmp(&a.equity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.play.cmp_encoding(&b.play))
    });
}

fn filter_count(filter: &MoveFilter, scored: &[ScoredPlay]) -> usize {
    if filter.accept < 0 {
        return scored.len();
    }
    let Some(best) = scored.first().map(|s| s.equity) else {
        return 0;
    };
    let limit = (filter.accept as usize + filter.extra as usize).min(scored.len());
    let mut keep = 1;
    for (index, candidate) in scored.iter().enumerate().take(limit) {
        if index < filter.accept as usize || best - candidate.equity <= filter.threshold {
            keep = index + 1;
        } else {
            break;
        }
    }
    keep
}

fn filter_count_scores(filter: &MoveFilter, ranked: &[(usize, f32)]) -> usize {
    if filter.accept < 0 {
        return ranked.len();
    }
    let Some(best) = ranked.first().map(|r| r.1) else {
        return 0;
    };
    let limit = (filter.accept as usize + filter.extra as usize).min(ranked.len());
    let mut keep = 1;
    for (index, candidate) in ranked.iter().enumerate().take(limit) {
        if index < filter.accept as usize || best - candidate.1 <= filter.threshold {
            keep = index + 1;
        } else {
            break;
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{DEFAULT_CACHE_SIZE, OUTPUT_WIN};
    use crate::weights::test_weight_set;
    use gammon::definitions::MOVER;
    use gammon::match_state::CubeInfo;

    struct Fixture {
        nets: WeightSet,
        bearoff: BearoffSet,
        met: MatchEquityTable,
        cache: EvalCache,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                nets: test_weight_set(),
                bearoff: BearoffSet::empty(),
                met: MatchEquityTable::builtin(),
                cache: EvalCache::new(1 << 14),
            }
        }

        fn searcher(&mut self) -> Searcher<'_> {
            Searcher::new(&self.nets, &self.bearoff, &self.met, &mut self.cache)
        }
    }

    fn money() -> CubeInfo {
        CubeInfo::money(false, 3)
    }

    #[test]
    fn cached_lookup_is_byte_identical() {
        let mut fixture = Fixture::new();
        let board = Board::starting_position();
        let ec = EvalContext::default();

        let mut searcher = fixture.searcher();
        let first = searcher.evaluate(&board, &money(), &ec, 0).unwrap();
        let second = searcher.evaluate(&board, &money(), &ec, 0).unwrap();
        assert_eq!(first, second);
        assert!(searcher.cache.hits() >= 1);
    }

    #[test]
    fn deeper_search_stays_coherent() {
        let mut fixture = Fixture::new();
        let board = Board::starting_position();
        let ec = EvalContext {
            filters: MOVEFILTER_TINY,
            ..Default::default()
        };

        let mut searcher = fixture.searcher();
        let outputs = searcher.evaluate(&board, &money(), &ec, 1).unwrap();
        assert!(outputs[OUTPUT_WIN] > 0.0 && outputs[OUTPUT_WIN] < 1.0);
        // probability ordering survives the dice expectation
        assert!(outputs[2] <= outputs[1] + 1e-5);
        assert!(outputs[1] <= outputs[0] + 1e-5);
    }

    #[test]
    fn find_best_plays_orders_by_equity() {
        let mut fixture = Fixture::new();
        let board = Board::starting_position();
        let ec = EvalContext::default();

        let mut searcher = fixture.searcher();
        let plays = searcher
            .find_best_plays(&board, Dice(6, 5), &money(), &ec)
            .unwrap();
        assert!(!plays.is_empty());
        for pair in plays.windows(2) {
            assert!(pair[0].equity >= pair[1].equity - 1e-6);
        }
    }

    #[test]
    fn dance_returns_no_plays() {
        let mut fixture = Fixture::new();
        let mut board = Board::empty();
        board.counts_mut(MOVER)[gammon::definitions::BAR] = 2;
        board.counts_mut(MOVER)[12] = 13;
        for point in 0..=gammon::definitions::HOME_TOP {
            board.counts_mut(gammon::definitions::OPPONENT)[point] = 2;
        }

        let mut searcher = fixture.searcher();
        let plays = searcher
            .find_best_plays(&board, Dice(6, 3), &money(), &EvalContext::default())
            .unwrap();
        assert!(plays.is_empty());
    }

    #[test]
    fn race_decisions_are_depth_stable() {
        // pure race evaluated through the one-sided database: deeper search
        // must agree with the static pick
        let mut fixture = Fixture::new();
        fixture.bearoff = BearoffSet::with_one_sided();
        let mut board = Board::empty();
        board.counts_mut(MOVER)[5] = 5;
        board.counts_mut(MOVER)[3] = 5;
        board.counts_mut(MOVER)[1] = 5;
        board.counts_mut(gammon::definitions::OPPONENT)[4] = 7;
        board.counts_mut(gammon::definitions::OPPONENT)[2] = 8;

        let ec = EvalContext::default();
        let mut searcher = fixture.searcher();
        let shallow = searcher
            .find_best_plays(&board, Dice(6, 5), &money(), &ec)
            .unwrap();
        let deep_ec = EvalContext {
            plies: 2,
            ..Default::default()
        };
        let deep = searcher
            .find_best_plays(&board, Dice(6, 5), &money(), &deep_ec)
            .unwrap();

        let best_shallow = format!("{:?}", shallow[0].play.submoves());
        let best_deep = format!("{:?}", deep[0].play.submoves());
        assert_eq!(best_shallow, best_deep);
    }

    #[test]
    fn filter_keeps_the_head_of_the_list() {
        let filter = MoveFilter {
            accept: 0,
            extra: 2,
            threshold: 0.1,
        };
        let mut scored: Vec<(usize, f32)> = vec![(0, 0.9), (1, 0.85), (2, 0.5), (3, 0.4)];
        let keep = filter_count_scores(&filter, &scored);
        assert_eq!(keep, 2);

        scored = vec![(0, 0.9), (1, 0.1)];
        let keep = filter_count_scores(&filter, &scored);
        assert_eq!(keep, 1);

        let keep_all = filter_count_scores(&KEEP_ALL, &scored);
        assert_eq!(keep_all, 2);
    }

    #[test]
    fn digest_distinguishes_contexts() {
        let ci = money();
        let base = EvalContext::default();
        let cubeful = EvalContext {
            cubeful: true,
            ..Default::default()
        };
        assert_ne!(base.digest_at(0, &ci), cubeful.digest_at(0, &ci));
        assert_ne!(base.digest_at(0, &ci), base.digest_at(1, &ci));

        let wide = EvalContext {
            filters: MOVEFILTER_HUGE,
            ..Default::default()
        };
        assert_ne!(base.digest_at(1, &ci), wide.digest_at(1, &ci));

        // the cube state only matters when the cubeful slot is cached
        let doubled = CubeInfo {
            cube: 2,
            owner: 0,
            ..ci
        };
        assert_eq!(base.digest_at(0, &ci), base.digest_at(0, &doubled));
        assert_ne!(cubeful.digest_at(0, &ci), cubeful.digest_at(0, &doubled));
    }

    #[test]
    fn default_cache_size_is_a_power_of_two() {
        assert!(DEFAULT_CACHE_SIZE.is_power_of_two());
    }
}
