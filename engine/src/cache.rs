/*
 * cache.rs
 * Part of the byte-gammon project
 * Created Date: Tuesday, March 25th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Thu Jun 26 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use gammon::position_key::PositionKey;

use crate::defs::{EvalOutputs, NUM_EVAL_OUTPUTS};

/// One cached evaluation: the canonical position key, the eval-context
/// digest it was computed under and the six outputs (five probabilities
/// plus the cubeful slot).
#[derive(Clone, Copy, Debug)]
pub struct CacheNodeDetail {
    pub key: PositionKey,
    pub eval_context: u32,
    pub outputs: EvalOutputs,
}

impl CacheNodeDetail {
    fn empty() -> Self {
        CacheNodeDetail {
            key: PositionKey::EMPTY,
            eval_context: 0,
            outputs: [0.0; NUM_EVAL_OUTPUTS],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CacheNode {
    primary: CacheNodeDetail,
    secondary: CacheNodeDetail,
}

/// Result of a cache probe: either the cached outputs, or the bucket index
/// to pass back to [`EvalCache::insert`] once the evaluation is done.
pub enum CacheLookup {
    Hit(EvalOutputs),
    Miss(u32),
}

/// Direct-mapped evaluation cache with two slots per bucket.
///
/// A hit in the secondary slot promotes the entry to primary, so each
/// bucket approximates LRU-of-two; inserts push the primary down to the
/// secondary slot. Nothing is ever evicted individually — entries are only
/// overwritten, or wiped wholesale by [`flush`] and [`resize`].
///
/// [`flush`]: EvalCache::flush
/// [`resize`]: EvalCache::resize
#[derive(Debug)]
pub struct EvalCache {
    entries: Vec<CacheNode>,
    size: u32,
    hash_mask: u32,
    lookups: u64,
    hits: u64,
}

impl EvalCache {
    /// Creates a cache holding `size` entries, rounded up to a power of
    /// two. Each bucket stores two entries.
    pub fn new(size: u32) -> Self {
        let size = size.next_power_of_two().max(2);
        let buckets = (size / 2) as usize;
        let node = CacheNode {
            primary: CacheNodeDetail::empty(),
            secondary: CacheNodeDetail::empty(),
        };
        EvalCache {
            entries: vec![node; buckets],
            size,
            hash_mask: size / 2 - 1,
            lookups: 0,
            hits: 0,
        }
    }

    /// Probes the bucket for `(key, ctx)`. On a secondary-slot match the
    /// entry is promoted to the primary slot first.
    pub fn lookup(&mut self, key: &PositionKey, ctx: u32) -> CacheLookup {
        self.lookups += 1;
        let index = (key.hash(ctx) & self.hash_mask) as usize;
        let node = &mut self.entries[index];

        if node.primary.key != *key || node.primary.eval_context != ctx {
            if node.secondary.key != *key || node.secondary.eval_context != ctx {
                return CacheLookup::Miss(index as u32);
            }
            // found in the second slot, promote the hot entry
            std::mem::swap(&mut node.primary, &mut node.secondary);
        }

        self.hits += 1;
        CacheLookup::Hit(node.primary.outputs)
    }

    /// Writes a fresh entry into the bucket returned by a miss. The old
    /// primary becomes the secondary.
    pub fn insert(&mut self, bucket: u32, detail: CacheNodeDetail) {
        let node = &mut self.entries[bucket as usize];
        node.secondary = node.primary;
        node.primary = detail;
    }

    /// Marks every slot empty.
    pub fn flush(&mut self) {
        for node in self.entries.iter_mut() {
            node.primary.key = PositionKey::EMPTY;
            node.secondary.key = PositionKey::EMPTY;
        }
        self.lookups = 0;
        self.hits = 0;
    }

    /// Rebuilds the cache if the rounded size differs from the current one;
    /// all contents are discarded.
    pub fn resize(&mut self, size: u32) {
        let rounded = size.next_power_of_two().max(2);
        if rounded != self.size {
            *self = EvalCache::new(rounded);
        }
    }

    /// Number of entries (twice the bucket count).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}
