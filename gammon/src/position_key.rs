/*
 * position_key.rs
 * Part of the byte-gammon project
 * Created Date: Wednesday, March 5th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jun 18 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use crate::board::Board;
use crate::definitions::{BOARD_SLOTS, NUM_SIDES};

/// Number of 32-bit words in a position key.
pub const KEY_WORDS: usize = 7;

/// Canonical 28-byte encoding of a [`Board`].
///
/// For side 0 then side 1, for each of the 25 count slots, the key stream
/// holds one `1` bit per chequer followed by a `0` terminator bit. A legal
/// position uses at most 80 bits (30 chequer bits, 50 terminators); the rest
/// of the 224 bits stay zero. Equal boards produce byte-identical keys.
///
/// Word 0 of a legal key can never be all ones (that would need a run of 32
/// chequers on one slot), so [`PositionKey::EMPTY`] is usable as a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    data: [u32; KEY_WORDS],
}

impl PositionKey {
    /// Sentinel key that no legal board encodes to.
    pub const EMPTY: PositionKey = PositionKey {
        data: [u32::MAX, 0, 0, 0, 0, 0, 0],
    };

    /// Encodes a board into its canonical key.
    pub fn from_board(board: &Board) -> Self {
        let mut data = [0u32; KEY_WORDS];
        let mut bit = 0usize;
        for side in 0..NUM_SIDES {
            for slot in 0..BOARD_SLOTS {
                for _ in 0..board.counts(side)[slot] {
                    data[bit >> 5] |= 1 << (bit & 31);
                    bit += 1;
                }
                bit += 1; // terminator
            }
        }
        PositionKey { data }
    }

    /// Decodes the key back into a board. Inverse of [`from_board`] for any
    /// legal position.
    ///
    /// [`from_board`]: PositionKey::from_board
    pub fn to_board(&self) -> Board {
        let mut board = Board::empty();
        let mut bit = 0usize;
        for side in 0..NUM_SIDES {
            for slot in 0..BOARD_SLOTS {
                let mut count = 0u8;
                while self.data[bit >> 5] & (1 << (bit & 31)) != 0 {
                    count += 1;
                    bit += 1;
                }
                bit += 1; // skip the terminator
                board.counts_mut(side)[slot] = count;
            }
        }
        board
    }

    pub fn words(&self) -> &[u32; KEY_WORDS] {
        &self.data
    }

    /// MurmurHash3-style mix over the eval-context seed and the seven key
    /// words, with the standard finalizer. Deterministic across platforms;
    /// the caller masks the result down to its bucket count.
    pub fn hash(&self, seed: u32) -> u32 {
        let mut hash = seed;

        hash = hash.wrapping_mul(0xcc9e_2d51);
        hash = hash.rotate_left(15);
        hash = hash.wrapping_mul(0x1b87_3593);

        hash = hash.rotate_left(13);
        hash = hash.wrapping_mul(5).wrapping_add(0xe654_6b64);

        for &word in &self.data {
            let mut k = word;
            k = k.wrapping_mul(0xcc9e_2d51);
            k = k.rotate_left(15);
            k = k.wrapping_mul(0x1b87_3593);

            hash ^= k;
            hash = hash.rotate_left(13);
            hash = hash.wrapping_mul(5).wrapping_add(0xe654_6b64);
        }

        // The block length is constant, so it is not mixed in.
        hash ^= hash >> 16;
        hash = hash.wrapping_mul(0x85eb_ca6b);
        hash ^= hash >> 13;
        hash = hash.wrapping_mul(0xc2b2_ae35);
        hash ^= hash >> 16;

        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{BAR, MOVER, OPPONENT};

    #[test]
    fn round_trip_starting_position() {
        let board = Board::starting_position();
        let key = PositionKey::from_board(&board);
        assert_eq!(key.to_board(), board);
    }

    #[test]
    fn round_trip_assorted_positions() {
        let mut board = Board::empty();
        board.counts_mut(MOVER)[0] = 15;
        board.counts_mut(OPPONENT)[BAR] = 2;
        board.counts_mut(OPPONENT)[17] = 13;
        let key = PositionKey::from_board(&board);
        assert_eq!(key.to_board(), board);

        let mut board = Board::empty();
        board.counts_mut(MOVER)[BAR] = 15;
        board.counts_mut(OPPONENT)[0] = 1;
        let key = PositionKey::from_board(&board);
        assert_eq!(key.to_board(), board);
    }

    #[test]
    fn equal_boards_equal_keys() {
        let a = PositionKey::from_board(&Board::starting_position());
        let b = PositionKey::from_board(&Board::starting_position());
        assert_eq!(a, b);

        let mut other = Board::starting_position();
        other.counts_mut(MOVER)[5] -= 1;
        other.counts_mut(MOVER)[3] += 1;
        assert_ne!(PositionKey::from_board(&other), a);
    }

    #[test]
    fn sentinel_differs_from_legal_keys() {
        let board = Board::starting_position();
        assert_ne!(PositionKey::from_board(&board), PositionKey::EMPTY);
        let empty = Board::empty();
        assert_ne!(PositionKey::from_board(&empty), PositionKey::EMPTY);
    }

    #[test]
    fn hash_depends_on_seed_and_board() {
        let key = PositionKey::from_board(&Board::starting_position());
        assert_ne!(key.hash(0), key.hash(1));

        let mut other = Board::starting_position();
        other.counts_mut(MOVER)[5] -= 1;
        other.counts_mut(MOVER)[4] += 1;
        let other_key = PositionKey::from_board(&other);
        assert_ne!(key.hash(0), other_key.hash(0));
    }
}
