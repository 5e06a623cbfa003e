//! A growable array of single-bit flags.
//!
//! The engine uses this to track which retarded-field history slots have
//! shifted in the current epoch. Reads past the end return `false`; writes
//! past the end grow the backing storage.

use std::fmt;

/// A compact bit array backed by `u32` words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitset {
    data: Vec<u32>,
}

impl Bitset {
    /// Create a bitset with room for at least `n` bits.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            data: vec![0; n.div_ceil(32)],
        }
    }

    /// The number of bit slots currently backed by storage.
    pub fn cap(&self) -> usize {
        self.data.len() * 32
    }

    /// Read bit `i`. Out-of-range bits read as zero.
    pub fn get(&self, i: usize) -> bool {
        let (w, n) = (i / 32, i % 32);
        match self.data.get(w) {
            Some(word) => word & (1 << n) != 0,
            None => false,
        }
    }

    /// Set bit `i` to one, growing if needed.
    pub fn set(&mut self, i: usize) {
        let (w, n) = (i / 32, i % 32);
        self.grow_to(w + 1);
        self.data[w] |= 1 << n;
    }

    /// Set bit `i` to zero, growing if needed.
    pub fn clear(&mut self, i: usize) {
        let (w, n) = (i / 32, i % 32);
        self.grow_to(w + 1);
        self.data[w] &= !(1 << n);
    }

    /// Toggle bit `i` and return its previous value.
    pub fn flip(&mut self, i: usize) -> bool {
        let (w, n) = (i / 32, i % 32);
        self.grow_to(w + 1);
        let old = self.data[w] & (1 << n) != 0;
        self.data[w] ^= 1 << n;
        old
    }

    /// Little-endian byte encoding of the backing words.
    pub fn bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.data.len() * 4);
        for w in &self.data {
            buf.extend_from_slice(&w.to_le_bytes());
        }
        buf
    }

    fn grow_to(&mut self, words: usize) {
        if self.data.len() < words {
            self.data.resize(words, 0);
        }
    }
}

impl fmt::Display for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bitset:")?;
        for w in &self.data {
            for j in 0..32 {
                f.write_str(if w & (1 << j) == 0 { "0" } else { "1" })?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
