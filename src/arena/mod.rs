//! Monitored bit arena
//!
//! A contiguous buffer of zero bits. It is only ever replaced wholesale;
//! any one bit found in it was put there by something other than this crate.

use bitvec::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::util::measure;

/// Errors raised while (re)allocating the arena
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Host refused the requested size
    #[error("failed to allocate arena of {bits} bits")]
    Allocation {
        /// Requested length in bits
        bits: u64,
    },
}

/// Zero-initialised bit buffer under observation
#[derive(Debug, Default)]
pub struct BitArena {
    bits: BitVec<usize, Lsb0>,
}

impl BitArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the current buffer and allocate `len_bits` zero bits.
    ///
    /// The old buffer is freed first so the new one can reuse its memory.
    pub fn allocate(&mut self, len_bits: u64) -> Result<(), ArenaError> {
        let gbytes = len_bits as f64 / 8.0 / 1e9;
        info!(
            "update data from {} to {} bits / {:.3} GBytes",
            self.bits.len(),
            len_bits,
            gbytes
        );

        measure("clear", || drop(std::mem::take(&mut self.bits)));

        let len = usize::try_from(len_bits).map_err(|_| ArenaError::Allocation { bits: len_bits })?;
        if len > BitSlice::<usize, Lsb0>::MAX_BITS {
            return Err(ArenaError::Allocation { bits: len_bits });
        }
        let words = len.div_ceil(usize::BITS as usize);

        let mut storage = measure("memalloc", || {
            let mut storage: Vec<usize> = Vec::new();
            storage
                .try_reserve_exact(words)
                .map(|_| storage)
                .map_err(|_| ArenaError::Allocation { bits: len_bits })
        })?;

        // Writing every word commits the pages; untouched zero pages would
        // all alias the same physical frame.
        measure("setall ZERO", || storage.resize(words, 0));

        let mut bits = BitVec::from_vec(storage);
        bits.truncate(len);
        self.bits = bits;
        Ok(())
    }

    /// Index of the first set bit, scanning the whole arena
    pub fn scan(&self) -> Option<usize> {
        let found = measure("search for ONE", || self.bits.first_one());
        if found.is_none() {
            debug!("ONE not found");
        }
        found
    }

    /// Set the bit at `index`, returning false when out of range
    pub fn inject_fault(&mut self, index: usize) -> bool {
        if index >= self.bits.len() {
            return false;
        }
        self.bits.set(index, true);
        true
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether no bits are monitored
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Length in bits as `u64`
    pub fn len_bits(&self) -> u64 {
        self.bits.len() as u64
    }
}
