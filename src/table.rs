//! tANS code tables.
//!
//! Both tables are derived from the same symbol spread over the state range
//! `[num_states, 2 * num_states)`:
//!
//! - the **decoder table** maps each state (indexed by `state - num_states`)
//!   to the emitted symbol, the pre-renormalization successor state, and the
//!   guaranteed minimum number of bits the transition consumes;
//! - the **encoder table** holds, per symbol, the inverse assignment
//!   `C(s, y)`: the state whose decoder entry carries symbol `s` with
//!   successor `y`.
//!
//! The spread uses the classic odd-step interleave; since the step is odd
//! and the table size is a power of two, the walk visits every slot exactly
//! once. Successors are assigned by rank in ascending state order, starting
//! at the symbol's weight, so a symbol of weight `w` owns successors
//! `[w, 2 * w)`.

use crate::model::SymbolWeights;
use crate::stream::{State, Symbol};

/// One decoder transition, indexed by `state - num_states`.
#[derive(Debug, Clone, Copy)]
pub struct DecoderTableEntry {
    pub symbol: Symbol,
    pub min_num_bits: u8,
    pub next_state: State,
}

/// Immutable decode lookup with exactly `num_states` entries.
#[derive(Debug, Clone)]
pub struct DecoderTable {
    num_states: u32,
    entries: Vec<DecoderTableEntry>,
}

impl DecoderTable {
    pub fn from_weights(weights: &SymbolWeights) -> Self {
        let num_states = weights.num_states();
        let spread = spread_symbols(weights);
        let min_bits = min_bits_per_symbol(weights);

        let mut successor = weights.weights().to_vec();
        let mut entries = Vec::with_capacity(num_states as usize);
        for &symbol in &spread {
            let y = successor[symbol as usize];
            successor[symbol as usize] += 1;
            entries.push(DecoderTableEntry {
                symbol,
                min_num_bits: min_bits[symbol as usize],
                next_state: y,
            });
        }

        Self {
            num_states,
            entries,
        }
    }

    #[inline]
    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    #[inline]
    pub fn entries(&self) -> &[DecoderTableEntry] {
        &self.entries
    }
}

/// Per-symbol encode data: weight, minimum bit count, and the inverse
/// state-assignment rows.
#[derive(Debug, Clone)]
pub struct EncoderTable {
    num_states: u32,
    weights: Vec<u32>,
    min_bits: Vec<u8>,
    offsets: Vec<u32>,
    assignments: Vec<State>,
}

impl EncoderTable {
    pub fn from_weights(weights: &SymbolWeights) -> Self {
        let num_states = weights.num_states();
        let spread = spread_symbols(weights);
        let min_bits = min_bits_per_symbol(weights);

        let mut offsets = Vec::with_capacity(weights.weights().len());
        let mut at = 0u32;
        for &w in weights.weights() {
            offsets.push(at);
            at += w;
        }

        let mut rank = vec![0u32; weights.weights().len()];
        let mut assignments = vec![0 as State; num_states as usize];
        for (idx, &symbol) in spread.iter().enumerate() {
            let s = symbol as usize;
            assignments[(offsets[s] + rank[s]) as usize] = num_states + idx as State;
            rank[s] += 1;
        }

        Self {
            num_states,
            weights: weights.weights().to_vec(),
            min_bits,
            offsets,
            assignments,
        }
    }

    #[inline]
    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    /// Weight of `symbol`; zero means the symbol is not modeled.
    #[inline]
    pub fn weight(&self, symbol: Symbol) -> u32 {
        self.weights
            .get(symbol as usize)
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub(crate) fn min_bits(&self, symbol: Symbol) -> u32 {
        self.min_bits[symbol as usize] as u32
    }

    /// The state whose decode entry is `(symbol, y)`.
    #[inline]
    pub(crate) fn assignment(&self, symbol: Symbol, y: State) -> State {
        let s = symbol as usize;
        self.assignments[(self.offsets[s] + (y - self.weights[s])) as usize]
    }
}

/// Assign a symbol to every slot of `[num_states, 2 * num_states)`.
fn spread_symbols(weights: &SymbolWeights) -> Vec<Symbol> {
    let table_size = weights.num_states() as usize;
    let mask = table_size - 1;
    // The step must be odd, hence coprime with the power-of-two table size,
    // so the walk is a full permutation of the slots. The classic value is
    // already odd for every table size except 8 and 2.
    let step = ((table_size >> 1) + (table_size >> 3) + 3) | 1;

    let mut spread = vec![0 as Symbol; table_size];
    let mut pos = 0usize;
    let mut filled = 0usize;

    for (symbol, &w) in weights.weights().iter().enumerate() {
        for _ in 0..w {
            spread[pos] = symbol as Symbol;
            filled += 1;
            pos = (pos + step) & mask;
        }
    }

    debug_assert_eq!(filled, table_size);
    debug_assert_eq!(pos, 0);
    spread
}

/// Guaranteed minimum bits per transition out of a state carrying `symbol`:
/// `log2(num_states) - floor(log2(2 * w - 1))`. Renormalization consumes the
/// remainder one bit at a time.
fn min_bits_per_symbol(weights: &SymbolWeights) -> Vec<u8> {
    let state_bits = weights.state_bits();
    weights
        .weights()
        .iter()
        .map(|&w| {
            if w == 0 {
                0
            } else {
                (state_bits - floor_log2(2 * w - 1)) as u8
            }
        })
        .collect()
}

#[inline]
fn floor_log2(x: u32) -> u32 {
    debug_assert!(x > 0);
    31 - x.leading_zeros()
}
