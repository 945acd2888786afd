//! tansync - self-synchronizing parallel decoder for tANS streams.
//!
//! Tabled ANS is a state-machine entropy coder: decoding symbol `i`
//! requires the exact state and bit position left behind by symbol `i - 1`,
//! which makes a conventional decoder strictly sequential. This crate
//! decodes such streams with multiple threads anyway, by exploiting how
//! quickly tANS state chains re-synchronize:
//!
//! 1. The stream is cut into fixed-size *subsequences* and every worker
//!    decodes its span speculatively from a guessed entry state, recording
//!    a sync point (state, bit offset, unit offset, symbol count) at each
//!    subsequence boundary.
//! 2. Workers whose boundaries disagree with their predecessor re-decode
//!    from the predecessor's sync point until the stored and recomputed
//!    boundaries match - the fixed point at which every boundary in the
//!    grid is correct.
//! 3. A prefix sum over the per-subsequence symbol counts assigns each
//!    worker a disjoint output range, and a final pass writes the symbols
//!    with no cross-thread coordination.
//!
//! The crate also carries the encoder-side collaborators needed to produce
//! such streams: weight quantization ([`SymbolWeights`]), code table
//! construction ([`DecoderTable`], [`EncoderTable`]) and the matching
//! [`encode`] routine. Decoded output is in reverse payload order; callers
//! wanting forward order finish with [`OutputBuffer::reverse`].
//!
//! ```
//! use tansync::{decode, encode, DecoderConfig, DecoderTable, EncoderTable,
//!               OutputBuffer, SymbolWeights};
//!
//! let payload = b"abracadabra".repeat(64);
//! let mut counts = [0u64; 256];
//! for &b in &payload {
//!     counts[b as usize] += 1;
//! }
//! let weights = SymbolWeights::from_counts(&counts, 1024)?;
//! let stream = encode(&payload, &EncoderTable::from_weights(&weights))?;
//!
//! let mut out = OutputBuffer::new(payload.len());
//! let config = DecoderConfig { subsequence_size: 4, num_threads: 2 };
//! decode(&stream, &DecoderTable::from_weights(&weights), &mut out, &config)?;
//! out.reverse();
//! assert_eq!(out.as_slice(), &payload[..]);
//! # Ok::<(), tansync::TansyncError>(())
//! ```

mod intervals;
mod kernel;

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod model;
pub mod output;
pub mod stream;
pub mod table;

pub use decoder::{decode, DecoderConfig};
pub use encoder::encode;
pub use error::{TansyncError, TansyncResult};
pub use model::SymbolWeights;
pub use output::OutputBuffer;
pub use stream::{CompressedStream, State, Symbol, Unit, UNIT_BITS};
pub use table::{DecoderTable, DecoderTableEntry, EncoderTable};
