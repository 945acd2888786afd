//! Compressed stream view: fixed-width units plus the decoder's entry point.
//!
//! A tANS stream is a packed sequence of 32-bit units read forwards by the
//! decoder, starting inside unit 0 at bit `UNIT_BITS - first_bit`. The
//! encoder's terminal state becomes the decoder's entry state.

/// Fixed-width word in which compressed bits are packed.
pub type Unit = u32;

/// Decoder state. Between symbols it lies in `[num_states, 2 * num_states)`.
pub type State = u32;

/// Decoded alphabet symbol.
pub type Symbol = u8;

/// Number of bits in a [`Unit`].
pub const UNIT_BITS: u32 = Unit::BITS;

/// An immutable compressed stream together with the decoder's entry point.
///
/// The unit vector is padded with one trailing unit: the decode kernel reads
/// `units[pos + 1]` while `pos` can equal the last real unit's index. The
/// pad's content never influences the decoded output.
#[derive(Debug, Clone)]
pub struct CompressedStream {
    units: Vec<Unit>,
    num_units: usize,
    first_state: State,
    first_bit: u32,
}

impl CompressedStream {
    /// Wrap raw units and the encoder's terminal `(state, bit)` pair.
    ///
    /// `first_bit` is the number of bits occupying the top of unit 0, in
    /// `[1, UNIT_BITS]`. The trailing pad unit is appended here; callers
    /// hand over only the real units.
    pub fn from_units(mut units: Vec<Unit>, first_state: State, first_bit: u32) -> Self {
        let num_units = units.len();
        units.push(0);
        Self {
            units,
            num_units,
            first_state,
            first_bit,
        }
    }

    /// All units including the trailing pad.
    #[inline]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Number of real (pre-pad) units.
    #[inline]
    pub fn num_units(&self) -> usize {
        self.num_units
    }

    #[inline]
    pub fn first_state(&self) -> State {
        self.first_state
    }

    #[inline]
    pub fn first_bit(&self) -> u32 {
        self.first_bit
    }

    /// Size of the real compressed payload in bytes.
    pub fn compressed_bytes(&self) -> usize {
        self.num_units * std::mem::size_of::<Unit>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_pads_one_unit() {
        let stream = CompressedStream::from_units(vec![0xdead_beef, 0x0123_4567], 9, 32);
        assert_eq!(stream.num_units(), 2);
        assert_eq!(stream.units().len(), 3);
        assert_eq!(stream.units()[2], 0);
        assert_eq!(stream.compressed_bytes(), 8);
    }
}
