//! The ZP-coder: an adaptive binary arithmetic coder.
//!
//! Encoder and decoder share one adaptation table and the same notion of a
//! [`BitContext`]. The bit-plane codec is written once against [`ZpCoder`],
//! which both directions implement: an encoder consumes the bit it is given,
//! a decoder ignores it and produces the decoded one.

pub mod decoder;
pub mod encoder;
pub mod table;

pub use decoder::ZpDecoder;
pub use encoder::ZpEncoder;

use thiserror::Error;

/// A single byte holding the adaptive state of one recurring binary decision.
pub type BitContext = u8;

#[derive(Error, Debug)]
pub enum ZpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoder already finished")]
    Finished,
}

/// One coding direction of the ZP-coder.
pub trait ZpCoder {
    /// Codes one bit under an adaptive context and returns the coded value.
    fn code_bit(&mut self, bit: bool, ctx: &mut BitContext) -> Result<bool, ZpError>;

    /// Codes one bit with the context-free pass-through coder.
    fn code_passthrough(&mut self, bit: bool) -> Result<bool, ZpError>;

    /// Codes one bit with the context-free balanced coder.
    fn code_raw(&mut self, bit: bool) -> Result<bool, ZpError>;
}

impl<W: std::io::Write> ZpCoder for ZpEncoder<W> {
    #[inline]
    fn code_bit(&mut self, bit: bool, ctx: &mut BitContext) -> Result<bool, ZpError> {
        self.encode(bit, ctx)?;
        Ok(bit)
    }

    #[inline]
    fn code_passthrough(&mut self, bit: bool) -> Result<bool, ZpError> {
        self.encode_bit(bit)?;
        Ok(bit)
    }

    #[inline]
    fn code_raw(&mut self, bit: bool) -> Result<bool, ZpError> {
        self.encode_raw(bit)?;
        Ok(bit)
    }
}

impl<R: std::io::Read> ZpCoder for ZpDecoder<R> {
    #[inline]
    fn code_bit(&mut self, _bit: bool, ctx: &mut BitContext) -> Result<bool, ZpError> {
        self.decode(ctx)
    }

    #[inline]
    fn code_passthrough(&mut self, _bit: bool) -> Result<bool, ZpError> {
        self.decode_bit()
    }

    #[inline]
    fn code_raw(&mut self, _bit: bool) -> Result<bool, ZpError> {
        self.decode_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Deterministic pseudo-random bits with a tunable bias.
    fn biased_bits(n: usize, one_in: u32, seed: u32) -> Vec<bool> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) % one_in == 0
            })
            .collect()
    }

    #[test]
    fn contexts_stay_in_lockstep() {
        let bits = biased_bits(4000, 5, 7);
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ectx: BitContext = 0;
        let mut trace = Vec::with_capacity(bits.len());
        for &b in &bits {
            enc.encode(b, &mut ectx).unwrap();
            trace.push(ectx);
        }
        let data = enc.finish().unwrap();

        let mut dec = ZpDecoder::new(Cursor::new(data)).unwrap();
        let mut dctx: BitContext = 0;
        for (i, &b) in bits.iter().enumerate() {
            assert_eq!(dec.decode(&mut dctx).unwrap(), b, "bit {i}");
            assert_eq!(dctx, trace[i], "context after bit {i}");
        }
    }

    #[test]
    fn mixed_adaptive_and_raw_bits_round_trip() {
        let bits = biased_bits(3000, 3, 99);
        let raw = biased_bits(3000, 2, 4242);
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ctxs = [0 as BitContext; 4];
        for i in 0..bits.len() {
            enc.code_bit(bits[i], &mut ctxs[i % 4]).unwrap();
            enc.code_raw(raw[i]).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = ZpDecoder::new(Cursor::new(data)).unwrap();
        let mut dctxs = [0 as BitContext; 4];
        for i in 0..bits.len() {
            assert_eq!(dec.code_bit(false, &mut dctxs[i % 4]).unwrap(), bits[i]);
            assert_eq!(dec.code_raw(false).unwrap(), raw[i]);
        }
        assert_eq!(ctxs, dctxs);
    }

    #[test]
    fn pass_through_and_balanced_bits_interleave() {
        let bits = biased_bits(2500, 4, 31);
        let plain = biased_bits(2500, 2, 8);
        let balanced = biased_bits(2500, 3, 77);
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ctx: BitContext = 0;
        for i in 0..bits.len() {
            enc.code_passthrough(plain[i]).unwrap();
            enc.code_bit(bits[i], &mut ctx).unwrap();
            enc.code_raw(balanced[i]).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = ZpDecoder::new(Cursor::new(data)).unwrap();
        let mut dctx: BitContext = 0;
        for i in 0..bits.len() {
            assert_eq!(dec.code_passthrough(false).unwrap(), plain[i], "pass-through {i}");
            assert_eq!(dec.code_bit(false, &mut dctx).unwrap(), bits[i], "adaptive {i}");
            assert_eq!(dec.code_raw(false).unwrap(), balanced[i], "balanced {i}");
        }
        assert_eq!(ctx, dctx);
    }

    #[test]
    fn skewed_stream_compresses() {
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ctx: BitContext = 0;
        for _ in 0..10_000 {
            enc.encode(false, &mut ctx).unwrap();
        }
        let data = enc.finish().unwrap();
        assert!(data.len() < 64, "got {} bytes", data.len());
    }

    #[test]
    fn decoder_reads_past_the_end() {
        let mut dec = ZpDecoder::new(Cursor::new(Vec::<u8>::new())).unwrap();
        let mut ctx: BitContext = 0;
        for _ in 0..10_000 {
            dec.decode(&mut ctx).unwrap();
            dec.decode_raw().unwrap();
            dec.decode_bit().unwrap();
        }
    }
}
