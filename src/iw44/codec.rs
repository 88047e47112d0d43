// src/iw44/codec.rs

//! Bit-plane coding of one coefficient map.
//!
//! The same state machine runs on both sides of the stream. The decoder
//! only has its reconstruction; the encoder additionally passes the exact
//! coefficients as `source` and keeps a reconstruction identical to the
//! decoder's, which is what every context and decision is derived from.

use super::coeff_map::CoeffMap;
use super::constants::{
    BAND_BUCKETS, BandBuckets, IW_NORM, IW_QUANT, IW_SHIFT, NUM_BANDS, expand_band_table,
};
use crate::utils::error::Result;
use crate::zp::{BitContext, ZpCoder};
use bitflags::bitflags;
#[cfg(feature = "iw44-trace")]
use log::trace;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CoeffState: u8 {
        const ZERO   = 1 << 0; // Cannot become nonzero at the current threshold
        const ACTIVE = 1 << 1; // Already nonzero, receives refinement bits
        const NEW    = 1 << 2; // Becomes nonzero in this slice
        const UNK    = 1 << 3; // Might become nonzero
    }
}

/// Thresholds at or above this are not representable and skip the slice.
const MAX_THRESHOLD: i32 = 0x8000;

#[derive(Debug, Clone)]
pub struct Codec {
    rec: CoeffMap,
    curband: usize,
    curbit: i32,
    quant_lo: [i32; 16],
    quant_hi: [i32; NUM_BANDS],
    coeff_state: [CoeffState; 256],
    bucket_state: [CoeffState; 16],
    ctx_start: [BitContext; 32],
    ctx_bucket: [[BitContext; 8]; NUM_BANDS],
    ctx_mant: BitContext,
    ctx_root: BitContext,
}

impl Codec {
    /// A codec at the start of the schedule with an all-zero reconstruction.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let (quant_lo, quant_hi) = expand_band_table(&IW_QUANT);
        Ok(Self {
            rec: CoeffMap::new(width, height)?,
            curband: 0,
            curbit: 1,
            quant_lo,
            quant_hi,
            coeff_state: [CoeffState::empty(); 256],
            bucket_state: [CoeffState::empty(); 16],
            ctx_start: [0; 32],
            ctx_bucket: [[0; 8]; NUM_BANDS],
            ctx_mant: 0,
            ctx_root: 0,
        })
    }

    /// Back to the first slice, reusing the block table.
    pub fn restart(&mut self) {
        let (quant_lo, quant_hi) = expand_band_table(&IW_QUANT);
        self.rec.clear();
        self.curband = 0;
        self.curbit = 1;
        self.quant_lo = quant_lo;
        self.quant_hi = quant_hi;
        self.coeff_state = [CoeffState::empty(); 256];
        self.bucket_state = [CoeffState::empty(); 16];
        self.ctx_start = [0; 32];
        self.ctx_bucket = [[0; 8]; NUM_BANDS];
        self.ctx_mant = 0;
        self.ctx_root = 0;
    }

    /// What the decoder holds after the slices coded so far.
    pub fn map(&self) -> &CoeffMap {
        &self.rec
    }

    pub fn into_map(self) -> CoeffMap {
        self.rec
    }

    pub fn curband(&self) -> usize {
        self.curband
    }

    /// Current bit-plane, or -1 once every threshold reached zero.
    pub fn curbit(&self) -> i32 {
        self.curbit
    }

    pub fn quant_hi(&self) -> &[i32; NUM_BANDS] {
        &self.quant_hi
    }

    pub fn quant_lo(&self) -> &[i32; 16] {
        &self.quant_lo
    }

    /// Codes the current (bit-plane, band) slice and advances the schedule.
    /// Returns `false` once the schedule is exhausted.
    pub fn code_slice<C: ZpCoder>(&mut self, zp: &mut C, source: Option<&CoeffMap>) -> Result<bool> {
        if self.curbit < 0 {
            return Ok(false);
        }
        if !self.is_null_slice() {
            let BandBuckets { start, size } = BAND_BUCKETS[self.curband];
            for blockno in 0..self.rec.num_blocks() {
                self.code_buckets(zp, source, blockno, start, size)?;
            }
        }
        #[cfg(feature = "iw44-trace")]
        trace!(
            "slice bit={} band={} quant_hi={}",
            self.curbit,
            self.curband,
            self.quant_hi[self.curband]
        );
        Ok(self.finish_slice())
    }

    fn is_null_slice(&mut self) -> bool {
        if self.curband == 0 {
            let mut is_null = true;
            for (state, &thres) in self.coeff_state[..16].iter_mut().zip(&self.quant_lo) {
                *state = if thres > 0 && thres < MAX_THRESHOLD {
                    is_null = false;
                    CoeffState::UNK
                } else {
                    CoeffState::ZERO
                };
            }
            is_null
        } else {
            let thres = self.quant_hi[self.curband];
            !(thres > 0 && thres < MAX_THRESHOLD)
        }
    }

    fn finish_slice(&mut self) -> bool {
        self.quant_hi[self.curband] >>= 1;
        if self.curband == 0 {
            for q in self.quant_lo.iter_mut() {
                *q >>= 1;
            }
        }
        self.curband += 1;
        if self.curband == NUM_BANDS {
            self.curband = 0;
            self.curbit += 1;
            if self.quant_hi[NUM_BANDS - 1] == 0 {
                self.curbit = -1;
                return false;
            }
        }
        true
    }

    #[inline]
    fn coefficient_state(rec: i16, src: i16, thres: i32) -> CoeffState {
        if rec != 0 {
            CoeffState::ACTIVE
        } else if (src as i32).abs() >= thres {
            CoeffState::UNK | CoeffState::NEW
        } else {
            CoeffState::UNK
        }
    }

    /// Fills the coefficient and bucket states of one block and returns
    /// their union.
    fn prepare(
        &mut self,
        source: Option<&CoeffMap>,
        blockno: usize,
        fbucket: usize,
        nbucket: usize,
    ) -> CoeffState {
        const ZEROS: [i16; 16] = [0; 16];
        let band = self.curband;
        let mut bbstate = CoeffState::empty();
        for buckno in 0..nbucket {
            let rec = self.rec.bucket(blockno, fbucket + buckno).unwrap_or(&ZEROS);
            let src = source
                .and_then(|s| s.bucket(blockno, fbucket + buckno))
                .unwrap_or(&ZEROS);
            let cstate = &mut self.coeff_state[buckno * 16..buckno * 16 + 16];
            let mut bstate = CoeffState::empty();
            for i in 0..16 {
                if band == 0 && cstate[i].contains(CoeffState::ZERO) {
                    continue;
                }
                let thres = if band == 0 { self.quant_lo[i] } else { self.quant_hi[band] };
                cstate[i] = Self::coefficient_state(rec[i], src[i], thres);
                bstate |= cstate[i];
            }
            self.bucket_state[buckno] = bstate;
            bbstate |= bstate;
        }
        bbstate
    }

    /// Context of a bucket bit: how many of the bucket's parents are
    /// already nonzero.
    fn bucket_context(&self, blockno: usize, bucket: usize) -> usize {
        let k = bucket << 2;
        let Some(parents) = self.rec.bucket(blockno, k >> 4) else {
            return 0;
        };
        let p = &parents[k & 15..(k & 15) + 4];
        let mut ctx = p[..3].iter().filter(|&&c| c != 0).count();
        if ctx < 3 && p[3] != 0 {
            ctx += 1;
        }
        ctx
    }

    fn code_buckets<C: ZpCoder>(
        &mut self,
        zp: &mut C,
        source: Option<&CoeffMap>,
        blockno: usize,
        fbucket: usize,
        nbucket: usize,
    ) -> Result<()> {
        let band = self.curband;
        let mut bbstate = self.prepare(source, blockno, fbucket, nbucket);

        // Root bit: does anything in this block become active?
        if nbucket < 16 || bbstate.contains(CoeffState::ACTIVE) {
            bbstate |= CoeffState::NEW;
        } else if bbstate.contains(CoeffState::UNK) {
            let bit = zp.code_bit(bbstate.contains(CoeffState::NEW), &mut self.ctx_root)?;
            bbstate.set(CoeffState::NEW, bit);
        }

        if bbstate.contains(CoeffState::NEW) {
            // Bucket bits
            for buckno in 0..nbucket {
                if !self.bucket_state[buckno].contains(CoeffState::UNK) {
                    continue;
                }
                let mut ctx = if band > 0 {
                    self.bucket_context(blockno, fbucket + buckno)
                } else {
                    0
                };
                if bbstate.contains(CoeffState::ACTIVE) {
                    ctx |= 4;
                }
                let has_new = self.bucket_state[buckno].contains(CoeffState::NEW);
                let bit = zp.code_bit(has_new, &mut self.ctx_bucket[band][ctx])?;
                self.bucket_state[buckno].set(CoeffState::NEW, bit);
            }

            // Newly active coefficients and their signs
            let mut thres = self.quant_hi[band];
            for buckno in 0..nbucket {
                let bstate = self.bucket_state[buckno];
                if !bstate.contains(CoeffState::NEW) {
                    continue;
                }
                let src = source.and_then(|s| s.bucket(blockno, fbucket + buckno));
                let cstate = &mut self.coeff_state[buckno * 16..buckno * 16 + 16];
                let rec = self.rec.bucket_mut(blockno, fbucket + buckno)?;
                let mut gotcha = cstate.iter().filter(|s| s.contains(CoeffState::UNK)).count();
                for i in 0..16 {
                    if !cstate[i].contains(CoeffState::UNK) {
                        continue;
                    }
                    if band == 0 {
                        thres = self.quant_lo[i];
                    }
                    let mut ctx = gotcha.min(7);
                    if bstate.contains(CoeffState::ACTIVE) {
                        ctx |= 8;
                    }
                    let is_new =
                        zp.code_bit(cstate[i].contains(CoeffState::NEW), &mut self.ctx_start[ctx])?;
                    cstate[i].set(CoeffState::NEW, is_new);
                    if is_new {
                        let negative = zp.code_raw(src.is_some_and(|s| s[i] < 0))?;
                        let half = thres >> 1;
                        let mag = (thres + half - (half >> 2)) as i16;
                        rec[i] = if negative { -mag } else { mag };
                        gotcha = 0;
                    } else {
                        gotcha = gotcha.saturating_sub(1);
                    }
                }
            }
        }

        if bbstate.contains(CoeffState::ACTIVE) {
            // Refinement of coefficients that were already active
            let mut thres = self.quant_hi[band];
            for buckno in 0..nbucket {
                if !self.bucket_state[buckno].contains(CoeffState::ACTIVE) {
                    continue;
                }
                let src = source.and_then(|s| s.bucket(blockno, fbucket + buckno));
                let cstate = &self.coeff_state[buckno * 16..buckno * 16 + 16];
                let rec = self.rec.bucket_mut(blockno, fbucket + buckno)?;
                for i in 0..16 {
                    if !cstate[i].contains(CoeffState::ACTIVE) {
                        continue;
                    }
                    if band == 0 {
                        thres = self.quant_lo[i];
                    }
                    let value = rec[i] as i32;
                    let target = src.map_or(0, |s| (s[i] as i32).abs());
                    let mut mag = value.abs();
                    let upper = if mag <= 3 * thres {
                        mag += thres >> 2;
                        zp.code_bit(target >= mag, &mut self.ctx_mant)?
                    } else {
                        zp.code_raw(target >= mag)?
                    };
                    mag += if upper { thres >> 1 } else { (thres >> 1) - thres };
                    let mag = mag.clamp(0, i16::MAX as i32) as i16;
                    rec[i] = if value < 0 { -mag } else { mag };
                }
            }
        }
        Ok(())
    }

    /// Quality of the current reconstruction against `source`, in dB, over
    /// the worst `frac` of blocks.
    pub fn estimate_decibel(&self, source: &CoeffMap, frac: f32) -> f32 {
        let (norm_lo, norm_hi) = expand_band_table(&IW_NORM);
        let block_mse = |blockno: usize| -> f32 {
            let mut mse = 0.0f32;
            for (band, bb) in BAND_BUCKETS.iter().enumerate() {
                for buckno in bb.start..bb.start + bb.size {
                    let Some(src) = source.bucket(blockno, buckno) else {
                        continue;
                    };
                    let rec = self.rec.bucket(blockno, buckno);
                    for i in 0..16 {
                        let norm = if band == 0 { norm_lo[i] } else { norm_hi[band] };
                        let delta = src[i] as f32 - rec.map_or(0.0, |r| r[i] as f32);
                        mse += norm * delta * delta;
                    }
                }
            }
            mse / 1024.0
        };

        let nblocks = self.rec.num_blocks();
        if nblocks == 0 {
            return 99.9;
        }
        #[cfg(feature = "rayon")]
        let mut mse_per_block: Vec<f32> = {
            use rayon::prelude::*;
            (0..nblocks).into_par_iter().map(block_mse).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let mut mse_per_block: Vec<f32> = (0..nblocks).map(block_mse).collect();

        mse_per_block.sort_by(f32::total_cmp);
        let m = nblocks - 1;
        let p = ((m as f32) * (1.0 - frac) + 0.5).floor().clamp(0.0, m as f32) as usize;
        let tail = &mse_per_block[p..];
        let avg_mse = tail.iter().sum::<f32>() / tail.len() as f32;
        if avg_mse <= 0.0 {
            return 99.9;
        }
        let factor = 255.0 * (1 << IW_SHIFT) as f32;
        10.0 * (factor * factor / avg_mse).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zp::{ZpDecoder, ZpEncoder};
    use std::io::Cursor;

    fn gradient_map(w: usize, h: usize) -> CoeffMap {
        let chan: Vec<i8> = (0..w * h)
            .map(|i| (((i % w) * 4 + (i / w) * 2) % 256) as u8 as i8)
            .collect();
        CoeffMap::create_from_signed_channel(&chan, w, h, None).unwrap()
    }

    #[test]
    fn schedule_halves_thresholds_and_terminates() {
        let mut codec = Codec::new(8, 8).unwrap();
        let mut zp = ZpEncoder::new(Vec::new());
        let src = CoeffMap::new(8, 8).unwrap();
        let q0 = *codec.quant_hi();
        let lo0 = *codec.quant_lo();
        assert!(codec.code_slice(&mut zp, Some(&src)).unwrap());
        assert_eq!(codec.curband(), 1);
        assert_eq!(codec.quant_lo()[0], lo0[0] >> 1);
        assert_eq!(codec.quant_hi()[1], q0[1]);
        assert!(codec.code_slice(&mut zp, Some(&src)).unwrap());
        assert_eq!(codec.quant_hi()[1], q0[1] >> 1);

        let mut slices = 2;
        while codec.code_slice(&mut zp, Some(&src)).unwrap() {
            slices += 1;
        }
        assert_eq!(codec.curbit(), -1);
        assert!(codec.quant_hi().iter().all(|&q| q == 0));
        assert!(!codec.code_slice(&mut zp, Some(&src)).unwrap());
        assert_eq!(slices + 1, 200);
    }

    #[test]
    fn encoder_and_decoder_reconstructions_agree() {
        let (w, h) = (48, 40);
        let src = gradient_map(w, h);
        let mut enc = Codec::new(w, h).unwrap();
        let mut zp = ZpEncoder::new(Vec::new());
        for _ in 0..45 {
            enc.code_slice(&mut zp, Some(&src)).unwrap();
        }
        let bytes = zp.finish().unwrap();

        let mut dec = Codec::new(w, h).unwrap();
        let mut zp = ZpDecoder::new(Cursor::new(bytes)).unwrap();
        for _ in 0..45 {
            dec.code_slice(&mut zp, None).unwrap();
        }
        for blockno in 0..src.num_blocks() {
            for buckno in 0..64 {
                assert_eq!(
                    enc.map().bucket(blockno, buckno),
                    dec.map().bucket(blockno, buckno),
                    "block {blockno} bucket {buckno}"
                );
            }
        }
    }

    #[test]
    fn decibels_grow_with_slices() {
        let (w, h) = (64, 64);
        let chan: Vec<i8> = (0..w * h).map(|i| ((i % w + i / w) as i32 * 2 - 128) as i8).collect();
        let src = CoeffMap::create_from_signed_channel(&chan, w, h, None).unwrap();
        let mut codec = Codec::new(w, h).unwrap();
        let mut zp = ZpEncoder::new(Vec::new());
        let mut last = codec.estimate_decibel(&src, 1.0);
        let mut more = true;
        while more {
            for _ in 0..20 {
                more = codec.code_slice(&mut zp, Some(&src)).unwrap();
            }
            let db = codec.estimate_decibel(&src, 1.0);
            assert!(db >= last - 0.01, "{db} < {last}");
            last = db;
        }
        assert!(last > 50.0, "{last}");
    }

    #[test]
    fn empty_source_is_perfect() {
        let src = CoeffMap::new(10, 10).unwrap();
        let codec = Codec::new(10, 10).unwrap();
        assert_eq!(codec.estimate_decibel(&src, 0.35), 99.9);
    }
}
