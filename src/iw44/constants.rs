// src/iw44/constants.rs

//! Constants shared by the IW44 encoder and decoder.

/// Fixed-point shift applied to pixels before the wavelet transform.
pub const IW_SHIFT: i32 = 6;

/// Rounding term matching [`IW_SHIFT`].
pub const IW_ROUND: i32 = 1 << (IW_SHIFT - 1);

/// Filter support, in samples of the coarser level, kept around a region
/// when reconstructing only part of an image.
pub const IW_BORDER: usize = 3;

/// Codec version written in the secondary header.
pub const IWCODEC_MAJOR: u8 = 1;
pub const IWCODEC_MINOR: u8 = 2;

/// Number of subbands in the slice schedule.
pub const NUM_BANDS: usize = 10;

/// Quality estimates closer than this to the target are refreshed every slice.
pub const DECIBEL_PRUNE: f32 = 5.0;

/// First bucket and bucket count of every subband.
#[derive(Debug, Clone, Copy)]
pub struct BandBuckets {
    pub start: usize,
    pub size: usize,
}

pub const BAND_BUCKETS: [BandBuckets; NUM_BANDS] = [
    BandBuckets { start: 0, size: 1 },
    BandBuckets { start: 1, size: 1 },
    BandBuckets { start: 2, size: 1 },
    BandBuckets { start: 3, size: 1 },
    BandBuckets { start: 4, size: 4 },
    BandBuckets { start: 8, size: 4 },
    BandBuckets { start: 12, size: 4 },
    BandBuckets { start: 16, size: 16 },
    BandBuckets { start: 32, size: 16 },
    BandBuckets { start: 48, size: 16 },
];

/// Initial quantization thresholds. The first seven entries expand into the
/// sixteen per-coefficient thresholds of band zero, the last nine are the
/// thresholds of bands 1 through 9.
pub const IW_QUANT: [i32; 16] = [
    0x004000, 0x008000, 0x008000, 0x010000, 0x010000, 0x010000, 0x020000, 0x020000, 0x020000,
    0x040000, 0x040000, 0x040000, 0x080000, 0x040000, 0x040000, 0x080000,
];

/// Energy of the synthesis filters, laid out like [`IW_QUANT`].
pub const IW_NORM: [f32; 16] = [
    2.627989e+03,
    1.832381e+02, 1.832381e+02, 5.984539e+01,
    2.389280e+01, 2.389280e+01, 8.171700e+00,
    6.138870e+00, 6.138870e+00, 2.072030e+00,
    1.540170e+00, 1.540170e+00, 5.197500e-01,
    4.004700e-01, 4.004700e-01, 1.302600e-01,
];

/// Expands a 16-entry table laid out like [`IW_QUANT`] into the per-coefficient
/// band-zero table and the per-band table.
pub fn expand_band_table<T: Copy + Default>(src: &[T; 16]) -> ([T; 16], [T; NUM_BANDS]) {
    let mut lo = [T::default(); 16];
    let mut hi = [T::default(); NUM_BANDS];
    lo[..4].copy_from_slice(&src[..4]);
    for i in 4..8 {
        lo[i] = src[4];
    }
    for i in 8..12 {
        lo[i] = src[5];
    }
    for i in 12..16 {
        lo[i] = src[6];
    }
    hi[1..].copy_from_slice(&src[7..]);
    (lo, hi)
}

const fn build_zigzag() -> [u16; 1024] {
    let mut loc = [0u16; 1024];
    let mut i = 0;
    while i < 1024 {
        let mut x = 0;
        let mut y = 0;
        let mut k = 0;
        while k < 5 {
            if (i >> (2 * k)) & 1 != 0 {
                x |= 1 << (4 - k);
            }
            if (i >> (2 * k + 1)) & 1 != 0 {
                y |= 1 << (4 - k);
            }
            k += 1;
        }
        loc[i] = (y * 32 + x) as u16;
        i += 1;
    }
    loc
}

/// Maps the zigzag index of a coefficient to its position in a 32x32 liftblock.
/// Coarse coefficients come first, so each bucket of 16 holds one resolution.
pub static ZIGZAG_LOC: [u16; 1024] = build_zigzag();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_reference_values() {
        let expected_first_16 = [
            0, 16, 512, 528, 8, 24, 520, 536, 256, 272, 768, 784, 264, 280, 776, 792,
        ];
        assert_eq!(&ZIGZAG_LOC[..16], &expected_first_16);
    }

    #[test]
    fn test_zigzag_is_a_permutation() {
        let mut seen = [false; 1024];
        for &loc in ZIGZAG_LOC.iter() {
            assert!(!seen[loc as usize], "duplicate location {loc}");
            seen[loc as usize] = true;
        }
    }

    #[test]
    fn test_band_table_expansion() {
        let (lo, hi) = expand_band_table(&IW_QUANT);
        assert_eq!(lo[..4], IW_QUANT[..4]);
        assert!(lo[4..8].iter().all(|&q| q == IW_QUANT[4]));
        assert!(lo[12..].iter().all(|&q| q == IW_QUANT[6]));
        assert_eq!(hi[0], 0);
        assert_eq!(hi[1..], IW_QUANT[7..]);
        let covered: usize = BAND_BUCKETS.iter().map(|b| b.size).sum();
        assert_eq!(covered, 64);
    }
}
