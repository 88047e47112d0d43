// src/iw44/masking.rs

//! Encoder-side masking: pixels covered by a bilevel mask are treated as
//! "don't care" so that they cost almost nothing to code.

use super::transform;
use ::image::GrayImage;
use bitvec::prelude::*;

/// Alternating passes per scale in [`forward_mask`].
const MASK_ITERATIONS: usize = 4;

/// Bilevel mask. A set bit marks a pixel whose value does not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: BitVec,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: bitvec![0; width * height],
        }
    }

    /// Any nonzero pixel is masked.
    pub fn from_gray(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let mut mask = Self::new(w as usize, h as usize);
        for (i, p) in img.as_raw().iter().enumerate() {
            mask.bits.set(i, *p != 0);
        }
        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, masked: bool) {
        self.bits.set(y * self.width + x, masked);
    }

    pub fn count_masked(&self) -> usize {
        self.bits.count_ones()
    }
}

/// Replaces every masked pixel with the average of the visible pixels in the
/// smallest enclosing power-of-two box that has any. A fully masked image
/// becomes zero.
pub fn interpolate_mask(data: &mut [i16], w: usize, h: usize, rowsize: usize, mask: &Mask) {
    let mut pending = mask.count_masked();
    if pending == 0 {
        return;
    }
    let mut filled = bitvec![0; w * h];
    let mut scale = 2;
    while pending > 0 && scale < 2 * w.max(h).max(1) {
        for by in (0..h).step_by(scale) {
            for bx in (0..w).step_by(scale) {
                let (ye, xe) = ((by + scale).min(h), (bx + scale).min(w));
                let mut sum = 0i32;
                let mut count = 0i32;
                for y in by..ye {
                    for x in bx..xe {
                        if !mask.get(x, y) {
                            sum += data[y * rowsize + x] as i32;
                            count += 1;
                        }
                    }
                }
                if count == 0 {
                    continue;
                }
                let avg = ((sum + count / 2).div_euclid(count)) as i16;
                for y in by..ye {
                    for x in bx..xe {
                        if mask.get(x, y) && !filled[y * w + x] {
                            data[y * rowsize + x] = avg;
                            filled.set(y * w + x, true);
                            pending -= 1;
                        }
                    }
                }
            }
        }
        scale <<= 1;
    }
    if pending > 0 {
        for y in 0..h {
            for x in 0..w {
                if mask.get(x, y) && !filled[y * w + x] {
                    data[y * rowsize + x] = 0;
                }
            }
        }
    }
}

fn clear_masked_details(data: &mut [i16], smask: &BitSlice, w: usize, h: usize, rowsize: usize, scale: usize) {
    let s2 = scale << 1;
    for y in (0..h).step_by(scale) {
        for x in (0..w).step_by(scale) {
            let i = y * rowsize + x;
            if (x % s2 != 0 || y % s2 != 0) && smask[i] {
                data[i] = 0;
            }
        }
    }
}

/// Wavelet decomposition that cancels the detail coefficients of masked
/// pixels at every scale while keeping visible pixels reconstructible.
pub fn forward_mask(
    data: &mut [i16],
    w: usize,
    h: usize,
    rowsize: usize,
    begin: usize,
    end: usize,
    mask: &Mask,
) {
    if w == 0 || h == 0 {
        return;
    }
    let mut smask = bitvec![0; rowsize * h];
    for y in 0..h {
        for x in 0..w {
            smask.set(y * rowsize + x, mask.get(x, y));
        }
    }

    let mut scale = begin;
    while scale < end {
        let level_input = data.to_vec();
        for _ in 0..MASK_ITERATIONS {
            transform::filter_fh(data, w, h, rowsize, scale);
            transform::filter_fv(data, w, h, rowsize, scale);
            clear_masked_details(data, &smask, w, h, rowsize, scale);
            transform::filter_bv(data, w, h, rowsize, scale);
            transform::filter_bh(data, w, h, rowsize, scale);
            for y in (0..h).step_by(scale) {
                for x in (0..w).step_by(scale) {
                    let i = y * rowsize + x;
                    if !smask[i] {
                        data[i] = level_input[i];
                    }
                }
            }
        }
        transform::filter_fh(data, w, h, rowsize, scale);
        transform::filter_fv(data, w, h, rowsize, scale);
        clear_masked_details(data, &smask, w, h, rowsize, scale);

        // A coarse sample stays masked only if everything it summarizes is.
        let s2 = scale << 1;
        for y in (0..h).step_by(s2) {
            for x in (0..w).step_by(s2) {
                let mut all = true;
                for (dx, dy) in [(0, 0), (scale, 0), (0, scale), (scale, scale)] {
                    if x + dx < w && y + dy < h && !smask[(y + dy) * rowsize + x + dx] {
                        all = false;
                    }
                }
                smask.set(y * rowsize + x, all);
            }
        }
        scale = s2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_uses_visible_neighbours() {
        let (w, h) = (4, 4);
        let mut data = vec![100i16; w * h];
        let mut mask = Mask::new(w, h);
        mask.set(1, 1, true);
        data[w + 1] = -5000;
        interpolate_mask(&mut data, w, h, w, &mask);
        assert_eq!(data[w + 1], 100);
    }

    #[test]
    fn fully_masked_image_becomes_flat_zero() {
        let (w, h) = (8, 8);
        let mut data: Vec<i16> = (0..64).map(|i| i * 10).collect();
        let img = GrayImage::from_pixel(w as u32, h as u32, ::image::Luma([255]));
        let mask = Mask::from_gray(&img);
        assert_eq!(mask.count_masked(), 64);
        interpolate_mask(&mut data, w, h, w, &mask);
        forward_mask(&mut data, w, h, w, 1, 32, &mask);
        assert!(data.iter().all(|&c| c == 0));
    }

    #[test]
    fn empty_mask_matches_plain_transform() {
        let (w, h) = (20, 13);
        let original: Vec<i16> = (0..w * h).map(|i| ((i * 37 % 251) as i16 - 120) << 6).collect();
        let mut plain = original.clone();
        transform::forward(&mut plain, w, h, w, 1, 32);
        let mut masked = original;
        forward_mask(&mut masked, w, h, w, 1, 32, &Mask::new(w, h));
        assert_eq!(plain, masked);
    }

    #[test]
    fn masked_half_has_no_fine_detail() {
        let (w, h) = (32, 32);
        let mut data: Vec<i16> = (0..w * h)
            .map(|i| if (i % w) >= 16 { ((i * 97 % 200) as i16 - 100) << 6 } else { 0 })
            .collect();
        let mut mask = Mask::new(w, h);
        for y in 0..h {
            for x in 16..w {
                mask.set(x, y, true);
            }
        }
        interpolate_mask(&mut data, w, h, w, &mask);
        forward_mask(&mut data, w, h, w, 1, 32, &mask);
        for y in 0..h {
            for x in 17..w {
                if x % 2 == 1 || y % 2 == 1 {
                    assert_eq!(data[y * w + x], 0, "({x},{y})");
                }
            }
        }
    }
}
