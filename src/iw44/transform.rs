// src/iw44/transform.rs

//! Separable lifting wavelet transform and the YCbCr color transform.
//!
//! One level of the transform at scale `s` works on the grid of samples
//! spaced `s` apart. Each line of that grid is split into even (low-pass)
//! and odd (high-pass) samples by two lifting steps:
//!
//! - predict: `d[k] = x[k] - ((9 (x[k-1] + x[k+1]) - (x[k-3] + x[k+3]) + 8) >> 4)`
//! - update:  `s[k] = x[k] + ((d[k-1] + d[k+1] + 2) >> 2)`
//!
//! Out-of-range neighbours replicate the nearest valid sample of the same
//! parity. All arithmetic on stored samples wraps, so `backward` undoes
//! `forward` exactly.

use std::sync::OnceLock;

#[inline]
fn even_at(line: &[i16], j: isize, last_even: isize) -> i32 {
    line[j.clamp(0, last_even) as usize] as i32
}

#[inline]
fn odd_at(line: &[i16], j: isize, last_odd: isize) -> i32 {
    line[j.clamp(1, last_odd) as usize] as i32
}

#[inline]
fn predict(line: &[i16], k: isize, last_even: isize) -> i16 {
    let a = even_at(line, k - 1, last_even) + even_at(line, k + 1, last_even);
    let b = even_at(line, k - 3, last_even) + even_at(line, k + 3, last_even);
    (((a << 3) + a - b + 8) >> 4) as i16
}

#[inline]
fn update(line: &[i16], k: isize, last_odd: isize) -> i16 {
    let a = odd_at(line, k - 1, last_odd) + odd_at(line, k + 1, last_odd);
    ((a + 2) >> 2) as i16
}

fn parity_bounds(n: usize) -> (isize, isize) {
    let last = n as isize - 1;
    if last % 2 == 0 {
        (last, last - 1)
    } else {
        (last - 1, last)
    }
}

/// One analysis level on a contiguous line.
pub fn lift_forward(line: &mut [i16]) {
    let n = line.len();
    if n < 2 {
        return;
    }
    let (last_even, last_odd) = parity_bounds(n);
    for k in (1..n).step_by(2) {
        let p = predict(line, k as isize, last_even);
        line[k] = line[k].wrapping_sub(p);
    }
    for k in (0..n).step_by(2) {
        let u = update(line, k as isize, last_odd);
        line[k] = line[k].wrapping_add(u);
    }
}

/// One synthesis level on a contiguous line; inverse of [`lift_forward`].
pub fn lift_backward(line: &mut [i16]) {
    let n = line.len();
    if n < 2 {
        return;
    }
    let (last_even, last_odd) = parity_bounds(n);
    for k in (0..n).step_by(2) {
        let u = update(line, k as isize, last_odd);
        line[k] = line[k].wrapping_sub(u);
    }
    for k in (1..n).step_by(2) {
        let p = predict(line, k as isize, last_even);
        line[k] = line[k].wrapping_add(p);
    }
}

fn for_each_row(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize, f: fn(&mut [i16])) {
    let n = (w - 1) / scale + 1;
    let mut line = vec![0i16; n];
    for y in (0..h).step_by(scale) {
        let row = &mut p[y * rowsize..];
        for (k, v) in line.iter_mut().enumerate() {
            *v = row[k * scale];
        }
        f(&mut line);
        for (k, v) in line.iter().enumerate() {
            row[k * scale] = *v;
        }
    }
}

fn for_each_column(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize, f: fn(&mut [i16])) {
    let n = (h - 1) / scale + 1;
    let step = scale * rowsize;
    let mut line = vec![0i16; n];
    for x in (0..w).step_by(scale) {
        for (k, v) in line.iter_mut().enumerate() {
            *v = p[x + k * step];
        }
        f(&mut line);
        for (k, v) in line.iter().enumerate() {
            p[x + k * step] = *v;
        }
    }
}

/// Forward horizontal filter at one scale.
pub fn filter_fh(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize) {
    for_each_row(p, w, h, rowsize, scale, lift_forward);
}

/// Forward vertical filter at one scale.
pub fn filter_fv(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize) {
    for_each_column(p, w, h, rowsize, scale, lift_forward);
}

/// Backward horizontal filter at one scale.
pub fn filter_bh(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize) {
    for_each_row(p, w, h, rowsize, scale, lift_backward);
}

/// Backward vertical filter at one scale.
pub fn filter_bv(p: &mut [i16], w: usize, h: usize, rowsize: usize, scale: usize) {
    for_each_column(p, w, h, rowsize, scale, lift_backward);
}

/// Decomposes `w x h` samples of `p` for `begin <= scale < end`, doubling each time.
pub fn forward(p: &mut [i16], w: usize, h: usize, rowsize: usize, begin: usize, end: usize) {
    if w == 0 || h == 0 {
        return;
    }
    let mut scale = begin;
    while scale < end {
        filter_fh(p, w, h, rowsize, scale);
        filter_fv(p, w, h, rowsize, scale);
        scale <<= 1;
    }
}

/// Reconstructs `w x h` samples of `p` for scales from `begin` down to `end` (exclusive).
pub fn backward(p: &mut [i16], w: usize, h: usize, rowsize: usize, begin: usize, end: usize) {
    if w == 0 || h == 0 {
        return;
    }
    let mut scale = begin >> 1;
    while scale >= end && scale > 0 {
        filter_bv(p, w, h, rowsize, scale);
        filter_bh(p, w, h, rowsize, scale);
        scale >>= 1;
    }
}

// Rows: Y, Cr, Cb
const RGB_TO_YCC: [[f32; 3]; 3] = [
    [0.304348, 0.608696, 0.086956],
    [0.463768, -0.405797, -0.057971],
    [-0.173913, -0.347826, 0.521739],
];

type YccTables = [[[i32; 256]; 3]; 3];

static YCC_TABLES: OnceLock<YccTables> = OnceLock::new();

fn ycc_tables() -> &'static YccTables {
    YCC_TABLES.get_or_init(|| {
        let mut tables = [[[0i32; 256]; 3]; 3];
        for (row, coeffs) in RGB_TO_YCC.iter().enumerate() {
            for (chan, &c) in coeffs.iter().enumerate() {
                for k in 0..256 {
                    tables[row][chan][k] = (k as f32 * 65536.0 * c) as i32;
                }
            }
        }
        tables
    })
}

/// Splits interleaved RGB bytes into signed Y, Cb and Cr planes.
pub fn rgb_to_ycbcr_planes(pixels: &[[u8; 3]], out_y: &mut [i8], out_cb: &mut [i8], out_cr: &mut [i8]) {
    assert_eq!(out_y.len(), pixels.len());
    assert_eq!(out_cb.len(), pixels.len());
    assert_eq!(out_cr.len(), pixels.len());
    let [y_tbl, cr_tbl, cb_tbl] = ycc_tables();

    for (i, &[r, g, b]) in pixels.iter().enumerate() {
        let (r, g, b) = (r as usize, g as usize, b as usize);

        let y = y_tbl[0][r] + y_tbl[1][g] + y_tbl[2][b] + 32768;
        out_y[i] = ((y >> 16) - 128).clamp(-128, 127) as i8;

        let cb = cb_tbl[0][r] + cb_tbl[1][g] + cb_tbl[2][b] + 32768;
        out_cb[i] = (cb >> 16).clamp(-128, 127) as i8;

        let cr = cr_tbl[0][r] + cr_tbl[1][g] + cr_tbl[2][b] + 32768;
        out_cr[i] = (cr >> 16).clamp(-128, 127) as i8;
    }
}

/// Integer inverse of the color transform for one pixel.
#[inline]
pub fn ycbcr_to_rgb(y: i8, cb: i8, cr: i8) -> [u8; 3] {
    let (y, b, r) = (y as i32, cb as i32, cr as i32);
    let t1 = b >> 2;
    let t2 = r + (r >> 1);
    let t3 = y + 128 - t1;
    let tr = y + 128 + t2;
    let tg = t3 - (t2 >> 1);
    let tb = t3 + (b << 1);
    [
        tr.clamp(0, 255) as u8,
        tg.clamp(0, 255) as u8,
        tb.clamp(0, 255) as u8,
    ]
}

#[inline]
pub fn signed_to_unsigned_u8(v: i8) -> u8 {
    (v as i16 + 128) as u8
}

#[inline]
pub fn unsigned_to_signed_i8(v: u8) -> i8 {
    (v as i16 - 128) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> Vec<i16> {
        (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                ((((x * 7 + y * 13) % 256) as i16) - 128) << 6
            })
            .collect()
    }

    #[test]
    fn lifting_round_trips_odd_sizes() {
        for &(w, h) in &[(1, 1), (2, 3), (7, 5), (33, 33), (64, 17)] {
            let original = ramp(w, h);
            let mut data = original.clone();
            forward(&mut data, w, h, w, 1, 32);
            backward(&mut data, w, h, w, 32, 1);
            assert_eq!(data, original, "{w}x{h}");
        }
    }

    #[test]
    fn flat_image_has_no_detail() {
        let (w, h) = (32, 32);
        let mut data = vec![1000i16; w * h];
        forward(&mut data, w, h, w, 1, 32);
        assert_eq!(data[0], 1000);
        assert!(data[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn padded_rows_are_untouched() {
        let (w, h, rowsize) = (10, 4, 16);
        let mut data = vec![7i16; rowsize * h];
        forward(&mut data, w, h, rowsize, 1, 32);
        for y in 0..h {
            assert!(data[y * rowsize + w..(y + 1) * rowsize].iter().all(|&c| c == 7));
        }
    }

    #[test]
    fn gray_pixels_have_neutral_chroma() {
        let pixels = [[0u8, 0, 0], [255, 255, 255], [128, 128, 128]];
        let (mut y, mut cb, mut cr) = ([0i8; 3], [0i8; 3], [0i8; 3]);
        rgb_to_ycbcr_planes(&pixels, &mut y, &mut cb, &mut cr);
        assert_eq!(y[0], -128);
        assert_eq!(y[1], 127);
        for i in 0..3 {
            assert!(cb[i].abs() <= 1 && cr[i].abs() <= 1, "pixel {i}");
        }
    }

    #[test]
    fn color_transform_round_trips_closely() {
        let mut pixels = Vec::new();
        for r in (0..256).step_by(51) {
            for g in (0..256).step_by(51) {
                for b in (0..256).step_by(51) {
                    pixels.push([r as u8, g as u8, b as u8]);
                }
            }
        }
        let n = pixels.len();
        let (mut y, mut cb, mut cr) = (vec![0i8; n], vec![0i8; n], vec![0i8; n]);
        rgb_to_ycbcr_planes(&pixels, &mut y, &mut cb, &mut cr);
        for i in 0..n {
            let back = ycbcr_to_rgb(y[i], cb[i], cr[i]);
            for c in 0..3 {
                let diff = (back[c] as i32 - pixels[i][c] as i32).abs();
                assert!(diff <= 12, "pixel {:?} -> {:?}", pixels[i], back);
            }
        }
    }
}
