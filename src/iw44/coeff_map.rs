// src/iw44/coeff_map.rs

//! Per-channel coefficient storage.
//!
//! A channel is tiled into 32x32 liftblocks. Each block keeps its 1024
//! coefficients in zigzag order as 64 buckets of 16, so that bucket `b`
//! only holds coefficients of one resolution. Buckets live in an arena
//! owned by the map and are materialized on first write; a bucket that was
//! never written reads as zeros.

use super::constants::{IW_BORDER, IW_ROUND, IW_SHIFT, ZIGZAG_LOC};
use super::masking::{self, Mask};
use super::transform;
use crate::utils::error::{Iw44Error, Result};
use crate::utils::geom::Rect;
use log::debug;

/// Stable handle of a bucket inside a [`BucketArena`].
pub type BucketId = u32;

/// Marks a bucket slot that was never materialized.
const NO_BUCKET: BucketId = BucketId::MAX;

/// Append-only bucket storage. Handles stay valid for the arena's lifetime.
#[derive(Debug, Clone, Default)]
pub struct BucketArena {
    buckets: Vec<[i16; 16]>,
}

impl BucketArena {
    fn alloc(&mut self) -> Result<BucketId> {
        if self.buckets.len() == self.buckets.capacity() {
            let extra = self.buckets.len().max(64);
            self.buckets.try_reserve(extra).map_err(|e| {
                Iw44Error::Allocation(format!("cannot grow bucket arena: {e}"))
            })?;
        }
        let id = BucketId::try_from(self.buckets.len())
            .ok()
            .filter(|&id| id != NO_BUCKET)
            .ok_or_else(|| Iw44Error::Allocation("bucket arena exhausted".to_string()))?;
        self.buckets.push([0; 16]);
        Ok(id)
    }

    #[inline]
    fn get(&self, id: BucketId) -> &[i16; 16] {
        &self.buckets[id as usize]
    }

    #[inline]
    fn get_mut(&mut self, id: BucketId) -> &mut [i16; 16] {
        &mut self.buckets[id as usize]
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn memory_usage(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<[i16; 16]>()
    }
}

/// Bucket table of one 32x32 liftblock.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    buckets: [BucketId; 64],
}

impl Default for Block {
    fn default() -> Self {
        Self { buckets: [NO_BUCKET; 64] }
    }
}

impl Block {
    #[inline]
    pub fn has_bucket(&self, buckno: usize) -> bool {
        self.buckets[buckno] != NO_BUCKET
    }

    #[inline]
    fn bucket_id(&self, buckno: usize) -> Option<BucketId> {
        Some(self.buckets[buckno]).filter(|&id| id != NO_BUCKET)
    }

    fn bucket_ids(&self, from: usize) -> impl Iterator<Item = BucketId> + '_ {
        self.buckets[from..].iter().copied().filter(|&id| id != NO_BUCKET)
    }
}

/// All coefficient blocks of one image component (Y, Cb, or Cr).
#[derive(Debug, Clone)]
pub struct CoeffMap {
    blocks: Vec<Block>,
    arena: BucketArena,
    iw: usize,
    ih: usize,
    bw: usize,
    bh: usize,
}

impl CoeffMap {
    /// An all-zero map for a `width x height` component.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let bw = (width + 31) & !31;
        let bh = (height + 31) & !31;
        let num_blocks = (bw / 32) * (bh / 32);
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(num_blocks).map_err(|e| {
            Iw44Error::Allocation(format!("cannot allocate {num_blocks} blocks for {width}x{height}: {e}"))
        })?;
        blocks.resize(num_blocks, Block::default());
        Ok(CoeffMap {
            blocks,
            arena: BucketArena::default(),
            iw: width,
            ih: height,
            bw,
            bh,
        })
    }

    /// Size of the block table [`CoeffMap::new`] allocates up front.
    pub fn table_size(width: usize, height: usize) -> usize {
        width.div_ceil(32) * height.div_ceil(32) * std::mem::size_of::<Block>()
    }

    pub fn width(&self) -> usize {
        self.iw
    }

    pub fn height(&self) -> usize {
        self.ih
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn blocks_per_row(&self) -> usize {
        self.bw / 32
    }

    #[inline]
    pub fn block(&self, blockno: usize) -> &Block {
        &self.blocks[blockno]
    }

    /// Reads a bucket without materializing it.
    #[inline]
    pub fn bucket(&self, blockno: usize, buckno: usize) -> Option<&[i16; 16]> {
        self.blocks[blockno].bucket_id(buckno).map(|id| self.arena.get(id))
    }

    /// Writable bucket, materialized as zeros on first access.
    #[inline]
    pub fn bucket_mut(&mut self, blockno: usize, buckno: usize) -> Result<&mut [i16; 16]> {
        let id = match self.blocks[blockno].bucket_id(buckno) {
            Some(id) => id,
            None => {
                let id = self.arena.alloc()?;
                self.blocks[blockno].buckets[buckno] = id;
                id
            }
        };
        Ok(self.arena.get_mut(id))
    }

    /// Builds the coefficients of a signed channel (`-128..=127` per pixel).
    /// Masked pixels, if any, are coded as cheaply as possible.
    pub fn create_from_signed_channel(
        data: &[i8],
        width: usize,
        height: usize,
        mask: Option<&Mask>,
    ) -> Result<Self> {
        if data.len() != width * height {
            return Err(Iw44Error::InvalidArg(format!(
                "channel has {} samples, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        if let Some(m) = mask {
            if m.width() != width || m.height() != height {
                return Err(Iw44Error::InvalidArg(format!(
                    "mask is {}x{}, image is {}x{}",
                    m.width(),
                    m.height(),
                    width,
                    height
                )));
            }
        }

        let mut map = Self::new(width, height)?;
        let mut data16 = vec![0i16; map.bw * map.bh];
        for (y, row) in data.chunks_exact(width.max(1)).enumerate().take(height) {
            let dst = &mut data16[y * map.bw..y * map.bw + width];
            for (d, &s) in dst.iter_mut().zip(row) {
                *d = (s as i16) << IW_SHIFT;
            }
        }

        match mask {
            Some(m) if m.count_masked() > 0 => {
                masking::interpolate_mask(&mut data16, map.iw, map.ih, map.bw, m);
                masking::forward_mask(&mut data16, map.iw, map.ih, map.bw, 1, 32, m);
            }
            _ => transform::forward(&mut data16, map.iw, map.ih, map.bw, 1, 32),
        }

        let bpr = map.blocks_per_row();
        let mut liftblock = [0i16; 1024];
        for blockno in 0..map.blocks.len() {
            let (bx, by) = (blockno % bpr, blockno / bpr);
            for row in 0..32 {
                let src = (by * 32 + row) * map.bw + bx * 32;
                liftblock[row * 32..row * 32 + 32].copy_from_slice(&data16[src..src + 32]);
            }
            map.read_liftblock(blockno, &liftblock)?;
        }
        debug!(
            "CoeffMap {}x{}: {} blocks, {} buckets",
            width,
            height,
            map.blocks.len(),
            map.arena.len()
        );
        Ok(map)
    }

    fn read_liftblock(&mut self, blockno: usize, liftblock: &[i16; 1024]) -> Result<()> {
        for buckno in 0..64 {
            let locs = &ZIGZAG_LOC[buckno * 16..buckno * 16 + 16];
            if locs.iter().all(|&loc| liftblock[loc as usize] == 0) {
                continue;
            }
            let bucket = self.bucket_mut(blockno, buckno)?;
            for (c, &loc) in bucket.iter_mut().zip(locs) {
                *c = liftblock[loc as usize];
            }
        }
        Ok(())
    }

    /// Drops every bucket; the map reads as all zeros again.
    pub fn clear(&mut self) {
        self.blocks.fill(Block::default());
        self.arena.buckets.clear();
    }

    /// Zeroes every bucket finer than what `res`-times subsampling keeps.
    /// Buckets stay allocated.
    pub fn slash_res(&mut self, res: usize) {
        let min_bucket = match res {
            0..=1 => return,
            2..=3 => 16,
            4..=7 => 4,
            _ => 1,
        };
        for block in &self.blocks {
            for id in block.bucket_ids(min_bucket) {
                *self.arena.get_mut(id) = [0; 16];
            }
        }
    }

    /// Bytes held by the block table and the bucket arena.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.blocks.capacity() * std::mem::size_of::<Block>()
            + self.arena.memory_usage()
    }

    /// Reconstructs the whole component at full resolution into `out`.
    pub fn image(&self, out: &mut [i8], row_stride: usize, pixel_stride: usize, fast: bool) -> Result<()> {
        self.image_region(1, Rect::from_size(self.iw, self.ih), out, row_stride, pixel_stride, fast)
    }

    /// Reconstructs `rect`, given in the coordinates of the image subsampled
    /// by `subsample` (a power of two up to 32). With `fast`, a full
    /// resolution request skips the finest level and replicates pixels.
    pub fn image_region(
        &self,
        subsample: usize,
        rect: Rect,
        out: &mut [i8],
        row_stride: usize,
        pixel_stride: usize,
        fast: bool,
    ) -> Result<()> {
        if !subsample.is_power_of_two() || subsample > 32 {
            return Err(Iw44Error::InvalidArg(format!(
                "subsample must be a power of two in 1..=32, got {subsample}"
            )));
        }
        let irect = Rect::from_size(self.iw.div_ceil(subsample), self.ih.div_ceil(subsample));
        if rect.is_empty() || !irect.contains_rect(&rect) {
            return Err(Iw44Error::InvalidArg(format!(
                "rect {rect:?} is empty or outside {irect:?}"
            )));
        }
        let (rw, rh) = (rect.width() as usize, rect.height() as usize);
        let needed_len = (rh - 1) * row_stride + (rw - 1) * pixel_stride + 1;
        if out.len() < needed_len {
            return Err(Iw44Error::InvalidArg(format!(
                "output buffer holds {} samples, needs {needed_len}",
                out.len()
            )));
        }

        if fast && subsample == 1 {
            let half = Rect::new(
                rect.xmin / 2,
                rect.ymin / 2,
                (rect.xmax + 1) / 2,
                (rect.ymax + 1) / 2,
            );
            let coarse = self.reconstruct(2, half)?;
            let hw = half.width() as usize;
            for y in 0..rh {
                let sy = ((rect.ymin as usize + y) >> 1) - half.ymin as usize;
                for x in 0..rw {
                    let sx = ((rect.xmin as usize + x) >> 1) - half.xmin as usize;
                    out[y * row_stride + x * pixel_stride] = coarse[sy * hw + sx];
                }
            }
            return Ok(());
        }

        let pixels = self.reconstruct(subsample, rect)?;
        for (y, row) in pixels.chunks_exact(rw).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                out[y * row_stride + x * pixel_stride] = v;
            }
        }
        Ok(())
    }

    /// Runs the inverse transform over just enough of the component to
    /// produce `rect` at `subsample`, returned row-major.
    fn reconstruct(&self, subsample: usize, rect: Rect) -> Result<Vec<i8>> {
        let boxsize = (32 / subsample) as i32;
        let irect = Rect::from_size(self.iw.div_ceil(subsample), self.ih.div_ceil(subsample));
        let align = |r: Rect, step: i32| {
            Rect::new(
                r.xmin - r.xmin.rem_euclid(step),
                r.ymin - r.ymin.rem_euclid(step),
                r.xmax,
                r.ymax,
            )
            .intersect(&irect)
        };

        // Window of each synthesis level, finest first. A level at scale
        // `s` reads its inputs from the window of the level at `2s`.
        let mut levels = Vec::new();
        let mut needed = rect;
        let mut scale = 1;
        while scale < boxsize {
            let r = scale * 2;
            let border = IW_BORDER as i32 * r;
            needed = align(needed.inflate(border, border), r);
            levels.push((scale as usize, needed));
            scale = r;
        }
        let work = align(needed, boxsize);
        let rowsize = work.width() as usize;
        let mut buf = Vec::new();
        buf.try_reserve_exact(rowsize * work.height() as usize)
            .map_err(|e| Iw44Error::Allocation(format!("reconstruction buffer: {e}")))?;
        buf.resize(rowsize * work.height() as usize, 0i16);

        // Gather coefficients lying on the subsampled grid.
        let limit = 1024 / (subsample * subsample);
        let bpr = self.blocks_per_row() as i32;
        for by in work.ymin / boxsize..(work.ymax + boxsize - 1) / boxsize {
            for bx in work.xmin / boxsize..(work.xmax + boxsize - 1) / boxsize {
                let block = &self.blocks[(by * bpr + bx) as usize];
                for buckno in 0..limit.div_ceil(16) {
                    let Some(id) = block.bucket_id(buckno) else { continue };
                    let bucket = self.arena.get(id);
                    for (k, &c) in bucket.iter().enumerate() {
                        let i = buckno * 16 + k;
                        if i >= limit || c == 0 {
                            continue;
                        }
                        let loc = ZIGZAG_LOC[i] as usize;
                        let x = bx * boxsize + (loc % 32 / subsample) as i32;
                        let y = by * boxsize + (loc / 32 / subsample) as i32;
                        if x < work.xmax && y < work.ymax && x >= work.xmin && y >= work.ymin {
                            buf[(y - work.ymin) as usize * rowsize + (x - work.xmin) as usize] = c;
                        }
                    }
                }
            }
        }

        for &(scale, win) in levels.iter().rev() {
            let offset = (win.ymin - work.ymin) as usize * rowsize + (win.xmin - work.xmin) as usize;
            let (ww, wh) = (win.width() as usize, win.height() as usize);
            transform::filter_bv(&mut buf[offset..], ww, wh, rowsize, scale);
            transform::filter_bh(&mut buf[offset..], ww, wh, rowsize, scale);
        }

        let mut pixels = Vec::with_capacity((rect.width() * rect.height()) as usize);
        for y in rect.ymin..rect.ymax {
            let row = (y - work.ymin) as usize * rowsize;
            for x in rect.xmin..rect.xmax {
                let v = buf[row + (x - work.xmin) as usize] as i32;
                pixels.push(((v + IW_ROUND) >> IW_SHIFT).clamp(-128, 127) as i8);
            }
        }
        Ok(pixels)
    }
}
