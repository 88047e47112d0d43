// src/iw44/decoder.rs

use super::codec::Codec;
use super::coeff_map::CoeffMap;
use super::header::{PrimaryHeader, SecondaryHeader, TertiaryHeader};
use super::transform::{signed_to_unsigned_u8, ycbcr_to_rgb};
use crate::utils::error::{Iw44Error, Result};
use crate::utils::geom::Rect;
use crate::zp::ZpDecoder;
use ::image::{GrayImage, RgbImage};
use log::{debug, info};
use std::io::Cursor;

/// A component is either still receiving slices or frozen.
#[derive(Debug, Clone)]
enum Channel {
    Open(Codec),
    Closed(CoeffMap),
}

impl Channel {
    fn map(&self) -> &CoeffMap {
        match self {
            Channel::Open(codec) => codec.map(),
            Channel::Closed(map) => map,
        }
    }

    fn close(self) -> Self {
        match self {
            Channel::Open(codec) => Channel::Closed(codec.into_map()),
            closed => closed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StreamInfo {
    width: u16,
    height: u16,
    crcb_delay: usize,
    crcb_half: bool,
}

/// Upper bound on the block tables a stream header may ask for.
pub const DEFAULT_MEMORY_LIMIT: usize = 512 << 20;

/// Decoder for a chunked IW44 stream. Chunks must arrive in order; the
/// image can be read back after any of them.
#[derive(Debug)]
pub struct IWDecoder {
    info: Option<StreamInfo>,
    y: Option<Channel>,
    crcb: Option<(Channel, Channel)>,
    cslice: usize,
    cserial: u8,
    memory_limit: usize,
}

impl Default for IWDecoder {
    fn default() -> Self {
        Self::with_memory_limit(DEFAULT_MEMORY_LIMIT)
    }
}

impl IWDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that refuses streams whose coefficient block tables
    /// would take more than `limit` bytes.
    pub fn with_memory_limit(limit: usize) -> Self {
        Self {
            info: None,
            y: None,
            crcb: None,
            cslice: 0,
            cserial: 0,
            memory_limit: limit,
        }
    }

    /// Decodes one chunk and returns the number of slices decoded so far.
    pub fn decode_chunk(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut input = Cursor::new(bytes);
        let primary = PrimaryHeader::read(&mut input)?;
        if primary.serial != self.cserial {
            return Err(Iw44Error::Format(format!(
                "chunk serial {} where {} was expected",
                primary.serial, self.cserial
            )));
        }
        if primary.serial == 0 {
            let secondary = SecondaryHeader::read(&mut input)?;
            let tertiary = TertiaryHeader::read(&mut input)?;
            self.start_stream(secondary, tertiary)?;
        }
        let info = self
            .info
            .ok_or_else(|| Iw44Error::Format("data chunk before the first chunk".to_string()))?;

        let nslices = self.cslice + primary.slices as usize;
        let mut zp = ZpDecoder::new(input)?;
        let Some(Channel::Open(ycodec)) = self.y.as_mut() else {
            return Err(Iw44Error::Logic("decoder was closed".to_string()));
        };
        let mut flag = true;
        while flag && self.cslice < nslices {
            flag = ycodec.code_slice(&mut zp, None)?;
            if let Some((Channel::Open(cb), Channel::Open(cr))) = self.crcb.as_mut() {
                if info.crcb_delay <= self.cslice {
                    flag |= cb.code_slice(&mut zp, None)?;
                    flag |= cr.code_slice(&mut zp, None)?;
                }
            }
            self.cslice += 1;
        }
        self.cserial = self.cserial.wrapping_add(1);
        debug!(
            "decode_chunk: serial {} brings the stream to {} slices",
            primary.serial, self.cslice
        );
        Ok(self.cslice)
    }

    fn start_stream(&mut self, secondary: SecondaryHeader, tertiary: TertiaryHeader) -> Result<()> {
        let (w, h) = (tertiary.width as usize, tertiary.height as usize);
        let channels = if secondary.is_grayscale() { 1 } else { 3 };
        let needed = CoeffMap::table_size(w, h) * channels;
        if needed > self.memory_limit {
            return Err(Iw44Error::Allocation(format!(
                "{w}x{h} stream needs {needed} bytes of block tables, limit is {}",
                self.memory_limit
            )));
        }
        // Minor versions before 2 carry no chroma delay.
        let (crcb_delay, crcb_half) = if secondary.minor >= 2 {
            (tertiary.crcb_delay as usize, tertiary.crcb_half)
        } else {
            (0, false)
        };
        let y = Codec::new(w, h)?;
        let crcb = if secondary.is_grayscale() {
            None
        } else {
            Some((Codec::new(w, h)?, Codec::new(w, h)?))
        };
        self.y = Some(Channel::Open(y));
        self.crcb = crcb.map(|(cb, cr)| (Channel::Open(cb), Channel::Open(cr)));
        self.info = Some(StreamInfo {
            width: tertiary.width,
            height: tertiary.height,
            crcb_delay,
            crcb_half,
        });
        info!(
            "IWDecoder: {}x{} {}, chroma delay {}{}",
            w,
            h,
            if secondary.is_grayscale() { "gray" } else { "color" },
            crcb_delay,
            if crcb_half { " (half)" } else { "" }
        );
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.info.map_or(0, |i| i.width as usize)
    }

    pub fn height(&self) -> usize {
        self.info.map_or(0, |i| i.height as usize)
    }

    pub fn is_color(&self) -> bool {
        self.crcb.is_some()
    }

    /// Slices decoded so far.
    pub fn slices(&self) -> usize {
        self.cslice
    }

    fn ymap(&self) -> Result<&CoeffMap> {
        self.y
            .as_ref()
            .map(Channel::map)
            .ok_or_else(|| Iw44Error::Logic("no chunk has been decoded".to_string()))
    }

    fn full_rect(&self, subsample: usize) -> Rect {
        Rect::from_size(
            self.width().div_ceil(subsample.max(1)),
            self.height().div_ceil(subsample.max(1)),
        )
    }

    pub fn get_gray(&self) -> Result<GrayImage> {
        self.get_gray_region(1, self.full_rect(1))
    }

    /// Luma of `rect`, in the coordinates of the image subsampled by `subsample`.
    pub fn get_gray_region(&self, subsample: usize, rect: Rect) -> Result<GrayImage> {
        let ymap = self.ymap()?;
        let (w, h) = (rect.width().max(0) as usize, rect.height().max(0) as usize);
        let mut buf = vec![0i8; w * h];
        ymap.image_region(subsample, rect, &mut buf, w, 1, false)?;
        let bytes = buf.into_iter().map(signed_to_unsigned_u8).collect();
        GrayImage::from_raw(w as u32, h as u32, bytes)
            .ok_or_else(|| Iw44Error::Logic("gray buffer size mismatch".to_string()))
    }

    pub fn get_rgb(&self) -> Result<RgbImage> {
        self.get_rgb_region(1, self.full_rect(1))
    }

    /// Color pixels of `rect`; grayscale streams come back as gray RGB.
    pub fn get_rgb_region(&self, subsample: usize, rect: Rect) -> Result<RgbImage> {
        let ymap = self.ymap()?;
        let (w, h) = (rect.width().max(0) as usize, rect.height().max(0) as usize);
        let mut ycc = vec![0i8; w * h * 3];
        ymap.image_region(subsample, rect, &mut ycc, w * 3, 3, false)?;
        if let Some((cb, cr)) = &self.crcb {
            let half = self.info.is_some_and(|i| i.crcb_half);
            cb.map().image_region(subsample, rect, &mut ycc[1..], w * 3, 3, half)?;
            cr.map().image_region(subsample, rect, &mut ycc[2..], w * 3, 3, half)?;
        }

        let mut rgb = Vec::with_capacity(w * h * 3);
        let color = self.is_color();
        for px in ycc.chunks_exact(3) {
            if color {
                rgb.extend_from_slice(&ycbcr_to_rgb(px[0], px[1], px[2]));
            } else {
                let g = signed_to_unsigned_u8(px[0]);
                rgb.extend_from_slice(&[g, g, g]);
            }
        }
        RgbImage::from_raw(w as u32, h as u32, rgb)
            .ok_or_else(|| Iw44Error::Logic("rgb buffer size mismatch".to_string()))
    }

    /// Drops the coding state; the decoded coefficients stay readable but
    /// no further chunks are accepted.
    pub fn close_codec(&mut self) {
        self.y = self.y.take().map(Channel::close);
        self.crcb = self.crcb.take().map(|(cb, cr)| (cb.close(), cr.close()));
    }

    pub fn reset(&mut self) {
        *self = Self::with_memory_limit(self.memory_limit);
    }

    pub fn memory_usage(&self) -> usize {
        let channel = |c: &Channel| match c {
            Channel::Open(codec) => std::mem::size_of::<Codec>() + codec.map().memory_usage(),
            Channel::Closed(map) => map.memory_usage(),
        };
        std::mem::size_of::<Self>()
            + self.y.as_ref().map_or(0, channel)
            + self
                .crcb
                .as_ref()
                .map_or(0, |(cb, cr)| channel(cb) + channel(cr))
    }
}
