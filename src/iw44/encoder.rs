// src/iw44/encoder.rs

use super::codec::Codec;
use super::coeff_map::CoeffMap;
use super::constants::DECIBEL_PRUNE;
use super::header::{PrimaryHeader, SecondaryHeader, TertiaryHeader};
use super::masking::Mask;
use super::transform::{rgb_to_ycbcr_planes, unsigned_to_signed_i8};
use crate::utils::error::{Iw44Error, Result};
use crate::zp::ZpEncoder;
use ::image::{GrayImage, RgbImage};
use log::{debug, info};

/// How chroma is coded for color images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrcbMode {
    /// Luma only; the stream is marked grayscale.
    None,
    /// Half-resolution chroma, delayed by 10 slices.
    Half,
    /// Full-resolution chroma, delayed by 10 slices.
    #[default]
    Normal,
    /// Full-resolution chroma from the first slice.
    Full,
}

impl CrcbMode {
    /// Luma-only slices before chroma starts, or `None` without chroma.
    fn delay(self) -> Option<u8> {
        match self {
            CrcbMode::None => None,
            CrcbMode::Half | CrcbMode::Normal => Some(10),
            CrcbMode::Full => Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EncoderParams {
    pub crcb_mode: CrcbMode,
    /// Fraction of worst blocks averaged by the quality estimate.
    pub db_frac: f32,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            crcb_mode: CrcbMode::Normal,
            db_frac: 0.35,
        }
    }
}

/// When to stop a chunk. All targets count from the start of the stream;
/// the chunk ends as soon as one of them is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChunkLimits {
    pub slices: Option<usize>,
    pub bytes: Option<usize>,
    pub decibels: Option<f32>,
}

impl ChunkLimits {
    pub fn slices(n: usize) -> Self {
        Self { slices: Some(n), ..Self::default() }
    }

    pub fn bytes(n: usize) -> Self {
        Self { bytes: Some(n), ..Self::default() }
    }

    pub fn decibels(db: f32) -> Self {
        Self { decibels: Some(db), ..Self::default() }
    }

    fn is_unbounded(&self) -> bool {
        self.slices.is_none() && self.bytes.is_none() && self.decibels.is_none()
    }
}

/// Source coefficients and coding state of one color component.
#[derive(Debug, Clone)]
struct Channel {
    source: CoeffMap,
    codec: Codec,
}

impl Channel {
    fn new(source: CoeffMap) -> Result<Self> {
        let codec = Codec::new(source.width(), source.height())?;
        Ok(Self { source, codec })
    }

    fn code_slice(&mut self, zp: &mut ZpEncoder<Vec<u8>>) -> Result<bool> {
        self.codec.code_slice(zp, Some(&self.source))
    }

    fn memory_usage(&self) -> usize {
        self.source.memory_usage() + self.codec.map().memory_usage()
    }
}

/// Progressive IW44 encoder producing one chunk per [`IWEncoder::encode_chunk`] call.
#[derive(Debug)]
pub struct IWEncoder {
    y: Channel,
    crcb: Option<(Channel, Channel)>,
    params: EncoderParams,
    width: u16,
    height: u16,
    cslice: usize,
    cserial: u8,
    cbytes: usize,
}

fn check_dimensions(width: u32, height: u32, mask: Option<&GrayImage>) -> Result<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(Iw44Error::InvalidArg("image is empty".to_string()));
    }
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(Iw44Error::InvalidArg(format!(
            "image {width}x{height} exceeds 65535 pixels per side"
        )));
    };
    if let Some(m) = mask {
        if m.dimensions() != (width, height) {
            return Err(Iw44Error::InvalidArg(format!(
                "mask is {}x{}, image is {width}x{height}",
                m.width(),
                m.height()
            )));
        }
    }
    Ok((w, h))
}

impl IWEncoder {
    pub fn from_gray(img: &GrayImage, mask: Option<&GrayImage>, params: EncoderParams) -> Result<Self> {
        let (width, height) = check_dimensions(img.width(), img.height(), mask)?;
        let mask = mask.map(Mask::from_gray);
        let signed: Vec<i8> = img.as_raw().iter().map(|&p| unsigned_to_signed_i8(p)).collect();
        let ymap = CoeffMap::create_from_signed_channel(
            &signed,
            width as usize,
            height as usize,
            mask.as_ref(),
        )?;
        info!("IWEncoder::from_gray {}x{}", width, height);
        Self::with_channels(ymap, None, params, width, height)
    }

    pub fn from_rgb(img: &RgbImage, mask: Option<&GrayImage>, params: EncoderParams) -> Result<Self> {
        let (width, height) = check_dimensions(img.width(), img.height(), mask)?;
        let (w, h) = (width as usize, height as usize);
        let mask = mask.map(Mask::from_gray);

        let pixels: &[[u8; 3]] = bytemuck::cast_slice(img.as_raw());
        let mut y_buf = vec![0i8; w * h];
        let mut cb_buf = vec![0i8; w * h];
        let mut cr_buf = vec![0i8; w * h];
        rgb_to_ycbcr_planes(pixels, &mut y_buf, &mut cb_buf, &mut cr_buf);

        let ymap = CoeffMap::create_from_signed_channel(&y_buf, w, h, mask.as_ref())?;
        let crcb = match params.crcb_mode {
            CrcbMode::None => None,
            mode => {
                let mut cbmap = CoeffMap::create_from_signed_channel(&cb_buf, w, h, mask.as_ref())?;
                let mut crmap = CoeffMap::create_from_signed_channel(&cr_buf, w, h, mask.as_ref())?;
                if mode == CrcbMode::Half {
                    cbmap.slash_res(2);
                    crmap.slash_res(2);
                }
                Some((cbmap, crmap))
            }
        };
        info!(
            "IWEncoder::from_rgb {}x{} chroma {:?}",
            width, height, params.crcb_mode
        );
        Self::with_channels(ymap, crcb, params, width, height)
    }

    fn with_channels(
        ymap: CoeffMap,
        crcb: Option<(CoeffMap, CoeffMap)>,
        params: EncoderParams,
        width: u16,
        height: u16,
    ) -> Result<Self> {
        let crcb = match crcb {
            Some((cb, cr)) => Some((Channel::new(cb)?, Channel::new(cr)?)),
            None => None,
        };
        Ok(Self {
            y: Channel::new(ymap)?,
            crcb,
            params,
            width,
            height,
            cslice: 0,
            cserial: 0,
            cbytes: 0,
        })
    }

    pub fn is_color(&self) -> bool {
        self.crcb.is_some()
    }

    /// Slices emitted so far.
    pub fn slices(&self) -> usize {
        self.cslice
    }

    fn crcb_delay(&self) -> Option<usize> {
        self.crcb.as_ref()?;
        self.params.crcb_mode.delay().map(usize::from)
    }

    fn is_finished(&self) -> bool {
        let done = |c: &Channel| c.codec.curbit() < 0;
        done(&self.y) && self.crcb.as_ref().is_none_or(|(cb, cr)| done(cb) && done(cr))
    }

    /// Codes slices until one of `limits` is reached and returns the chunk
    /// together with whether more slices remain. The chunk is empty when
    /// nothing was left to code.
    pub fn encode_chunk(&mut self, limits: &ChunkLimits) -> Result<(Vec<u8>, bool)> {
        if limits.is_unbounded() {
            return Err(Iw44Error::Logic(
                "at least one of slices, bytes or decibels must be set".to_string(),
            ));
        }
        if self.is_finished() {
            return Ok((Vec::new(), false));
        }

        let header_size = PrimaryHeader::SIZE
            + if self.cserial == 0 {
                SecondaryHeader::SIZE + TertiaryHeader::SIZE
            } else {
                0
            };
        let crcb_delay = self.crcb_delay();
        let mut zp = ZpEncoder::new(Vec::new());
        let mut nslices = 0usize;
        let mut estdb = -1.0f32;
        let mut flag = true;
        while flag {
            if limits.decibels.is_some_and(|db| estdb >= db) {
                break;
            }
            if limits
                .bytes
                .is_some_and(|b| self.cbytes + header_size + zp.tell_bytes() >= b)
            {
                break;
            }
            if limits.slices.is_some_and(|s| self.cslice + nslices >= s) {
                break;
            }
            if nslices == usize::from(u8::MAX) {
                break;
            }

            flag = self.y.code_slice(&mut zp)?;
            if let Some(db) = limits.decibels {
                if flag && (self.y.codec.curband() == 0 || estdb >= db - DECIBEL_PRUNE) {
                    estdb = self.y.codec.estimate_decibel(&self.y.source, self.params.db_frac);
                }
            }
            if let (Some((cb, cr)), Some(delay)) = (self.crcb.as_mut(), crcb_delay) {
                if self.cslice + nslices >= delay {
                    flag |= cb.code_slice(&mut zp)?;
                    flag |= cr.code_slice(&mut zp)?;
                }
            }
            nslices += 1;
        }

        if nslices == 0 {
            debug!("encode_chunk: limits already reached at slice {}", self.cslice);
            return Ok((Vec::new(), !self.is_finished()));
        }

        let data = zp.finish()?;
        let serial = self.cserial;
        let mut chunk = Vec::with_capacity(header_size + data.len());
        PrimaryHeader {
            serial,
            slices: nslices as u8,
        }
        .write(&mut chunk)?;
        if serial == 0 {
            SecondaryHeader::new(!self.is_color()).write(&mut chunk)?;
            TertiaryHeader {
                width: self.width,
                height: self.height,
                crcb_delay: crcb_delay.unwrap_or(0) as u8,
                crcb_half: self.params.crcb_mode == CrcbMode::Half,
            }
            .write(&mut chunk)?;
        }
        chunk.extend_from_slice(&data);

        self.cslice += nslices;
        self.cserial = self.cserial.wrapping_add(1);
        self.cbytes += chunk.len();
        debug!(
            "encode_chunk: serial {} with {} slices, {} bytes (estimate {:.2} dB)",
            serial,
            nslices,
            chunk.len(),
            estdb
        );
        Ok((chunk, flag))
    }

    /// Restarts the stream; the source coefficients are kept.
    pub fn reset(&mut self) {
        let restart = |c: &mut Channel| c.codec.restart();
        restart(&mut self.y);
        if let Some((cb, cr)) = self.crcb.as_mut() {
            restart(cb);
            restart(cr);
        }
        self.cslice = 0;
        self.cserial = 0;
        self.cbytes = 0;
    }

    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.y.memory_usage()
            + self
                .crcb
                .as_ref()
                .map_or(0, |(cb, cr)| cb.memory_usage() + cr.memory_usage())
    }
}
