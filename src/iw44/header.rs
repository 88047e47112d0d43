// src/iw44/header.rs

//! Chunk headers.
//!
//! Every chunk starts with a [`PrimaryHeader`]. The first chunk of a stream
//! (serial 0) continues with a [`SecondaryHeader`] and a [`TertiaryHeader`].

use super::constants::{IWCODEC_MAJOR, IWCODEC_MINOR};
use crate::utils::error::{Iw44Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Set in the major version of grayscale streams.
const GRAY_FLAG: u8 = 0x80;
/// Set in `crcbdelay` when chroma is coded at full resolution.
const FULL_CHROMA_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub serial: u8,
    pub slices: u8,
}

impl PrimaryHeader {
    pub const SIZE: usize = 2;

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u8(self.serial)?;
        out.write_u8(self.slices)?;
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        Ok(Self {
            serial: input.read_u8()?,
            slices: input.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryHeader {
    pub major: u8,
    pub minor: u8,
}

impl SecondaryHeader {
    pub const SIZE: usize = 2;

    pub fn new(grayscale: bool) -> Self {
        Self {
            major: IWCODEC_MAJOR | if grayscale { GRAY_FLAG } else { 0 },
            minor: IWCODEC_MINOR,
        }
    }

    pub fn is_grayscale(&self) -> bool {
        self.major & GRAY_FLAG != 0
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u8(self.major)?;
        out.write_u8(self.minor)?;
        Ok(())
    }

    /// Reads the version and rejects streams this codec cannot decode.
    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        let header = Self {
            major: input.read_u8()?,
            minor: input.read_u8()?,
        };
        if header.major & 0x7f != IWCODEC_MAJOR {
            return Err(Iw44Error::Format(format!(
                "incompatible codec major version {}",
                header.major & 0x7f
            )));
        }
        if header.minor > IWCODEC_MINOR {
            return Err(Iw44Error::Format(format!(
                "codec minor version {} is newer than {}",
                header.minor, IWCODEC_MINOR
            )));
        }
        Ok(header)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TertiaryHeader {
    pub width: u16,
    pub height: u16,
    /// Luma-only slices coded before chroma starts.
    pub crcb_delay: u8,
    pub crcb_half: bool,
}

impl TertiaryHeader {
    pub const SIZE: usize = 5;

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_u16::<BigEndian>(self.width)?;
        out.write_u16::<BigEndian>(self.height)?;
        let flag = if self.crcb_half { 0 } else { FULL_CHROMA_FLAG };
        out.write_u8(flag | (self.crcb_delay & 0x7f))?;
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        let width = input.read_u16::<BigEndian>()?;
        let height = input.read_u16::<BigEndian>()?;
        let crcbdelay = input.read_u8()?;
        if width == 0 || height == 0 {
            return Err(Iw44Error::Format(format!("empty image {width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            crcb_delay: crcbdelay & 0x7f,
            crcb_half: crcbdelay & FULL_CHROMA_FLAG == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn first_chunk_header_layout() {
        let mut out = Vec::new();
        PrimaryHeader { serial: 0, slices: 74 }.write(&mut out).unwrap();
        SecondaryHeader::new(true).write(&mut out).unwrap();
        TertiaryHeader {
            width: 300,
            height: 2,
            crcb_delay: 10,
            crcb_half: false,
        }
        .write(&mut out)
        .unwrap();
        assert_eq!(out, [0, 74, 0x81, 2, 0x01, 0x2c, 0, 2, 0x8a]);

        let mut input = Cursor::new(&out);
        assert_eq!(PrimaryHeader::read(&mut input).unwrap().slices, 74);
        assert!(SecondaryHeader::read(&mut input).unwrap().is_grayscale());
        let tertiary = TertiaryHeader::read(&mut input).unwrap();
        assert_eq!((tertiary.width, tertiary.crcb_delay, tertiary.crcb_half), (300, 10, false));
    }

    #[test]
    fn rejects_unsupported_versions() {
        assert!(matches!(
            SecondaryHeader::read(&mut Cursor::new([1u8, 3])),
            Err(Iw44Error::Format(_))
        ));
        assert!(matches!(
            SecondaryHeader::read(&mut Cursor::new([2u8, 2])),
            Err(Iw44Error::Format(_))
        ));
        assert!(SecondaryHeader::read(&mut Cursor::new([1u8, 1])).is_ok());
    }

    #[test]
    fn rejects_empty_dimensions_and_short_input() {
        assert!(matches!(
            TertiaryHeader::read(&mut Cursor::new([0u8, 0, 0, 5, 0])),
            Err(Iw44Error::Format(_))
        ));
        assert!(matches!(
            PrimaryHeader::read(&mut Cursor::new([0u8])),
            Err(Iw44Error::Io(_))
        ));
    }
}
