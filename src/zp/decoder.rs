use super::table::{DEFAULT_ZP_TABLE, ZpTableEntry};
use super::{BitContext, ZpError};
use std::io::{ErrorKind, Read};

/// Byte synthesized once the underlying stream is exhausted.
const FILL_BYTE: u8 = 0xff;

/// ZP decoder reading from any byte source.
///
/// Reading past the end of the source never fails: the decoder keeps feeding
/// itself [`FILL_BYTE`], so a truncated stream always decodes to completion.
/// Framing is the caller's business.
pub struct ZpDecoder<R: Read> {
    reader: R,
    exhausted: bool,
    a: u32,
    code: u32,
    fence: u32,
    buffer: u32,
    scount: i32,
    table: &'static [ZpTableEntry],
}

impl<R: Read> ZpDecoder<R> {
    pub fn new(reader: R) -> Result<Self, ZpError> {
        let mut dec = Self {
            reader,
            exhausted: false,
            a: 0,
            code: 0,
            fence: 0,
            buffer: 0,
            scount: 0,
            table: &DEFAULT_ZP_TABLE,
        };
        let hi = dec.next_byte()? as u32;
        let lo = dec.next_byte()? as u32;
        dec.code = (hi << 8) | lo;
        dec.preload()?;
        dec.update_fence();
        Ok(dec)
    }

    fn next_byte(&mut self) -> Result<u8, ZpError> {
        if self.exhausted {
            return Ok(FILL_BYTE);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(FILL_BYTE);
                }
                Ok(_) => return Ok(byte[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn preload(&mut self) -> Result<(), ZpError> {
        while self.scount <= 24 {
            let byte = self.next_byte()?;
            self.buffer = (self.buffer << 8) | byte as u32;
            self.scount += 8;
        }
        Ok(())
    }

    #[inline]
    fn update_fence(&mut self) {
        self.fence = self.code.min(0x7fff);
    }

    /// Decodes one bit under the adaptive context `ctx`.
    #[inline]
    pub fn decode(&mut self, ctx: &mut BitContext) -> Result<bool, ZpError> {
        let z = self.a + self.table[*ctx as usize].p as u32;
        if z <= self.fence {
            self.a = z;
            return Ok(*ctx & 1 != 0);
        }
        self.decode_sub(ctx, z)
    }

    /// Decodes one bit written by the pass-through coder.
    #[inline]
    pub fn decode_bit(&mut self) -> Result<bool, ZpError> {
        let z = 0x8000 + (self.a >> 1);
        self.decode_sub_simple(false, z)
    }

    /// Decodes one bit written by the balanced coder.
    #[inline]
    pub fn decode_raw(&mut self) -> Result<bool, ZpError> {
        let z = 0x8000 + ((self.a + self.a + self.a) >> 3);
        self.decode_sub_simple(false, z)
    }

    fn decode_sub(&mut self, ctx: &mut BitContext, mut z: u32) -> Result<bool, ZpError> {
        let mps = *ctx & 1 != 0;
        // Avoid interval reversion
        let d = 0x6000 + ((z + self.a) >> 2);
        if z > d {
            z = d;
        }
        if z > self.code {
            *ctx = self.table[*ctx as usize].dn;
            self.renorm_lps(z)?;
            Ok(!mps)
        } else {
            if self.a >= self.table[*ctx as usize].m as u32 {
                *ctx = self.table[*ctx as usize].up;
            }
            self.renorm_mps(z)?;
            Ok(mps)
        }
    }

    fn decode_sub_simple(&mut self, mps: bool, z: u32) -> Result<bool, ZpError> {
        if z > self.code {
            self.renorm_lps(z)?;
            Ok(!mps)
        } else {
            self.renorm_mps(z)?;
            Ok(mps)
        }
    }

    fn renorm_lps(&mut self, z: u32) -> Result<(), ZpError> {
        let z = 0x10000 - z;
        self.a += z;
        self.code += z;
        // count of leading ones in the 16-bit range register
        let shift = (!(self.a as u16)).leading_zeros() as i32;
        self.scount -= shift;
        self.a = (self.a << shift) & 0xffff;
        let mask = (1u32 << shift) - 1;
        self.code = ((self.code << shift) & 0xffff) | ((self.buffer >> self.scount) & mask);
        if self.scount < 16 {
            self.preload()?;
        }
        self.update_fence();
        Ok(())
    }

    fn renorm_mps(&mut self, z: u32) -> Result<(), ZpError> {
        self.scount -= 1;
        self.a = (z << 1) & 0xffff;
        self.code = ((self.code << 1) & 0xffff) | ((self.buffer >> self.scount) & 1);
        if self.scount < 16 {
            self.preload()?;
        }
        self.update_fence();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zp::ZpEncoder;
    use std::io::Cursor;

    #[test]
    fn single_context_round_trip() {
        let pattern: Vec<bool> = (0..500).map(|i| i % 5 == 0 || i % 11 == 0).collect();
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ctx = 0;
        for &b in &pattern {
            enc.encode(b, &mut ctx).unwrap();
        }
        let data = enc.finish().unwrap();

        let mut dec = ZpDecoder::new(Cursor::new(data)).unwrap();
        let mut ctx = 0;
        let decoded: Vec<bool> = (0..pattern.len()).map(|_| dec.decode(&mut ctx).unwrap()).collect();
        assert_eq!(decoded, pattern);
    }

    #[test]
    fn truncated_stream_still_terminates() {
        let mut enc = ZpEncoder::new(Vec::new());
        for i in 0..4000 {
            enc.encode_raw(i % 3 == 1).unwrap();
        }
        let mut data = enc.finish().unwrap();
        data.truncate(data.len() / 2);

        let mut dec = ZpDecoder::new(Cursor::new(data)).unwrap();
        for _ in 0..8000 {
            dec.decode_raw().unwrap();
        }
    }
}
