use super::table::{DEFAULT_ZP_TABLE, ZpTableEntry};
use super::{BitContext, ZpError};
use std::io::Write;

/// ZP encoder writing to any byte sink.
pub struct ZpEncoder<W: Write> {
    writer: Option<W>,
    a: u32,      // range register
    subend: u32, // subrange end
    buffer: u32, // 24-bit carry buffer for zemit
    nrun: u32,   // pending run of undecided bits
    byte: u8,    // output byte being built
    scount: u8,  // bits in `byte`
    delay: u8,   // leading bits still to suppress
    written: usize,
    table: &'static [ZpTableEntry],
    finished: bool,
}

impl<W: Write> ZpEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            a: 0,
            subend: 0,
            buffer: 0xffffff,
            nrun: 0,
            byte: 0,
            scount: 0,
            delay: 25,
            written: 0,
            table: &DEFAULT_ZP_TABLE,
            finished: false,
        }
    }

    /// Encodes `bit` under the adaptive context `ctx`.
    #[inline]
    pub fn encode(&mut self, bit: bool, ctx: &mut BitContext) -> Result<(), ZpError> {
        if self.finished {
            return Err(ZpError::Finished);
        }
        let z = self.a + self.table[*ctx as usize].p as u32;
        if bit != (*ctx & 1 != 0) {
            self.encode_lps(ctx, z)
        } else if z >= 0x8000 {
            self.encode_mps(ctx, z)
        } else {
            self.a = z;
            Ok(())
        }
    }

    /// Encodes `bit` with the context-free pass-through coder: both values
    /// split the interval evenly.
    #[inline]
    pub fn encode_bit(&mut self, bit: bool) -> Result<(), ZpError> {
        if self.finished {
            return Err(ZpError::Finished);
        }
        let z = 0x8000 + (self.a >> 1);
        if bit {
            self.encode_lps_simple(z)
        } else {
            self.encode_mps_simple(z)
        }
    }

    /// Encodes `bit` with the balanced coder used for signs and low mantissa bits.
    #[inline]
    pub fn encode_raw(&mut self, bit: bool) -> Result<(), ZpError> {
        if self.finished {
            return Err(ZpError::Finished);
        }
        let z = 0x8000 + ((self.a + self.a + self.a) >> 3);
        if bit {
            self.encode_lps_simple(z)
        } else {
            self.encode_mps_simple(z)
        }
    }

    /// Number of bytes emitted so far.
    pub fn tell_bytes(&self) -> usize {
        self.written
    }

    fn encode_lps(&mut self, ctx: &mut BitContext, mut z: u32) -> Result<(), ZpError> {
        // Avoid interval reversion
        let d = 0x6000 + ((z + self.a) >> 2);
        if z > d {
            z = d;
        }
        *ctx = self.table[*ctx as usize].dn;
        self.encode_lps_simple(z)
    }

    fn encode_mps(&mut self, ctx: &mut BitContext, mut z: u32) -> Result<(), ZpError> {
        let d = 0x6000 + ((z + self.a) >> 2);
        if z > d {
            z = d;
        }
        if self.a >= self.table[*ctx as usize].m as u32 {
            *ctx = self.table[*ctx as usize].up;
        }
        self.encode_mps_simple(z)
    }

    fn encode_lps_simple(&mut self, z: u32) -> Result<(), ZpError> {
        let z = 0x10000 - z;
        self.subend += z;
        self.a += z;
        while self.a >= 0x8000 {
            self.zemit(1 - (self.subend >> 15) as i32)?;
            self.subend = (self.subend << 1) & 0xffff;
            self.a = (self.a << 1) & 0xffff;
        }
        Ok(())
    }

    fn encode_mps_simple(&mut self, z: u32) -> Result<(), ZpError> {
        self.a = z;
        if self.a >= 0x8000 {
            self.zemit(1 - (self.subend >> 15) as i32)?;
            self.subend = (self.subend << 1) & 0xffff;
            self.a = (self.a << 1) & 0xffff;
        }
        Ok(())
    }

    /// Pushes one bit through the 24-bit carry buffer.
    fn zemit(&mut self, b: i32) -> Result<(), ZpError> {
        self.buffer = (self.buffer << 1).wrapping_add(b as u32);
        let out = self.buffer >> 24;
        self.buffer &= 0xffffff;

        match out {
            1 => {
                self.outbit(1)?;
                while self.nrun > 0 {
                    self.outbit(0)?;
                    self.nrun -= 1;
                }
            }
            0xff => {
                self.outbit(0)?;
                while self.nrun > 0 {
                    self.outbit(1)?;
                    self.nrun -= 1;
                }
            }
            0 => self.nrun += 1,
            _ => unreachable!("carry buffer can only yield 0, 1 or 0xff"),
        }
        Ok(())
    }

    fn outbit(&mut self, bit: u8) -> Result<(), ZpError> {
        if self.delay > 0 {
            // delay == 0xff suspends emission forever
            if self.delay < 0xff {
                self.delay -= 1;
            }
            return Ok(());
        }
        self.byte = (self.byte << 1) | bit;
        self.scount += 1;
        if self.scount == 8 {
            if let Some(writer) = self.writer.as_mut() {
                writer.write_all(&[self.byte])?;
                self.written += 1;
            }
            self.scount = 0;
            self.byte = 0;
        }
        Ok(())
    }

    fn eflush(&mut self) -> Result<(), ZpError> {
        if self.subend > 0x8000 {
            self.subend = 0x10000;
        } else if self.subend > 0 {
            self.subend = 0x8000;
        }
        while self.buffer != 0xffffff || self.subend != 0 {
            self.zemit(1 - (self.subend >> 15) as i32)?;
            self.subend = (self.subend << 1) & 0xffff;
        }
        self.outbit(1)?;
        while self.nrun > 0 {
            self.outbit(0)?;
            self.nrun -= 1;
        }
        while self.scount > 0 {
            self.outbit(1)?;
        }
        self.delay = 0xff;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Terminates the stream and returns the writer.
    pub fn finish(mut self) -> Result<W, ZpError> {
        if !self.finished {
            self.eflush()?;
            self.finished = true;
        }
        self.writer.take().ok_or(ZpError::Finished)
    }
}

impl<W: Write> Drop for ZpEncoder<W> {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            let _ = self.eflush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_is_short() {
        let enc = ZpEncoder::new(Vec::new());
        let data = enc.finish().unwrap();
        assert!(data.len() <= 2, "got {:?}", data);
    }

    #[test]
    fn pass_through_bits_cost_about_one_bit_each() {
        let mut enc = ZpEncoder::new(Vec::new());
        for i in 0..8000u32 {
            enc.encode_bit(i.wrapping_mul(2_654_435_761) >> 31 == 1).unwrap();
        }
        let data = enc.finish().unwrap();
        assert!((900..=1100).contains(&data.len()), "got {} bytes", data.len());
    }

    #[test]
    fn finished_encoder_counts_bytes() {
        let mut enc = ZpEncoder::new(Vec::new());
        let mut ctx = 0;
        for i in 0..2000 {
            enc.encode(i % 3 == 0, &mut ctx).unwrap();
            enc.encode_raw(i % 7 == 0).unwrap();
            enc.encode_bit(i % 5 == 0).unwrap();
        }
        let before = enc.tell_bytes();
        let data = enc.finish().unwrap();
        assert!(before > 0);
        assert!(data.len() >= before);
    }
}
