//! Bounds-checked little-endian reader.
//!
//! A [`Cursor`] either borrows the caller's buffer or owns a buffer it
//! inflated itself. Sub-cursors over length-delimited blocks keep reporting
//! offsets relative to the region they were cut from, so an error deep inside
//! a room still points at the right byte of the file or inflated region.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{DecodeError, DecodeResult};

/// Width of the count that prefixes a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountWidth {
    /// 16-bit count
    U16,
    /// 32-bit count
    U32,
}

/// Sequential reader over one buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: Cow<'a, [u8]>,
    pos: usize,
    base: usize,
    region: &'static str,
}

impl<'a> Cursor<'a> {
    /// Cursor over a whole file.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::borrowed(data, "file", 0)
    }

    fn borrowed(data: &'a [u8], region: &'static str, base: usize) -> Self {
        Self { data: Cow::Borrowed(data), pos: 0, base, region }
    }

    /// Position within this cursor's buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Position as reported in errors (relative to the enclosing region).
    #[must_use]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Name of the region this cursor reads.
    #[must_use]
    pub fn region(&self) -> &'static str {
        self.region
    }

    /// Length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remaining bytes from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn ensure(&self, n: usize) -> DecodeResult<()> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                region: self.region,
                offset: self.offset(),
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Skip `count` fixed-size records.
    pub fn skip_records(&mut self, count: usize, record_size: usize) -> DecodeResult<()> {
        let n = count.checked_mul(record_size).ok_or_else(|| {
            DecodeError::malformed(self.region, self.offset(), format!("{count} records of {record_size} bytes overflow"))
        })?;
        self.skip(n)
    }

    /// Read `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&[u8]> {
        self.ensure(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a 4-byte tag.
    pub fn read_tag(&mut self) -> DecodeResult<[u8; 4]> {
        self.read_array()
    }

    /// Look at the next 4 bytes without consuming them.
    pub fn peek_tag(&self) -> DecodeResult<[u8; 4]> {
        self.ensure(4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        Ok(out)
    }

    /// Read an unsigned byte.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    /// Read a `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read an `i16`.
    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// Read a `u32`.
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read an `i32`.
    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read a `u64`.
    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read an `i64`.
    pub fn read_i64(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Read an IEEE `f32`.
    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read an IEEE `f64`.
    pub fn read_f64(&mut self) -> DecodeResult<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read `N` consecutive `i16`s.
    pub fn read_i16_array<const N: usize>(&mut self) -> DecodeResult<[i16; N]> {
        let mut out = [0i16; N];
        for v in &mut out {
            *v = self.read_i16()?;
        }
        Ok(out)
    }

    /// Read `N` consecutive `i32`s.
    pub fn read_i32_array<const N: usize>(&mut self) -> DecodeResult<[i32; N]> {
        let mut out = [0i32; N];
        for v in &mut out {
            *v = self.read_i32()?;
        }
        Ok(out)
    }

    /// Read `N` consecutive `f32`s.
    pub fn read_f32_array<const N: usize>(&mut self) -> DecodeResult<[f32; N]> {
        let mut out = [0f32; N];
        for v in &mut out {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a count of the given width.
    pub fn read_count(&mut self, width: CountWidth) -> DecodeResult<usize> {
        Ok(match width {
            CountWidth::U16 => usize::from(self.read_u16()?),
            CountWidth::U32 => self.read_u32()? as usize,
        })
    }

    /// Decode exactly `count` records with `f`.
    pub fn read_n<T>(
        &mut self,
        count: usize,
        mut f: impl FnMut(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<Vec<T>> {
        // Never trust a count for the allocation size.
        let mut out = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// Read a length-prefixed sequence.
    pub fn read_seq<T>(
        &mut self,
        width: CountWidth,
        f: impl FnMut(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<Vec<T>> {
        let count = self.read_count(width)?;
        self.read_n(count, f)
    }

    /// Read a `u32` and fail unless it equals `expected`.
    pub fn expect_u32(&mut self, expected: u32, chunk: &'static str) -> DecodeResult<()> {
        let offset = self.offset();
        let v = self.read_u32()?;
        if v != expected {
            return Err(DecodeError::malformed(chunk, offset, format!("expected {expected:#010x}, found {v:#010x}")));
        }
        Ok(())
    }

    /// Read a `u16` and fail unless it equals `expected`.
    pub fn expect_u16(&mut self, expected: u16, chunk: &'static str) -> DecodeResult<()> {
        let offset = self.offset();
        let v = self.read_u16()?;
        if v != expected {
            return Err(DecodeError::malformed(chunk, offset, format!("expected {expected:#06x}, found {v:#06x}")));
        }
        Ok(())
    }

    /// Read raw bytes and fail unless they equal `expected`.
    pub fn expect_bytes(&mut self, expected: &[u8], chunk: &'static str) -> DecodeResult<()> {
        let offset = self.offset();
        let found = self.read_bytes(expected.len())?;
        if found != expected {
            let reason = format!("expected marker {expected:02x?}, found {found:02x?}");
            return Err(DecodeError::malformed(chunk, offset, reason));
        }
        Ok(())
    }

    /// Cut the next `len` bytes into their own cursor and step over them.
    pub fn sub_cursor(&mut self, len: usize, region: &'static str) -> DecodeResult<Cursor<'_>> {
        self.ensure(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(Cursor::borrowed(&self.data[start..start + len], region, self.base + start))
    }

    /// A fresh cursor starting at `offset` within this buffer.
    ///
    /// Used for blocks that address their parts by offset.
    pub fn at(&self, offset: usize, region: &'static str) -> DecodeResult<Cursor<'_>> {
        if offset > self.data.len() {
            return Err(DecodeError::malformed(
                region,
                self.base + offset,
                format!("offset lies beyond the {} bytes of {}", self.data.len(), self.region),
            ));
        }
        Ok(Cursor::borrowed(&self.data[offset..], region, self.base + offset))
    }

    /// A cursor over `len` bytes starting at `start`, leaving this cursor
    /// where it is.
    ///
    /// Used for blocks whose length comes first but whose contents can only
    /// be decoded once later chunks have been read.
    pub fn window(&self, start: usize, len: usize, region: &'static str) -> DecodeResult<Cursor<'_>> {
        let have = self.data.len().saturating_sub(start);
        if len > have {
            return Err(DecodeError::UnexpectedEof { region: self.region, offset: self.base + start, need: len, have });
        }
        Ok(Cursor::borrowed(&self.data[start..start + len], region, self.base + start))
    }

    /// Fail unless every byte has been consumed.
    pub fn expect_end(&self, chunk: &'static str) -> DecodeResult<()> {
        if self.remaining() != 0 {
            return Err(DecodeError::malformed(
                chunk,
                self.offset(),
                format!("{} unread bytes at end of {}", self.remaining(), self.region),
            ));
        }
        Ok(())
    }

    /// Inflate the next `compressed_len` bytes of zlib data.
    ///
    /// The result must be exactly `uncompressed_len` bytes long. The returned
    /// cursor owns its buffer; its offsets start at zero.
    pub fn inflate(
        &mut self,
        compressed_len: usize,
        uncompressed_len: usize,
        region: &'static str,
    ) -> DecodeResult<Cursor<'static>> {
        let offset = self.offset();
        let packed = self.read_bytes(compressed_len)?;

        let mut out = Vec::with_capacity(uncompressed_len);
        // One extra byte is enough to detect an over-long stream.
        let limit = uncompressed_len as u64 + 1;
        let mut decoder = ZlibDecoder::new(packed).take(limit);
        decoder.read_to_end(&mut out).map_err(|e| DecodeError::DecompressionFailure {
            region,
            offset,
            expected: uncompressed_len,
            actual: out.len(),
            reason: e.to_string(),
        })?;

        if out.len() != uncompressed_len {
            return Err(DecodeError::DecompressionFailure {
                region,
                offset,
                expected: uncompressed_len,
                actual: out.len(),
                reason: "length mismatch".into(),
            });
        }

        tracing::trace!(region, compressed_len, uncompressed_len, "inflated region");
        Ok(Cursor { data: Cow::Owned(out), pos: 0, base: 0, region })
    }
}
