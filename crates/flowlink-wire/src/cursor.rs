//! Bounded big-endian reader.
//!
//! A [`Cursor`] is a borrowing view over a byte slice with a read position
//! and a `base` offset. `base + pos` is the absolute offset from the start of
//! the enclosing message, which is what OpenFlow's pad-to-8 rules are defined
//! against. Child cursors produced by [`Cursor::subcursor`] carry the
//! absolute offset forward so alignment math inside nested TLVs stays
//! consistent with the outer message.
//!
//! All reads are bounds-checked and fail with [`WireError::Truncated`]; a
//! cursor never reads past the slice it was constructed over, which is how
//! length-bounded parsing is enforced: give a structure a subcursor of
//! exactly its declared length and it cannot consume its neighbor's bytes.

use crate::error::{Result, WireError};

/// Borrowing big-endian reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    /// Cursor over `buf` starting at absolute offset 0.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, base: 0 }
    }

    /// Cursor over `buf` whose first byte sits at absolute offset `base`.
    #[must_use]
    pub fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Absolute offset from the start of the enclosing message.
    #[must_use]
    pub fn absolute(&self) -> usize {
        self.base + self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(WireError::Truncated { needed: n, remaining: self.remaining() });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    /// Read a big-endian `u128`.
    pub fn read_u128(&mut self) -> Result<u128> {
        let b = self.take(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(b);
        Ok(u128::from_be_bytes(arr))
    }

    /// Borrow `n` bytes and advance.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Borrow a fixed-size array and advance.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(b);
        Ok(arr)
    }

    /// Consume and return everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    /// Advance `n` bytes without reading.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Advance to the next multiple of 8 of the absolute offset.
    ///
    /// Tolerates a cursor that ends exactly at the boundary; fails with
    /// `Truncated` only if the padding bytes are genuinely missing.
    pub fn skip_align8(&mut self) -> Result<()> {
        let pad = (8 - self.absolute() % 8) % 8;
        self.skip(pad)
    }

    /// Peek a big-endian `u16` at `offset` bytes past the read position
    /// without advancing.
    pub fn peek_u16(&self, offset: usize) -> Result<u16> {
        let at = self.pos + offset;
        if at + 2 > self.buf.len() {
            return Err(WireError::Truncated { needed: offset + 2, remaining: self.remaining() });
        }
        Ok(u16::from_be_bytes([self.buf[at], self.buf[at + 1]]))
    }

    /// Child cursor over the next `length - rewind` bytes.
    ///
    /// `length` is a structure's declared total length; `rewind` is the part
    /// of it the caller already consumed (typically a 4-byte type/length
    /// header). The child carries the parent's absolute offset so its
    /// alignment math agrees with the enclosing message, and the parent's
    /// position advances past the region in one step.
    pub fn subcursor(&mut self, length: usize, rewind: usize) -> Result<Cursor<'a>> {
        let take = length
            .checked_sub(rewind)
            .ok_or(WireError::Invariant("declared length shorter than its own header"))?;
        let base = self.absolute();
        let bytes = self.take(take)?;
        Ok(Cursor { buf: bytes, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_in_order() {
        let data = [0x01, 0x02, 0x03, 0x00, 0x00, 0x00, 0x00, 0x04];
        let mut cur = Cursor::new(&data);
        assert_eq!(cur.read_u8().unwrap(), 0x01);
        assert_eq!(cur.read_u16().unwrap(), 0x0203);
        cur.skip(4).unwrap();
        assert_eq!(cur.read_u8().unwrap(), 0x04);
        assert!(cur.is_empty());
    }

    #[test]
    fn truncated_read_reports_sizes() {
        let mut cur = Cursor::new(&[0xAA, 0xBB]);
        let err = cur.read_u32().unwrap_err();
        assert_eq!(err, WireError::Truncated { needed: 4, remaining: 2 });
        // Position unchanged by the failed read.
        assert_eq!(cur.read_u16().unwrap(), 0xAABB);
    }

    #[test]
    fn align8_uses_absolute_offset() {
        // Child starting at absolute offset 4 must skip 4 bytes to realign,
        // even though its local position is 0.
        let data = [0u8; 16];
        let mut parent = Cursor::new(&data);
        parent.skip(4).unwrap();
        let mut child = parent.subcursor(12, 0).unwrap();
        assert_eq!(child.absolute(), 4);
        child.skip_align8().unwrap();
        assert_eq!(child.absolute(), 8);
    }

    #[test]
    fn align8_is_noop_on_boundary() {
        let data = [0u8; 8];
        let mut cur = Cursor::new(&data);
        cur.skip_align8().unwrap();
        assert_eq!(cur.remaining(), 8);
    }

    #[test]
    fn subcursor_bounds_child_reads() {
        let data = [0u8; 12];
        let mut parent = Cursor::new(&data);
        let mut child = parent.subcursor(8, 0).unwrap();
        assert_eq!(child.remaining(), 8);
        assert!(child.read_u128().is_err());
        // Parent advanced past the whole region.
        assert_eq!(parent.remaining(), 4);
    }

    #[test]
    fn subcursor_rewind_shrinks_region() {
        let data = [0u8; 12];
        let mut parent = Cursor::new(&data);
        parent.skip(4).unwrap(); // the "already consumed" TLV header
        let child = parent.subcursor(12, 4).unwrap();
        assert_eq!(child.remaining(), 8);
        assert!(parent.is_empty());
    }

    #[test]
    fn subcursor_rejects_undersized_length() {
        let data = [0u8; 4];
        let mut parent = Cursor::new(&data);
        assert_eq!(
            parent.subcursor(2, 4).unwrap_err(),
            WireError::Invariant("declared length shorter than its own header"),
        );
    }
}
