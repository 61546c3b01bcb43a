use crate::error::{Error, Result};

/// Read cursor over a byte slice. All reads are little-endian.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a 4-byte tag (container magic or chunk FourCC).
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        let mut tag = [0u8; 4];
        tag.copy_from_slice(bytes);
        Ok(tag)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `count` consecutive u32 words.
    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>> {
        let need = count.checked_mul(4).ok_or(Error::UnexpectedEof {
            offset: self.pos,
            need: usize::MAX,
            have: self.remaining(),
        })?;
        self.ensure(need)?;
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(self.read_u32()?);
        }
        Ok(words)
    }

    /// Create a cursor positioned at an absolute offset into the same data.
    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            data: self.data,
            pos: offset,
        }
    }

    fn ensure(&self, n: usize) -> Result<()> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::UnexpectedEof {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            }),
        }
    }
}

/// Writer that builds a byte buffer. All writes are little-endian.
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_tag(&mut self, tag: &[u8; 4]) {
        self.buf.extend_from_slice(tag);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Patch a u32 at a specific position (for backpatching sizes).
    pub fn patch_u32(&mut self, pos: usize, v: u32) {
        let bytes = v.to_le_bytes();
        self.buf[pos..pos + 4].copy_from_slice(&bytes);
    }

    /// Pad to 4-byte alignment.
    pub fn align4(&mut self) {
        while !self.buf.len().is_multiple_of(4) {
            self.buf.push(0);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a u32 at `pos` in a buffer that is being rewritten in place.
pub fn read_u32_at(buf: &[u8], pos: usize) -> Result<u32> {
    let mut c = Cursor::new(buf);
    c.seek(pos);
    c.read_u32()
}

/// Overwrite the u32 at `pos`.
pub fn write_u32_at(buf: &mut [u8], pos: usize, v: u32) -> Result<()> {
    let have = buf.len().saturating_sub(pos);
    let slot = pos
        .checked_add(4)
        .and_then(|end| buf.get_mut(pos..end))
        .ok_or(Error::UnexpectedEof {
            offset: pos,
            need: 4,
            have,
        })?;
    slot.copy_from_slice(&v.to_le_bytes());
    Ok(())
}

/// Add `delta` to the u32 at `pos`, failing if the field would overflow.
pub fn add_u32_at(buf: &mut [u8], pos: usize, delta: u32) -> Result<u32> {
    let old = read_u32_at(buf, pos)?;
    let new = old
        .checked_add(delta)
        .ok_or_else(|| Error::malformed(pos, format!("field {old:#x} + {delta:#x} overflows u32")))?;
    write_u32_at(buf, pos, new)?;
    Ok(new)
}
