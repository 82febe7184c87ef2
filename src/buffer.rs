//! Bounded writer over a caller-supplied byte buffer.

use crate::error::Error;
use core::fmt::{self, Write};

/// Appends text to a fixed `&mut [u8]` and refuses to write past its end.
///
/// A failed push leaves the already written prefix untouched, but the caller
/// is expected to discard the buffer.
pub(crate) struct BufWriter<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl<'b> BufWriter<'b> {
    pub(crate) fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Resume writing after `len` bytes that are already in `buf`.
    pub(crate) fn with_len(buf: &'b mut [u8], len: usize) -> Self {
        let len = len.min(buf.len());
        Self { buf, len }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self
            .len
            .checked_add(bytes.len())
            .ok_or(Error::BufferTooSmall)?;
        let dst = self
            .buf
            .get_mut(self.len..end)
            .ok_or(Error::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    pub(crate) fn push_str(&mut self, s: &str) -> Result<(), Error> {
        self.push_bytes(s.as_bytes())
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.push_bytes(&[byte])
    }

    pub(crate) fn push_u32(&mut self, value: u32) -> Result<(), Error> {
        self.push_u64(u64::from(value))
    }

    pub(crate) fn push_u64(&mut self, value: u64) -> Result<(), Error> {
        write!(self, "{}", value).map_err(|_| Error::BufferTooSmall)
    }

    /// Percent-encode `s`, keeping only RFC 3986 unreserved characters.
    pub(crate) fn push_url_encoded(&mut self, s: &str) -> Result<(), Error> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        for &b in s.as_bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
                self.push_byte(b)?;
            } else {
                self.push_bytes(&[b'%', HEX[(b >> 4) as usize], HEX[(b & 0x0F) as usize]])?;
            }
        }
        Ok(())
    }

    /// Unused tail of the buffer, for encoders that write in place.
    pub(crate) fn remaining_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.len..]
    }

    /// Commit `n` bytes written directly into [`Self::remaining_mut`].
    pub(crate) fn advance(&mut self, n: usize) -> Result<(), Error> {
        if n > self.buf.len() - self.len {
            return Err(Error::BufferTooSmall);
        }
        self.len += n;
        Ok(())
    }
}

impl fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}
