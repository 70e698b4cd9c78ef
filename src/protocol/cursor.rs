//! Positioned reader over a response buffer.

use std::io;

use bytes::Bytes;

/// A cursor over a response envelope.
///
/// The tag-scanning loop reads one tag byte at a time and then hands the
/// cursor to the codec, which consumes exactly one serialized value through
/// the [`io::Read`] impl. [`ResponseCursor::position`] and
/// [`ResponseCursor::slice_between`] let callers capture the raw bytes a
/// value occupied without re-encoding it.
pub struct ResponseCursor<'a> {
    buf: &'a Bytes,
    pos: usize,
}

impl<'a> ResponseCursor<'a> {
    pub fn new(buf: &'a Bytes) -> Self {
        ResponseCursor { buf, pos: 0 }
    }

    /// Current byte offset into the response.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes and returns the next tag byte, or `None` at end of input.
    pub fn next_tag(&mut self) -> Option<u8> {
        let tag = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(tag)
    }

    /// The full response this cursor reads from.
    pub fn response(&self) -> &Bytes {
        self.buf
    }

    /// A cheap slice of the response between two offsets.
    pub fn slice_between(&self, start: usize, end: usize) -> Bytes {
        self.buf.slice(start..end)
    }
}

impl io::Read for ResponseCursor<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = &self.buf[self.pos..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}
