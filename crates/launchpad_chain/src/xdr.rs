//! Minimal XDR (RFC 4506) primitives: big-endian integers and 4-byte padded
//! variable-length opaque data.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XdrError {
    #[error("unexpected end of input at byte {0}")]
    Eof(usize),

    #[error("{0} trailing bytes after value")]
    Trailing(usize),

    #[error("invalid discriminant {value} for {what}")]
    Discriminant { what: &'static str, value: i32 },

    #[error("length {0} exceeds limit")]
    Length(u32),

    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),

    #[error("invalid base64: {0}")]
    Base64(String),
}

#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.u32(v as u32)
    }

    /// Fixed-length opaque (no length prefix).
    pub fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len())
    }

    /// Variable-length opaque / string: length prefix, data, zero padding.
    pub fn var(&mut self, bytes: &[u8]) -> &mut Self {
        self.u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len())
    }

    /// Splice already-encoded XDR verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    fn pad(&mut self, len: usize) -> &mut Self {
        let rem = len % 4;
        if rem != 0 {
            self.buf.extend(std::iter::repeat_n(0u8, 4 - rem));
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        let end = self.pos.checked_add(n).ok_or(XdrError::Eof(self.pos))?;
        if end > self.buf.len() {
            return Err(XdrError::Eof(self.pos));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u32(&mut self) -> Result<u32, XdrError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, XdrError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64, XdrError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> Result<i64, XdrError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn bool(&mut self) -> Result<bool, XdrError> {
        match self.i32()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(XdrError::Discriminant { what: "bool", value }),
        }
    }

    pub fn fixed32(&mut self) -> Result<[u8; 32], XdrError> {
        self.array()
    }

    pub fn var(&mut self, max: u32) -> Result<&'a [u8], XdrError> {
        let len = self.u32()?;
        if len > max || len as usize > self.buf.len() - self.pos {
            return Err(XdrError::Length(len));
        }
        let data = self.take(len as usize)?;
        let rem = len as usize % 4;
        if rem != 0 {
            self.take(4 - rem)?;
        }
        Ok(data)
    }

    /// Element count of a variable-length array, bounded by the bytes left.
    pub fn count(&mut self) -> Result<usize, XdrError> {
        let n = self.u32()?;
        if n as usize > self.buf.len() - self.pos {
            return Err(XdrError::Length(n));
        }
        Ok(n as usize)
    }

    pub fn finish(self) -> Result<(), XdrError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            n => Err(XdrError::Trailing(n)),
        }
    }
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>, XdrError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| XdrError::Base64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_pads_to_four_bytes() {
        let mut w = XdrWriter::new();
        w.var(b"abcde");
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 4 + 8);
        assert_eq!(&bytes[..4], &[0, 0, 0, 5]);
        assert_eq!(&bytes[9..], &[0, 0, 0]);

        let mut r = XdrReader::new(&bytes);
        assert_eq!(r.var(64).unwrap(), b"abcde");
        r.finish().unwrap();
    }

    #[test]
    fn integers_are_big_endian() {
        let mut w = XdrWriter::new();
        w.u32(1).i64(-2);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
        let mut r = XdrReader::new(&bytes);
        assert_eq!(r.u32().unwrap(), 1);
        assert_eq!(r.i64().unwrap(), -2);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut r = XdrReader::new(&[0, 0, 1]);
        assert_eq!(r.u32().unwrap_err(), XdrError::Eof(0));
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut r = XdrReader::new(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(r.var(u32::MAX).unwrap_err(), XdrError::Length(_)));
    }

    #[test]
    fn trailing_bytes_detected() {
        let mut r = XdrReader::new(&[0, 0, 0, 1, 9]);
        r.u32().unwrap();
        assert_eq!(r.finish().unwrap_err(), XdrError::Trailing(1));
    }

    #[test]
    fn bad_base64_is_reported() {
        assert!(matches!(from_base64("%%%"), Err(XdrError::Base64(_))));
        assert_eq!(from_base64(&to_base64(b"xdr")).unwrap(), b"xdr");
    }
}
