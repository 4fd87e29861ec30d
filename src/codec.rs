//! Little-endian cursor and the encode/decode traits every wire type implements.
//!
//! Fixed-layout headers are [`Record`]s described with `binrw`; offset tables
//! and token streams are walked by hand with [`Reader`].

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use widestring::{U16CStr, U16Str};

use crate::{SecurityError, SecurityResult};

/// Bounds-checked cursor over a byte slice.
///
/// Every read names the structure being decoded so a short buffer surfaces as
/// [`SecurityError::Truncated`] with context instead of a panic.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, len: usize, what: &'static str) -> SecurityResult<&'a [u8]> {
        let slice = self
            .pos
            .checked_add(len)
            .and_then(|end| self.buf.get(self.pos..end))
            .ok_or(SecurityError::Truncated {
                what,
                needed: len,
                available: self.remaining(),
            })?;
        self.pos += len;
        Ok(slice)
    }

    /// Everything that has not been read yet.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = self.buf.get(self.pos..).unwrap_or_default();
        self.pos = self.buf.len();
        rest
    }

    pub(crate) fn read_array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> SecurityResult<[u8; N]> {
        let slice = self.take(N, what)?;
        <[u8; N]>::try_from(slice).map_err(|_| SecurityError::Truncated {
            what,
            needed: N,
            available: slice.len(),
        })
    }

    pub(crate) fn read_u8(&mut self, what: &'static str) -> SecurityResult<u8> {
        self.read_array::<1>(what).map(|[b]| b)
    }

    pub(crate) fn read_u32(&mut self, what: &'static str) -> SecurityResult<u32> {
        self.read_array(what).map(u32::from_le_bytes)
    }

    pub(crate) fn read_u64(&mut self, what: &'static str) -> SecurityResult<u64> {
        self.read_array(what).map(u64::from_le_bytes)
    }

    /// Reads a `u32` byte length followed by that many bytes.
    pub(crate) fn read_prefixed(&mut self, what: &'static str) -> SecurityResult<&'a [u8]> {
        let len = self.read_u32(what)?;
        self.take(len as usize, what)
    }

    /// Reads one [`Record`] and advances past the bytes it consumed.
    pub(crate) fn read_record<T: Record>(&mut self) -> SecurityResult<T> {
        let available = self.remaining();
        let mut cursor = Cursor::new(self.buf.get(self.pos..).unwrap_or_default());
        let record = T::read_le(&mut cursor).map_err(|err| record_error::<T>(&err, available))?;
        let consumed = usize::try_from(cursor.position()).unwrap_or(available);
        self.pos += consumed.min(available);
        Ok(record)
    }
}

/// A fixed-layout wire structure read and written through `binrw`.
///
/// Field asserts carry a [`SecurityError`], which [`Reader::read_record`]
/// hands back unchanged.
pub(crate) trait Record:
    for<'a> BinRead<Args<'a> = ()> + for<'a> BinWrite<Args<'a> = ()>
{
    /// Structure name reported on truncation.
    const WHAT: &'static str;
    /// Shortest valid encoding.
    const MIN_LEN: usize;
}

fn record_error<T: Record>(err: &binrw::Error, available: usize) -> SecurityError {
    if let Some(err) = err.custom_err::<SecurityError>() {
        err.clone()
    } else if err.is_eof() {
        SecurityError::Truncated {
            what: T::WHAT,
            needed: T::MIN_LEN.max(available + 1),
            available,
        }
    } else {
        SecurityError::MalformedRecord(T::WHAT)
    }
}

/// Appends the binary form of `record`.
pub(crate) fn put_record<T: Record>(out: &mut Vec<u8>, record: &T) -> SecurityResult<()> {
    let mut cursor = Cursor::new(Vec::with_capacity(T::MIN_LEN));
    record
        .write_le(&mut cursor)
        .map_err(|_| SecurityError::MalformedRecord(T::WHAT))?;
    out.extend_from_slice(cursor.get_ref());
    Ok(())
}

/// Binary encoding of a model value.
pub(crate) trait Encode {
    /// Exact number of bytes [`Encode::encode_into`] appends.
    fn encoded_len(&self) -> usize;

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()>;

    fn encode_to_vec(&self) -> SecurityResult<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

/// Binary decoding of a model value from a cursor.
pub(crate) trait Decode: Sized {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self>;
}

pub(crate) fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Converts a length to the `u32` a wire field holds.
pub(crate) fn wire_u32(len: usize, what: &'static str) -> SecurityResult<u32> {
    u32::try_from(len).map_err(|_| SecurityError::InvalidSize { what, size: len })
}

/// Converts a length to the `u16` a wire field holds.
pub(crate) fn wire_u16(len: usize, what: &'static str) -> SecurityResult<u16> {
    u16::try_from(len).map_err(|_| SecurityError::InvalidSize { what, size: len })
}

/// Rounds `len` up to the next multiple of four.
pub(crate) const fn align4(len: usize) -> usize {
    (len + 3) & !3
}

pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count() * 2
}

/// Appends `text` as UTF-16LE without a terminator.
pub(crate) fn put_utf16(out: &mut Vec<u8>, text: &str) {
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}

fn units(bytes: &[u8]) -> SecurityResult<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(SecurityError::InvalidUtf16);
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| {
            let mut unit = [0u8; 2];
            unit.copy_from_slice(pair);
            u16::from_le_bytes(unit)
        })
        .collect())
}

/// Decodes UTF-16LE bytes that fill the whole slice.
pub(crate) fn utf16_to_string(bytes: &[u8]) -> SecurityResult<String> {
    let units = units(bytes)?;
    U16Str::from_slice(&units)
        .to_string()
        .map_err(|_| SecurityError::InvalidUtf16)
}

/// Decodes a NUL-terminated UTF-16LE string at the start of `bytes`.
///
/// Returns the string and the number of bytes consumed, terminator included.
pub(crate) fn utf16z_to_string(bytes: &[u8]) -> SecurityResult<(String, usize)> {
    let even = bytes.get(..bytes.len() & !1).unwrap_or_default();
    let units = units(even)?;
    let text = U16CStr::from_slice_truncate(&units).map_err(|_| SecurityError::InvalidUtf16)?;
    let consumed = (text.len() + 1) * 2;
    let text = text.to_string().map_err(|_| SecurityError::InvalidUtf16)?;
    Ok((text, consumed))
}
