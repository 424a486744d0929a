//! Fixed-width field encoding helpers.
//!
//! All multi-byte integers are big-endian, matching the on-disk format.

use crate::error::{CodecError, CodecResult};
use bytes::{Buf, BufMut, BytesMut};

/// Writes `value` into exactly `width` bytes, zero-padded.
///
/// Oversized strings are truncated at a char boundary so the stored bytes
/// remain valid UTF-8.
pub(crate) fn put_fixed_str(buf: &mut BytesMut, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let mut end = width.min(bytes.len());
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    buf.put_slice(&bytes[..end]);
    buf.put_bytes(0, width - end);
}

/// Reads a `width`-byte string field, trimming trailing zero and
/// whitespace bytes.
pub(crate) fn get_fixed_str(buf: &mut &[u8], width: usize) -> CodecResult<String> {
    let mut field = vec![0u8; width];
    buf.copy_to_slice(&mut field);
    while matches!(field.last(), Some(0 | b' ' | b'\t' | b'\n' | b'\r')) {
        field.pop();
    }
    String::from_utf8(field).map_err(|_| CodecError::InvalidUtf8)
}

pub(crate) fn put_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(u8::from(value));
}

pub(crate) fn get_bool(buf: &mut &[u8]) -> bool {
    buf.get_u8() == 1
}

pub(crate) fn put_u64_array(buf: &mut BytesMut, values: &[u64]) {
    for value in values {
        buf.put_u64(*value);
    }
}

pub(crate) fn get_u64_array<const N: usize>(buf: &mut &[u8]) -> [u64; N] {
    let mut out = [0u64; N];
    for slot in &mut out {
        *slot = buf.get_u64();
    }
    out
}

pub(crate) fn put_u32_array(buf: &mut BytesMut, values: &[u32]) {
    for value in values {
        buf.put_u32(*value);
    }
}

pub(crate) fn get_u32_array<const N: usize>(buf: &mut &[u8]) -> [u32; N] {
    let mut out = [0u32; N];
    for slot in &mut out {
        *slot = buf.get_u32();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_is_zero_padded() {
        let mut buf = BytesMut::new();
        put_fixed_str(&mut buf, "abc", 8);
        assert_eq!(&buf[..], b"abc\0\0\0\0\0");
    }

    #[test]
    fn oversized_string_is_truncated() {
        let mut buf = BytesMut::new();
        put_fixed_str(&mut buf, "abcdefghij", 4);
        assert_eq!(&buf[..], b"abcd");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut buf = BytesMut::new();
        // 'é' is two bytes; cutting at 3 would split it.
        put_fixed_str(&mut buf, "aéé", 3);
        assert_eq!(buf.len(), 3);
        let mut slice = &buf[..];
        assert_eq!(get_fixed_str(&mut slice, 3).unwrap(), "aé");
    }

    #[test]
    fn decode_trims_trailing_zeros_and_whitespace() {
        let field = *b"title  \0\0\0";
        let mut slice = &field[..];
        assert_eq!(get_fixed_str(&mut slice, 10).unwrap(), "title");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let field = [0xFFu8, 0xFE, 0x01, 0x00];
        let mut slice = &field[..];
        assert_eq!(get_fixed_str(&mut slice, 4), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn u64_array_roundtrip() {
        let mut buf = BytesMut::new();
        put_u64_array(&mut buf, &[1, 2, u64::MAX]);
        let mut slice = &buf[..];
        assert_eq!(get_u64_array::<3>(&mut slice), [1, 2, u64::MAX]);
    }

    #[test]
    fn u32_array_roundtrip() {
        let mut buf = BytesMut::new();
        put_u32_array(&mut buf, &[7, 0, 9]);
        let mut slice = &buf[..];
        assert_eq!(get_u32_array::<3>(&mut slice), [7, 0, 9]);
    }
}
