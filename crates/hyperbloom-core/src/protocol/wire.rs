// ============================================
// File: crates/hyperbloom-core/src/protocol/wire.rs
// ============================================
//! # Wire Primitives
//!
//! ## Creation Reason
//! Provides the low-level encoding primitives shared by the codec and
//! the trust-link serializer: unsigned LEB128 varints and
//! protobuf3-compatible tagged fields.
//!
//! ## Main Functionality
//! - `peek_uvarint` / `read_uvarint` / `write_uvarint`: u32 varints,
//!   capped at 5 bytes (the framing-layer limit)
//! - `read_uvarint64` / `write_uvarint64`: u64 varints, used only
//!   inside opaque trust-link bodies
//! - Tag and field helpers for length-delimited and varint fields
//!
//! ## Varint Encoding
//! Each byte carries 7 value bits; the high bit marks continuation.
//! A u32 therefore never needs more than 5 bytes, and the 5th byte may
//! only carry the 4 remaining value bits.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `peek_uvarint` returning `Ok(None)` means "feed me more bytes",
//!   never an error - the frame parser depends on this
//! - Always validate buffer lengths before reading
//!
//! ## Last Modified
//! v0.1.0 - Initial wire primitives

use bytes::BufMut;

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Maximum encoded length of a framing-layer (u32) varint.
pub const MAX_VARINT_LEN: usize = 5;

/// Wire type for varint-encoded fields.
pub const WIRE_VARINT: u32 = 0;

/// Wire type for 64-bit fields (skipped if encountered).
pub const WIRE_FIXED64: u32 = 1;

/// Wire type for length-delimited fields.
pub const WIRE_LEN: u32 = 2;

/// Wire type for 32-bit fields (skipped if encountered).
pub const WIRE_FIXED32: u32 = 5;

// ============================================
// u32 Varints (framing layer)
// ============================================

/// Attempts to decode a u32 varint from the front of `buf`.
///
/// # Returns
/// - `Ok(Some((value, consumed)))` - a complete varint
/// - `Ok(None)` - the buffer ends mid-varint; more bytes are needed
/// - `Err(VarintOverflow)` - the encoding exceeds 5 bytes or 32 bits
pub fn peek_uvarint(buf: &[u8]) -> Result<Option<(u32, usize)>> {
    let mut value: u32 = 0;
    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        // The 5th byte may only carry the top 4 value bits of a u32
        // and must terminate the encoding.
        if i == MAX_VARINT_LEN - 1 && byte & 0xf0 != 0 {
            return Err(CoreError::VarintOverflow);
        }
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if buf.len() >= MAX_VARINT_LEN {
        return Err(CoreError::VarintOverflow);
    }
    Ok(None)
}

/// Reads a u32 varint from a slice cursor, advancing it.
///
/// # Errors
/// - `Truncated` if the buffer ends mid-varint
/// - `VarintOverflow` if the encoding exceeds 5 bytes or 32 bits
pub fn read_uvarint(buf: &mut &[u8]) -> Result<u32> {
    match peek_uvarint(buf)? {
        Some((value, consumed)) => {
            *buf = &buf[consumed..];
            Ok(value)
        }
        None => Err(CoreError::Truncated { needed: 1 }),
    }
}

/// Writes a u32 varint.
pub fn write_uvarint(mut value: u32, buf: &mut impl BufMut) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Returns the encoded length of a u32 varint.
#[must_use]
pub const fn uvarint_len(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0xfff_ffff => 4,
        _ => 5,
    }
}

// ============================================
// u64 Varints (trust-link bodies only)
// ============================================

/// Reads a u64 varint from a slice cursor, advancing it.
///
/// Used only inside opaque trust-link bodies (expiration timestamps);
/// the framing layer itself never carries 64-bit varints.
pub fn read_uvarint64(buf: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..10 {
        let Some(&byte) = buf.get(i) else {
            return Err(CoreError::Truncated { needed: 1 });
        };
        if i == 9 && byte & 0xfe != 0 {
            return Err(CoreError::VarintOverflow);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            *buf = &buf[i + 1..];
            return Ok(value);
        }
    }
    Err(CoreError::VarintOverflow)
}

/// Writes a u64 varint.
pub fn write_uvarint64(mut value: u64, buf: &mut impl BufMut) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

// ============================================
// Tagged Fields
// ============================================

/// Writes a field tag (`field_number << 3 | wire_type`).
pub fn write_tag(field: u32, wire: u32, buf: &mut impl BufMut) {
    write_uvarint((field << 3) | wire, buf);
}

/// Reads a field tag, returning `(field_number, wire_type)`.
pub fn read_tag(buf: &mut &[u8]) -> Result<(u32, u32)> {
    let tag = read_uvarint(buf)?;
    Ok((tag >> 3, tag & 0x7))
}

/// Writes a length-delimited field (`tag ‖ varint(len) ‖ data`).
pub fn write_bytes_field(field: u32, data: &[u8], buf: &mut impl BufMut) {
    write_tag(field, WIRE_LEN, buf);
    write_uvarint(data.len() as u32, buf);
    buf.put_slice(data);
}

/// Writes a varint field (`tag ‖ varint(value)`).
pub fn write_uint_field(field: u32, value: u32, buf: &mut impl BufMut) {
    write_tag(field, WIRE_VARINT, buf);
    write_uvarint(value, buf);
}

/// Reads the body of a length-delimited field.
///
/// # Errors
/// `Truncated` if the declared length overruns the buffer - the
/// message "lies about its length".
pub fn read_len_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_uvarint(buf)? as usize;
    if buf.len() < len {
        return Err(CoreError::Truncated {
            needed: len - buf.len(),
        });
    }
    let (body, rest) = buf.split_at(len);
    *buf = rest;
    Ok(body)
}

/// Skips an unrecognized field of the given wire type.
///
/// Unknown field numbers are tolerated for forward compatibility;
/// unknown wire types are not.
pub fn skip_field(wire: u32, buf: &mut &[u8]) -> Result<()> {
    match wire {
        WIRE_VARINT => {
            read_uvarint64(buf)?;
        }
        WIRE_LEN => {
            read_len_delimited(buf)?;
        }
        WIRE_FIXED64 => {
            if buf.len() < 8 {
                return Err(CoreError::Truncated {
                    needed: 8 - buf.len(),
                });
            }
            *buf = &buf[8..];
        }
        WIRE_FIXED32 => {
            if buf.len() < 4 {
                return Err(CoreError::Truncated {
                    needed: 4 - buf.len(),
                });
            }
            *buf = &buf[4..];
        }
        other => {
            return Err(CoreError::malformed(format!(
                "unsupported wire type {other}"
            )));
        }
    }
    Ok(())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn encode(value: u32) -> Vec<u8> {
        let mut buf = BytesMut::new();
        write_uvarint(value, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_uvarint_roundtrip_boundaries() {
        // 1 through 5 byte encodings
        for (value, expected_len) in [
            (0u32, 1),
            (0x7f, 1),
            (0x80, 2),
            (0x3fff, 2),
            (0x4000, 3),
            (0x1f_ffff, 3),
            (0x20_0000, 4),
            (0xfff_ffff, 4),
            (0x1000_0000, 5),
            (u32::MAX, 5),
        ] {
            let encoded = encode(value);
            assert_eq!(encoded.len(), expected_len, "value {value:#x}");
            assert_eq!(uvarint_len(value), expected_len);

            let (decoded, consumed) = peek_uvarint(&encoded).unwrap().unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, expected_len);
        }
    }

    #[test]
    fn test_uvarint_incomplete() {
        // Continuation bit set, no terminator yet
        assert!(matches!(peek_uvarint(&[0x80]), Ok(None)));
        assert!(matches!(peek_uvarint(&[0xff, 0xff]), Ok(None)));
        assert!(matches!(peek_uvarint(&[]), Ok(None)));
    }

    #[test]
    fn test_uvarint_overflow_six_bytes() {
        // Five continuation bytes imply a 6th byte: rejected as soon as
        // the 5th byte fails to terminate.
        let six = [0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(matches!(
            peek_uvarint(&six),
            Err(CoreError::VarintOverflow)
        ));
    }

    #[test]
    fn test_uvarint_overflow_value_bits() {
        // 5th byte carrying more than the top 4 bits of a u32
        let wide = [0xff, 0xff, 0xff, 0xff, 0x10];
        assert!(matches!(
            peek_uvarint(&wide),
            Err(CoreError::VarintOverflow)
        ));
    }

    #[test]
    fn test_uvarint64_roundtrip() {
        for value in [0u64, 1, u32::MAX as u64, u64::MAX] {
            let mut buf = BytesMut::new();
            write_uvarint64(value, &mut buf);
            let mut cursor = &buf[..];
            assert_eq!(read_uvarint64(&mut cursor).unwrap(), value);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn test_bytes_field_roundtrip() {
        let mut buf = BytesMut::new();
        write_bytes_field(3, b"hello", &mut buf);

        let mut cursor = &buf[..];
        let (field, wire) = read_tag(&mut cursor).unwrap();
        assert_eq!(field, 3);
        assert_eq!(wire, WIRE_LEN);
        assert_eq!(read_len_delimited(&mut cursor).unwrap(), b"hello");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_len_delimited_overrun() {
        // Declared length of 10 but only 2 bytes present
        let mut buf = BytesMut::new();
        write_uvarint(10, &mut buf);
        buf.put_slice(b"ab");

        let mut cursor = &buf[..];
        assert!(matches!(
            read_len_delimited(&mut cursor),
            Err(CoreError::Truncated { .. })
        ));
    }

    #[test]
    fn test_skip_field() {
        let mut buf = BytesMut::new();
        write_uint_field(9, 1234, &mut buf);
        write_bytes_field(10, b"payload", &mut buf);
        write_uint_field(1, 7, &mut buf);

        let mut cursor = &buf[..];
        let (_, wire) = read_tag(&mut cursor).unwrap();
        skip_field(wire, &mut cursor).unwrap();
        let (_, wire) = read_tag(&mut cursor).unwrap();
        skip_field(wire, &mut cursor).unwrap();

        let (field, _) = read_tag(&mut cursor).unwrap();
        assert_eq!(field, 1);
        assert_eq!(read_uvarint(&mut cursor).unwrap(), 7);
    }
}
