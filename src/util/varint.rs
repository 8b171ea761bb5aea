//! Variable-length integer encoding utilities.
//!
//! The lookup table stores docid deltas as big-endian 7-bit groups: the most
//! significant group comes first and every byte except the last carries the
//! continuation flag `0x80`. This is the mirror image of the little-endian
//! (LEB128) layout used by protocol buffers.

use crate::error::{LivenessError, Result};

/// Continuation flag carried by every byte except the last.
const CONTINUATION: u8 = 0x80;

/// Maximum number of bytes a u64 can occupy (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

/// Encode a u64 value using big-endian variable-length encoding.
pub fn encode_u64_be(value: u64) -> Vec<u8> {
    let mut groups = Vec::with_capacity(MAX_VARINT_LEN);
    let mut val = value;

    loop {
        groups.push((val & 0x7F) as u8);
        val >>= 7;
        if val == 0 {
            break;
        }
    }

    groups.reverse();
    let last = groups.len() - 1;
    for byte in &mut groups[..last] {
        *byte |= CONTINUATION;
    }

    groups
}

/// Append the big-endian variable-length encoding of `value` to `out`.
pub fn write_u64_be(out: &mut Vec<u8>, value: u64) -> usize {
    let bytes = encode_u64_be(value);
    out.extend_from_slice(&bytes);
    bytes.len()
}

/// Decode a u64 value from big-endian variable-length encoding.
///
/// Returns the value and the number of bytes consumed. A buffer that ends
/// while the continuation flag is still set, or a value that does not fit in
/// 64 bits, is a format error.
pub fn decode_u64_be(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;

    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_VARINT_LEN || result > (u64::MAX >> 7) {
            return Err(LivenessError::format("VarInt overflow"));
        }

        result = (result << 7) | u64::from(byte & 0x7F);

        if byte & CONTINUATION == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(LivenessError::format("Incomplete VarInt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_u64_be() {
        let test_values = [0, 1, 127, 128, 255, 256, 16383, 16384, u64::MAX];

        for &value in &test_values {
            let encoded = encode_u64_be(value);
            let (decoded, bytes_read) = decode_u64_be(&encoded).unwrap();

            assert_eq!(value, decoded);
            assert_eq!(encoded.len(), bytes_read);
        }
    }

    #[test]
    fn test_msb_group_comes_first() {
        // 300 = 0b10_0101100 -> groups [0x02, 0x2C]
        assert_eq!(encode_u64_be(300), vec![0x82, 0x2C]);
        assert_eq!(decode_u64_be(&[0x82, 0x2C]).unwrap(), (300, 2));
    }

    #[test]
    fn test_decode_stops_at_terminal_byte() {
        let (value, read) = decode_u64_be(&[0x05, 0xFF, 0xFF]).unwrap();
        assert_eq!(value, 5);
        assert_eq!(read, 1);
    }

    #[test]
    fn test_write_appends() {
        let mut out = vec![0xAA];
        let written = write_u64_be(&mut out, 128);
        assert_eq!(written, 2);
        assert_eq!(out, vec![0xAA, 0x81, 0x00]);
    }

    #[test]
    fn test_encoding_efficiency() {
        assert_eq!(encode_u64_be(0).len(), 1);
        assert_eq!(encode_u64_be(127).len(), 1);
        assert_eq!(encode_u64_be(128).len(), 2);
        assert_eq!(encode_u64_be(16383).len(), 2);
        assert_eq!(encode_u64_be(16384).len(), 3);
        assert_eq!(encode_u64_be(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn test_incomplete_varint() {
        let incomplete = vec![0x80]; // Continuation bit set but no more data
        assert!(decode_u64_be(&incomplete).unwrap_err().is_format());
        assert!(decode_u64_be(&[]).unwrap_err().is_format());
    }

    #[test]
    fn test_overflow() {
        let overflow_data = vec![0xFF; 11];
        assert!(decode_u64_be(&overflow_data).unwrap_err().is_format());
    }
}
