//! LEB128 variable-length integers.
//!
//! Seven bits per byte, least significant group first, high bit set on
//! every byte but the last. Decoding accepts only the shortest encoding of
//! a value, so `encode(decode(b)) == b` for every accepted input.

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VarintError {
    #[error("truncated varint")]
    Truncated,
    #[error("varint overflow")]
    Overflow,
    #[error("non-canonical varint encoding")]
    NonCanonical,
}

/// Encode a u64 as a variable-length integer.
pub fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        let group = (byte & 0x7F) as u64;
        let shift = 7 * i as u32;
        if shift == 63 && group > 1 {
            return Err(VarintError::Overflow);
        }
        value |= group << shift;
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(VarintError::NonCanonical);
            }
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(&mut buf, value);
        buf
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(300), vec![0xAC, 0x02]);
        assert_eq!(encoded(u64::MAX).len(), MAX_VARINT_LEN);
    }

    #[test]
    fn decode_reports_consumed_bytes() {
        assert_eq!(decode_varint(&[0xAC, 0x02, 0xFF]), Ok((300, 2)));
        assert_eq!(decode_varint(&[0x05, 0x01]), Ok((5, 1)));
    }

    #[test]
    fn decode_extremes() {
        assert_eq!(decode_varint(&encoded(u64::MAX)), Ok((u64::MAX, MAX_VARINT_LEN)));
        assert_eq!(decode_varint(&encoded(1 << 63)), Ok((1 << 63, MAX_VARINT_LEN)));
    }

    #[test]
    fn truncated() {
        assert_eq!(decode_varint(&[]), Err(VarintError::Truncated));
        assert_eq!(decode_varint(&[0x80]), Err(VarintError::Truncated));
        assert_eq!(decode_varint(&[0xFF, 0xFF]), Err(VarintError::Truncated));
    }

    #[test]
    fn overflow() {
        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert_eq!(decode_varint(&too_big), Err(VarintError::Overflow));
        assert_eq!(decode_varint(&[0xFF; 11]), Err(VarintError::Overflow));
    }

    #[test]
    fn non_canonical_is_rejected() {
        assert_eq!(decode_varint(&[0x85, 0x00]), Err(VarintError::NonCanonical));
    }
}
