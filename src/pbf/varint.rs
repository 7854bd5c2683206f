// Protobuf base-128 variable-length integers and zigzag transforms.
//
// Little-endian groups: least-significant 7 bits first. Each byte has
// bit 7 set except the final byte. A u64 needs at most 10 bytes, and the
// 10th byte may only contribute the single remaining bit.

use thiserror::Error;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

/// Decode a `u64` from the front of `data`.
/// Returns `(value, bytes_consumed)` or an error.
///
/// Fails with `Truncated` when `data` ends before a byte with the high bit
/// clear, and with `Overlong` when the encoding does not fit in 64 bits.
#[inline]
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
    // Single-byte fast path: tags, small lengths and most geometry deltas.
    if let Some(&b) = data.first()
        && b & 0x80 == 0
    {
        return Ok((u64::from(b), 1));
    }

    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            // Either a continuation bit on the 10th byte or bits past 64.
            return Err(VarIntError::Overlong);
        }
        val |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarIntError::Truncated)
}

/// Decode a `u32` from the front of `data`, rejecting values above `u32::MAX`.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, usize), VarIntError> {
    let (val, len) = read_u64(data)?;
    let val = u32::try_from(val).map_err(|_| VarIntError::Overflow)?;
    Ok((val, len))
}

// ---------------------------------------------------------------------------
// Zigzag
// ---------------------------------------------------------------------------

/// Map an unsigned zigzag value back to its signed form: 0, 1, 2, 3 -> 0, -1, 1, -2.
#[inline]
pub const fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// 32-bit variant used by geometry parameters.
#[inline]
pub const fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
pub const fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub const fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into `buf`. Returns the number of bytes written (1..=10),
/// stored at the front of `buf`.
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    while num >= 0x80 {
        buf[i] = (num as u8) | 0x80;
        num >>= 7;
        i += 1;
    }
    buf[i] = num as u8;
    i + 1
}

/// Return the encoded byte-length of a `u64` value.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Input ended before the terminating byte.
    #[error("varint truncated")]
    Truncated,
    /// More than ten bytes, or bits beyond 64.
    #[error("varint longer than 10 bytes")]
    Overlong,
    /// Value does not fit the requested integer type.
    #[error("varint overflows target type")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
