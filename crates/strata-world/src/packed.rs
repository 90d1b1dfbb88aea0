//! The non-split packed long array format: each 64-bit word holds
//! `64 / bits` whole entries starting from the low bits, and the leftover
//! high bits of every word are padding.

use crate::error::DecodeSectionError;

/// Widest entry the format supports.
pub const MAX_BITS: u8 = 32;

pub fn entries_per_long(bits: u8) -> usize {
    64 / bits as usize
}

/// Number of words needed to hold `count` entries of `bits` each.
pub fn packed_length(bits: u8, count: usize) -> usize {
    if bits == 0 {
        return 0;
    }
    let per_long = entries_per_long(bits);
    (count + per_long - 1) / per_long
}

/// Extracts `count` entries of `bits` width from `data`. A width of 0 means
/// every entry is 0 and `data` is not touched.
pub fn unpack(bits: u8, data: &[u64], count: usize) -> Result<Vec<u32>, DecodeSectionError> {
    if bits == 0 {
        return Ok(vec![0; count]);
    }
    if bits > MAX_BITS {
        return Err(DecodeSectionError::InvalidBitsPerBlock(bits));
    }

    let expected = packed_length(bits, count);
    if data.len() < expected {
        return Err(DecodeSectionError::PackedArrayTooShort {
            expected,
            found: data.len(),
        });
    }

    let per_long = entries_per_long(bits);
    let mask = (1u64 << bits) - 1;
    let mut values = Vec::with_capacity(count);
    for n in 0..count {
        let word = data[n / per_long];
        let offset = (n % per_long) * bits as usize;
        values.push(((word >> offset) & mask) as u32);
    }
    Ok(values)
}

/// Inverse of [`unpack`]. Values wider than `bits` are truncated.
pub fn pack(bits: u8, values: &[u32]) -> Vec<u64> {
    if bits == 0 {
        return Vec::new();
    }

    let per_long = entries_per_long(bits);
    let mask = (1u64 << bits) - 1;
    let mut data = vec![0u64; packed_length(bits, values.len())];
    for (n, value) in values.iter().enumerate() {
        let offset = (n % per_long) * bits as usize;
        data[n / per_long] |= (*value as u64 & mask) << offset;
    }
    data
}
