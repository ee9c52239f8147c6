//! Septet encoding
//!
//! Seven payload bytes are transmitted as eight 7-bit-clean bytes: the low
//! seven bits of each byte stay in place and the MSBs are collected into a
//! trailing "septet" byte (bit `i` holds the MSB of byte `i`).

/// Number of payload bytes per frame
pub const SEPTET_SOURCE_LEN: usize = 7;

/// Number of bytes on the wire per frame, excluding the checksum
pub const SEPTET_ENCODED_LEN: usize = 8;

/// Encode seven payload bytes into eight 7-bit-clean bytes
pub fn encode_septet(src: &[u8; SEPTET_SOURCE_LEN]) -> [u8; SEPTET_ENCODED_LEN] {
    let mut dst = [0u8; SEPTET_ENCODED_LEN];
    extract_septet(src, &mut dst);
    dst
}

/// Decode eight 7-bit-clean bytes back into seven payload bytes
pub fn decode_septet(src: &[u8; SEPTET_ENCODED_LEN]) -> [u8; SEPTET_SOURCE_LEN] {
    let mut dst = [0u8; SEPTET_SOURCE_LEN];
    inject_septet(src, &mut dst);
    dst
}

/// Encode `src` (up to 7 bytes) into `dst`, writing `src.len() + 1` bytes
///
/// Callers size both slices from the frame layout; the public entry points
/// are the fixed-size [`encode_septet`] and [`decode_septet`].
pub(crate) fn extract_septet(src: &[u8], dst: &mut [u8]) {
    debug_assert!(src.len() <= SEPTET_SOURCE_LEN && dst.len() > src.len());
    let mut septet = 0u8;
    for (i, &b) in src.iter().enumerate() {
        if b & 0x80 != 0 {
            septet |= 1 << i;
        }
        dst[i] = b & 0x7F;
    }
    dst[src.len()] = septet;
}

/// Decode `src` (payload bytes followed by the septet byte) into `dst`
///
/// `dst.len()` decides how many payload bytes are restored.
pub(crate) fn inject_septet(src: &[u8], dst: &mut [u8]) {
    debug_assert!(dst.len() <= SEPTET_SOURCE_LEN && src.len() > dst.len());
    let septet = src[dst.len()];
    for (i, b) in dst.iter_mut().enumerate() {
        *b = if septet & (1 << i) != 0 {
            src[i] | 0x80
        } else {
            src[i]
        };
    }
}
