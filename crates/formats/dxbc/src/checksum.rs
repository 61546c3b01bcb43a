//! Container checksum.
//!
//! The 16-byte field at offset 4 is an MD5 variant over everything from
//! offset 20 to the end of the container. Full 64-byte blocks are hashed as
//! plain MD5; the final block stores the message bit count in its first word
//! and `(bits >> 2) | 1` in its last word instead of MD5's 64-bit length
//! trailer.

use crate::reader::CHECKSUM_RANGE;

/// First byte covered by the digest (the version word).
const HASHED_FROM: usize = CHECKSUM_RANGE.end;

/// Digest over a complete container.
pub trait Checksum {
    /// Compute the digest of `container`. The existing checksum field is not
    /// part of the hashed range, so its contents do not matter.
    fn digest(&self, container: &[u8]) -> [u8; 16];
}

/// The checksum `fxc` and the D3D runtime use.
#[derive(Debug, Default, Clone, Copy)]
pub struct DxbcChecksum;

impl Checksum for DxbcChecksum {
    fn digest(&self, container: &[u8]) -> [u8; 16] {
        let data = container.get(HASHED_FROM..).unwrap_or(&[]);
        let mut md5 = Md5::new();

        let full = data.len() & !63;
        for block in data[..full].chunks_exact(64) {
            md5.transform(block);
        }

        let tail = &data[full..];
        let bits = (data.len() as u32).wrapping_mul(8);
        let bits_tail = (bits >> 2) | 1;

        let mut block = [0u8; 64];
        if tail.len() >= 56 {
            block[..tail.len()].copy_from_slice(tail);
            block[tail.len()] = 0x80;
            md5.transform(&block);

            block = [0u8; 64];
            block[0..4].copy_from_slice(&bits.to_le_bytes());
            block[60..64].copy_from_slice(&bits_tail.to_le_bytes());
            md5.transform(&block);
        } else {
            block[0..4].copy_from_slice(&bits.to_le_bytes());
            block[4..4 + tail.len()].copy_from_slice(tail);
            block[4 + tail.len()] = 0x80;
            block[60..64].copy_from_slice(&bits_tail.to_le_bytes());
            md5.transform(&block);
        }

        md5.output()
    }
}

/// Zero the checksum field, then write a fresh digest into it.
///
/// Buffers shorter than the header are left untouched.
pub fn write_checksum(container: &mut [u8], checksum: &dyn Checksum) {
    if container.len() < HASHED_FROM {
        return;
    }
    container[CHECKSUM_RANGE].fill(0);
    let digest = checksum.digest(container);
    container[CHECKSUM_RANGE].copy_from_slice(&digest);
}

/// Whether the stored checksum matches the container contents.
pub fn verify_checksum(container: &[u8]) -> bool {
    match container.get(CHECKSUM_RANGE) {
        Some(stored) => stored == DxbcChecksum.digest(container),
        None => false,
    }
}

// ── MD5 block transform ──────────────────────────────────────────────────────

const SHIFTS: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, //
    5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, //
    4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, //
    6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21,
];

/// `floor(abs(sin(i + 1)) * 2^32)`.
const K: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed, 0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

struct Md5 {
    state: [u32; 4],
}

impl Md5 {
    fn new() -> Self {
        Self {
            state: [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476],
        }
    }

    /// Process one 64-byte block. `block` must be exactly 64 bytes.
    fn transform(&mut self, block: &[u8]) {
        let mut m = [0u32; 16];
        for (word, bytes) in m.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        let [mut a, mut b, mut c, mut d] = self.state;
        for i in 0..64 {
            let (f, g) = match i / 16 {
                0 => ((b & c) | (!b & d), i),
                1 => ((d & b) | (!d & c), (5 * i + 1) % 16),
                2 => (b ^ c ^ d, (3 * i + 5) % 16),
                _ => (c ^ (b | !d), (7 * i) % 16),
            };
            let rotated = a
                .wrapping_add(f)
                .wrapping_add(K[i])
                .wrapping_add(m[g])
                .rotate_left(SHIFTS[i]);
            a = d;
            d = c;
            c = b;
            b = b.wrapping_add(rotated);
        }

        self.state[0] = self.state[0].wrapping_add(a);
        self.state[1] = self.state[1].wrapping_add(b);
        self.state[2] = self.state[2].wrapping_add(c);
        self.state[3] = self.state[3].wrapping_add(d);
    }

    fn output(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}
