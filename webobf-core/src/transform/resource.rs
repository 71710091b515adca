//! Binary resource noise
//!
//! Appends random bytes to images and media. The original bytes are kept as-is,
//! only the file size and checksum change.

use std::ops::Range;

use rand::{Rng, RngCore};

/// Number of noise bytes appended, chosen uniformly per file
pub const NOISE_LEN: Range<usize> = 32..52;

/// Append a random run of [`NOISE_LEN`] bytes to `content`
pub fn append_noise(mut content: Vec<u8>) -> Vec<u8> {
    // ThreadRng is a CSPRNG reseeded from the OS
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(NOISE_LEN);
    let start = content.len();
    content.resize(start + len, 0);
    rng.fill_bytes(&mut content[start..]);
    content
}
