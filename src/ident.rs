//! Identifier generation for storage keys and download filenames.
//!
//! Ids are drawn uniformly from the 62-symbol alphanumeric alphabet. They
//! exist purely to avoid filename collisions in shared storage — this is not
//! a source of cryptographic randomness.

use rand::{distr::Alphanumeric, Rng};

/// Length of the identifier part of a storage key.
pub const STORAGE_KEY_LEN: usize = 21;

/// Length of the tag embedded in downloaded-file names.
pub const DOWNLOAD_TAG_LEN: usize = 8;

/// Generate a random alphanumeric identifier of exactly `len` characters.
///
/// Each character is sampled independently from `A–Z a–z 0–9`.
pub fn generate(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
