use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Row;

const UNIT_SEPARATOR: u8 = 0x1f;

/// How field values are fed into the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintScheme {
    /// Plain concatenation. Matches ledgers written by earlier runs, but
    /// `("1", "23")` and `("12", "3")` collide.
    #[default]
    Concatenated,
    /// Each value is terminated by 0x1F, so values cannot straddle.
    Delimited,
}

pub fn fingerprint_values<'a>(values: impl IntoIterator<Item = &'a str>, scheme: FingerprintScheme) -> String {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.as_bytes());
        if scheme == FingerprintScheme::Delimited {
            hasher.update([UNIT_SEPARATOR]);
        }
    }
    hex::encode(hasher.finalize())
}

pub fn fingerprint(row: &Row, scheme: FingerprintScheme) -> String {
    fingerprint_values(row.values(), scheme)
}
