use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

pub fn sha256_hex_digest<D: AsRef<[u8]>>(data: D) -> String {
    let mut hasher = Sha256::default();
    hasher.update(data.as_ref());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Compare two byte slices without short-circuiting on the first
/// differing byte.
///
/// Slices of different length compare unequal right away; only the length
/// leaks in that case.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
