//! Content hashing for deriving item identifiers

use sha2::{Digest, Sha256};

/// Separator fed to the hasher between fields.
///
/// ASCII unit separator; it cannot appear in a field unless the field was
/// quoted, so `["a,b", "c"]` and `["a", "b,c"]` hash differently.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Compute the hex-encoded SHA-256 digest of an ordered list of fields
pub fn hash_fields<S: AsRef<str>>(fields: &[S]) -> String {
    let mut hasher = Sha256::new();

    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update(field.as_ref().as_bytes());
    }

    hex::encode(hasher.finalize())
}
