// src/sync/fingerprint.rs

use blake3::Hasher;

/// Convenience fingerprint: a stable blake3 hex digest over an ordered set
/// of fields.
///
/// The synchronizer only requires string-comparable fingerprints, so callers
/// are free to use any projection; this helper exists for collaborators that
/// want a compact, collision-resistant one. Fields are length-delimited so
/// `["ab", "c"]` and `["a", "bc"]` hash differently.
pub fn fingerprint_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Hasher::new();
    for field in fields {
        let bytes = field.as_ref();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hasher.finalize().to_hex().to_string()
}
