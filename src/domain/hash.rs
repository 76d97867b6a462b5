//! Deterministic content hashing
//!
//! An item's hash covers all of its constituent files, sorted by relative
//! path so the result is independent of filesystem read order. File mtimes
//! are never part of the hash; they are unreliable across checkouts and
//! clones and serve only as a fast-path skip in change detection.

/// Hashes a set of (relative path, content bytes) pairs.
///
/// Path and content are length-delimited so `("ab", "c")` and `("a", "bc")`
/// cannot collide.
pub fn content_hash<P, B>(files: &[(P, B)]) -> String
where
    P: AsRef<str>,
    B: AsRef<[u8]>,
{
    let mut indices: Vec<usize> = (0..files.len()).collect();
    indices.sort_by(|&a, &b| files[a].0.as_ref().cmp(files[b].0.as_ref()));

    let mut hasher = blake3::Hasher::new();
    for i in indices {
        let (path, bytes) = &files[i];
        let path = path.as_ref().as_bytes();
        let bytes = bytes.as_ref();

        hasher.update(&(path.len() as u64).to_le_bytes());
        hasher.update(path);
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }

    hasher.finalize().to_hex().to_string()
}
