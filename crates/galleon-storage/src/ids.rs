//! Deterministic path-derived identifiers using blake3.
//!
//! A file's identity is its absolute path: the same path always hashes to
//! the same id, so renames and moves deterministically produce the new id
//! without any stored counter. The thumbnail hash additionally folds in the
//! modification time, so a changed file gets a fresh thumbnail slot.

/// Deterministic file id: blake3 of the absolute path.
pub fn file_id(path: &str) -> String {
    blake3::hash(path.as_bytes()).to_hex().to_string()
}

/// Thumbnail correlation hash: blake3 of `path|mtime`.
///
/// `mtime` is truncated to whole seconds so sub-second filesystem jitter
/// does not orphan thumbnails.
pub fn thumb_hash(path: &str, mtime: f64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    hasher.update(&(mtime as i64).to_le_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_is_deterministic_and_path_sensitive() {
        assert_eq!(file_id("/a/b.png"), file_id("/a/b.png"));
        assert_ne!(file_id("/a/b.png"), file_id("/a/c.png"));
    }

    #[test]
    fn thumb_hash_changes_with_mtime() {
        assert_ne!(
            thumb_hash("/a/b.png", 100.0),
            thumb_hash("/a/b.png", 200.0)
        );
        // Sub-second jitter is ignored.
        assert_eq!(
            thumb_hash("/a/b.png", 100.2),
            thumb_hash("/a/b.png", 100.9)
        );
    }
}
