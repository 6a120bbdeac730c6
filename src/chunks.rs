//! Key layout and payload splitting.
//!
//! A payload too large for one backend value is cut into ordered slices,
//! each stored under `prefix + "chunk_" + index`. Joining the slices by
//! ascending index gives back the exact payload: no separators, no
//! per-chunk encoding.

/// Backend keys used by one save slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key holding an unsplit payload.
    pub fn main_key(&self) -> String {
        format!("{}main", self.prefix)
    }

    /// Key holding the layout record.
    pub fn meta_key(&self) -> String {
        format!("{}meta", self.prefix)
    }

    pub fn chunk_key(&self, index: usize) -> String {
        format!("{}chunk_{}", self.prefix, index)
    }

    /// Data keys for a save of `chunks` values.
    pub fn data_keys(&self, chunks: usize) -> Vec<String> {
        if chunks > 1 {
            (0..chunks).map(|i| self.chunk_key(i)).collect()
        } else {
            vec![self.main_key()]
        }
    }

    /// Whether a backend key belongs to this slot.
    pub fn owns(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

/// Split `payload` into slices of at most `size` characters.
///
/// Slices never cut through a UTF-8 code point. An empty payload has no
/// slices.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn split_chunks(payload: &str, size: usize) -> Vec<&str> {
    assert!(size > 0, "chunk size must be positive");

    let mut chunks = Vec::with_capacity(payload.len() / size + 1);
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in payload.char_indices() {
        if count == size {
            chunks.push(&payload[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < payload.len() {
        chunks.push(&payload[start..]);
    }

    chunks
}

/// Concatenate slices in order.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    let total = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut joined = String::with_capacity(total);
    for chunk in chunks {
        joined.push_str(chunk.as_ref());
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_layout() {
        let keys = KeyLayout::new("gameState_");
        assert_eq!(keys.main_key(), "gameState_main");
        assert_eq!(keys.meta_key(), "gameState_meta");
        assert_eq!(keys.chunk_key(2), "gameState_chunk_2");
        assert_eq!(keys.data_keys(1), vec!["gameState_main"]);
        assert_eq!(
            keys.data_keys(2),
            vec!["gameState_chunk_0", "gameState_chunk_1"]
        );
        assert!(keys.owns("gameState_chunk_9"));
        assert!(!keys.owns("settings"));
    }

    #[test]
    fn test_join_exact_at_boundaries() {
        const C: usize = 16;
        for len in [0, 1, C - 1, C, C + 1, 3 * C, 3 * C + 1] {
            let payload: String = (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect();
            let chunks = split_chunks(&payload, C);

            assert_eq!(chunks.len(), len.div_ceil(C), "len {}", len);
            assert!(chunks.iter().all(|c| c.chars().count() <= C));
            assert_eq!(join_chunks(&chunks), payload, "len {}", len);
        }
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let payload = "골드골드골드골";
        let chunks = split_chunks(payload, 3);
        assert_eq!(chunks, vec!["골드골", "드골드", "골"]);
        assert_eq!(join_chunks(&chunks), payload);
    }

    #[test]
    #[should_panic]
    fn test_zero_chunk_size_panics() {
        split_chunks("abc", 0);
    }

    proptest! {
        #[test]
        fn prop_split_then_join_is_identity(payload in ".{0,200}", size in 1usize..64) {
            let chunks = split_chunks(&payload, size);
            prop_assert_eq!(join_chunks(&chunks), payload.clone());
            prop_assert_eq!(chunks.len(), payload.chars().count().div_ceil(size));
        }
    }
}
