//! Metadata chunking
//!
//! On-chain byte strings are limited to 64 bytes, so free-form metadata is
//! split into chunks at UTF-8 codepoint boundaries and rejoined on read.

/// Maximum chunk size in bytes
pub const METADATA_CHUNK_LEN: usize = 64;

/// Split `metadata` into chunks of at most [`METADATA_CHUNK_LEN`] bytes.
///
/// A multi-byte codepoint is never split; an empty string yields no chunks.
pub fn chunk_metadata(metadata: &str) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(metadata.len() / METADATA_CHUNK_LEN + 1);
    let mut rest = metadata;
    while !rest.is_empty() {
        let mut end = rest.len().min(METADATA_CHUNK_LEN);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}
