//! Tolerant file-container parsers.
//!
//! Every parser here takes a byte slice and yields whatever structure it
//! can recover; malformed or truncated input produces an empty result,
//! never an error. The metadata probe is the only consumer.

pub mod exif;
pub mod jpeg;
pub mod mp4;
pub mod png;

/// Decode bytes as Latin-1 (one char per byte). Used for the lowercased
/// substring scans over opaque container payloads.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_is_total() {
        assert_eq!(latin1(b"abc"), "abc");
        assert_eq!(latin1(&[0xe9]), "\u{e9}");
        assert_eq!(latin1(&[]), "");
    }
}
