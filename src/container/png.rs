//! PNG chunk walker and text-record extraction.

use crate::container::latin1;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// One chunk: 4-byte ASCII type plus raw payload. CRCs are skipped.
#[derive(Clone, Debug)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
}

/// Keyword/text pair from a `tEXt` or `iTXt` chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRecord {
    pub keyword: String,
    pub text: String,
}

/// Walk the chunk list. Stops at `IEND`, a truncated chunk, or a length
/// that overruns the buffer.
pub fn chunks(bytes: &[u8]) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return out;
    }
    let mut pos = PNG_SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let length = u32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
            as usize;
        let kind = [bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]];
        let data_start = pos + 8;
        let Some(data_end) = data_start.checked_add(length) else {
            break;
        };
        if data_end > bytes.len() {
            break;
        }
        out.push(Chunk {
            kind,
            data: &bytes[data_start..data_end],
        });
        if &kind == b"IEND" {
            break;
        }
        // Skip the 4 CRC bytes.
        pos = data_end + 4;
    }
    out
}

/// Extract `tEXt` (keyword NUL text, Latin-1) and `iTXt` (keyword NUL rest,
/// UTF-8) records.
pub fn text_records(bytes: &[u8]) -> Vec<TextRecord> {
    let mut records = Vec::new();
    for chunk in chunks(bytes) {
        match &chunk.kind {
            b"tEXt" => {
                if let Some(nul) = chunk.data.iter().position(|&b| b == 0) {
                    if nul > 0 {
                        records.push(TextRecord {
                            keyword: latin1(&chunk.data[..nul]),
                            text: latin1(&chunk.data[nul + 1..]),
                        });
                    }
                }
            }
            b"iTXt" => {
                if let Some(nul) = chunk.data.iter().position(|&b| b == 0) {
                    if nul > 0 {
                        records.push(TextRecord {
                            keyword: latin1(&chunk.data[..nul]),
                            text: String::from_utf8_lossy(&chunk.data[nul + 1..]).into_owned(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
    records
}

/// Build a chunk with a valid length prefix and a placeholder CRC. Parsing
/// skips CRCs, so fixtures built this way walk correctly.
#[cfg(test)]
pub fn encode_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&[0u8; 4]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_png(extra_chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(encode_chunk(b"IHDR", &[0u8; 13]));
        for chunk in extra_chunks {
            bytes.extend_from_slice(chunk);
        }
        bytes.extend(encode_chunk(b"IEND", &[]));
        bytes
    }

    #[test]
    fn rejects_wrong_signature() {
        assert!(chunks(b"not a png at all").is_empty());
        assert!(chunks(&[]).is_empty());
    }

    #[test]
    fn walks_chunks_and_stops_at_iend() {
        let mut bytes = minimal_png(&[]);
        bytes.extend_from_slice(b"trailing garbage");
        let chunks = chunks(&bytes);
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].kind, b"IHDR");
        assert_eq!(&chunks[1].kind, b"IEND");
    }

    #[test]
    fn tolerates_overrunning_length() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"tEXt");
        bytes.extend_from_slice(b"short");
        assert!(chunks(&bytes).is_empty());
    }

    #[test]
    fn extracts_text_and_itxt_records() {
        let text = encode_chunk(b"tEXt", b"Software\0Midjourney v5");
        let itxt = encode_chunk(b"iTXt", b"Comment\0made with ai");
        let bytes = minimal_png(&[text, itxt]);
        let records = text_records(&bytes);
        assert_eq!(
            records,
            vec![
                TextRecord {
                    keyword: "Software".to_string(),
                    text: "Midjourney v5".to_string()
                },
                TextRecord {
                    keyword: "Comment".to_string(),
                    text: "made with ai".to_string()
                },
            ]
        );
    }

    #[test]
    fn text_chunk_without_nul_is_skipped() {
        let bad = encode_chunk(b"tEXt", b"no separator here");
        let bytes = minimal_png(&[bad]);
        assert!(text_records(&bytes).is_empty());
    }
}
