//! Flat MP4 atom scan over the head of the file.

/// Bytes scanned from the front of the container; atoms past this point
/// are ignored.
pub const MAX_SCAN_BYTES: usize = 10 * 1024 * 1024;

/// One atom: 4-byte ASCII type plus payload.
#[derive(Clone, Debug)]
pub struct Atom<'a> {
    pub kind: String,
    pub data: &'a [u8],
}

/// Scan the first [`MAX_SCAN_BYTES`] as a flat atom list
/// `{size: u32 BE, type: ASCII[4], data: size - 8}`. Atoms whose declared
/// size is under 8 or overruns the buffer are stepped past byte by byte,
/// matching a tolerant recovery scan rather than a strict demux.
pub fn atoms(bytes: &[u8]) -> Vec<Atom<'_>> {
    let window = &bytes[..bytes.len().min(MAX_SCAN_BYTES)];
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= window.len() {
        let size = u32::from_be_bytes([
            window[pos],
            window[pos + 1],
            window[pos + 2],
            window[pos + 3],
        ]) as usize;
        if size < 8 || size > window.len() - pos {
            pos += 1;
            continue;
        }
        let kind: String = window[pos + 4..pos + 8]
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '\u{fffd}' })
            .collect();
        out.push(Atom {
            kind,
            data: &window[pos + 8..pos + size],
        });
        pos += size;
    }
    out
}
