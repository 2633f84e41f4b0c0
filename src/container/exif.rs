//! EXIF extraction through the standard tag table.
//!
//! Wraps the `kamadak-exif` reader and flattens the primary image's fields
//! into a tag-name → display-string map, which is all the metadata probe
//! consumes.

use std::collections::BTreeMap;
use std::io::{BufReader, Cursor};

use exif::{In, Tag};

/// Parse EXIF from raw container bytes. Missing or malformed EXIF yields an
/// empty map.
pub fn fields(bytes: &[u8]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut reader = BufReader::new(Cursor::new(bytes));
    let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
        return out;
    };
    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        let key = if field.tag == Tag::PhotographicSensitivity {
            // EXIF 2.3 renamed ISOSpeedRatings; keep the legacy key that
            // tag-table consumers expect.
            "ISOSpeedRatings".to_string()
        } else {
            field.tag.to_string()
        };
        out.entry(key)
            .or_insert_with(|| field.display_value().to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_and_empty_input_yield_empty_maps() {
        assert!(fields(&[]).is_empty());
        assert!(fields(b"definitely not a tiff or jpeg").is_empty());
    }

    #[test]
    fn reads_tags_from_a_minimal_tiff() {
        // Little-endian TIFF with one IFD holding Make = "Acme" (ASCII).
        let mut tiff: Vec<u8> = vec![
            0x49, 0x49, 0x2A, 0x00, // II, 42
            0x08, 0x00, 0x00, 0x00, // IFD offset 8
            0x01, 0x00, // 1 entry
            0x0F, 0x01, // tag 0x010F Make
            0x02, 0x00, // type ASCII
            0x05, 0x00, 0x00, 0x00, // count 5
            0x1A, 0x00, 0x00, 0x00, // value offset 26
            0x00, 0x00, 0x00, 0x00, // next IFD
        ];
        tiff.extend_from_slice(b"Acme\0");

        let map = fields(&tiff);
        let make = map.get("Make").expect("Make field present");
        assert!(make.contains("Acme"), "Make rendered as {make}");
    }
}
