//! Metadata probe: EXIF, container text records, and C2PA claims.

use serde::Serialize;

use crate::config::DetectorConfig;
use crate::container::{exif, jpeg, latin1, mp4, png};

pub const NO_EXIF_INDICATOR: &str = "No EXIF data (suspicious for real camera)";
pub const MISSING_CAMERA_INDICATOR: &str = "Missing camera metadata";
pub const C2PA_SYNTHETIC_INDICATOR: &str = "C2PA indicates synthetic content";

#[derive(Clone, Debug, Default, Serialize)]
pub struct ExifScan {
    pub has_exif: bool,
    pub suspicious: bool,
    pub ai_indicators: Vec<String>,
    pub missing_camera_fields: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct C2paScan {
    pub c2pa_found: bool,
    pub is_synthetic: bool,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ContainerScan {
    pub has_metadata: bool,
    pub suspicious: bool,
    pub ai_indicators: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MetadataDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifScan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c2pa: Option<C2paScan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png: Option<ContainerScan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg: Option<ContainerScan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<ContainerScan>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MetadataReport {
    pub metadata_suspicious: bool,
    pub c2pa_synthetic: bool,
    pub indicators: Vec<String>,
    pub details: MetadataDetails,
}

/// Scan still-image container bytes.
pub fn analyze_image(bytes: &[u8], cfg: &DetectorConfig) -> MetadataReport {
    let mut general_indicators = Vec::new();

    let exif_scan = scan_exif(bytes, cfg, &mut general_indicators);
    let (container_scan, is_png) = scan_container_text(bytes, cfg);
    let c2pa_scan = scan_c2pa(bytes, &mut general_indicators);

    let container_suspicious = container_scan
        .as_ref()
        .map(|scan| scan.suspicious)
        .unwrap_or(false);

    let mut indicators = exif_scan.ai_indicators.clone();
    if let Some(scan) = &container_scan {
        indicators.extend(scan.ai_indicators.iter().cloned());
    }
    indicators.extend(general_indicators);

    let mut details = MetadataDetails {
        exif: Some(exif_scan.clone()),
        c2pa: Some(c2pa_scan.clone()),
        ..Default::default()
    };
    if is_png {
        details.png = container_scan;
    } else {
        details.jpeg = container_scan;
    }

    MetadataReport {
        metadata_suspicious: exif_scan.suspicious || container_suspicious,
        c2pa_synthetic: c2pa_scan.is_synthetic,
        indicators,
        details,
    }
}

/// Scan video container bytes (flat MP4 atom walk).
pub fn analyze_video(bytes: &[u8], cfg: &DetectorConfig) -> MetadataReport {
    let mut scan = ContainerScan::default();
    for atom in mp4::atoms(bytes) {
        let text = latin1(atom.data).to_lowercase();
        for mark in &cfg.strings.ai_watermark_strings {
            if text.contains(mark.as_str()) {
                scan.ai_indicators.push(format!("AI watermark in video: {mark}"));
            }
        }
        for encoder in &cfg.strings.synthetic_encoders {
            if text.contains(encoder.as_str()) {
                scan.ai_indicators.push(format!("Synthetic encoder: {encoder}"));
            }
        }
        scan.has_metadata = true;
    }
    scan.suspicious = !scan.ai_indicators.is_empty();

    MetadataReport {
        metadata_suspicious: scan.suspicious,
        c2pa_synthetic: false,
        indicators: scan.ai_indicators.clone(),
        details: MetadataDetails {
            video: Some(scan),
            ..Default::default()
        },
    }
}

fn scan_exif(
    bytes: &[u8],
    cfg: &DetectorConfig,
    general_indicators: &mut Vec<String>,
) -> ExifScan {
    let fields = exif::fields(bytes);
    if fields.is_empty() {
        general_indicators.push(NO_EXIF_INDICATOR.to_string());
        return ExifScan {
            has_exif: false,
            suspicious: true,
            ..Default::default()
        };
    }

    let mut ai_indicators = Vec::new();
    let software = fields
        .get("Software")
        .map(|v| v.to_lowercase())
        .unwrap_or_default();
    for tag in &cfg.strings.ai_software_tags {
        if software.contains(tag.as_str()) {
            ai_indicators.push(format!("AI software detected: {tag}"));
        }
    }
    for value in fields.values() {
        let value = value.to_lowercase();
        for mark in &cfg.strings.ai_watermark_strings {
            if value.contains(mark.as_str()) {
                ai_indicators.push(format!("AI watermark in EXIF: {mark}"));
            }
        }
    }

    let missing_camera_fields: Vec<String> = cfg
        .strings
        .camera_fields
        .iter()
        .filter(|field| !fields.contains_key(field.as_str()))
        .cloned()
        .collect();
    if missing_camera_fields.len() >= 3 {
        general_indicators.push(MISSING_CAMERA_INDICATOR.to_string());
    }

    ExifScan {
        has_exif: true,
        suspicious: !ai_indicators.is_empty() || missing_camera_fields.len() >= 3,
        ai_indicators,
        missing_camera_fields,
    }
}

/// Substring scans over PNG text records or JPEG APP payloads. Returns the
/// scan plus whether the container was PNG.
fn scan_container_text(bytes: &[u8], cfg: &DetectorConfig) -> (Option<ContainerScan>, bool) {
    let records = png::text_records(bytes);
    if !records.is_empty() || bytes.starts_with(&[0x89, b'P']) {
        let mut scan = ContainerScan {
            has_metadata: !records.is_empty(),
            ..Default::default()
        };
        for record in &records {
            let keyword = record.keyword.to_lowercase();
            let text = record.text.to_lowercase();
            for mark in &cfg.strings.ai_watermark_strings {
                if keyword.contains(mark.as_str()) || text.contains(mark.as_str()) {
                    scan.ai_indicators.push(format!("AI indicator in PNG: {mark}"));
                }
            }
            if keyword.contains("software") {
                for tag in &cfg.strings.ai_software_tags {
                    if text.contains(tag.as_str()) {
                        scan.ai_indicators.push(format!("AI software in PNG: {tag}"));
                    }
                }
            }
        }
        scan.suspicious = !scan.ai_indicators.is_empty();
        return (Some(scan), true);
    }

    let segments = jpeg::app_segments(bytes);
    if segments.is_empty() {
        return (None, false);
    }
    let mut scan = ContainerScan {
        has_metadata: true,
        ..Default::default()
    };
    for segment in &segments {
        let text = latin1(segment.data).to_lowercase();
        for mark in &cfg.strings.ai_watermark_strings {
            if text.contains(mark.as_str()) {
                scan.ai_indicators.push(format!("AI indicator in JPEG: {mark}"));
            }
        }
    }
    scan.suspicious = !scan.ai_indicators.is_empty();
    (Some(scan), false)
}

fn scan_c2pa(bytes: &[u8], general_indicators: &mut Vec<String>) -> C2paScan {
    let mut found = false;
    let mut synthetic = false;

    let mut check = |blob: &str| {
        if blob.contains("c2pa") || blob.contains("content credentials") {
            found = true;
            if blob.contains("synthetic") || blob.contains("ai") {
                synthetic = true;
            }
        }
    };

    for record in png::text_records(bytes) {
        check(&format!("{}{}", record.keyword, record.text).to_lowercase());
    }
    for segment in jpeg::app_segments(bytes) {
        check(&latin1(segment.data).to_lowercase());
    }

    if synthetic {
        general_indicators.push(C2PA_SYNTHETIC_INDICATOR.to_string());
    }
    C2paScan {
        c2pa_found: found,
        is_synthetic: synthetic,
        confidence: if synthetic { 1.0 } else { 0.0 },
    }
}
