//! synthscan - synthetic-media detection kernel.
//!
//! Decides whether a still image or short video is of generative-model
//! origin without a learned classifier: many cheap, independent
//! signal-processing probes reduce the asset to named boolean detections
//! plus scalar features, and a weighted-evidence engine fuses them into a
//! verdict with a human-readable evidence trail.
//!
//! # Architecture
//!
//! - `media`: decoded containers (`RgbFrame`, `Plane`, frame sequences)
//! - `primitives`: pure signal primitives (blur, Canny, DCT, FFT,
//!   autocorrelation, Hough, dense flow)
//! - `container`: tolerant PNG/JPEG/MP4/EXIF parsers
//! - `probes`: metadata, watermark, frequency, noise, color, geometry,
//!   temporal, motion
//! - `decision`: detection kinds, the scoring engine, the verdict record
//! - `analyze`: the fixed-order per-asset pipeline
//! - `ingest`: sampled video frame extraction (feature `video-ffmpeg`)
//! - `api`: the detect HTTP surface
//!
//! Probes are pure functions of `(input, &DetectorConfig)`; the
//! configuration is immutable after startup and shared read-only across
//! concurrent analyses.

pub mod analyze;
pub mod api;
pub mod config;
pub mod container;
pub mod decision;
pub mod ingest;
pub mod media;
pub mod primitives;
pub mod probes;
pub mod stats;

pub use analyze::{Analyzer, ImageAnalysis, ImageDetails, VideoAnalysis, VideoDetails};
pub use config::{DetectorConfig, MediaKind};
pub use decision::{DecisionEngine, DetectionKind, MetricCmp, Verdict, VerdictLabel};
pub use media::{Plane, RgbFrame};
