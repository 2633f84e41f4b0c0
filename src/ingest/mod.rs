//! Video frame ingestion.
//!
//! Frame extraction decodes a video file into a sampled RGB frame
//! sequence: every Nth source frame, capped at `max_frames`. The FFmpeg
//! backend is feature-gated; builds without it still analyze pre-decoded
//! frame sequences through [`crate::Analyzer::analyze_frames`].

#[cfg(feature = "video-ffmpeg")]
mod video_ffmpeg;

#[cfg(feature = "video-ffmpeg")]
pub use video_ffmpeg::extract_frames;

#[cfg(not(feature = "video-ffmpeg"))]
pub fn extract_frames(
    _path: &std::path::Path,
    _sample_rate: u32,
    _max_frames: u32,
) -> anyhow::Result<Vec<crate::media::RgbFrame>> {
    anyhow::bail!("video decoding not available: rebuild with the 'video-ffmpeg' feature")
}
