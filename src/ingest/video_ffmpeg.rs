//! FFmpeg-backed frame extraction.
//!
//! Opens the best video stream, decodes, scales every sampled frame to
//! RGB24 and copies it out stride-aware. Sampling keeps every Nth frame
//! until `max_frames` are collected.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;

use crate::media::RgbFrame;

pub fn extract_frames(path: &Path, sample_rate: u32, max_frames: u32) -> Result<Vec<RgbFrame>> {
    ffmpeg::init().context("initialize ffmpeg")?;
    let mut input = ffmpeg::format::input(&path)
        .with_context(|| format!("failed to open video '{}' with ffmpeg", path.display()))?;
    let input_stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| anyhow::anyhow!("file has no video track"))?;
    let stream_index = input_stream.index();
    let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
        .context("load video decoder parameters")?;
    let mut decoder = context
        .decoder()
        .video()
        .context("open ffmpeg video decoder")?;

    let mut scaler = ffmpeg::software::scaling::context::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg::util::format::pixel::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::flag::Flags::BILINEAR,
    )
    .context("create ffmpeg scaler")?;

    let sample_rate = sample_rate.max(1) as u64;
    let mut frames = Vec::new();
    let mut source_index = 0u64;
    let mut decoded = ffmpeg::frame::Video::empty();
    let mut rgb_frame = ffmpeg::frame::Video::empty();

    'packets: for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder
            .send_packet(&packet)
            .context("send packet to ffmpeg decoder")?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            if source_index % sample_rate == 0 {
                scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                frames.push(frame_to_rgb(&rgb_frame)?);
                if frames.len() >= max_frames as usize {
                    break 'packets;
                }
            }
            source_index += 1;
        }
    }

    log::info!(
        "extracted {} frames from '{}' (every {}th of {} decoded)",
        frames.len(),
        path.display(),
        sample_rate,
        source_index
    );
    Ok(frames)
}

fn frame_to_rgb(frame: &ffmpeg::frame::Video) -> Result<RgbFrame> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0);
    let data = frame.data(0);

    if stride == row_bytes {
        return RgbFrame::new(data.to_vec(), width, height);
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }
    RgbFrame::new(pixels, width, height)
}
