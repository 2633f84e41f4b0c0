//! Decoded media containers.
//!
//! - `RgbFrame`: contiguous row-major RGB8 buffer. No alpha.
//! - `Plane`: single-channel `f32` buffer used by the signal primitives.
//!
//! Frames are immutable once constructed; probes only ever borrow them.

use anyhow::{anyhow, Result};

/// Decoded RGB image or video frame. Three bytes per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} RGB",
                data.len(),
                expected,
                width,
                height
            ));
        }
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn from_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved RGB bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// One color channel (0=R, 1=G, 2=B) as a float plane.
    pub fn channel_plane(&self, channel: usize) -> Plane {
        debug_assert!(channel < 3);
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| px[channel] as f32)
            .collect();
        Plane::from_vec(data, self.width as usize, self.height as usize)
    }

    /// True when `other` has identical dimensions.
    pub fn same_shape(&self, other: &RgbFrame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Single-channel float buffer, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Plane {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    /// Value at clamped coordinates; replicates the border.
    #[inline]
    pub fn at_clamped(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.at(x, y)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Rectangular crop. Coordinates are clamped to the plane bounds.
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> Plane {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        let x0 = x0.min(x1);
        let y0 = y0.min(y1);
        let mut out = Vec::with_capacity((x1 - x0) * (y1 - y0));
        for y in y0..y1 {
            out.extend_from_slice(&self.data[y * self.width + x0..y * self.width + x1]);
        }
        Plane::from_vec(out, x1 - x0, y1 - y0)
    }

    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max)
    }
}

/// Validate a sampled frame sequence: non-empty, identical shapes.
pub fn validate_frame_sequence(frames: &[RgbFrame]) -> Result<()> {
    let Some(first) = frames.first() else {
        return Err(anyhow!("frame sequence is empty"));
    };
    if let Some(bad) = frames.iter().find(|f| !f.same_shape(first)) {
        return Err(anyhow!(
            "frame sequence mixes shapes: {}x{} and {}x{}",
            first.width(),
            first.height(),
            bad.width(),
            bad.height()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        assert!(RgbFrame::new(vec![0u8; 10], 2, 2).is_err());
        assert!(RgbFrame::new(vec![0u8; 12], 2, 2).is_ok());
    }

    #[test]
    fn pixel_and_channel_access() {
        let data = vec![
            1, 2, 3, 4, 5, 6, //
            7, 8, 9, 10, 11, 12,
        ];
        let frame = RgbFrame::new(data, 2, 2).unwrap();
        assert_eq!(frame.pixel(1, 0), [4, 5, 6]);
        assert_eq!(frame.pixel(0, 1), [7, 8, 9]);
        let green = frame.channel_plane(1);
        assert_eq!(green.data(), &[2.0, 5.0, 8.0, 11.0]);
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let plane = Plane::from_vec((0..12).map(|v| v as f32).collect(), 4, 3);
        let crop = plane.crop(2, 1, 10, 10);
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.data(), &[6.0, 7.0, 10.0, 11.0]);
    }

    #[test]
    fn sequence_shape_validation() {
        let a = RgbFrame::new(vec![0u8; 12], 2, 2).unwrap();
        let b = RgbFrame::new(vec![0u8; 27], 3, 3).unwrap();
        assert!(validate_frame_sequence(&[a.clone(), a.clone()]).is_ok());
        assert!(validate_frame_sequence(&[a, b]).is_err());
        assert!(validate_frame_sequence(&[]).is_err());
    }
}
