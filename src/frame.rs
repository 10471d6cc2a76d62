//! Decoded frame buffers.
//!
//! A [`Frame`] is a tightly-packed pixel buffer paired with the timestamp the
//! decoder reported for it. Frames are owned by the decoder and lent to the
//! caller for one pull at a time; the buffer is overwritten on the next
//! decode.

use ffmpeg_next::format::Pixel;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::SamplerError;

/// Colour layout of a [`Frame`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    /// 8-bit blue/green/red (24 bpp). This is the default, and the layout
    /// most face-analysis SDKs expect.
    #[default]
    Bgr,
    /// 8-bit red/green/blue (24 bpp).
    Rgb,
    /// 8-bit grayscale (8 bpp).
    Gray,
}

impl ColorFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            ColorFormat::Bgr => Pixel::BGR24,
            ColorFormat::Rgb => Pixel::RGB24,
            ColorFormat::Gray => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel in a packed buffer of this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Bgr | ColorFormat::Rgb => 3,
            ColorFormat::Gray => 1,
        }
    }
}

/// A decoded video frame.
///
/// Produced by a [`FrameDecoder`](crate::FrameDecoder) and handed to the
/// caller by [`VideoSource::next_frame`](crate::VideoSource::next_frame).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub(crate) data: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color_format: ColorFormat,
    pub(crate) timestamp_ms: i64,
}

impl Frame {
    /// Create a frame from an existing packed buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidArgument`] if `data` does not hold
    /// exactly `width * height` pixels of `color_format`.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        color_format: ColorFormat,
        timestamp_ms: i64,
    ) -> Result<Self, SamplerError> {
        let expected = width as usize * height as usize * color_format.bytes_per_pixel();
        if data.len() != expected {
            return Err(SamplerError::InvalidArgument(format!(
                "frame buffer holds {} bytes, expected {expected} for {width}x{height} {color_format:?}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            color_format,
            timestamp_ms,
        })
    }

    /// An empty frame of the given format, used as a reusable decode target.
    pub fn empty(color_format: ColorFormat) -> Self {
        Self {
            color_format,
            ..Self::default()
        }
    }

    /// Packed pixel data, row-major, no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    /// Decoder-reported presentation time in milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Returns `true` if the frame holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn set_timestamp_ms(&mut self, timestamp_ms: i64) {
        self.timestamp_ms = timestamp_ms;
    }

    /// Copy the frame into an [`image::DynamicImage`].
    ///
    /// BGR frames are swizzled to RGB since the `image` crate has no BGR
    /// buffer type.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidArgument`] if the buffer size does not
    /// match the frame dimensions.
    pub fn to_image(&self) -> Result<DynamicImage, SamplerError> {
        let mismatch = || {
            SamplerError::InvalidArgument(format!(
                "Failed to construct image from {}x{} {:?} frame data",
                self.width, self.height, self.color_format
            ))
        };

        match self.color_format {
            ColorFormat::Rgb => {
                let image = RgbImage::from_raw(self.width, self.height, self.data.clone())
                    .ok_or_else(mismatch)?;
                Ok(DynamicImage::ImageRgb8(image))
            }
            ColorFormat::Bgr => {
                let mut swizzled = self.data.clone();
                for pixel in swizzled.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
                let image =
                    RgbImage::from_raw(self.width, self.height, swizzled).ok_or_else(mismatch)?;
                Ok(DynamicImage::ImageRgb8(image))
            }
            ColorFormat::Gray => {
                let image = GrayImage::from_raw(self.width, self.height, self.data.clone())
                    .ok_or_else(mismatch)?;
                Ok(DynamicImage::ImageLuma8(image))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_mismatched_buffer() {
        let result = Frame::new(vec![0; 5], 2, 1, ColorFormat::Bgr, 0);
        assert!(matches!(result, Err(SamplerError::InvalidArgument(_))));
    }

    #[test]
    fn bgr_to_image_swaps_channels() {
        let frame = Frame::new(vec![10, 20, 30], 1, 1, ColorFormat::Bgr, 40).unwrap();
        let image = frame.to_image().unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn gray_to_image_keeps_luma() {
        let frame = Frame::new(vec![7, 9], 2, 1, ColorFormat::Gray, 0).unwrap();
        let image = frame.to_image().unwrap();
        assert!(matches!(image, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn empty_frame_keeps_format() {
        let frame = Frame::empty(ColorFormat::Gray);
        assert!(frame.is_empty());
        assert_eq!(frame.color_format(), ColorFormat::Gray);
        assert_eq!(frame.timestamp_ms(), 0);
    }
}
