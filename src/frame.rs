//! A single video frame: contiguous RGB bytes in row-major order.
//!
//! Pixel format conversion happens at the I/O boundary (frame sources and
//! displays); everything in between treats the pixels as opaque apart from
//! the mirror and overlay drawing helpers below.

use anyhow::{Context, Result};
use image::{imageops, ImageBuffer, Rgb, RgbImage};

const CHANNELS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn from_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, index)
    }

    pub fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .context("Frame buffer does not match its dimensions")
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of the frame in its source stream, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Flips the frame left to right in place (selfie view).
    pub fn mirror_horizontal(&mut self) {
        let (width, height) = (self.width, self.height);
        if let Some(mut view) = ImageBuffer::<Rgb<u8>, &mut [u8]>::from_raw(width, height, self.data.as_mut_slice()) {
            imageops::flip_horizontal_in_place(&mut view);
        }
    }

    /// Draws an unfilled rectangle, clipped to the frame.
    pub fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, thickness: u32, color: [u8; 3]) {
        if width == 0 || height == 0 {
            return;
        }
        let x0 = i64::from(x);
        let y0 = i64::from(y);
        let x1 = x0 + i64::from(width) - 1;
        let y1 = y0 + i64::from(height) - 1;
        let t = i64::from(thickness.max(1));

        for py in y0..=y1 {
            for px in x0..=x1 {
                let on_edge = px - x0 < t || x1 - px < t || py - y0 < t || y1 - py < t;
                if on_edge {
                    self.put_pixel(px, py, color);
                }
            }
        }
    }

    fn put_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[offset..offset + CHANNELS].copy_from_slice(&color);
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }
}
