use std::borrow::Cow;

use image::{imageops::FilterType, ImageBuffer, Rgba, RgbaImage};

use crate::{format::align_to_block, TextureError};

/// An owned RGBA8 raster, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::UnsupportedDimension { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, TextureError> {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, data)
    }

    pub fn from_image(image: RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    pub fn into_image(self) -> Result<RgbaImage, TextureError> {
        let expected = self.data.len();
        ImageBuffer::from_raw(self.width, self.height, self.data).ok_or(
            TextureError::BufferSize {
                expected,
                actual: expected,
            },
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels()[y as usize * self.width as usize + x as usize]
    }

    /// Resamples to exactly `width`x`height` with a bilinear filter. Aspect ratio is not kept.
    pub fn resize_exact(&self, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::UnsupportedDimension { width, height });
        }

        if self.dimensions() == (width, height) {
            return Ok(self.clone());
        }

        let view = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(self.width, self.height, &self.data)
            .ok_or(TextureError::BufferSize {
                expected: self.width as usize * self.height as usize * 4,
                actual: self.data.len(),
            })?;

        Self::from_image(image::imageops::resize(
            &view,
            width,
            height,
            FilterType::Triangle,
        ))
    }

    /// Extends the right and bottom edges so both dimensions are block aligned.
    pub fn pad_to_blocks(&self) -> Cow<'_, Self> {
        let padded_width = align_to_block(self.width);
        let padded_height = align_to_block(self.height);
        if (padded_width, padded_height) == self.dimensions() {
            return Cow::Borrowed(self);
        }

        let mut data = Vec::with_capacity(padded_width as usize * padded_height as usize * 4);
        for y in 0..padded_height {
            let src_y = y.min(self.height - 1);
            for x in 0..padded_width {
                data.extend_from_slice(&self.pixel(x.min(self.width - 1), src_y));
            }
        }

        Cow::Owned(Self {
            width: padded_width,
            height: padded_height,
            data,
        })
    }

    /// Keeps the top-left `width`x`height` rectangle.
    pub fn crop(&self, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return Err(TextureError::UnsupportedDimension { width, height });
        }

        let row_bytes = width as usize * 4;
        let stride = self.width as usize * 4;
        let data = self
            .data
            .chunks_exact(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect();

        Self::new(width, height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            TextureError::BufferSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(matches!(
            PixelBuffer::new(0, 4, vec![]),
            Err(TextureError::UnsupportedDimension { .. })
        ));
    }

    #[test]
    fn test_resize_ignores_aspect_ratio() {
        let buffer = PixelBuffer::filled(640, 480, [10, 20, 30, 255]).unwrap();
        let resized = buffer.resize_exact(1280, 720).unwrap();
        assert_eq!(resized.dimensions(), (1280, 720));
        // a flat image stays flat under bilinear filtering
        assert_eq!(resized.pixel(700, 300), [10, 20, 30, 255]);
    }

    #[test]
    fn test_pad_replicates_edges() {
        let mut data = vec![0u8; 5 * 3 * 4];
        // mark the bottom-right pixel
        data[(2 * 5 + 4) * 4..].copy_from_slice(&[255, 0, 0, 255]);
        let buffer = PixelBuffer::new(5, 3, data).unwrap();

        let padded = buffer.pad_to_blocks();
        assert_eq!(padded.dimensions(), (8, 4));
        assert_eq!(padded.pixel(7, 3), [255, 0, 0, 255]);
        assert_eq!(padded.pixel(4, 2), [255, 0, 0, 255]);
        assert_eq!(padded.pixel(3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_pad_borrows_aligned() {
        let buffer = PixelBuffer::filled(8, 8, [1, 2, 3, 4]).unwrap();
        assert!(matches!(buffer.pad_to_blocks(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_crop_undoes_pad() {
        let data = (0..6 * 2 * 4).map(|i| i as u8).collect();
        let buffer = PixelBuffer::new(6, 2, data).unwrap();
        let cropped = buffer.pad_to_blocks().crop(6, 2).unwrap();
        assert_eq!(cropped, buffer);
    }

    #[test]
    fn test_image_conversion() {
        let image = RgbaImage::from_pixel(3, 7, Rgba([9, 8, 7, 6]));
        let buffer = PixelBuffer::from_image(image.clone()).unwrap();
        assert_eq!(buffer.dimensions(), (3, 7));
        assert_eq!(buffer.into_image().unwrap(), image);
    }
}
