pub mod codec;
pub mod dxt;
pub mod format;
pub mod pixel;
pub mod tiling;

pub use format::TextureFormat;
pub use pixel::PixelBuffer;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("Unsupported texture dimensions {width}x{height}")]
    UnsupportedDimension { width: u32, height: u32 },

    #[error("Corrupt block data: expected {expected} bytes, got {actual}")]
    CorruptBlockData { expected: usize, actual: usize },

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// A block-compressed surface in console fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedTexture {
    /// Surface width, always a multiple of the block size
    pub width: u32,
    /// Surface height, always a multiple of the block size
    pub height: u32,
    pub format: TextureFormat,
    /// Tiled, 8-in-16 swapped block data
    pub data: Vec<u8>,
}
