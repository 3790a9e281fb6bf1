use rayon::prelude::*;
use tracing::debug;

use crate::{
    dxt::{self, Block},
    format::BLOCK_DIM,
    tiling::tiled_block_index,
    CompressedTexture, PixelBuffer, TextureError, TextureFormat,
};

/// Compresses `buffer` into a tiled surface of the same size.
///
/// The buffer must already have the target dimensions, and both must be multiples of
/// the block size.
pub fn encode(
    buffer: &PixelBuffer,
    format: TextureFormat,
) -> Result<CompressedTexture, TextureError> {
    let (width, height) = buffer.dimensions();
    let (blocks_wide, blocks_high) = block_grid(width, height)?;
    let block_size = format.block_size();

    debug!("Encoding {width}x{height} {format:?} surface");

    let mut linear = vec![0u8; blocks_wide * blocks_high * block_size];
    linear
        .par_chunks_mut(blocks_wide * block_size)
        .enumerate()
        .for_each(|(by, row)| {
            for (bx, dst) in row.chunks_exact_mut(block_size).enumerate() {
                dxt::encode_block(format, &read_block(buffer, bx, by), dst);
            }
        });

    let mut data = vec![0u8; linear.len()];
    for (i, block) in linear.chunks_exact(block_size).enumerate() {
        let (bx, by) = (i % blocks_wide, i / blocks_wide);
        let dst = tiled_block_index(bx, by, blocks_wide, blocks_high) * block_size;
        data[dst..dst + block_size].copy_from_slice(block);
    }

    Ok(CompressedTexture {
        width,
        height,
        format,
        data,
    })
}

pub fn decode(texture: &CompressedTexture) -> Result<PixelBuffer, TextureError> {
    decode_raw(&texture.data, texture.width, texture.height, texture.format)
}

/// Decompresses a tiled surface. `data` must be exactly the surface size.
pub fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    format: TextureFormat,
) -> Result<PixelBuffer, TextureError> {
    let (blocks_wide, blocks_high) = block_grid(width, height)?;
    let expected = format.surface_size(width, height);
    if data.len() != expected {
        return Err(TextureError::CorruptBlockData {
            expected,
            actual: data.len(),
        });
    }

    debug!(
        "Decoding {width}x{height} {format:?} surface (alpha plane: {})",
        format.has_alpha_plane()
    );

    let block_size = format.block_size();
    let row_stride = width as usize * 4;
    let mut pixels = vec![0u8; row_stride * height as usize];
    pixels
        .par_chunks_mut(row_stride * BLOCK_DIM as usize)
        .enumerate()
        .for_each(|(by, rows)| {
            for bx in 0..blocks_wide {
                let src = tiled_block_index(bx, by, blocks_wide, blocks_high) * block_size;
                let block = dxt::decode_block(format, &data[src..src + block_size]);
                for (i, texel) in block.iter().enumerate() {
                    let offset = (i / 4) * row_stride + (bx * 4 + i % 4) * 4;
                    rows[offset..offset + 4].copy_from_slice(texel);
                }
            }
        });

    PixelBuffer::new(width, height, pixels)
}

fn block_grid(width: u32, height: u32) -> Result<(usize, usize), TextureError> {
    if width == 0 || height == 0 || width % BLOCK_DIM != 0 || height % BLOCK_DIM != 0 {
        return Err(TextureError::UnsupportedDimension { width, height });
    }

    Ok(((width / BLOCK_DIM) as usize, (height / BLOCK_DIM) as usize))
}

fn read_block(buffer: &PixelBuffer, bx: usize, by: usize) -> Block {
    let pixels = buffer.pixels();
    let width = buffer.width() as usize;
    let mut block = [[0u8; 4]; 16];
    for (i, texel) in block.iter_mut().enumerate() {
        let (x, y) = (bx * 4 + i % 4, by * 4 + i / 4);
        *texel = pixels[y * width + x];
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[
                    (x * 255 / (width - 1)) as u8,
                    (y * 255 / (height - 1)) as u8,
                    128,
                    255,
                ]);
            }
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    fn max_error(a: &PixelBuffer, b: &PixelBuffer) -> u8 {
        a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .map(|(x, y)| x.abs_diff(*y))
            .max()
            .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_dimensions() {
        for (width, height) in [(64, 64), (420, 96), (1000, 564), (128, 64)] {
            let source = gradient(width, height);
            let texture = encode(&source, TextureFormat::Dxt1).unwrap();
            assert_eq!(
                texture.data.len(),
                (width * height / 16 * 8) as usize,
                "{width}x{height}"
            );

            let decoded = decode(&texture).unwrap();
            assert_eq!(decoded.dimensions(), (width, height));
            assert!(max_error(&source, &decoded) <= 32, "{width}x{height}");
        }
    }

    #[test]
    fn test_round_trip_dxt3() {
        let mut source = gradient(32, 16).as_bytes().to_vec();
        for (i, texel) in source.chunks_exact_mut(4).enumerate() {
            texel[3] = (i % 256) as u8;
        }
        let source = PixelBuffer::new(32, 16, source).unwrap();

        let texture = encode(&source, TextureFormat::Dxt3).unwrap();
        assert_eq!(texture.data.len(), 32 * 16);
        let decoded = decode(&texture).unwrap();
        assert!(max_error(&source, &decoded) <= 32);
    }

    #[test]
    fn test_rejects_unaligned_dimensions() {
        let source = gradient(1000, 562);
        assert!(matches!(
            encode(&source, TextureFormat::Dxt1),
            Err(TextureError::UnsupportedDimension {
                width: 1000,
                height: 562
            })
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = decode_raw(&[0; 100], 16, 16, TextureFormat::Dxt1).unwrap_err();
        assert!(matches!(
            err,
            TextureError::CorruptBlockData {
                expected: 128,
                actual: 100
            }
        ));

        // DXT3 surfaces are twice the size
        assert!(decode_raw(&[0; 128], 16, 16, TextureFormat::Dxt3).is_err());
    }

    #[test]
    fn test_blocks_are_tiled() {
        // every block a distinct solid grey level, 16x16 blocks
        let (width, height) = (64u32, 64u32);
        let mut data = vec![0u8; (width * height * 4) as usize];
        for y in 0..height {
            for x in 0..width {
                let level = ((y / 4) * 16 + (x / 4)) as u8;
                let offset = ((y * width + x) * 4) as usize;
                data[offset..offset + 4].copy_from_slice(&[level, level, level, 255]);
            }
        }
        let source = PixelBuffer::new(width, height, data).unwrap();
        let texture = encode(&source, TextureFormat::Dxt1).unwrap();

        let second = dxt::decode_block(TextureFormat::Dxt1, &texture.data[8..16]);
        let expected = dxt::decode_block(TextureFormat::Dxt1, &{
            let mut block = [0u8; 8];
            dxt::encode_block(TextureFormat::Dxt1, &[[16, 16, 16, 255]; 16], &mut block);
            block
        });
        // stream position 1 holds block (0, 1), not block (1, 0)
        assert_eq!(second, expected);
    }
}
