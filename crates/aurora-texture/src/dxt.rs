//! DXT1/DXT3 block compression.
//!
//! Blocks are handed out and taken in console byte order: every 16-bit word is
//! stored byte-swapped compared to the PC layout (8-in-16 endianness).

use crate::format::TextureFormat;

/// 16 texels of a 4x4 block, row-major
pub type Block = [[u8; 4]; 16];

/// Texels below this alpha are punched through in DXT1 blocks.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Compresses one block into `dst`, which must be exactly `format.block_size()` bytes.
pub fn encode_block(format: TextureFormat, texels: &Block, dst: &mut [u8]) {
    match format {
        TextureFormat::Dxt1 => dst.copy_from_slice(&encode_color_block(texels, true)),
        TextureFormat::Dxt3 => {
            dst[..8].copy_from_slice(&encode_alpha_block(texels));
            dst[8..].copy_from_slice(&encode_color_block(texels, false));
        }
    }

    swap_8in16(dst);
}

/// Decompresses one console-order block.
pub fn decode_block(format: TextureFormat, src: &[u8]) -> Block {
    let mut raw = [0u8; 16];
    let raw = &mut raw[..src.len()];
    raw.copy_from_slice(src);
    swap_8in16(raw);

    match format {
        TextureFormat::Dxt1 => decode_color_block(raw, false),
        TextureFormat::Dxt3 => {
            let mut texels = decode_color_block(&raw[8..], true);
            for (i, texel) in texels.iter_mut().enumerate() {
                let nibble = (raw[i / 2] >> ((i % 2) * 4)) & 0x0F;
                texel[3] = nibble * 17;
            }
            texels
        }
    }
}

pub fn swap_8in16(bytes: &mut [u8]) {
    for pair in bytes.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

fn encode_alpha_block(texels: &Block) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, texel) in texels.iter().enumerate() {
        let nibble = ((texel[3] as u16 * 15 + 127) / 255) as u8;
        out[i / 2] |= nibble << ((i % 2) * 4);
    }
    out
}

/// Encodes the colour half of a block in PC byte order.
///
/// With `punch_through` set, blocks containing transparent texels switch to the
/// three-colour mode and mark those texels with index 3.
fn encode_color_block(texels: &Block, punch_through: bool) -> [u8; 8] {
    let transparent = punch_through && texels.iter().any(|t| t[3] < ALPHA_THRESHOLD);

    let (mut c0, mut c1) = match farthest_pair(texels, transparent) {
        Some((a, b)) => (to_565(a), to_565(b)),
        None => (0, 0),
    };

    // c0 > c1 selects four colours, c0 <= c1 three colours plus transparent
    if transparent == (c0 > c1) {
        std::mem::swap(&mut c0, &mut c1);
    }

    let four_color = c0 > c1;
    let palette = palette(c0, c1, four_color);
    let candidates = if four_color { &palette[..] } else { &palette[..3] };

    let mut indices = 0u32;
    for (i, texel) in texels.iter().enumerate() {
        let index = if transparent && texel[3] < ALPHA_THRESHOLD {
            3
        } else if c0 == c1 {
            0
        } else {
            nearest(candidates, texel)
        };
        indices |= index << (i * 2);
    }

    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&c0.to_le_bytes());
    out[2..4].copy_from_slice(&c1.to_le_bytes());
    out[4..8].copy_from_slice(&indices.to_le_bytes());
    out
}

fn decode_color_block(raw: &[u8], force_four_color: bool) -> Block {
    let c0 = u16::from_le_bytes([raw[0], raw[1]]);
    let c1 = u16::from_le_bytes([raw[2], raw[3]]);
    let indices = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let palette = palette(c0, c1, force_four_color || c0 > c1);

    let mut texels = [[0u8; 4]; 16];
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = palette[((indices >> (i * 2)) & 0b11) as usize];
    }
    texels
}

/// The two texels furthest apart in RGB, ignoring punched-through texels if asked.
fn farthest_pair(texels: &Block, skip_transparent: bool) -> Option<([u8; 4], [u8; 4])> {
    let mut candidates = [[0u8; 4]; 16];
    let mut count = 0;
    for texel in texels {
        if skip_transparent && texel[3] < ALPHA_THRESHOLD {
            continue;
        }
        candidates[count] = *texel;
        count += 1;
    }

    let candidates = &candidates[..count];
    let first = *candidates.first()?;
    let mut best = (first, first);
    let mut best_distance = 0;
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            let d = distance(a, b);
            if d > best_distance {
                best_distance = d;
                best = (*a, *b);
            }
        }
    }

    Some(best)
}

fn nearest(palette: &[[u8; 4]], texel: &[u8; 4]) -> u32 {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (i, color) in palette.iter().enumerate() {
        let d = distance(color, texel);
        if d < best_distance {
            best_distance = d;
            best = i as u32;
        }
    }
    best
}

fn distance(a: &[u8; 4], b: &[u8; 4]) -> u32 {
    (0..3)
        .map(|c| {
            let d = a[c] as i32 - b[c] as i32;
            (d * d) as u32
        })
        .sum()
}

fn palette(c0: u16, c1: u16, four_color: bool) -> [[u8; 4]; 4] {
    let a = from_565(c0);
    let b = from_565(c1);
    let mix = |wa: u16, wb: u16| -> [u8; 4] {
        let total = wa + wb;
        let mut out = [255u8; 4];
        for c in 0..3 {
            out[c] = ((a[c] as u16 * wa + b[c] as u16 * wb) / total) as u8;
        }
        out
    };

    if four_color {
        [a, b, mix(2, 1), mix(1, 2)]
    } else {
        [a, b, mix(1, 1), [0, 0, 0, 0]]
    }
}

fn to_565(texel: [u8; 4]) -> u16 {
    let r = (texel[0] as u16 * 31 + 127) / 255;
    let g = (texel[1] as u16 * 63 + 127) / 255;
    let b = (texel[2] as u16 * 31 + 127) / 255;
    (r << 11) | (g << 5) | b
}

fn from_565(value: u16) -> [u8; 4] {
    let r = ((value >> 11) & 0x1F) as u8;
    let g = ((value >> 5) & 0x3F) as u8;
    let b = (value & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_error(a: &Block, b: &Block) -> u8 {
        a.iter()
            .zip(b)
            .flat_map(|(x, y)| (0..4).map(move |c| x[c].abs_diff(y[c])))
            .max()
            .unwrap()
    }

    #[test]
    fn test_565_extremes() {
        assert_eq!(from_565(to_565([255, 255, 255, 255])), [255, 255, 255, 255]);
        assert_eq!(from_565(to_565([0, 0, 0, 255])), [0, 0, 0, 255]);
    }

    #[test]
    fn test_solid_block() {
        let block = [[200, 100, 50, 255]; 16];
        let mut encoded = [0u8; 8];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        let decoded = decode_block(TextureFormat::Dxt1, &encoded);
        assert!(max_error(&block, &decoded) <= 4);
    }

    #[test]
    fn test_two_color_block_is_exact() {
        let mut block = [[0, 0, 0, 255]; 16];
        for texel in block.iter_mut().step_by(3) {
            *texel = [255, 255, 255, 255];
        }
        let mut encoded = [0u8; 8];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        assert_eq!(decode_block(TextureFormat::Dxt1, &encoded), block);
    }

    #[test]
    fn test_punch_through_alpha() {
        let mut block = [[255, 0, 0, 255]; 16];
        for texel in block.iter_mut().take(8) {
            *texel = [0, 0, 0, 0];
        }
        let mut encoded = [0u8; 8];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        let decoded = decode_block(TextureFormat::Dxt1, &encoded);

        for texel in &decoded[..8] {
            assert_eq!(texel[3], 0);
        }
        for texel in &decoded[8..] {
            assert_eq!(*texel, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_fully_transparent_block() {
        let block = [[12, 34, 56, 0]; 16];
        let mut encoded = [0u8; 8];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        let decoded = decode_block(TextureFormat::Dxt1, &encoded);
        assert!(decoded.iter().all(|t| t[3] == 0));
    }

    #[test]
    fn test_dxt3_keeps_alpha_gradient() {
        let mut block = [[40, 80, 120, 0]; 16];
        for (i, texel) in block.iter_mut().enumerate() {
            texel[3] = (i * 17) as u8;
        }
        let mut encoded = [0u8; 16];
        encode_block(TextureFormat::Dxt3, &block, &mut encoded);
        let decoded = decode_block(TextureFormat::Dxt3, &encoded);
        assert!(max_error(&block, &decoded) <= 8);
    }

    #[test]
    fn test_words_are_byte_swapped() {
        let block = [[255, 255, 255, 255]; 16];
        let mut encoded = [0u8; 8];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        let c0 = u16::from_be_bytes([encoded[0], encoded[1]]);
        assert_eq!(c0, 0xFFFF);

        let mut block = [[0, 0, 255, 255]; 16];
        block[0] = [0, 0, 0, 255];
        encode_block(TextureFormat::Dxt1, &block, &mut encoded);
        // pure blue quantises to 0x001F, stored big-endian
        assert_eq!(&encoded[0..2], &[0x00, 0x1F]);
    }
}
