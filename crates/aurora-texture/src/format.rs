use binrw::binrw;

/// Side length of a compression block, in pixels.
pub const BLOCK_DIM: u32 = 4;

/// Block-compressed surface formats, numbered the way the console GPU numbers them.
#[binrw]
#[brw(repr(u8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Two RGB565 endpoints and 2-bit indices, with optional punch-through alpha.
    Dxt1 = 0x12,
    /// Explicit 4-bit alpha followed by a DXT1 colour block.
    Dxt3 = 0x13,
}

impl TextureFormat {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Bytes per 4x4 block
    pub fn block_size(&self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 => 16,
        }
    }

    pub fn has_alpha_plane(&self) -> bool {
        matches!(self, Self::Dxt3)
    }

    /// Exact byte length of a surface of the given (block-aligned) size.
    pub fn surface_size(&self, width: u32, height: u32) -> usize {
        let blocks_x = width.div_ceil(BLOCK_DIM) as usize;
        let blocks_y = height.div_ceil(BLOCK_DIM) as usize;
        blocks_x * blocks_y * self.block_size()
    }
}

/// Rounds a dimension up to the next block boundary.
pub fn align_to_block(value: u32) -> u32 {
    value.div_ceil(BLOCK_DIM) * BLOCK_DIM
}
