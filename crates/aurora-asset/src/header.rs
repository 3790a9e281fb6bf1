//! On-disk layout of `.asset` files. All integers are big-endian.
//!
//! ```text
//! 0x00: magic        [u8; 4]   type tag (BKGD / GCVR / GLBI / SSHT)
//! 0x04: version      u16
//! 0x06: entry_count  u16
//! 0x08: entries      entry_count x EntryRecord (13 bytes each)
//!       zero padding, then the payloads at PAYLOAD_ALIGNMENT-aligned offsets
//! ```

use aurora_texture::TextureFormat;
use binrw::binrw;

pub const ASSET_VERSION: u16 = 1;

/// Every payload starts on a multiple of this.
pub const PAYLOAD_ALIGNMENT: u64 = 0x800;

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHeader {
    pub magic: [u8; 4],
    pub version: u16,

    #[br(temp)]
    #[bw(try_calc = u16::try_from(entries.len()))]
    entry_count: u16,

    #[br(count = entry_count as usize)]
    pub entries: Vec<EntryRecord>,
}

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecord {
    /// Logical image width, may be smaller than the stored surface
    pub width: u16,
    /// Logical image height, may be smaller than the stored surface
    pub height: u16,
    pub format: TextureFormat,
    /// Absolute offset of the payload
    pub offset: u32,
    /// Payload length in bytes
    pub length: u32,
}

impl AssetHeader {
    /// Magic, version and entry count
    pub const PREAMBLE_SIZE: u64 = 8;
    pub const ENTRY_SIZE: u64 = 13;

    /// Header size in bytes for `entry_count` entries.
    pub fn size_for(entry_count: usize) -> u64 {
        Self::PREAMBLE_SIZE + entry_count as u64 * Self::ENTRY_SIZE
    }

    /// Offset of the first payload.
    pub fn data_start(entry_count: usize) -> u64 {
        align_up(Self::size_for(entry_count), PAYLOAD_ALIGNMENT)
    }
}

pub fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}
