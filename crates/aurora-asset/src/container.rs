use std::io::{Cursor, Seek, SeekFrom};

use aurora_texture::{
    codec, format::align_to_block, CompressedTexture, PixelBuffer, TextureError, TextureFormat,
};
use binrw::{BinReaderExt, BinWrite};
use tracing::debug;

use crate::{
    header::{align_up, AssetHeader, EntryRecord, ASSET_VERSION, PAYLOAD_ALIGNMENT},
    AssetError, AssetKind, AssetType,
};

/// A compressed surface plus the logical size of the image it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedTexture {
    pub width: u32,
    pub height: u32,
    pub texture: CompressedTexture,
}

/// A parsed container. Payloads borrow from the input and are decoded on demand.
#[derive(Debug)]
pub struct AssetFile<'a> {
    pub asset_type: AssetType,
    pub header: AssetHeader,
    pub entries: Vec<AssetEntry<'a>>,
}

#[derive(Debug, Clone, Copy)]
pub struct AssetEntry<'a> {
    pub kind: AssetKind,
    /// Position in the container
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: &'a [u8],
}

impl AssetEntry<'_> {
    /// Block-aligned size of the stored surface.
    pub fn surface_dimensions(&self) -> (u32, u32) {
        (align_to_block(self.width), align_to_block(self.height))
    }

    /// Decompresses the payload into an image of the entry's logical size.
    pub fn decode(&self) -> Result<PixelBuffer, AssetError> {
        let (surface_width, surface_height) = self.surface_dimensions();
        let surface = codec::decode_raw(self.data, surface_width, surface_height, self.format)?;
        if surface.dimensions() == (self.width, self.height) {
            return Ok(surface);
        }

        Ok(surface.crop(self.width, self.height)?)
    }
}

/// Writes a container holding `textures` in slot order.
pub fn serialize(
    asset_type: AssetType,
    textures: &[EmbeddedTexture],
) -> Result<Vec<u8>, AssetError> {
    let multiplicity = asset_type.multiplicity();
    if !multiplicity.allows(textures.len()) {
        return Err(AssetError::InvalidMultiplicity {
            asset_type,
            expected: multiplicity,
            actual: textures.len(),
        });
    }

    let mut offset = AssetHeader::data_start(textures.len());
    let mut entries = Vec::with_capacity(textures.len());
    for embedded in textures {
        check_surface(embedded)?;
        let length = embedded.texture.data.len() as u64;
        entries.push(EntryRecord {
            width: dimension(embedded.width, embedded.height)?,
            height: dimension(embedded.height, embedded.width)?,
            format: embedded.texture.format,
            offset: u32::try_from(offset).map_err(|_| AssetError::FileTooLarge)?,
            length: u32::try_from(length).map_err(|_| AssetError::FileTooLarge)?,
        });
        offset = align_up(offset + length, PAYLOAD_ALIGNMENT);
    }

    let header = AssetHeader {
        magic: asset_type.tag(),
        version: ASSET_VERSION,
        entries,
    };

    let mut writer = Cursor::new(Vec::new());
    header.write(&mut writer)?;
    let mut bytes = writer.into_inner();
    for (entry, embedded) in header.entries.iter().zip(textures) {
        bytes.resize(entry.offset as usize, 0);
        bytes.extend_from_slice(&embedded.texture.data);
    }

    debug!(
        "Serialized {asset_type} asset: {} entries, {} bytes",
        header.entries.len(),
        bytes.len()
    );

    Ok(bytes)
}

/// Frames a container without decoding any texture data.
pub fn deserialize(bytes: &[u8]) -> Result<AssetFile<'_>, AssetError> {
    let len = bytes.len() as u64;
    let mut reader = Cursor::new(bytes);

    let (magic, version, entry_count): ([u8; 4], u16, u16) =
        reader.read_be().map_err(|e| truncated_or(e, AssetHeader::PREAMBLE_SIZE, len))?;

    let asset_type = AssetType::from_tag(&magic).ok_or(AssetError::UnknownAssetType(magic))?;
    if version != ASSET_VERSION {
        return Err(AssetError::UnsupportedVersion(version));
    }

    reader.seek(SeekFrom::Start(0)).map_err(binrw::Error::Io)?;
    let header: AssetHeader = reader
        .read_be()
        .map_err(|e| truncated_or(e, AssetHeader::size_for(entry_count as usize), len))?;

    let multiplicity = asset_type.multiplicity();
    if !multiplicity.allows(header.entries.len()) {
        return Err(AssetError::InvalidMultiplicity {
            asset_type,
            expected: multiplicity,
            actual: header.entries.len(),
        });
    }

    let mut entries = Vec::with_capacity(header.entries.len());
    for (index, record) in header.entries.iter().enumerate() {
        let start = record.offset as u64;
        let end = start + record.length as u64;
        if end > len {
            return Err(AssetError::TruncatedFile { needed: end, len });
        }

        let kind = asset_type
            .slot(index)
            .ok_or(AssetError::InvalidMultiplicity {
                asset_type,
                expected: multiplicity,
                actual: header.entries.len(),
            })?;

        entries.push(AssetEntry {
            kind,
            index,
            width: record.width as u32,
            height: record.height as u32,
            format: record.format,
            data: &bytes[start as usize..end as usize],
        });
    }

    debug!("Parsed {asset_type} asset with {} entries", entries.len());

    Ok(AssetFile {
        asset_type,
        header,
        entries,
    })
}

/// The surface must be the block-aligned logical size and hold exactly that many blocks.
fn check_surface(embedded: &EmbeddedTexture) -> Result<(), TextureError> {
    let texture = &embedded.texture;
    let surface = (align_to_block(embedded.width), align_to_block(embedded.height));
    if embedded.width == 0 || embedded.height == 0 || (texture.width, texture.height) != surface {
        return Err(TextureError::UnsupportedDimension {
            width: texture.width,
            height: texture.height,
        });
    }

    let expected = texture.format.surface_size(texture.width, texture.height);
    if texture.data.len() != expected {
        return Err(TextureError::CorruptBlockData {
            expected,
            actual: texture.data.len(),
        });
    }

    Ok(())
}

fn dimension(value: u32, other: u32) -> Result<u16, AssetError> {
    u16::try_from(value).map_err(|_| {
        AssetError::Texture(TextureError::UnsupportedDimension {
            width: value,
            height: other,
        })
    })
}

fn truncated_or(error: binrw::Error, needed: u64, len: u64) -> AssetError {
    if error.is_eof() {
        AssetError::TruncatedFile { needed, len }
    } else {
        AssetError::Header(error)
    }
}
