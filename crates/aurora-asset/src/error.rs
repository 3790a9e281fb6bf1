use aurora_texture::TextureError;

use crate::{AssetType, Multiplicity};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("A {asset_type} asset holds {expected} textures, got {actual}")]
    InvalidMultiplicity {
        asset_type: AssetType,
        expected: Multiplicity,
        actual: usize,
    },

    #[error("Unknown asset type tag {0:02X?}")]
    UnknownAssetType([u8; 4]),

    #[error("Unsupported asset version {0}")]
    UnsupportedVersion(u16),

    #[error("Asset file is truncated: {needed} bytes needed, {len} available")]
    TruncatedFile { needed: u64, len: u64 },

    #[error("Asset data exceeds the 4 GiB offset range")]
    FileTooLarge,

    #[error("Too many source images for a {asset_type} asset: at most {max}, got {actual}")]
    TooManySources {
        asset_type: AssetType,
        max: usize,
        actual: usize,
    },

    #[error("Too few source images for a {asset_type} asset: at least {min}, got {actual}")]
    TooFewSources {
        asset_type: AssetType,
        min: usize,
        actual: usize,
    },

    #[error("Invalid title id '{0}', expected 8 hex characters")]
    InvalidTitleId(String),

    #[error("Invalid asset filename '{0}', expected [BK|GC|GL|SS]<TitleID>.asset")]
    InvalidFileName(String),

    #[error("Unknown raster format '{0}', expected png, jpeg or webp")]
    UnknownRasterFormat(String),

    #[error("Malformed asset header: {0}")]
    Header(#[from] binrw::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
