use std::{borrow::Cow, fmt, io::Cursor, str::FromStr};

use aurora_texture::{codec, PixelBuffer};
use image::{DynamicImage, ImageFormat};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    container::{self, EmbeddedTexture},
    AssetError, AssetKind, AssetType, TitleId,
};

/// Output format for extracted images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl RasterFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for RasterFormat {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            _ => Err(AssetError::UnknownRasterFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ConvertedAsset {
    pub asset_type: AssetType,
    /// `<prefix><titleid>.asset`
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub kind: AssetKind,
    /// Position of the source entry in its container
    pub index: usize,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Fails unless `count` source images fit `asset_type`.
pub fn check_source_count(asset_type: AssetType, count: usize) -> Result<(), AssetError> {
    let multiplicity = asset_type.multiplicity();
    if count < multiplicity.min() {
        return Err(AssetError::TooFewSources {
            asset_type,
            min: multiplicity.min(),
            actual: count,
        });
    }

    if count > multiplicity.max() {
        return Err(AssetError::TooManySources {
            asset_type,
            max: multiplicity.max(),
            actual: count,
        });
    }

    Ok(())
}

/// Builds a container from encoded raster images (PNG/JPEG/WEBP), given in slot order.
pub fn to_asset<S>(
    asset_type: AssetType,
    title_id: &TitleId,
    sources: &[S],
) -> Result<ConvertedAsset, AssetError>
where
    S: AsRef<[u8]> + Sync,
{
    check_source_count(asset_type, sources.len())?;

    let buffers = sources
        .par_iter()
        .map(|source| decode_raster(source.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    to_asset_from_pixels(asset_type, title_id, buffers)
}

/// Same as [`to_asset`], for images that are already decoded.
pub fn to_asset_from_pixels(
    asset_type: AssetType,
    title_id: &TitleId,
    buffers: Vec<PixelBuffer>,
) -> Result<ConvertedAsset, AssetError> {
    check_source_count(asset_type, buffers.len())?;

    let textures = buffers
        .into_par_iter()
        .enumerate()
        .map(|(index, buffer)| {
            let kind = asset_type
                .slot(index)
                .ok_or(AssetError::TooManySources {
                    asset_type,
                    max: asset_type.multiplicity().max(),
                    actual: index + 1,
                })?;
            embed(kind, &buffer)
        })
        .collect::<Result<Vec<_>, AssetError>>()?;

    let bytes = container::serialize(asset_type, &textures)?;

    Ok(ConvertedAsset {
        asset_type,
        file_name: asset_type.file_name(title_id),
        bytes,
    })
}

/// Resizes `buffer` to the size `kind` requires and compresses it.
pub fn embed(kind: AssetKind, buffer: &PixelBuffer) -> Result<EmbeddedTexture, AssetError> {
    let (width, height) = kind.dimensions();

    let resized = if buffer.dimensions() == (width, height) {
        Cow::Borrowed(buffer)
    } else {
        debug!(
            "Resizing {kind} from {}x{} to {width}x{height}",
            buffer.width(),
            buffer.height()
        );
        Cow::Owned(buffer.resize_exact(width, height)?)
    };

    let texture = codec::encode(&resized.pad_to_blocks(), kind.format())?;

    Ok(EmbeddedTexture {
        width,
        height,
        texture,
    })
}

/// Decodes every embedded texture and re-encodes it as `format`, in container order.
pub fn from_asset(
    bytes: &[u8],
    format: RasterFormat,
) -> Result<Vec<ExtractedImage>, AssetError> {
    let asset = container::deserialize(bytes)?;

    asset
        .entries
        .par_iter()
        .map(|entry| {
            let pixels = entry.decode()?;
            let (width, height) = pixels.dimensions();
            Ok(ExtractedImage {
                kind: entry.kind,
                index: entry.index,
                file_name: entry.kind.output_name(entry.index, format.extension()),
                width,
                height,
                bytes: encode_raster(pixels, format)?,
            })
        })
        .collect()
}

pub fn decode_raster(bytes: &[u8]) -> Result<PixelBuffer, AssetError> {
    let image = image::load_from_memory(bytes)?;
    Ok(PixelBuffer::from_image(image.to_rgba8())?)
}

pub fn encode_raster(pixels: PixelBuffer, format: RasterFormat) -> Result<Vec<u8>, AssetError> {
    let image = pixels.into_image()?;
    let mut writer = Cursor::new(Vec::new());
    match format {
        // no alpha channel in JPEG
        RasterFormat::Jpeg => DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .write_to(&mut writer, format.image_format())?,
        _ => image.write_to(&mut writer, format.image_format())?,
    }

    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 96])
        });
        let mut writer = Cursor::new(Vec::new());
        image.write_to(&mut writer, ImageFormat::Jpeg).unwrap();
        writer.into_inner()
    }

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut writer = Cursor::new(Vec::new());
        image.write_to(&mut writer, ImageFormat::Png).unwrap();
        writer.into_inner()
    }

    fn title() -> TitleId {
        "4D5308DE".parse().unwrap()
    }

    #[test]
    fn test_background_from_jpeg() {
        let asset = to_asset(AssetType::Background, &title(), &[jpeg(1280, 720)]).unwrap();
        assert_eq!(asset.file_name, "BK4D5308DE.asset");

        let parsed = container::deserialize(&asset.bytes).unwrap();
        assert_eq!(parsed.asset_type, AssetType::Background);
        assert_eq!(parsed.header.entries.len(), 1);
        let record = parsed.header.entries[0];
        assert_eq!((record.width, record.height), (1280, 720));
        assert_eq!(record.length, 1280 * 720 / 2);
    }

    #[test]
    fn test_resizes_to_required_dimensions() {
        let asset = to_asset(AssetType::Boxart, &title(), &[png(300, 300, [1, 2, 3, 255])]).unwrap();
        let parsed = container::deserialize(&asset.bytes).unwrap();
        assert_eq!(
            (parsed.entries[0].width, parsed.entries[0].height),
            AssetKind::Boxart.dimensions()
        );
    }

    #[test]
    fn test_source_count_fails_fast() {
        // garbage bytes would fail to decode, so these errors prove nothing was decoded
        let garbage = [vec![0u8; 4]];
        assert!(matches!(
            to_asset(AssetType::BannerIcon, &title(), &garbage),
            Err(AssetError::TooFewSources { min: 2, actual: 1, .. })
        ));

        let none: [Vec<u8>; 0] = [];
        assert!(matches!(
            to_asset(AssetType::Screenshots, &title(), &none),
            Err(AssetError::TooFewSources { .. })
        ));

        let many = vec![vec![0u8; 4]; 21];
        assert!(matches!(
            to_asset(AssetType::Screenshots, &title(), &many),
            Err(AssetError::TooManySources { max: 20, actual: 21, .. })
        ));

        let two = vec![vec![0u8; 4]; 2];
        assert!(matches!(
            to_asset(AssetType::Background, &title(), &two),
            Err(AssetError::TooManySources { .. })
        ));
    }

    #[test]
    fn test_undecodable_source() {
        assert!(matches!(
            to_asset(AssetType::Background, &title(), &[vec![0u8; 16]]),
            Err(AssetError::Image(_))
        ));
    }

    #[test]
    fn test_extract_boxart() {
        let asset = to_asset(AssetType::Boxart, &title(), &[jpeg(900, 600)]).unwrap();
        assert_eq!(asset.file_name, "GC4D5308DE.asset");

        let images = from_asset(&asset.bytes, RasterFormat::Png).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_name, "boxart.png");

        let decoded = image::load_from_memory(&images[0].bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (900, 600));
    }

    #[test]
    fn test_extract_then_reconvert_keeps_header() {
        let sources = [png(1920, 1080, [200, 10, 10, 255]), png(640, 360, [10, 200, 10, 255])];
        let converted = to_asset(AssetType::Screenshots, &title(), &sources).unwrap();

        let extracted = from_asset(&converted.bytes, RasterFormat::Png).unwrap();
        let names: Vec<_> = extracted.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, ["screenshot1.png", "screenshot2.png"]);
        assert!(extracted.iter().all(|i| (i.width, i.height) == (1000, 562)));

        let rasters: Vec<_> = extracted.into_iter().map(|i| i.bytes).collect();
        let rebuilt = to_asset(AssetType::Screenshots, &title(), &rasters).unwrap();

        let before = container::deserialize(&converted.bytes).unwrap().header;
        let after = container::deserialize(&rebuilt.bytes).unwrap().header;
        assert_eq!(before.magic, after.magic);
        assert_eq!(before.entries.len(), after.entries.len());
        for (a, b) in before.entries.iter().zip(&after.entries) {
            assert_eq!((a.width, a.height, a.format), (b.width, b.height, b.format));
            assert_eq!((a.offset, a.length), (b.offset, b.length));
        }
    }

    #[test]
    fn test_banner_icon_extraction_names() {
        let sources = [png(420, 96, [0, 0, 0, 255]), png(64, 64, [255, 255, 255, 255])];
        let asset = to_asset(AssetType::BannerIcon, &title(), &sources).unwrap();
        assert_eq!(asset.file_name, "GL4D5308DE.asset");

        let images = from_asset(&asset.bytes, RasterFormat::Webp).unwrap();
        let summary: Vec<_> = images
            .iter()
            .map(|i| (i.file_name.as_str(), i.width, i.height))
            .collect();
        assert_eq!(summary, [("banner.webp", 420, 96), ("icon.webp", 64, 64)]);

        let icon = decode_raster(&images[1].bytes).unwrap();
        assert_eq!(icon.pixel(10, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn test_jpeg_output_drops_alpha() {
        let pixels = PixelBuffer::filled(8, 8, [10, 20, 30, 0]).unwrap();
        let bytes = encode_raster(pixels, RasterFormat::Jpeg).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_raster_format_parsing() {
        assert_eq!("PNG".parse::<RasterFormat>().unwrap(), RasterFormat::Png);
        assert_eq!("jpeg".parse::<RasterFormat>().unwrap(), RasterFormat::Jpeg);
        assert_eq!("webp".parse::<RasterFormat>().unwrap(), RasterFormat::Webp);
        assert!("bmp".parse::<RasterFormat>().is_err());
    }
}
