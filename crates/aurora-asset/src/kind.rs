use std::fmt;

use aurora_texture::{format::align_to_block, TextureFormat};

use crate::{AssetError, TitleId};

/// Screenshot containers hold up to this many images.
pub const MAX_SCREENSHOTS: usize = 20;

/// Semantic role of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Background,
    Banner,
    Icon,
    Boxart,
    Screenshot,
}

struct KindInfo {
    width: u32,
    height: u32,
    format: TextureFormat,
    asset_type: AssetType,
    name: &'static str,
    /// Whether extracted images get a running number (`screenshot1`, `screenshot2`, ...)
    numbered: bool,
}

impl AssetKind {
    const fn info(self) -> KindInfo {
        match self {
            Self::Background => KindInfo {
                width: 1280,
                height: 720,
                format: TextureFormat::Dxt1,
                asset_type: AssetType::Background,
                name: "background",
                numbered: false,
            },
            Self::Banner => KindInfo {
                width: 420,
                height: 96,
                format: TextureFormat::Dxt1,
                asset_type: AssetType::BannerIcon,
                name: "banner",
                numbered: false,
            },
            Self::Icon => KindInfo {
                width: 64,
                height: 64,
                format: TextureFormat::Dxt1,
                asset_type: AssetType::BannerIcon,
                name: "icon",
                numbered: false,
            },
            Self::Boxart => KindInfo {
                width: 900,
                height: 600,
                format: TextureFormat::Dxt1,
                asset_type: AssetType::Boxart,
                name: "boxart",
                numbered: false,
            },
            Self::Screenshot => KindInfo {
                width: 1000,
                height: 562,
                format: TextureFormat::Dxt1,
                asset_type: AssetType::Screenshots,
                name: "screenshot",
                numbered: true,
            },
        }
    }

    /// Required logical size of the image.
    pub fn dimensions(self) -> (u32, u32) {
        let info = self.info();
        (info.width, info.height)
    }

    /// Block-aligned size the image is stored at.
    pub fn surface_dimensions(self) -> (u32, u32) {
        let (width, height) = self.dimensions();
        (align_to_block(width), align_to_block(height))
    }

    pub fn format(self) -> TextureFormat {
        self.info().format
    }

    /// The container this kind is stored in.
    pub fn asset_type(self) -> AssetType {
        self.info().asset_type
    }

    /// Lower-case role name, used for source and extracted image filenames.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn is_numbered(self) -> bool {
        self.info().numbered
    }

    /// Filename of an extracted image. `index` is the entry's position in its container.
    pub fn output_name(self, index: usize, extension: &str) -> String {
        if self.is_numbered() {
            format!("{}{}.{extension}", self.name(), index + 1)
        } else {
            format!("{}.{extension}", self.name())
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many textures a container holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Exactly(usize),
    Range { min: usize, max: usize },
}

impl Multiplicity {
    pub fn min(self) -> usize {
        match self {
            Self::Exactly(n) => n,
            Self::Range { min, .. } => min,
        }
    }

    pub fn max(self) -> usize {
        match self {
            Self::Exactly(n) => n,
            Self::Range { max, .. } => max,
        }
    }

    pub fn allows(self, count: usize) -> bool {
        (self.min()..=self.max()).contains(&count)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::Range { min, max } => write!(f, "{min} to {max}"),
        }
    }
}

/// The `.asset` container variants, one per filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Background,
    Boxart,
    BannerIcon,
    Screenshots,
}

struct TypeInfo {
    tag: [u8; 4],
    prefix: &'static str,
    /// Kinds of the embedded textures in order; the last one repeats.
    slots: &'static [AssetKind],
    multiplicity: Multiplicity,
    description: &'static str,
}

impl AssetType {
    pub const ALL: [AssetType; 4] = [
        Self::Background,
        Self::Boxart,
        Self::BannerIcon,
        Self::Screenshots,
    ];

    const fn info(self) -> TypeInfo {
        match self {
            Self::Background => TypeInfo {
                tag: *b"BKGD",
                prefix: "BK",
                slots: &[AssetKind::Background],
                multiplicity: Multiplicity::Exactly(1),
                description: "background",
            },
            Self::Boxart => TypeInfo {
                tag: *b"GCVR",
                prefix: "GC",
                slots: &[AssetKind::Boxart],
                multiplicity: Multiplicity::Exactly(1),
                description: "boxart",
            },
            Self::BannerIcon => TypeInfo {
                tag: *b"GLBI",
                prefix: "GL",
                slots: &[AssetKind::Banner, AssetKind::Icon],
                multiplicity: Multiplicity::Exactly(2),
                description: "banner/icon",
            },
            Self::Screenshots => TypeInfo {
                tag: *b"SSHT",
                prefix: "SS",
                slots: &[AssetKind::Screenshot],
                multiplicity: Multiplicity::Range {
                    min: 1,
                    max: MAX_SCREENSHOTS,
                },
                description: "screenshots",
            },
        }
    }

    /// Header magic
    pub fn tag(self) -> [u8; 4] {
        self.info().tag
    }

    /// Filename prefix, the first two characters of the tag
    pub fn prefix(self) -> &'static str {
        self.info().prefix
    }

    pub fn multiplicity(self) -> Multiplicity {
        self.info().multiplicity
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }

    /// Distinct slot kinds in container order.
    pub fn slots(self) -> &'static [AssetKind] {
        self.info().slots
    }

    /// Kind of the texture at `index`, if the container can hold that many.
    pub fn slot(self, index: usize) -> Option<AssetKind> {
        if index >= self.multiplicity().max() {
            return None;
        }

        let slots = self.slots();
        slots.get(index).or(slots.last()).copied()
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    /// `<prefix><titleid>.asset`
    pub fn file_name(self, title_id: &TitleId) -> String {
        format!("{}{title_id}.asset", self.prefix())
    }

    /// Splits a name like `BK4D5308DE.asset` into its type and title id.
    pub fn parse_file_name(name: &str) -> Result<(Self, TitleId), AssetError> {
        let invalid = || AssetError::InvalidFileName(name.to_string());

        let stem = name.strip_suffix(".asset").ok_or_else(invalid)?;
        let (prefix, title_id) = stem.split_at_checked(2).ok_or_else(invalid)?;
        let asset_type = Self::from_prefix(prefix).ok_or_else(invalid)?;

        Ok((asset_type, title_id.parse()?))
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
