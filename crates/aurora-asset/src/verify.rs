use std::fmt;

use aurora_texture::TextureFormat;

use crate::{
    container::{self, AssetEntry},
    header::{align_up, AssetHeader, PAYLOAD_ALIGNMENT},
    AssetError, AssetKind, AssetType,
};

/// A consistency problem in a container that still frames correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    PrefixMismatch {
        file_name: String,
        asset_type: AssetType,
    },
    InvalidFileName(String),
    Dimensions {
        index: usize,
        kind: AssetKind,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    Format {
        index: usize,
        kind: AssetKind,
        expected: TextureFormat,
        actual: TextureFormat,
    },
    PayloadLength {
        index: usize,
        expected: u64,
        actual: u64,
    },
    FileSize {
        expected: u64,
        actual: u64,
    },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::PrefixMismatch {
                file_name,
                asset_type,
            } => write!(
                f,
                "{file_name} holds {asset_type} data, expected prefix {}",
                asset_type.prefix()
            ),
            Issue::InvalidFileName(name) => write!(f, "invalid asset filename '{name}'"),
            Issue::Dimensions {
                index,
                kind,
                expected,
                actual,
            } => write!(
                f,
                "entry {index} ({kind}) is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Issue::Format {
                index,
                kind,
                expected,
                actual,
            } => write!(
                f,
                "entry {index} ({kind}) uses format {:#04x} ({actual:?}), expected {:#04x} ({expected:?})",
                actual.code(),
                expected.code()
            ),
            Issue::PayloadLength {
                index,
                expected,
                actual,
            } => write!(
                f,
                "entry {index} payload is {actual} bytes, expected {expected}"
            ),
            Issue::FileSize { expected, actual } => {
                write!(f, "file is {actual} bytes, expected {expected}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub asset_type: AssetType,
    pub entry_count: usize,
    pub issues: Vec<Issue>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks a container against the layout its type requires.
///
/// Returns `Err` only when the file cannot be framed at all.
pub fn verify(file_name: Option<&str>, bytes: &[u8]) -> Result<VerifyReport, AssetError> {
    let asset = container::deserialize(bytes)?;
    let mut issues = vec![];

    if let Some(name) = file_name {
        match AssetType::parse_file_name(name) {
            Ok((named_type, _)) if named_type != asset.asset_type => {
                issues.push(Issue::PrefixMismatch {
                    file_name: name.to_string(),
                    asset_type: asset.asset_type,
                })
            }
            Ok(_) => {}
            Err(_) => issues.push(Issue::InvalidFileName(name.to_string())),
        }
    }

    let mut expected_end = AssetHeader::data_start(asset.entries.len());
    for entry in &asset.entries {
        issues.extend(check_entry(entry));

        expected_end = align_up(expected_end, PAYLOAD_ALIGNMENT) + entry_size(entry);
    }

    if expected_end != bytes.len() as u64 {
        issues.push(Issue::FileSize {
            expected: expected_end,
            actual: bytes.len() as u64,
        });
    }

    Ok(VerifyReport {
        asset_type: asset.asset_type,
        entry_count: asset.entries.len(),
        issues,
    })
}

fn check_entry(entry: &AssetEntry<'_>) -> Vec<Issue> {
    let mut issues = vec![];
    let kind = entry.kind;

    let actual = (entry.width, entry.height);
    if actual != kind.dimensions() {
        issues.push(Issue::Dimensions {
            index: entry.index,
            kind,
            expected: kind.dimensions(),
            actual,
        });
    }

    if entry.format != kind.format() {
        issues.push(Issue::Format {
            index: entry.index,
            kind,
            expected: kind.format(),
            actual: entry.format,
        });
    }

    let expected_length = entry_size(entry);
    if entry.data.len() as u64 != expected_length {
        issues.push(Issue::PayloadLength {
            index: entry.index,
            expected: expected_length,
            actual: entry.data.len() as u64,
        });
    }

    issues
}

/// Payload size implied by the entry's declared size and format.
fn entry_size(entry: &AssetEntry<'_>) -> u64 {
    let (width, height) = entry.surface_dimensions();
    entry.format.surface_size(width, height) as u64
}
