use std::{fmt, str::FromStr};

use crate::AssetError;

/// Title identifier, 8 hex characters. Only ever used to build filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleId([u8; 4]);

impl FromStr for TitleId {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| AssetError::InvalidTitleId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let title_id: TitleId = "4d5308de".parse().unwrap();
        assert_eq!(title_id, TitleId([0x4D, 0x53, 0x08, 0xDE]));
        assert_eq!(title_id.to_string(), "4D5308DE");
        assert_eq!(TitleId([0xFF, 0xFF, 0x07, 0xD1]).to_string(), "FFFF07D1");
    }

    #[test]
    fn test_rejects_invalid() {
        for input in ["", "4D5308D", "4D5308DE0", "4D5308DG", "0x5308DE"] {
            assert!(
                matches!(input.parse::<TitleId>(), Err(AssetError::InvalidTitleId(_))),
                "{input}"
            );
        }
    }
}
