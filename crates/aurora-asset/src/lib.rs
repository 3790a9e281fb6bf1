pub mod container;
pub mod error;
pub mod header;
pub mod kind;
pub mod pipeline;
pub mod title;
pub mod verify;

pub use error::AssetError;
pub use kind::{AssetKind, AssetType, Multiplicity, MAX_SCREENSHOTS};
pub use title::TitleId;
