use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use aurora_asset::{pipeline, AssetKind, AssetType, TitleId, MAX_SCREENSHOTS};
use glob::Pattern;
use rayon::prelude::*;

/// Existing assets smaller than this are treated as broken and always rebuilt.
pub const BROKEN_ASSET_SIZE: u64 = 10 * 1024;

/// Recognised source extensions, in order of preference.
const EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// An image in the source folder, with its name lowercased for matching.
#[derive(Debug, Clone)]
struct SourceFile {
    stem: String,
    priority: usize,
    path: PathBuf,
}

impl SourceFile {
    fn new(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let priority = EXTENSIONS.iter().position(|e| *e == extension)?;

        Some(Self {
            stem,
            priority,
            path,
        })
    }

    /// `N` for a stem of the form `<prefix>N`
    fn number_after(&self, prefix: &str) -> Option<u32> {
        let digits = self.stem.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        digits.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Converted,
    Skipped,
    Missing,
}

#[derive(Debug, Default)]
pub struct FolderSummary {
    pub converted: usize,
    pub skipped: usize,
    pub missing: usize,
    pub failed: usize,
}

impl FolderSummary {
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.failed > 0 {
            anyhow::bail!("{} asset(s) failed to convert", self.failed);
        }

        if self.converted + self.skipped == 0 {
            anyhow::bail!("No source images found");
        }

        Ok(())
    }
}

/// Converts every asset type that has source images in `dir` into `<out_root>/<title_id>/`.
pub fn convert_folder(
    dir: &Path,
    out_root: &Path,
    title_id: &TitleId,
    overwrite: bool,
) -> anyhow::Result<FolderSummary> {
    let files = list_sources(dir)?;
    let out_dir = out_root.join(title_id.to_string());
    info!(
        "Found {} source image(s) in {}, writing to {}",
        files.len(),
        dir.display(),
        out_dir.display()
    );

    let results: Vec<_> = AssetType::ALL
        .par_iter()
        .map(|&asset_type| {
            let result = convert_type(asset_type, &files, title_id, &out_dir, overwrite);
            (asset_type, result)
        })
        .collect();

    let mut summary = FolderSummary::default();
    for (asset_type, result) in results {
        match result {
            Ok(Outcome::Converted) => summary.converted += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Missing) => summary.missing += 1,
            Err(e) => {
                error!("Failed to convert {asset_type}: {e:?}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "{} converted, {} skipped, {} missing, {} failed",
        summary.converted, summary.skipped, summary.missing, summary.failed
    );

    Ok(summary)
}

fn convert_type(
    asset_type: AssetType,
    files: &[SourceFile],
    title_id: &TitleId,
    out_dir: &Path,
    overwrite: bool,
) -> anyhow::Result<Outcome> {
    let Some(sources) = select_sources(asset_type, files) else {
        debug!("No source images for {asset_type}");
        return Ok(Outcome::Missing);
    };

    let path = out_dir.join(asset_type.file_name(title_id));
    if !should_write(&path, overwrite)? {
        info!("Skipping existing {}", path.display());
        return Ok(Outcome::Skipped);
    }

    let asset = pipeline::to_asset(asset_type, title_id, &crate::read_sources(&sources)?)?;
    crate::write_file(&path, &asset.bytes)?;
    info!(
        "Wrote {} from {} image(s) ({} bytes)",
        path.display(),
        sources.len(),
        asset.bytes.len()
    );

    Ok(Outcome::Converted)
}

fn list_sources(dir: &Path) -> anyhow::Result<Vec<SourceFile>> {
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let files = glob::glob(&pattern)
        .with_context(|| format!("Invalid folder path {}", dir.display()))?
        .flatten()
        .filter(|p| p.is_file())
        .filter_map(SourceFile::new)
        .collect();

    Ok(files)
}

/// Source images for `asset_type` in slot order, or `None` if any slot has no image.
fn select_sources(asset_type: AssetType, files: &[SourceFile]) -> Option<Vec<PathBuf>> {
    let mut sources = vec![];
    for &kind in asset_type.slots() {
        if kind.is_numbered() {
            sources.extend(find_numbered(kind, files));
        } else {
            match find_role(kind, files) {
                Some(path) => sources.push(path),
                None => {
                    if !sources.is_empty() {
                        warn!("Found images for {asset_type} but no {kind}, skipping");
                    }
                    return None;
                }
            }
        }
    }

    (!sources.is_empty()).then_some(sources)
}

/// `<role>.<ext>` by extension preference, then the lowest `<role>_NNN.<ext>`.
fn find_role(kind: AssetKind, files: &[SourceFile]) -> Option<PathBuf> {
    let role = kind.name();
    if let Some(file) = files
        .iter()
        .filter(|f| f.stem == role)
        .min_by_key(|f| f.priority)
    {
        return Some(file.path.clone());
    }

    let prefix = format!("{role}_");
    files
        .iter()
        .filter_map(|f| Some((f.number_after(&prefix)?, f.priority, f)))
        .min_by_key(|(number, priority, _)| (*number, *priority))
        .map(|(_, _, f)| f.path.clone())
}

/// `<role>N.<ext>` in numeric order, one file per number.
fn find_numbered(kind: AssetKind, files: &[SourceFile]) -> Vec<PathBuf> {
    let mut numbered: Vec<_> = files
        .iter()
        .filter_map(|f| Some((f.number_after(kind.name())?, f.priority, f)))
        .collect();
    numbered.sort_by_key(|(number, priority, _)| (*number, *priority));
    numbered.dedup_by_key(|(number, _, _)| *number);

    if numbered.len() > MAX_SCREENSHOTS {
        warn!(
            "Found {} {kind} images, only the first {MAX_SCREENSHOTS} are used",
            numbered.len()
        );
        numbered.truncate(MAX_SCREENSHOTS);
    }

    numbered.into_iter().map(|(_, _, f)| f.path.clone()).collect()
}

fn should_write(path: &Path, overwrite: bool) -> anyhow::Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => {
            if metadata.len() < BROKEN_ASSET_SIZE {
                warn!(
                    "{} is only {} bytes, regenerating",
                    path.display(),
                    metadata.len()
                );
                return Ok(true);
            }

            Ok(overwrite)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
    }
}
