use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use aurora_asset::{verify, AssetType};
use glob::Pattern;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AssetReport {
    pub file: String,
    pub asset_type: Option<String>,
    pub entries: usize,
    pub issues: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FolderReport {
    pub folder: String,
    pub title_id: Option<String>,
    pub valid: bool,
    pub problems: Vec<String>,
    pub assets: Vec<AssetReport>,
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub root: String,
    pub total: usize,
    pub valid: usize,
    pub folders: Vec<FolderReport>,
}

impl ScanSummary {
    pub fn print(&self) {
        for folder in &self.folders {
            if folder.valid {
                info!("{}: ok", folder.folder);
                continue;
            }

            warn!("{}: invalid", folder.folder);
            for problem in &folder.problems {
                warn!("  {problem}");
            }
            for asset in &folder.assets {
                for issue in &asset.issues {
                    warn!("  {}: {issue}", asset.file);
                }
            }
        }

        println!("{}/{} folders valid", self.valid, self.total);
    }
}

/// Verifies the assets in every immediate sub-folder of `root`.
pub fn scan(root: &Path) -> anyhow::Result<ScanSummary> {
    let folders: Vec<PathBuf> = list(root, "*")?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();

    let folders = folders
        .par_iter()
        .map(|folder| scan_folder(folder))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(ScanSummary {
        root: root.display().to_string(),
        total: folders.len(),
        valid: folders.iter().filter(|f| f.valid).count(),
        folders,
    })
}

fn scan_folder(folder: &Path) -> anyhow::Result<FolderReport> {
    let mut assets = vec![];
    let mut types = BTreeSet::new();
    let mut title_ids = BTreeSet::new();
    let mut problems = vec![];

    for path in list(folder, "*.asset")? {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Ok((_, title_id)) = AssetType::parse_file_name(&file) {
            title_ids.insert(title_id.to_string());
        }

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let report = match verify::verify(Some(&file), &bytes) {
            Ok(report) => {
                types.insert(report.asset_type.prefix());
                AssetReport {
                    file,
                    asset_type: Some(report.asset_type.to_string()),
                    entries: report.entry_count,
                    issues: report.issues.iter().map(|i| i.to_string()).collect(),
                }
            }
            Err(e) => AssetReport {
                file,
                asset_type: None,
                entries: 0,
                issues: vec![e.to_string()],
            },
        };
        assets.push(report);
    }

    if assets.len() != AssetType::ALL.len() {
        problems.push(format!(
            "expected {} assets, found {}",
            AssetType::ALL.len(),
            assets.len()
        ));
    }

    for asset_type in AssetType::ALL {
        if !types.contains(asset_type.prefix()) {
            problems.push(format!("no valid {asset_type} asset"));
        }
    }

    if title_ids.len() > 1 {
        problems.push(format!(
            "mixed title ids: {}",
            title_ids.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }

    let valid = problems.is_empty() && assets.iter().all(|a| a.issues.is_empty());
    debug!("Scanned {}: {} assets, valid: {valid}", folder.display(), assets.len());

    Ok(FolderReport {
        folder: folder.display().to_string(),
        title_id: (title_ids.len() == 1)
            .then(|| title_ids.into_iter().next())
            .flatten(),
        valid,
        problems,
        assets,
    })
}

fn list(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let full = format!("{}/{pattern}", Pattern::escape(&dir.to_string_lossy()));
    let mut paths: Vec<PathBuf> = glob::glob(&full)
        .with_context(|| format!("Invalid path {}", dir.display()))?
        .flatten()
        .collect();
    paths.sort();

    Ok(paths)
}
