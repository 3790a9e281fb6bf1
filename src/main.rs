mod folder;
mod scan;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use aurora_asset::{
    pipeline::{self, RasterFormat},
    AssetType, TitleId,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[macro_use]
extern crate tracing;

/// Converts images to and from Aurora dashboard `.asset` files
#[derive(Parser)]
#[command(name = "aurora")]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory converted files are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image into a background asset (BK)
    Background {
        image: PathBuf,
        title_id: TitleId,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Convert an image into a boxart asset (GC)
    Boxart {
        image: PathBuf,
        title_id: TitleId,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Convert 1 to 20 images into a screenshots asset (SS)
    Screenshots {
        title_id: TitleId,
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Convert a banner and an icon into a banner/icon asset (GL)
    Bannericon {
        #[arg(long)]
        banner: PathBuf,
        #[arg(long)]
        icon: PathBuf,
        title_id: TitleId,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Convert every recognised image in a folder, writing into <output>/<title_id>/
    Folder {
        dir: PathBuf,
        title_id: TitleId,
        /// Replace assets that already exist
        #[arg(long)]
        overwrite: bool,
        /// Directory the <title_id>/ folder is created in [default: <dir>]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the images of an asset into <output>/<title_id>/
    Extract {
        asset: PathBuf,
        #[arg(short, long, default_value_t)]
        format: RasterFormat,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Check every asset folder under a root directory
    Scan {
        root: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Background {
            image,
            title_id,
            out,
        } => convert(AssetType::Background, &title_id, &[image], &out.output),
        Commands::Boxart {
            image,
            title_id,
            out,
        } => convert(AssetType::Boxart, &title_id, &[image], &out.output),
        Commands::Screenshots {
            title_id,
            images,
            out,
        } => convert(AssetType::Screenshots, &title_id, &images, &out.output),
        Commands::Bannericon {
            banner,
            icon,
            title_id,
            out,
        } => convert(AssetType::BannerIcon, &title_id, &[banner, icon], &out.output),
        Commands::Folder {
            dir,
            title_id,
            overwrite,
            output,
        } => {
            let out_root = output.as_deref().unwrap_or(&dir);
            let summary = folder::convert_folder(&dir, out_root, &title_id, overwrite)?;
            summary.into_result()
        }
        Commands::Extract { asset, format, out } => extract(&asset, format, &out.output),
        Commands::Scan { root, json } => {
            let summary = scan::scan(&root)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.print();
            }
            Ok(())
        }
    }
}

fn convert(
    asset_type: AssetType,
    title_id: &TitleId,
    images: &[PathBuf],
    output: &Path,
) -> anyhow::Result<()> {
    // before touching any file
    pipeline::check_source_count(asset_type, images.len())?;

    let sources = read_sources(images)?;
    let asset = pipeline::to_asset(asset_type, title_id, &sources)?;

    let path = output.join(&asset.file_name);
    write_file(&path, &asset.bytes)?;
    info!("Wrote {} ({} bytes)", path.display(), asset.bytes.len());

    Ok(())
}

fn extract(path: &Path, format: RasterFormat, output: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let out_dir = match AssetType::parse_file_name(&file_name) {
        Ok((_, title_id)) => output.join(title_id.to_string()),
        Err(e) => {
            warn!("{e}, extracting into a folder named after the file");
            output.join(path.file_stem().unwrap_or(path.as_os_str()))
        }
    };

    let images = pipeline::from_asset(&bytes, format)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    for image in &images {
        let image_path = out_dir.join(&image.file_name);
        write_file(&image_path, &image.bytes)?;
        info!(
            "Extracted {} {}x{} to {}",
            image.kind,
            image.width,
            image.height,
            image_path.display()
        );
    }

    Ok(())
}

pub(crate) fn read_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<u8>>> {
    paths
        .iter()
        .map(|p| fs::read(p).with_context(|| format!("Failed to read {}", p.display())))
        .collect()
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
