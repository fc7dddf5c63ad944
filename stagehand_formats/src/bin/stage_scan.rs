use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use stagehand_formats::{PakArchive, SplineFile, SplineRole, StageGeometry};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(about = "Scan a directory tree for stage assets", version)]
struct Args {
    /// Directory to scan recursively
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Write the JSON manifest here instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct AssetManifest {
    root: String,
    stages: Vec<StageSummary>,
    archives: Vec<ArchiveSummary>,
    paths: Vec<PathSummary>,
}

#[derive(Debug, Serialize)]
struct StageSummary {
    file: String,
    chunks: usize,
    visible: usize,
    solid: usize,
    texture_refs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ArchiveSummary {
    file: String,
    entries: usize,
    total_bytes: u64,
}

#[derive(Debug, Serialize)]
struct PathSummary {
    file: String,
    role: SplineRole,
    points: usize,
    total_distance: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut manifest = AssetManifest {
        root: args.root.display().to_string(),
        stages: Vec::new(),
        archives: Vec::new(),
        paths: Vec::new(),
    };

    let mut files: Vec<PathBuf> = WalkDir::new(&args.root)
        .into_iter()
        .filter_map(|res| res.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    for path in files {
        match extension_of(&path).as_deref() {
            Some("blvl") => match StageGeometry::load(&path) {
                Ok(stage) => manifest.stages.push(StageSummary {
                    file: path.display().to_string(),
                    chunks: stage.chunks.len(),
                    visible: stage.visible_count(),
                    solid: stage.solid_count(),
                    texture_refs: stage.texture_refs,
                }),
                Err(err) => eprintln!("[stage_scan] warning: {err:#}"),
            },
            Some("pak") => match PakArchive::open(&path) {
                Ok(archive) => manifest.archives.push(ArchiveSummary {
                    file: path.display().to_string(),
                    entries: archive.entries().len(),
                    total_bytes: archive
                        .entries()
                        .iter()
                        .map(|entry| u64::from(entry.size))
                        .sum(),
                }),
                Err(err) => eprintln!("[stage_scan] warning: {err:#}"),
            },
            Some("path") => match SplineFile::load(&path) {
                Ok(spline) => manifest.paths.push(PathSummary {
                    file: path.display().to_string(),
                    role: spline.role,
                    points: spline.points.len(),
                    total_distance: spline.total_distance,
                }),
                Err(err) => eprintln!("[stage_scan] warning: {err:#}"),
            },
            _ => {}
        }
    }

    let json = serde_json::to_string_pretty(&manifest).context("serializing manifest to JSON")?;
    match args.out {
        Some(out) => {
            fs::write(&out, json).with_context(|| format!("writing {}", out.display()))?;
            println!(
                "Scanned {}: {} stages, {} archives, {} paths -> {}",
                manifest.root,
                manifest.stages.len(),
                manifest.archives.len(),
                manifest.paths.len(),
                out.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
