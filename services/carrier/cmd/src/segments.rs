//! Batch conversion of media segment directories.
//!
//! `pack` turns every `seg_NNNNN.ts` in a directory into a carrier PNG and
//! records what it wrote in a JSON manifest. `unpack` goes the other way and
//! skips any image that does not decode.

use anyhow::{Context, Result};
use bytes::Bytes;
use carrier_codec::{Decoder, Encoder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SEGMENT_STEM_PREFIX: &str = "seg_";
const SEGMENT_DIGITS: usize = 5;

/// A segment file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Numeric segment index
    pub index: u32,
    /// File stem as found, e.g. `seg_00001`
    pub stem: String,
    /// Full path
    pub path: PathBuf,
}

/// One line of the pack manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Source segment file name
    pub segment: String,
    /// Written PNG file name
    pub png: String,
    /// iTXt parts in the PNG
    pub parts: usize,
    /// PNG size in bytes
    pub bytes: usize,
}

/// Options for [`pack`]
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Prefix for output names; the directory basename when absent
    pub name: Option<String>,
    /// Leave sources in place
    pub keep_source: bool,
    /// Manifest file name inside the directory
    pub manifest: String,
}

/// What [`unpack`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    /// Segment files written
    pub written: Vec<String>,
    /// PNGs that failed to decode
    pub skipped: Vec<String>,
}

/// Index of a `seg_NNNNN` stem, case-insensitive
pub fn stem_index(stem: &str) -> Option<u32> {
    if stem.len() != SEGMENT_STEM_PREFIX.len() + SEGMENT_DIGITS {
        return None;
    }
    let head = stem.get(..SEGMENT_STEM_PREFIX.len())?;
    let digits = stem.get(SEGMENT_STEM_PREFIX.len()..)?;
    if !head.eq_ignore_ascii_case(SEGMENT_STEM_PREFIX)
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Index of a `seg_NNNNN.ts` file name
pub fn segment_index(file_name: &str) -> Option<u32> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case("ts") {
        return None;
    }
    stem_index(stem)
}

/// Segment stem at the end of a carrier PNG name, e.g. `show seg_00001.png`
pub fn carrier_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case("png") {
        return None;
    }
    let start = stem.len().checked_sub(SEGMENT_STEM_PREFIX.len() + SEGMENT_DIGITS)?;
    let tail = stem.get(start..)?;
    stem_index(tail).map(|_| tail)
}

async fn file_names(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push((name.to_string(), entry.path()));
        }
    }
    Ok(names)
}

/// Segment files in `dir`, ascending by index
pub async fn list_segments(dir: &Path) -> Result<Vec<Segment>> {
    let mut segments: Vec<Segment> = file_names(dir)
        .await?
        .into_iter()
        .filter_map(|(name, path)| {
            let index = segment_index(&name)?;
            let stem = name.rsplit_once('.')?.0.to_string();
            Some(Segment { index, stem, path })
        })
        .collect();

    segments.sort_by_key(|s| s.index);
    Ok(segments)
}

fn dir_basename(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Encode every segment in `dir` and write the manifest
pub async fn pack(
    dir: &Path,
    encoder: &Encoder,
    options: &PackOptions,
) -> Result<Vec<ManifestEntry>> {
    let name = options.name.clone().unwrap_or_else(|| dir_basename(dir));
    let segments = list_segments(dir).await?;
    crate::component_info!("pack", "Packing {} segments in {}", segments.len(), dir.display());

    let mut manifest = Vec::with_capacity(segments.len());
    for segment in segments {
        let payload = tokio::fs::read(&segment.path)
            .await
            .with_context(|| format!("failed to read {}", segment.path.display()))?;

        let worker = encoder.clone();
        let (container, report) =
            tokio::task::spawn_blocking(move || worker.encode_report(&payload, None))
                .await?
                .with_context(|| format!("failed to encode {}", segment.path.display()))?;

        let png = format!("{}{}.png", name, segment.stem);
        tokio::fs::write(dir.join(&png), &container)
            .await
            .with_context(|| format!("failed to write {}", png))?;

        let source = segment
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !options.keep_source {
            tokio::fs::remove_file(&segment.path)
                .await
                .with_context(|| format!("failed to remove {}", segment.path.display()))?;
        }

        crate::component_debug!(
            "pack",
            parts = report.parts,
            bytes = report.container_len,
            "{} -> {}",
            source,
            png
        );

        manifest.push(ManifestEntry {
            segment: source,
            png,
            parts: report.parts,
            bytes: report.container_len,
        });
    }

    let manifest_path = dir.join(&options.manifest);
    let json = serde_json::to_vec_pretty(&manifest)?;
    tokio::fs::write(&manifest_path, json)
        .await
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    crate::component_info!(
        "pack",
        "Wrote {} images and {}",
        manifest.len(),
        manifest_path.display()
    );
    Ok(manifest)
}

/// Decode every carrier PNG in `dir` back into `seg_NNNNN.ts`
pub async fn unpack(dir: &Path, decoder: &Decoder, prefix: &str) -> Result<UnpackSummary> {
    let mut pngs: Vec<(String, String, PathBuf)> = file_names(dir)
        .await?
        .into_iter()
        .filter_map(|(name, path)| {
            let stem = carrier_stem(&name)?.to_ascii_lowercase();
            Some((name, stem, path))
        })
        .collect();
    pngs.sort();

    let mut summary = UnpackSummary::default();
    for (name, stem, path) in pngs {
        let body = Bytes::from(
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        );

        let worker = decoder.clone();
        let owned_prefix = prefix.to_string();
        let decoded =
            tokio::task::spawn_blocking(move || worker.decode(&body, &owned_prefix)).await?;

        match decoded {
            Ok(payload) => {
                let out = format!("{}.ts", stem);
                tokio::fs::write(dir.join(&out), &payload)
                    .await
                    .with_context(|| format!("failed to write {}", out))?;
                crate::component_debug!("unpack", bytes = payload.len(), "{} -> {}", name, out);
                summary.written.push(out);
            }
            Err(e) => {
                crate::component_warn!("unpack", "Skipping {}: {}", name, e);
                summary.skipped.push(name);
            }
        }
    }

    crate::component_info!(
        "unpack",
        "Restored {} segments, skipped {}",
        summary.written.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
