//! Device copy queue - moves converted books onto a connected e-reader
//!
//! Per item: copy the book file (preserving its modification time), mirror
//! the `.sdr` reading-position sidecar directory if one exists, then ask
//! the cover-sync collaborator for a thumbnail. Every step is best-effort:
//! a fault is recorded in the item's [`CopyOutcome`] and logged, and the
//! batch always continues. Frontends receive no per-item failure signal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::queue::JobProcessor;
use crate::types::{CopyOutcome, CopyStage};

/// Thumbnail target size expected by Kindle-style readers.
pub const THUMBNAIL_WIDTH: u32 = 330;
pub const THUMBNAIL_HEIGHT: u32 = 470;

/// Suffix of the reading-position sidecar directory next to a book file.
pub const SIDECAR_SUFFIX: &str = "sdr";

/// External cover thumbnail generator.
pub trait CoverSync: Send + Sync {
    fn sync_cover(
        &self,
        file: &Path,
        thumbnail_dir: &Path,
        width: u32,
        height: u32,
        stretch: bool,
        overwrite: bool,
    ) -> Result<()>;
}

/// Cover sync that does nothing. Used when no sync tool is configured.
pub struct NoopCoverSync;

impl CoverSync for NoopCoverSync {
    fn sync_cover(
        &self,
        file: &Path,
        _thumbnail_dir: &Path,
        _width: u32,
        _height: u32,
        _stretch: bool,
        _overwrite: bool,
    ) -> Result<()> {
        log::debug!("no cover sync configured, skipping {}", file.display());
        Ok(())
    }
}

/// Whether the device looks connected: its documents directory exists.
pub fn is_device_connected(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_dir()
}

/// Locate the device's thumbnail directory: `system/thumbnails` next to
/// the documents directory, i.e. under the device root. `None` when the
/// device has no such directory.
pub fn probe_thumbnail_dir(device_root: &Path) -> Option<PathBuf> {
    let absolute = device_root
        .canonicalize()
        .unwrap_or_else(|_| device_root.to_path_buf());
    let candidate = absolute.parent()?.join("system").join("thumbnails");
    candidate.is_dir().then_some(candidate)
}

/// Per-item device copy work.
pub struct CopyProcessor {
    device_root: PathBuf,
    thumbnail_dir: Option<PathBuf>,
    sync_covers: bool,
    cover_sync: Arc<dyn CoverSync>,
}

impl CopyProcessor {
    /// The thumbnail directory is resolved once here, not per item.
    pub fn new(device_root: PathBuf, sync_covers: bool, cover_sync: Arc<dyn CoverSync>) -> Self {
        let thumbnail_dir = probe_thumbnail_dir(&device_root);
        Self {
            device_root,
            thumbnail_dir,
            sync_covers,
            cover_sync,
        }
    }

    fn copy_item(&self, source: &Path) -> CopyOutcome {
        // The device may disconnect mid-batch; re-checked per item
        if !self.device_root.exists() {
            return CopyOutcome::DeviceMissing;
        }

        let Some(file_name) = source.file_name() else {
            return CopyOutcome::Failed {
                stage: CopyStage::CopyFile,
            };
        };
        let dest = self.device_root.join(file_name);
        if copy_with_mtime(source, &dest).is_err() {
            return CopyOutcome::Failed {
                stage: CopyStage::CopyFile,
            };
        }

        let mut sidecar = false;
        let source_sdr = source.with_extension(SIDECAR_SUFFIX);
        if source_sdr.is_dir() {
            let dest_sdr = dest.with_extension(SIDECAR_SUFFIX);
            if replace_dir_tree(&source_sdr, &dest_sdr).is_err() {
                return CopyOutcome::Failed {
                    stage: CopyStage::Sidecar,
                };
            }
            sidecar = true;
        }

        let mut thumbnail = false;
        if self.sync_covers {
            if let Some(thumbnail_dir) = &self.thumbnail_dir {
                if dest.exists() {
                    match self.cover_sync.sync_cover(
                        &dest,
                        thumbnail_dir,
                        THUMBNAIL_WIDTH,
                        THUMBNAIL_HEIGHT,
                        false,
                        false,
                    ) {
                        Ok(()) => thumbnail = true,
                        Err(_) => {
                            return CopyOutcome::Failed {
                                stage: CopyStage::Thumbnail,
                            }
                        }
                    }
                }
            }
        }

        CopyOutcome::Copied { sidecar, thumbnail }
    }
}

impl JobProcessor for CopyProcessor {
    type Outcome = CopyOutcome;

    fn process(&mut self, source: &Path) -> CopyOutcome {
        let outcome = self.copy_item(source);
        match &outcome {
            CopyOutcome::DeviceMissing => log::warn!(
                "device root {} is gone, skipping {}",
                self.device_root.display(),
                source.display()
            ),
            CopyOutcome::Failed { stage } => log::warn!(
                "copy of {} stopped at {} stage",
                source.display(),
                stage
            ),
            CopyOutcome::Copied { .. } => {}
        }
        outcome
    }
}

/// `fs::copy` plus the source's modification time on the destination.
fn copy_with_mtime(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest)?;
    let modified = fs::metadata(source)?.modified()?;
    let file = fs::OpenOptions::new().write(true).open(dest)?;
    file.set_modified(modified)?;
    Ok(())
}

/// Replace `dest` with a copy of the directory tree at `src`. Any existing
/// tree at `dest` is removed first, never merged into.
fn replace_dir_tree(src: &Path, dest: &Path) -> io::Result<()> {
    if dest.is_dir() {
        fs::remove_dir_all(dest)?;
    }
    copy_dir_recursive(src, dest)
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
