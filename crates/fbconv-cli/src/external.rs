//! External collaborator processes
//!
//! The conversion engine and the cover-sync tool are separate programs;
//! these adapters shell out to them. Whether a conversion actually
//! succeeded is decided by the core from the filesystem, not from the
//! child's exit status.

use std::path::Path;
use std::process::Command;

use fbconv_core::convert::{ConvertConfig, Converter};
use fbconv_core::device::CoverSync;
use fbconv_core::error::{Error, Result};
use fbconv_core::types::HyphensMode;

/// Invokes an external conversion binary per source file.
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    pub fn new(program: String) -> Self {
        Self { program }
    }
}

impl Converter for CommandConverter {
    fn convert(&self, config: &ConvertConfig, source: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(source)
            .arg("--format")
            .arg(config.output_format.to_string())
            .arg("--profile")
            .arg(&config.profile);
        if let Some(output_dir) = &config.output_dir {
            cmd.arg("--output-dir").arg(output_dir);
        }
        match config.hyphens {
            HyphensMode::Yes => {
                cmd.arg("--hyphenate");
            }
            HyphensMode::No => {
                cmd.arg("--no-hyphenate");
            }
            HyphensMode::Profile => {}
        }
        if let Some(css) = &config.font_css {
            cmd.arg("--css").arg(css);
        }

        log::debug!("running converter: {:?}", cmd);
        let status = cmd
            .status()
            .map_err(|e| Error::Converter(format!("failed to run {}: {}", self.program, e)))?;
        if !status.success() {
            return Err(Error::Converter(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// Invokes an external thumbnail-sync binary per copied file.
pub struct CommandCoverSync {
    program: String,
}

impl CommandCoverSync {
    pub fn new(program: String) -> Self {
        Self { program }
    }
}

impl CoverSync for CommandCoverSync {
    fn sync_cover(
        &self,
        file: &Path,
        thumbnail_dir: &Path,
        width: u32,
        height: u32,
        stretch: bool,
        overwrite: bool,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(file)
            .arg(thumbnail_dir)
            .arg("--size")
            .arg(format!("{}x{}", width, height));
        if stretch {
            cmd.arg("--stretch");
        }
        if overwrite {
            cmd.arg("--overwrite");
        }

        log::debug!("running cover sync: {:?}", cmd);
        let status = cmd
            .status()
            .map_err(|e| Error::CoverSync(format!("failed to run {}: {}", self.program, e)))?;
        if !status.success() {
            return Err(Error::CoverSync(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}
