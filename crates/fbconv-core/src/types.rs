//! Types module - data structures for fbconv
//!
//! These types define the data models shared between the core and frontends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Target output format of the conversion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    Mobi,
    Azw3,
    Epub,
}

impl OutputFormat {
    /// File extension appended to destination names (no leading dot)
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mobi => "mobi",
            OutputFormat::Azw3 => "azw3",
            OutputFormat::Epub => "epub",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobi" => Ok(OutputFormat::Mobi),
            "azw3" => Ok(OutputFormat::Azw3),
            "epub" => Ok(OutputFormat::Epub),
            other => Err(Error::InvalidInput(format!(
                "unknown output format: {}",
                other
            ))),
        }
    }
}

/// Hyphenation override passed to the conversion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HyphensMode {
    Yes,
    No,
    /// Leave the decision to the engine profile
    #[default]
    Profile,
}

impl std::fmt::Display for HyphensMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyphensMode::Yes => write!(f, "yes"),
            HyphensMode::No => write!(f, "no"),
            HyphensMode::Profile => write!(f, "profile"),
        }
    }
}

impl FromStr for HyphensMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(HyphensMode::Yes),
            "no" => Ok(HyphensMode::No),
            "profile" => Ok(HyphensMode::Profile),
            other => Err(Error::InvalidInput(format!(
                "unknown hyphenation mode: {}",
                other
            ))),
        }
    }
}

/// Saved window geometry, persisted for graphical frontends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub output_format: OutputFormat,
    pub output_folder: String,
    /// Write conversion output next to each source file instead of
    /// into `output_folder`
    pub convert_to_source_dir: bool,
    pub current_profile: String,
    pub hyphens: HyphensMode,
    pub embed_font_family: Option<String>,
    /// Documents directory on the device, e.g. `/media/Kindle/documents`
    pub device_path: String,
    pub copy_to_device: bool,
    pub sync_covers: bool,
    pub write_log: bool,
    pub last_used_path: String,
    pub geometry: WindowGeometry,
    pub column_widths: [u32; 3],
}

impl Default for Settings {
    fn default() -> Self {
        let output_folder = dirs::desktop_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Self {
            output_format: OutputFormat::Mobi,
            output_folder,
            convert_to_source_dir: false,
            current_profile: "default".to_string(),
            hyphens: HyphensMode::Profile,
            embed_font_family: None,
            device_path: String::new(),
            copy_to_device: false,
            sync_covers: false,
            write_log: false,
            last_used_path: String::new(),
            geometry: WindowGeometry::default(),
            column_widths: [0, 0, 0],
        }
    }
}

/// Result of converting one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub success: bool,
    /// Resolved output path; `None` when the conversion produced nothing
    pub destination: Option<PathBuf>,
}

/// Stage of the per-item device-copy sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyStage {
    CopyFile,
    Sidecar,
    Thumbnail,
}

impl std::fmt::Display for CopyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyStage::CopyFile => write!(f, "file copy"),
            CopyStage::Sidecar => write!(f, "sidecar copy"),
            CopyStage::Thumbnail => write!(f, "thumbnail sync"),
        }
    }
}

/// Structured record of one device-copy item.
///
/// Frontends only see a bare per-file done message; this record exists so
/// the worker can log what actually happened to each item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyOutcome {
    Copied { sidecar: bool, thumbnail: bool },
    /// Device root was gone at copy time; the item is skipped, not failed
    DeviceMissing,
    Failed { stage: CopyStage },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("mobi".parse::<OutputFormat>().unwrap(), OutputFormat::Mobi);
        assert_eq!("AZW3".parse::<OutputFormat>().unwrap(), OutputFormat::Azw3);
        assert_eq!("epub".parse::<OutputFormat>().unwrap(), OutputFormat::Epub);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_hyphens_parse() {
        assert_eq!("Profile".parse::<HyphensMode>().unwrap(), HyphensMode::Profile);
        assert!("maybe".parse::<HyphensMode>().is_err());
    }
}
