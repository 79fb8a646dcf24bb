//! Conversion queue - per-item logic around the external conversion engine
//!
//! The engine itself is a collaborator behind the [`Converter`] trait. Its
//! return value is logged but deliberately not trusted: success of an item
//! is decided solely by whether the destination file exists after the call
//! returns, so a partial engine failure can never masquerade as a result.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::queue::JobProcessor;
use crate::types::{ConversionOutcome, HyphensMode, OutputFormat, Settings};

/// External conversion engine.
pub trait Converter: Send + Sync {
    /// Convert `source` according to `config`. The output is expected at
    /// [`destination_path`]; the call's own result is advisory only.
    fn convert(&self, config: &ConvertConfig, source: &Path) -> Result<()>;
}

/// Immutable per-batch snapshot of the conversion settings.
///
/// Built once when a batch starts so that a queue never reads live-mutating
/// shared settings mid-run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub profile: String,
    pub output_format: OutputFormat,
    /// Explicit output directory, or `None` to write next to each source
    pub output_dir: Option<PathBuf>,
    pub hyphens: HyphensMode,
    /// Generated font-embedding stylesheet, when one exists
    pub font_css: Option<PathBuf>,
}

impl ConvertConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let output_dir = if settings.convert_to_source_dir {
            None
        } else {
            Some(PathBuf::from(&settings.output_folder))
        };

        let font_css = settings.embed_font_family.as_ref().and_then(|_| {
            let css = crate::db::config_dir().join("profiles").join("_font.css");
            css.exists().then_some(css)
        });

        Self {
            profile: settings.current_profile.clone(),
            output_format: settings.output_format,
            output_dir,
            hyphens: settings.hyphens,
            font_css,
        }
    }
}

/// Resolve the output path for one source file.
///
/// The item's base name lands in `output_dir` when one is configured,
/// otherwise in the source file's own directory. Only a trailing `.fb2`
/// extension is stripped (case-insensitive); a `.fb2.zip` source keeps its
/// full name. The format extension is then appended:
/// `book.fb2` + mobi -> `book.mobi`,
/// `novel.fb2.zip` + epub -> `novel.fb2.zip.epub`.
pub fn destination_path(
    source: &Path,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> PathBuf {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let full_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = match source.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("fb2") => source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(full_name),
        _ => full_name,
    };

    dir.join(format!("{}.{}", base, format.extension()))
}

/// Per-item conversion work: remove a stale output, invoke the engine,
/// decide success from the filesystem.
pub struct ConvertProcessor {
    config: ConvertConfig,
    converter: Arc<dyn Converter>,
}

impl ConvertProcessor {
    pub fn new(config: ConvertConfig, converter: Arc<dyn Converter>) -> Self {
        Self { config, converter }
    }
}

impl JobProcessor for ConvertProcessor {
    type Outcome = ConversionOutcome;

    fn process(&mut self, source: &Path) -> ConversionOutcome {
        let destination = destination_path(
            source,
            self.config.output_dir.as_deref(),
            self.config.output_format,
        );

        // A stale prior output must not masquerade as a fresh result
        if destination.exists() {
            if let Err(err) = fs::remove_file(&destination) {
                log::warn!(
                    "could not remove stale output {}: {}",
                    destination.display(),
                    err
                );
            }
        }

        if let Err(err) = self.converter.convert(&self.config, source) {
            log::warn!("converter error for {}: {}", source.display(), err);
        }

        let success = destination.exists();
        ConversionOutcome {
            source: source.to_path_buf(),
            success,
            destination: success.then_some(destination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(output_dir: Option<PathBuf>, format: OutputFormat) -> ConvertConfig {
        ConvertConfig {
            profile: "default".to_string(),
            output_format: format,
            output_dir,
            hyphens: HyphensMode::Profile,
            font_css: None,
        }
    }

    #[test]
    fn test_destination_strips_trailing_fb2_only() {
        assert_eq!(
            destination_path(Path::new("/books/book.fb2"), None, OutputFormat::Mobi),
            PathBuf::from("/books/book.mobi")
        );
        // .zip-suffixed sources keep their full name
        assert_eq!(
            destination_path(
                Path::new("/books/novel.fb2.zip"),
                Some(Path::new("/out")),
                OutputFormat::Epub
            ),
            PathBuf::from("/out/novel.fb2.zip.epub")
        );
    }

    #[test]
    fn test_destination_fb2_strip_is_case_insensitive() {
        assert_eq!(
            destination_path(Path::new("/books/BOOK.FB2"), None, OutputFormat::Azw3),
            PathBuf::from("/books/BOOK.azw3")
        );
    }

    #[test]
    fn test_destination_explicit_dir_wins() {
        assert_eq!(
            destination_path(
                Path::new("/books/book.fb2"),
                Some(Path::new("/out")),
                OutputFormat::Mobi
            ),
            PathBuf::from("/out/book.mobi")
        );
    }

    /// Writes the expected destination file, regardless of its own result.
    struct WritingConverter {
        fail_call: bool,
    }

    impl Converter for WritingConverter {
        fn convert(&self, config: &ConvertConfig, source: &Path) -> Result<()> {
            let dest = destination_path(source, config.output_dir.as_deref(), config.output_format);
            fs::write(&dest, b"converted")?;
            if self.fail_call {
                return Err(crate::error::Error::Converter("engine grumbled".into()));
            }
            Ok(())
        }
    }

    /// Never produces an output file.
    struct SilentConverter;

    impl Converter for SilentConverter {
        fn convert(&self, _config: &ConvertConfig, _source: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stale_output_removed_and_missing_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.fb2");
        fs::write(&source, b"<fb2/>").unwrap();
        let stale = dir.path().join("book.mobi");
        fs::write(&stale, b"old output").unwrap();

        let mut processor = ConvertProcessor::new(
            config(None, OutputFormat::Mobi),
            Arc::new(SilentConverter),
        );
        let outcome = processor.process(&source);

        assert!(!outcome.success);
        assert!(outcome.destination.is_none());
        // the stale file must not survive to mask the failure
        assert!(!stale.exists());
    }

    #[test]
    fn test_success_is_decided_by_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.fb2");
        fs::write(&source, b"<fb2/>").unwrap();

        // engine errors are advisory: output exists, so the item succeeded
        let mut processor = ConvertProcessor::new(
            config(None, OutputFormat::Mobi),
            Arc::new(WritingConverter { fail_call: true }),
        );
        let outcome = processor.process(&source);

        assert!(outcome.success);
        assert_eq!(outcome.destination, Some(dir.path().join("book.mobi")));
    }

    #[test]
    fn test_missing_output_dir_is_a_plain_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.fb2");
        fs::write(&source, b"<fb2/>").unwrap();
        let nowhere = dir.path().join("does-not-exist");

        let mut processor = ConvertProcessor::new(
            config(Some(nowhere), OutputFormat::Epub),
            Arc::new(SilentConverter),
        );
        let outcome = processor.process(&source);
        assert!(!outcome.success);
    }
}
