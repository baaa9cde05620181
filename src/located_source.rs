use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ReflectionError, Result};
use crate::parser::Span;
use crate::parser::line_index::LineIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Ordinary,
    /// Stub text standing in for a symbol compiled into the host runtime.
    Internal { extension: Option<String> },
    /// Reconstructed text for code that was declared through `eval()`.
    Evaled,
}

/// Source text plus where it came from. Every reflection built from one parse
/// shares the same instance.
pub struct LocatedSource {
    source: String,
    file_path: Option<PathBuf>,
    kind: SourceKind,
    line_index: OnceCell<LineIndex>,
}

impl LocatedSource {
    /// `file_path`, when given, must point at an existing regular file.
    pub fn new(source: impl Into<String>, file_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = &file_path {
            validate_file(path)?;
        }
        Ok(Self::with_kind(source.into(), file_path, SourceKind::Ordinary))
    }

    /// Reads a file from disk. Invalid UTF-8 is replaced rather than rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        validate_file(path)?;
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Self::with_kind(
            source,
            Some(path.to_path_buf()),
            SourceKind::Ordinary,
        ))
    }

    pub fn internal(source: impl Into<String>, extension: Option<String>) -> Self {
        Self::with_kind(source.into(), None, SourceKind::Internal { extension })
    }

    pub fn evaled(source: impl Into<String>) -> Self {
        Self::with_kind(source.into(), None, SourceKind::Evaled)
    }

    fn with_kind(source: String, file_path: Option<PathBuf>, kind: SourceKind) -> Self {
        Self {
            source,
            file_path,
            kind,
            line_index: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind, SourceKind::Internal { .. })
    }

    pub fn is_evaled(&self) -> bool {
        self.kind == SourceKind::Evaled
    }

    pub fn extension_name(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::Internal { extension } => extension.as_deref(),
            _ => None,
        }
    }

    pub fn text(&self, span: Span) -> &str {
        span.as_str(&self.source)
    }

    fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.source))
    }

    /// 1-based line of a byte offset.
    pub fn line_number(&self, offset: usize) -> usize {
        self.line_index().line_number(offset)
    }

    /// 1-based first and last line of a span.
    pub fn line_span(&self, span: Span) -> (usize, usize) {
        self.line_index().line_span(span)
    }

    /// Short description used in diagnostics.
    pub fn location(&self) -> String {
        match (&self.file_path, &self.kind) {
            (Some(path), _) => path.display().to_string(),
            (None, SourceKind::Internal { extension }) => match extension {
                Some(extension) => format!("internal stub ({extension})"),
                None => "internal stub".to_string(),
            },
            (None, SourceKind::Evaled) => "evaled code".to_string(),
            (None, SourceKind::Ordinary) => "string".to_string(),
        }
    }
}

impl fmt::Debug for LocatedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatedSource")
            .field("file_path", &self.file_path)
            .field("kind", &self.kind)
            .field("len", &self.source.len())
            .finish()
    }
}

pub(crate) fn validate_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ReflectionError::InvalidFileLocation {
            path: path.to_path_buf(),
            reason: "file does not exist",
        });
    }
    if !path.is_file() {
        return Err(ReflectionError::InvalidFileLocation {
            path: path.to_path_buf(),
            reason: "not a regular file",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_missing_and_non_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LocatedSource::from_file(dir.path().join("missing.php")),
            Err(ReflectionError::InvalidFileLocation { .. })
        ));
        assert!(matches!(
            LocatedSource::new("<?php", Some(dir.path().to_path_buf())),
            Err(ReflectionError::InvalidFileLocation { .. })
        ));
    }

    #[test]
    fn reads_files_and_maps_lines() {
        let mut file = tempfile::Builder::new().suffix(".php").tempfile().unwrap();
        write!(file, "<?php\n\nclass Foo {{}}\n").unwrap();

        let source = LocatedSource::from_file(file.path()).unwrap();
        assert_eq!(source.file_path(), Some(file.path()));
        assert_eq!(source.line_number(source.source().find("class").unwrap()), 3);
        assert_eq!(source.kind(), &SourceKind::Ordinary);
    }

    #[test]
    fn internal_sources_carry_extension() {
        let source = LocatedSource::internal("<?php interface Countable {}", Some("Core".into()));
        assert!(source.is_internal());
        assert_eq!(source.extension_name(), Some("Core"));
        assert_eq!(source.location(), "internal stub (Core)");
    }
}
