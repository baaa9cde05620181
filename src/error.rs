use std::path::PathBuf;

use thiserror::Error;

use crate::identifier::IdentifierType;

#[derive(Error, Debug)]
pub enum ReflectionError {
    #[error("Invalid {kind} identifier name \"{name}\"")]
    InvalidIdentifierName { kind: IdentifierType, name: String },
    #[error("{kind} \"{name}\" could not be found in the located source")]
    IdentifierNotFound { kind: IdentifierType, name: String },
    #[error("AST failed to parse in located source ({location}):\n{message}")]
    ParseToAstFailure { location: String, message: String },
    #[error("Invalid constant node: {0}")]
    InvalidConstantNode(String),
    #[error("Unable to compile expression: {0}")]
    UnableToCompileNode(String),
    #[error("Invalid file location {}: {reason}", path.display())]
    InvalidFileLocation { path: PathBuf, reason: &'static str },
    #[error("\"{}\" is not a directory", path.display())]
    InvalidDirectory { path: PathBuf },
    #[error("Invalid autoload mapping for prefix \"{prefix}\": {reason}")]
    InvalidPrefixMapping { prefix: String, reason: &'static str },
    #[error("Source code string was empty")]
    EmptyPhpSourceCode,
    #[error("Two anonymous classes on line {line} in {location}")]
    TwoAnonymousClassesOnSameLine { location: String, line: usize },
    #[error("Two closures on line {line} in {location}")]
    TwoClosuresOnSameLine { location: String, line: usize },
    #[error("Circular reference to class \"{0}\"")]
    CircularReference(String),
    #[error("The reflector that produced this reflection has been dropped")]
    ReflectorDropped,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReflectionError {
    pub fn not_found(kind: IdentifierType, name: impl Into<String>) -> Self {
        ReflectionError::IdentifierNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReflectionError::IdentifierNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReflectionError>;
