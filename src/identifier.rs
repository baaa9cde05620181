use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{ReflectionError, Result};
use crate::reflection::Reflection;

pub const WILDCARD: &str = "*";
pub const CLOSURE_NAME: &str = "{closure}";
pub const ANONYMOUS_CLASS_PREFIX: &str = "class@anonymous";

lazy_static! {
    static ref VALID_NAME: Regex = Regex::new(
        r"^[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*(\\[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*)*$"
    )
    .expect("identifier pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentifierType {
    Class,
    Function,
    Constant,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Class => "class",
            IdentifierType::Function => "function",
            IdentifierType::Constant => "constant",
        }
    }

    /// Whether a reflection produced by a walk is of this kind.
    pub fn matches(&self, reflection: &Reflection) -> bool {
        matches!(
            (self, reflection),
            (IdentifierType::Class, Reflection::Class(_))
                | (IdentifierType::Function, Reflection::Function(_))
                | (IdentifierType::Constant, Reflection::Constant(_))
        )
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated symbol name together with the kind of symbol it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier {
    name: String,
    kind: IdentifierType,
}

impl Identifier {
    pub fn new(name: impl Into<String>, kind: IdentifierType) -> Result<Self> {
        let name = name.into();

        if name == WILDCARD || name == CLOSURE_NAME || name.starts_with(ANONYMOUS_CLASS_PREFIX) {
            return Ok(Self { name, kind });
        }

        let name = name.strip_prefix('\\').map(str::to_string).unwrap_or(name);
        if !VALID_NAME.is_match(&name) {
            return Err(ReflectionError::InvalidIdentifierName { kind, name });
        }

        Ok(Self { name, kind })
    }

    pub fn class(name: impl Into<String>) -> Result<Self> {
        Self::new(name, IdentifierType::Class)
    }

    pub fn function(name: impl Into<String>) -> Result<Self> {
        Self::new(name, IdentifierType::Function)
    }

    pub fn constant(name: impl Into<String>) -> Result<Self> {
        Self::new(name, IdentifierType::Constant)
    }

    /// The "every symbol of this kind" identifier.
    pub fn wildcard(kind: IdentifierType) -> Self {
        Self {
            name: WILDCARD.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IdentifierType {
        self.kind
    }

    pub fn is_class(&self) -> bool {
        self.kind == IdentifierType::Class
    }

    pub fn is_function(&self) -> bool {
        self.kind == IdentifierType::Function
    }

    pub fn is_constant(&self) -> bool {
        self.kind == IdentifierType::Constant
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    pub fn is_closure(&self) -> bool {
        self.name == CLOSURE_NAME
    }

    pub fn is_anonymous_class(&self) -> bool {
        self.name.starts_with(ANONYMOUS_CLASS_PREFIX)
    }

    /// Case-insensitive comparison against a declared name.
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = candidate.strip_prefix('\\').unwrap_or(candidate);
        self.name.eq_ignore_ascii_case(candidate)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Splits `A\B\c` into (`A\B`, `c`).
pub(crate) fn split_namespace(name: &str) -> (&str, &str) {
    match name.rfind('\\') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_separator() {
        let id = Identifier::class("\\App\\Foo").unwrap();
        assert_eq!(id.name(), "App\\Foo");
        assert!(id.is_class());
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "1abc", "Foo\\", "Foo\\\\Bar", "foo-bar", "\\"] {
            assert!(
                matches!(
                    Identifier::function(name),
                    Err(ReflectionError::InvalidIdentifierName { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_sentinels_and_unicode() {
        assert!(Identifier::class("*").unwrap().is_wildcard());
        assert!(Identifier::function("{closure}").unwrap().is_closure());
        assert!(
            Identifier::class("class@anonymous/tmp/a.php:3")
                .unwrap()
                .is_anonymous_class()
        );
        assert!(Identifier::class("Ünïcode\\Klässe").is_ok());
    }

    #[test]
    fn name_matching_ignores_case_and_leading_separator() {
        let class = Identifier::class("App\\Foo").unwrap();
        assert!(class.matches_name("\\app\\FOO"));
        assert!(!class.matches_name("App\\Foo\\Bar"));
    }

    #[test]
    fn splits_namespaces() {
        assert_eq!(split_namespace("A\\B\\c"), ("A\\B", "c"));
        assert_eq!(split_namespace("c"), ("", "c"));
    }
}
