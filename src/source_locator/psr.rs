use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::trace;

use super::{DirectoriesSourceLocator, ReflectionScan, SourceLocator, find_in_source};
use crate::ast_locator::AstLocator;
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::located_source::LocatedSource;
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// Maps class names to the files an autoloader convention would load them from.
pub trait PsrAutoloaderMapping {
    /// Candidate files, most specific first. Empty for non-class identifiers.
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf>;

    /// Every directory the mapping points at.
    fn directories(&self) -> Vec<PathBuf>;
}

type PrefixTable = IndexMap<String, Vec<PathBuf>>;

fn validate_prefixes(table: PrefixTable, trailing_separator: bool) -> Result<PrefixTable> {
    let mut validated = IndexMap::with_capacity(table.len());
    for (prefix, paths) in table {
        let trimmed = prefix.trim_matches('\\');
        if trimmed.is_empty() {
            return Err(ReflectionError::InvalidPrefixMapping {
                prefix,
                reason: "prefix must not be empty",
            });
        }
        if paths.is_empty() {
            return Err(ReflectionError::InvalidPrefixMapping {
                prefix,
                reason: "at least one path is required",
            });
        }
        let key = if trailing_separator {
            format!("{trimmed}\\")
        } else {
            trimmed.to_string()
        };
        validated.entry(key).or_insert_with(Vec::new).extend(paths);
    }
    Ok(validated)
}

fn class_name(identifier: &Identifier) -> Option<&str> {
    if !identifier.is_class() || identifier.is_wildcard() || identifier.is_anonymous_class() {
        return None;
    }
    let name = identifier.name();
    Some(name.strip_prefix('\\').unwrap_or(name))
}

fn unique_directories(table: &PrefixTable) -> Vec<PathBuf> {
    let mut directories: Vec<PathBuf> = Vec::new();
    for path in table.values().flatten() {
        if !directories.contains(path) {
            directories.push(path.clone());
        }
    }
    directories
}

/// PSR-4: the namespace prefix is replaced by a base directory.
///
/// Deserializes from a map of prefix to directories, e.g.
/// `{"App\\": ["/src"]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "PrefixTable")]
pub struct Psr4Mapping {
    prefixes: PrefixTable,
}

impl Psr4Mapping {
    pub fn new<P, I>(prefixes: impl IntoIterator<Item = (P, I)>) -> Result<Self>
    where
        P: Into<String>,
        I: IntoIterator<Item = PathBuf>,
    {
        Self::from_map(
            prefixes
                .into_iter()
                .map(|(prefix, paths)| (prefix.into(), paths.into_iter().collect()))
                .collect(),
        )
    }

    pub fn from_map(prefixes: IndexMap<String, Vec<PathBuf>>) -> Result<Self> {
        Ok(Self {
            prefixes: validate_prefixes(prefixes, true)?,
        })
    }
}

impl TryFrom<PrefixTable> for Psr4Mapping {
    type Error = ReflectionError;

    fn try_from(table: PrefixTable) -> Result<Self> {
        Self::from_map(table)
    }
}

impl PsrAutoloaderMapping for Psr4Mapping {
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf> {
        let Some(class) = class_name(identifier) else {
            return Vec::new();
        };

        let mut matching: Vec<(&String, &Vec<PathBuf>)> = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| class.starts_with(prefix.as_str()))
            .collect();
        matching.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        matching
            .into_iter()
            .flat_map(|(prefix, paths)| {
                let relative = format!("{}.php", class[prefix.len()..].replace('\\', "/"));
                paths.iter().map(move |path| path.join(&relative))
            })
            .collect()
    }

    fn directories(&self) -> Vec<PathBuf> {
        unique_directories(&self.prefixes)
    }
}

/// PSR-0: the whole class name becomes the path, with `_` in the short name
/// acting as a directory separator.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "PrefixTable")]
pub struct Psr0Mapping {
    prefixes: PrefixTable,
}

impl Psr0Mapping {
    pub fn new<P, I>(prefixes: impl IntoIterator<Item = (P, I)>) -> Result<Self>
    where
        P: Into<String>,
        I: IntoIterator<Item = PathBuf>,
    {
        Self::from_map(
            prefixes
                .into_iter()
                .map(|(prefix, paths)| (prefix.into(), paths.into_iter().collect()))
                .collect(),
        )
    }

    pub fn from_map(prefixes: IndexMap<String, Vec<PathBuf>>) -> Result<Self> {
        Ok(Self {
            prefixes: validate_prefixes(prefixes, false)?,
        })
    }
}

impl TryFrom<PrefixTable> for Psr0Mapping {
    type Error = ReflectionError;

    fn try_from(table: PrefixTable) -> Result<Self> {
        Self::from_map(table)
    }
}

impl PsrAutoloaderMapping for Psr0Mapping {
    fn resolve_possible_file_paths(&self, identifier: &Identifier) -> Vec<PathBuf> {
        let Some(class) = class_name(identifier) else {
            return Vec::new();
        };

        let relative = match class.rsplit_once('\\') {
            Some((namespace, short)) => format!(
                "{}/{}.php",
                namespace.replace('\\', "/"),
                short.replace('_', "/")
            ),
            None => format!("{}.php", class.replace('_', "/")),
        };

        let mut matching: Vec<(&String, &Vec<PathBuf>)> = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| class.starts_with(prefix.as_str()))
            .collect();
        matching.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        matching
            .into_iter()
            .flat_map(|(_, paths)| paths.iter().map(|path| path.join(&relative)))
            .collect()
    }

    fn directories(&self) -> Vec<PathBuf> {
        unique_directories(&self.prefixes)
    }
}

/// Finds classes through an autoloader mapping. Enumeration scans the
/// mapped directories that exist.
pub struct PsrAutoloaderLocator {
    mapping: Box<dyn PsrAutoloaderMapping>,
    ast_locator: Rc<AstLocator>,
}

impl PsrAutoloaderLocator {
    pub fn new(mapping: impl PsrAutoloaderMapping + 'static, ast_locator: Rc<AstLocator>) -> Self {
        Self {
            mapping: Box::new(mapping),
            ast_locator,
        }
    }

    pub fn mapping(&self) -> &dyn PsrAutoloaderMapping {
        self.mapping.as_ref()
    }
}

impl SourceLocator for PsrAutoloaderLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        for candidate in self.mapping.resolve_possible_file_paths(identifier) {
            if !candidate.is_file() {
                trace!(path = %candidate.display(), "no file at candidate path");
                continue;
            }
            let source = Rc::new(LocatedSource::from_file(&candidate)?);
            if let Some(reflection) =
                find_in_source(&self.ast_locator, reflector, &source, identifier)?
            {
                return Ok(Some(reflection));
            }
        }
        Ok(None)
    }

    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        let directories: Vec<PathBuf> = self
            .mapping
            .directories()
            .into_iter()
            .filter(|directory| directory.is_dir())
            .collect();
        if directories.is_empty() {
            return Ok(ReflectionScan::default());
        }
        DirectoriesSourceLocator::new(directories, Rc::clone(&self.ast_locator))?
            .locate_all_of_kind(reflector, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn psr4(prefix: &str, path: &str) -> Psr4Mapping {
        Psr4Mapping::new([(prefix, [PathBuf::from(path)])]).unwrap()
    }

    #[test]
    fn psr4_strips_the_prefix() {
        let mapping = psr4("App\\", "/src");
        let id = Identifier::class("App\\Foo\\Bar").unwrap();
        assert_eq!(
            mapping.resolve_possible_file_paths(&id),
            vec![PathBuf::from("/src/Foo/Bar.php")]
        );
    }

    #[test]
    fn psr4_prefers_the_longest_prefix() {
        let mapping = Psr4Mapping::new([
            ("App", vec![PathBuf::from("/src")]),
            ("App\\Tests", vec![PathBuf::from("/tests")]),
        ])
        .unwrap();
        let id = Identifier::class("App\\Tests\\FooTest").unwrap();
        assert_eq!(
            mapping.resolve_possible_file_paths(&id),
            vec![
                PathBuf::from("/tests/FooTest.php"),
                PathBuf::from("/src/Tests/FooTest.php"),
            ]
        );
    }

    #[test]
    fn psr4_ignores_unrelated_names_and_kinds() {
        let mapping = psr4("App\\", "/src");
        assert!(
            mapping
                .resolve_possible_file_paths(&Identifier::class("Other\\Foo").unwrap())
                .is_empty()
        );
        assert!(
            mapping
                .resolve_possible_file_paths(&Identifier::function("App\\foo").unwrap())
                .is_empty()
        );
    }

    #[test]
    fn psr0_splits_underscores_in_the_short_name() {
        let mapping = Psr0Mapping::new([("Vendor", [PathBuf::from("/lib")])]).unwrap();
        let id = Identifier::class("Vendor\\Some_Pkg\\Http_Client").unwrap();
        assert_eq!(
            mapping.resolve_possible_file_paths(&id),
            vec![PathBuf::from("/lib/Vendor/Some_Pkg/Http/Client.php")]
        );
    }

    #[test]
    fn rejects_empty_prefixes_and_paths() {
        assert!(matches!(
            Psr4Mapping::new([("\\", [PathBuf::from("/src")])]),
            Err(ReflectionError::InvalidPrefixMapping { .. })
        ));
        assert!(matches!(
            Psr4Mapping::new([("App\\", Vec::<PathBuf>::new())]),
            Err(ReflectionError::InvalidPrefixMapping { .. })
        ));
    }

    #[test]
    fn deserializes_from_json() {
        let mapping: Psr4Mapping =
            serde_json::from_str(r#"{"App\\": ["/src", "/lib"]}"#).unwrap();
        assert_eq!(
            mapping.directories(),
            vec![PathBuf::from("/src"), PathBuf::from("/lib")]
        );
        assert!(serde_json::from_str::<Psr4Mapping>(r#"{"": ["/src"]}"#).is_err());
    }
}
