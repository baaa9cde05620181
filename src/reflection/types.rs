use std::fmt;
use std::rc::Rc;

use super::ReflectionClass;
use crate::error::Result;
use crate::names::NameContext;
use crate::parser::ast::{NameKind, Type};
use crate::reflector::WeakReflector;

const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "string", "bool", "array", "callable", "iterable", "object", "mixed", "void",
    "null", "never", "false", "true",
];

/// Declared type of a parameter, property, return value or enum backing.
#[derive(Debug, Clone)]
pub enum ReflectionType {
    Named(ReflectionNamedType),
    Union(Vec<ReflectionType>),
    Intersection(Vec<ReflectionType>),
}

#[derive(Debug, Clone)]
pub struct ReflectionNamedType {
    /// Built-ins are lower-cased; classes are fully qualified. `self`,
    /// `static` and `parent` keep their spelling.
    name: String,
    /// Class the name refers to, with `self`/`static`/`parent` resolved.
    target: Option<String>,
    nullable: bool,
    builtin: bool,
    reflector: WeakReflector,
}

pub(crate) struct TypeScope<'a> {
    pub names: &'a NameContext,
    pub self_class: Option<&'a str>,
    pub parent_class: Option<String>,
    pub reflector: &'a WeakReflector,
}

impl ReflectionType {
    pub(crate) fn from_ast(ty: &Type, scope: &TypeScope<'_>) -> Self {
        match ty {
            Type::Named(name) => {
                let lower = name.last().to_ascii_lowercase();
                let is_builtin = name.kind == NameKind::Unqualified
                    && BUILTIN_TYPES.contains(&lower.as_str());
                let (display, target) = if is_builtin {
                    (lower, None)
                } else if name.is_special_class() {
                    let target = match lower.as_str() {
                        "parent" => scope.parent_class.clone(),
                        _ => scope.self_class.map(str::to_string),
                    };
                    (lower, target)
                } else {
                    let resolved = scope.names.resolve_class_name(name);
                    (resolved.clone(), Some(resolved))
                };
                let nullable = matches!(display.as_str(), "null" | "mixed");
                ReflectionType::Named(ReflectionNamedType {
                    name: display,
                    target,
                    nullable,
                    builtin: is_builtin,
                    reflector: scope.reflector.clone(),
                })
            }
            Type::Nullable { inner, .. } => Self::from_ast(inner, scope).into_nullable(),
            Type::Union { types, .. } => {
                let members: Vec<ReflectionType> =
                    types.iter().map(|ty| Self::from_ast(ty, scope)).collect();
                // `T|null` is reported the same way as `?T`.
                if members.len() == 2
                    && let Some(null_at) = members.iter().position(ReflectionType::is_null)
                    && let ReflectionType::Named(_) = &members[1 - null_at]
                {
                    return members[1 - null_at].clone().into_nullable();
                }
                ReflectionType::Union(members)
            }
            Type::Intersection { types, .. } => {
                ReflectionType::Intersection(types.iter().map(|ty| Self::from_ast(ty, scope)).collect())
            }
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, ReflectionType::Named(named) if named.name == "null")
    }

    /// Marks the type nullable, as a `null` default does for an untyped-null parameter.
    pub(crate) fn into_nullable(self) -> Self {
        match self {
            ReflectionType::Named(mut named) => {
                named.nullable = true;
                ReflectionType::Named(named)
            }
            ReflectionType::Union(mut members) => {
                if !members.iter().any(ReflectionType::is_null) {
                    members.push(ReflectionType::Named(ReflectionNamedType {
                        name: "null".to_string(),
                        target: None,
                        nullable: true,
                        builtin: true,
                        reflector: members
                            .iter()
                            .find_map(|member| match member {
                                ReflectionType::Named(named) => Some(named.reflector.clone()),
                                _ => None,
                            })
                            .unwrap_or_else(WeakReflector::dangling),
                    }));
                }
                ReflectionType::Union(members)
            }
            intersection => intersection,
        }
    }

    pub fn allows_null(&self) -> bool {
        match self {
            ReflectionType::Named(named) => named.nullable,
            ReflectionType::Union(members) => members.iter().any(ReflectionType::allows_null),
            ReflectionType::Intersection(_) => false,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, ReflectionType::Named(named) if named.builtin)
    }

    pub fn as_named(&self) -> Option<&ReflectionNamedType> {
        match self {
            ReflectionType::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn members(&self) -> &[ReflectionType] {
        match self {
            ReflectionType::Named(_) => &[],
            ReflectionType::Union(members) | ReflectionType::Intersection(members) => members,
        }
    }
}

impl ReflectionNamedType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allows_null(&self) -> bool {
        self.nullable
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Fully qualified class the type names, if it names one.
    pub fn class_name(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn class(&self) -> Result<Option<Rc<ReflectionClass>>> {
        match &self.target {
            Some(target) => Ok(Some(self.reflector.upgrade()?.reflect_class(target)?)),
            None => Ok(None),
        }
    }
}

impl fmt::Display for ReflectionNamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable && self.name != "null" && self.name != "mixed" {
            f.write_str("?")?;
        }
        f.write_str(&self.name)
    }
}

impl fmt::Display for ReflectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionType::Named(named) => fmt::Display::fmt(named, f),
            ReflectionType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match member {
                        ReflectionType::Intersection(_) => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                Ok(())
            }
            ReflectionType::Intersection(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}
