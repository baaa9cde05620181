use indexmap::IndexMap;

use crate::parser::ast::{Name, NameKind, UseItem, UseKind};

/// Namespace and imports in effect for a group of declarations.
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    namespace: Option<String>,
    /// Keyed by lower-cased alias.
    classes: IndexMap<String, String>,
    /// Keyed by lower-cased alias.
    functions: IndexMap<String, String>,
    /// Keyed by alias; constant imports are case-sensitive.
    constants: IndexMap<String, String>,
}

impl NameContext {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: Option<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
            ..Self::default()
        }
    }

    pub fn add_use(&mut self, item: &UseItem) {
        let target = item.name.joined();
        let alias = item.local_name().to_string();
        match item.kind {
            UseKind::Normal => {
                self.classes.insert(alias.to_ascii_lowercase(), target);
            }
            UseKind::Function => {
                self.functions.insert(alias.to_ascii_lowercase(), target);
            }
            UseKind::Const => {
                self.constants.insert(alias, target);
            }
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Prefixes a declared short name with the current namespace.
    pub fn qualify(&self, short_name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}\\{short_name}"),
            None => short_name.to_string(),
        }
    }

    /// Resolves a class reference. `self`, `static` and `parent` are returned unchanged.
    pub fn resolve_class_name(&self, name: &Name) -> String {
        match name.kind {
            NameKind::FullyQualified => name.joined(),
            NameKind::Relative => self.qualify(&name.joined()),
            NameKind::Unqualified if name.is_special_class() => name.joined(),
            NameKind::Unqualified | NameKind::Qualified => {
                self.resolve_through_class_imports(name).unwrap_or_else(|| self.qualify(&name.joined()))
            }
        }
    }

    /// Candidate fully qualified names for a function reference, in lookup order.
    pub fn resolve_function_candidates(&self, name: &Name) -> Vec<String> {
        if name.kind == NameKind::Unqualified {
            if let Some(target) = self.functions.get(&name.last().to_ascii_lowercase()) {
                return vec![target.clone()];
            }
            return self.with_global_fallback(name.last());
        }
        vec![self.resolve_qualified(name)]
    }

    /// Candidate fully qualified names for a constant reference, in lookup order.
    pub fn resolve_constant_candidates(&self, name: &Name) -> Vec<String> {
        if name.kind == NameKind::Unqualified {
            if let Some(target) = self.constants.get(name.last()) {
                return vec![target.clone()];
            }
            return self.with_global_fallback(name.last());
        }
        vec![self.resolve_qualified(name)]
    }

    fn with_global_fallback(&self, short_name: &str) -> Vec<String> {
        match &self.namespace {
            Some(ns) => vec![format!("{ns}\\{short_name}"), short_name.to_string()],
            None => vec![short_name.to_string()],
        }
    }

    fn resolve_qualified(&self, name: &Name) -> String {
        match name.kind {
            NameKind::FullyQualified => name.joined(),
            NameKind::Relative => self.qualify(&name.joined()),
            _ => self
                .resolve_through_class_imports(name)
                .unwrap_or_else(|| self.qualify(&name.joined())),
        }
    }

    /// The first segment of a non-fully-qualified name may be a class or namespace alias.
    fn resolve_through_class_imports(&self, name: &Name) -> Option<String> {
        let (first, rest) = name.parts.split_first()?;
        let target = self.classes.get(&first.to_ascii_lowercase())?;
        if rest.is_empty() {
            Some(target.clone())
        } else {
            Some(format!("{target}\\{}", rest.join("\\")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Span;
    use crate::parser::ast::Ident;

    fn name(text: &str) -> Name {
        let (kind, text) = match text.strip_prefix('\\') {
            Some(rest) => (NameKind::FullyQualified, rest),
            None if text.contains('\\') => (NameKind::Qualified, text),
            None => (NameKind::Unqualified, text),
        };
        Name {
            parts: text.split('\\').map(str::to_string).collect(),
            kind,
            span: Span::default(),
        }
    }

    fn use_item(target: &str, alias: Option<&str>, kind: UseKind) -> UseItem {
        UseItem {
            name: name(target),
            alias: alias.map(|alias| Ident {
                name: alias.to_string(),
                span: Span::default(),
            }),
            kind,
            span: Span::default(),
        }
    }

    #[test]
    fn resolves_class_names_through_imports() {
        let mut names = NameContext::in_namespace(Some("App".into()));
        names.add_use(&use_item("Vendor\\Lib\\Thing", Some("Other"), UseKind::Normal));
        names.add_use(&use_item("Vendor\\Models", None, UseKind::Normal));

        assert_eq!(names.resolve_class_name(&name("other")), "Vendor\\Lib\\Thing");
        assert_eq!(names.resolve_class_name(&name("Models\\User")), "Vendor\\Models\\User");
        assert_eq!(names.resolve_class_name(&name("Local")), "App\\Local");
        assert_eq!(names.resolve_class_name(&name("\\Global")), "Global");
        assert_eq!(names.resolve_class_name(&name("self")), "self");
    }

    #[test]
    fn constants_fall_back_to_global_namespace() {
        let mut names = NameContext::in_namespace(Some("App".into()));
        names.add_use(&use_item("Lib\\LIMIT", None, UseKind::Const));

        assert_eq!(names.resolve_constant_candidates(&name("FOO")), ["App\\FOO", "FOO"]);
        assert_eq!(names.resolve_constant_candidates(&name("LIMIT")), ["Lib\\LIMIT"]);
        assert_eq!(
            NameContext::global().resolve_constant_candidates(&name("FOO")),
            ["FOO"]
        );
    }
}
