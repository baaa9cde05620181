use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::types::TypeScope;
use super::{
    FunctionLike, ReflectionClassConstant, ReflectionEnumCase, ReflectionMethod, ReflectionProperty,
    ReflectionType, SourceContext, check_depth,
};
use crate::error::{ReflectionError, Result};
use crate::identifier::{ANONYMOUS_CLASS_PREFIX, split_namespace};
use crate::located_source::LocatedSource;
use crate::node_compiler::Value;
use crate::parser::ast::{ClassDecl, ClassKind, ClassMember, TraitAdaptation, Visibility};

/// A class, interface, trait or enum.
pub struct ReflectionClass {
    ctx: SourceContext,
    node: Rc<ClassDecl>,
    name: String,
    /// Compiled values of constants declared here, by name.
    constant_values: RefCell<HashMap<String, Value>>,
}

impl ReflectionClass {
    pub(crate) fn new(ctx: SourceContext, node: Rc<ClassDecl>, name: String) -> Self {
        Self {
            ctx,
            node,
            name,
            constant_values: RefCell::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        if self.is_anonymous() {
            return &self.name;
        }
        split_namespace(&self.name).1
    }

    pub fn namespace_name(&self) -> Option<&str> {
        self.ctx.names().namespace()
    }

    pub fn in_namespace(&self) -> bool {
        self.namespace_name().is_some()
    }

    pub fn node(&self) -> &Rc<ClassDecl> {
        &self.node
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn kind(&self) -> ClassKind {
        self.node.kind
    }

    pub fn is_interface(&self) -> bool {
        self.node.kind == ClassKind::Interface
    }

    pub fn is_trait(&self) -> bool {
        self.node.kind == ClassKind::Trait
    }

    pub fn is_enum(&self) -> bool {
        self.node.kind == ClassKind::Enum
    }

    pub fn is_anonymous(&self) -> bool {
        self.node.name.is_none() || self.name.starts_with(ANONYMOUS_CLASS_PREFIX)
    }

    pub fn is_final(&self) -> bool {
        self.node.modifiers.is_final || self.is_enum()
    }

    pub fn is_abstract(&self) -> bool {
        self.node.modifiers.is_abstract || self.is_interface()
    }

    pub fn is_readonly(&self) -> bool {
        self.node.modifiers.is_readonly
    }

    pub fn is_instantiable(&self) -> bool {
        self.node.kind == ClassKind::Class && !self.node.modifiers.is_abstract
    }

    pub fn is_internal(&self) -> bool {
        self.ctx.source().is_internal()
    }

    pub fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.ctx.source().extension_name()
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        self.ctx.source()
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.ctx.file_path()
    }

    pub fn start_line(&self) -> usize {
        self.ctx.lines(self.node.span).0
    }

    pub fn end_line(&self) -> usize {
        self.ctx.lines(self.node.span).1
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.ctx.doc_comment(self.node.doc_comment)
    }

    pub fn is_deprecated(&self) -> bool {
        super::is_deprecated_doc(self.doc_comment())
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.ctx.attribute_names(&self.node.attributes)
    }

    pub fn is_backed(&self) -> bool {
        self.node.backing_type.is_some()
    }

    pub fn backing_type(&self) -> Option<ReflectionType> {
        self.node
            .backing_type
            .as_ref()
            .map(|ty| ReflectionType::from_ast(ty, &self.type_scope()))
    }

    pub(crate) fn type_scope(&self) -> TypeScope<'_> {
        TypeScope {
            names: self.ctx.names(),
            self_class: Some(&self.name),
            parent_class: self.parent_class_name(),
            reflector: self.ctx.weak_reflector(),
        }
    }

    // Hierarchy

    /// Resolved name of the parent class. Interfaces list their parents as interfaces instead.
    pub fn parent_class_name(&self) -> Option<String> {
        if self.node.kind != ClassKind::Class {
            return None;
        }
        self.node
            .extends
            .first()
            .map(|name| self.ctx.names().resolve_class_name(name))
    }

    pub fn parent_class(&self) -> Result<Option<Rc<ReflectionClass>>> {
        match self.parent_class_name() {
            Some(name) => Ok(Some(self.ctx.reflector()?.reflect_class(&name)?)),
            None => Ok(None),
        }
    }

    /// Ancestors from the direct parent upwards.
    pub fn parent_class_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut current = self.parent_class()?;
        while let Some(class) = current {
            if class.name.eq_ignore_ascii_case(&self.name)
                || names
                    .iter()
                    .any(|seen: &String| seen.eq_ignore_ascii_case(&class.name))
            {
                return Err(ReflectionError::CircularReference(class.name.clone()));
            }
            names.push(class.name.clone());
            check_depth(names.len(), &self.name)?;
            current = class.parent_class()?;
        }
        Ok(names)
    }

    /// Interfaces named directly in the declaration (`implements` for classes
    /// and enums, `extends` for interfaces).
    pub fn immediate_interface_names(&self) -> Vec<String> {
        let names = match self.node.kind {
            ClassKind::Interface => &self.node.extends,
            ClassKind::Class | ClassKind::Enum => &self.node.implements,
            ClassKind::Trait => return Vec::new(),
        };
        names
            .iter()
            .map(|name| self.ctx.names().resolve_class_name(name))
            .collect()
    }

    /// Direct and inherited interfaces, each listed once.
    pub fn interfaces(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        let mut found = IndexMap::new();
        self.collect_interfaces(0, &mut found)?;
        Ok(found.into_values().collect())
    }

    pub fn interface_names(&self) -> Result<Vec<String>> {
        Ok(self
            .interfaces()?
            .iter()
            .map(|interface| interface.name.clone())
            .collect())
    }

    fn collect_interfaces(
        &self,
        depth: usize,
        found: &mut IndexMap<String, Rc<ReflectionClass>>,
    ) -> Result<()> {
        check_depth(depth, &self.name)?;
        let reflector = self.ctx.reflector()?;

        for name in self.immediate_interface_names() {
            let key = name.to_ascii_lowercase();
            if found.contains_key(&key) {
                continue;
            }
            let interface = reflector.reflect_class(&name)?;
            found.insert(key, Rc::clone(&interface));
            interface.collect_interfaces(depth + 1, found)?;
        }

        if let Some(parent) = self.parent_class()? {
            parent.collect_interfaces(depth + 1, found)?;
        }
        Ok(())
    }

    pub fn implements_interface(&self, interface_name: &str) -> Result<bool> {
        let wanted = interface_name.trim_start_matches('\\');
        Ok(self
            .interface_names()?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(wanted)))
    }

    pub fn is_subclass_of(&self, class_name: &str) -> Result<bool> {
        let wanted = class_name.trim_start_matches('\\');
        if self
            .parent_class_names()?
            .iter()
            .any(|name| name.eq_ignore_ascii_case(wanted))
        {
            return Ok(true);
        }
        self.implements_interface(wanted)
    }

    pub fn trait_names(&self) -> Vec<String> {
        self.node
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::TraitUse(trait_use) => Some(&trait_use.traits),
                _ => None,
            })
            .flatten()
            .map(|name| self.ctx.names().resolve_class_name(name))
            .collect()
    }

    pub fn traits(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        let reflector = self.ctx.reflector()?;
        self.trait_names()
            .iter()
            .map(|name| reflector.reflect_class(name))
            .collect()
    }

    // Methods

    /// Methods declared in this class plus those imported from traits.
    pub fn immediate_methods(self: &Rc<Self>) -> Result<Vec<Rc<ReflectionMethod>>> {
        Ok(self.immediate_methods_at(0)?.into_values().collect())
    }

    fn immediate_methods_at(
        self: &Rc<Self>,
        depth: usize,
    ) -> Result<IndexMap<String, Rc<ReflectionMethod>>> {
        check_depth(depth, &self.name)?;

        let mut methods = IndexMap::new();
        for member in &self.node.members {
            if let ClassMember::Method(decl) = member {
                let method = ReflectionMethod::declared(self, Rc::clone(decl));
                methods
                    .entry(method.name().to_ascii_lowercase())
                    .or_insert(method);
            }
        }

        for method in self.trait_methods(depth)? {
            methods
                .entry(method.name().to_ascii_lowercase())
                .or_insert(method);
        }
        Ok(methods)
    }

    fn trait_methods(self: &Rc<Self>, depth: usize) -> Result<Vec<Rc<ReflectionMethod>>> {
        let mut adopted = Vec::new();
        let names = self.ctx.names();

        for member in &self.node.members {
            let ClassMember::TraitUse(trait_use) = member else {
                continue;
            };
            let reflector = self.ctx.reflector()?;

            for trait_name in &trait_use.traits {
                let trait_class = reflector.reflect_class(&names.resolve_class_name(trait_name))?;

                for method in trait_class.immediate_methods_at(depth + 1)?.into_values() {
                    let method_name = method.name();
                    let mut excluded = false;
                    let mut visibility = None;

                    for adaptation in &trait_use.adaptations {
                        match adaptation {
                            TraitAdaptation::Precedence {
                                trait_name: preferred,
                                method: adapted,
                                insteadof,
                                ..
                            } => {
                                if adapted.name.eq_ignore_ascii_case(method_name)
                                    && !names
                                        .resolve_class_name(preferred)
                                        .eq_ignore_ascii_case(trait_class.name())
                                    && insteadof.iter().any(|name| {
                                        names
                                            .resolve_class_name(name)
                                            .eq_ignore_ascii_case(trait_class.name())
                                    })
                                {
                                    excluded = true;
                                }
                            }
                            TraitAdaptation::Alias {
                                trait_name: source,
                                method: adapted,
                                alias,
                                visibility: new_visibility,
                                ..
                            } => {
                                let applies = adapted.name.eq_ignore_ascii_case(method_name)
                                    && source.as_ref().is_none_or(|source| {
                                        names
                                            .resolve_class_name(source)
                                            .eq_ignore_ascii_case(trait_class.name())
                                    });
                                if !applies {
                                    continue;
                                }
                                match alias {
                                    Some(alias) => adopted.push(method.adopted_by(
                                        self,
                                        Some(&alias.name),
                                        *new_visibility,
                                    )),
                                    None => visibility = *new_visibility,
                                }
                            }
                        }
                    }

                    if !excluded {
                        adopted.push(method.adopted_by(self, None, visibility));
                    }
                }
            }
        }
        Ok(adopted)
    }

    /// All methods including inherited ones, own declarations first.
    pub fn methods(self: &Rc<Self>) -> Result<Vec<Rc<ReflectionMethod>>> {
        Ok(self.methods_at(0)?.into_values().collect())
    }

    fn methods_at(self: &Rc<Self>, depth: usize) -> Result<IndexMap<String, Rc<ReflectionMethod>>> {
        let mut methods = self.immediate_methods_at(depth)?;

        if let Some(parent) = self.parent_class()? {
            for (key, method) in parent.methods_at(depth + 1)? {
                methods.entry(key).or_insert(method);
            }
        }

        for interface in self.interfaces()? {
            for (key, method) in interface.immediate_methods_at(depth + 1)? {
                methods.entry(key).or_insert(method);
            }
        }
        Ok(methods)
    }

    /// Method lookup is case-insensitive.
    pub fn method(self: &Rc<Self>, name: &str) -> Result<Option<Rc<ReflectionMethod>>> {
        Ok(self.methods_at(0)?.swap_remove(&name.to_ascii_lowercase()))
    }

    pub fn has_method(self: &Rc<Self>, name: &str) -> Result<bool> {
        Ok(self.method(name)?.is_some())
    }

    pub(crate) fn immediate_method(self: &Rc<Self>, name: &str) -> Result<Option<Rc<ReflectionMethod>>> {
        Ok(self
            .immediate_methods_at(0)?
            .swap_remove(&name.to_ascii_lowercase()))
    }

    pub fn constructor(self: &Rc<Self>) -> Result<Option<Rc<ReflectionMethod>>> {
        self.method("__construct")
    }

    // Properties

    /// Declared, promoted and trait-imported properties.
    pub fn immediate_properties(self: &Rc<Self>) -> Result<Vec<Rc<ReflectionProperty>>> {
        Ok(self.immediate_properties_at(0)?.into_values().collect())
    }

    fn immediate_properties_at(
        self: &Rc<Self>,
        depth: usize,
    ) -> Result<IndexMap<String, Rc<ReflectionProperty>>> {
        check_depth(depth, &self.name)?;
        let mut properties = IndexMap::new();

        for member in &self.node.members {
            match member {
                ClassMember::Property(group) => {
                    for index in 0..group.entries.len() {
                        let property = ReflectionProperty::declared(self, Rc::clone(group), index);
                        properties
                            .entry(property.name().to_string())
                            .or_insert(property);
                    }
                }
                ClassMember::Method(decl)
                    if decl
                        .name
                        .as_ref()
                        .is_some_and(|name| name.name.eq_ignore_ascii_case("__construct")) =>
                {
                    for (index, param) in decl.params.iter().enumerate() {
                        if param.is_promoted() {
                            let property =
                                ReflectionProperty::promoted(self, Rc::clone(decl), index);
                            properties
                                .entry(property.name().to_string())
                                .or_insert(property);
                        }
                    }
                }
                _ => {}
            }
        }

        let reflector = self.ctx.reflector()?;
        for trait_name in self.trait_names() {
            let trait_class = reflector.reflect_class(&trait_name)?;
            for (name, property) in trait_class.immediate_properties_at(depth + 1)? {
                if let Entry::Vacant(entry) = properties.entry(name) {
                    entry.insert(property.adopted_by(self));
                }
            }
        }
        Ok(properties)
    }

    /// All properties including non-private inherited ones.
    pub fn properties(self: &Rc<Self>) -> Result<Vec<Rc<ReflectionProperty>>> {
        Ok(self.properties_at(0)?.into_values().collect())
    }

    fn properties_at(
        self: &Rc<Self>,
        depth: usize,
    ) -> Result<IndexMap<String, Rc<ReflectionProperty>>> {
        let mut properties = self.immediate_properties_at(depth)?;
        if let Some(parent) = self.parent_class()? {
            for (name, property) in parent.properties_at(depth + 1)? {
                if property.visibility() != Visibility::Private {
                    properties.entry(name).or_insert(property);
                }
            }
        }
        Ok(properties)
    }

    /// Property lookup is case-sensitive.
    pub fn property(self: &Rc<Self>, name: &str) -> Result<Option<Rc<ReflectionProperty>>> {
        Ok(self.properties_at(0)?.swap_remove(name))
    }

    pub fn has_property(self: &Rc<Self>, name: &str) -> Result<bool> {
        Ok(self.property(name)?.is_some())
    }

    // Constants

    pub fn immediate_constants(self: &Rc<Self>) -> Vec<Rc<ReflectionClassConstant>> {
        let mut constants: IndexMap<String, Rc<ReflectionClassConstant>> = IndexMap::new();
        for member in &self.node.members {
            if let ClassMember::Const(group) = member {
                for index in 0..group.entries.len() {
                    let constant = Rc::new(ReflectionClassConstant::new(
                        self.ctx.clone(),
                        Rc::clone(self),
                        Rc::clone(group),
                        index,
                    ));
                    constants
                        .entry(constant.name().to_string())
                        .or_insert(constant);
                }
            }
        }
        constants.into_values().collect()
    }

    /// Own constants, then non-private inherited ones, then interface constants.
    pub fn constants(self: &Rc<Self>) -> Result<Vec<Rc<ReflectionClassConstant>>> {
        Ok(self.constants_at(0)?.into_values().collect())
    }

    fn constants_at(
        self: &Rc<Self>,
        depth: usize,
    ) -> Result<IndexMap<String, Rc<ReflectionClassConstant>>> {
        check_depth(depth, &self.name)?;
        let mut constants: IndexMap<String, Rc<ReflectionClassConstant>> = self
            .immediate_constants()
            .into_iter()
            .map(|constant| (constant.name().to_string(), constant))
            .collect();

        if let Some(parent) = self.parent_class()? {
            for (name, constant) in parent.constants_at(depth + 1)? {
                if constant.visibility() != Visibility::Private {
                    constants.entry(name).or_insert(constant);
                }
            }
        }

        for interface in self.interfaces()? {
            for constant in interface.immediate_constants() {
                constants
                    .entry(constant.name().to_string())
                    .or_insert(constant);
            }
        }
        Ok(constants)
    }

    /// Constant lookup is case-sensitive.
    pub fn constant(self: &Rc<Self>, name: &str) -> Result<Option<Rc<ReflectionClassConstant>>> {
        Ok(self.constants_at(0)?.swap_remove(name))
    }

    pub fn has_constant(self: &Rc<Self>, name: &str) -> Result<bool> {
        Ok(self.constant(name)?.is_some())
    }

    pub(crate) fn cached_constant_value(&self, name: &str) -> Option<Value> {
        self.constant_values.borrow().get(name).cloned()
    }

    pub(crate) fn cache_constant_value(&self, name: &str, value: Value) {
        self.constant_values
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    // Enum cases

    pub fn cases(self: &Rc<Self>) -> Vec<Rc<ReflectionEnumCase>> {
        self.node
            .members
            .iter()
            .filter_map(|member| match member {
                ClassMember::Case(case) => Some(Rc::new(ReflectionEnumCase::new(
                    self.ctx.clone(),
                    Rc::clone(self),
                    Rc::clone(case),
                ))),
                _ => None,
            })
            .collect()
    }

    pub fn case(self: &Rc<Self>, name: &str) -> Option<Rc<ReflectionEnumCase>> {
        self.cases().into_iter().find(|case| case.name() == name)
    }
}

impl fmt::Debug for ReflectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionClass")
            .field("name", &self.name)
            .field("kind", &self.node.kind)
            .field("source", self.ctx.source())
            .finish()
    }
}
