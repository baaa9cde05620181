use std::fmt;
use std::rc::Rc;

use super::{FunctionCore, FunctionLike, ReflectionClass, check_depth};
use crate::error::Result;
use crate::parser::ast::{FunctionDecl, Visibility};

pub struct ReflectionMethod {
    core: FunctionCore,
    /// Class whose member list contains the method; the using class for trait methods.
    class: Rc<ReflectionClass>,
    name: String,
    visibility: Visibility,
    trait_name: Option<String>,
}

impl ReflectionMethod {
    pub(crate) fn declared(class: &Rc<ReflectionClass>, node: Rc<FunctionDecl>) -> Rc<Self> {
        let name = node
            .name
            .as_ref()
            .map(|name| name.name.clone())
            .unwrap_or_default();
        let visibility = node.modifiers.visibility.unwrap_or(Visibility::Public);
        Rc::new(Self {
            core: FunctionCore::new(class.context().clone(), node, Some(Rc::clone(class))),
            class: Rc::clone(class),
            name,
            visibility,
            trait_name: None,
        })
    }

    /// Copy of a trait method as seen from the class that uses the trait.
    pub(crate) fn adopted_by(
        &self,
        class: &Rc<ReflectionClass>,
        alias: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Rc<Self> {
        Rc::new(Self {
            core: self.core.with_self_class(Rc::clone(class)),
            class: Rc::clone(class),
            name: alias.map_or_else(|| self.name.clone(), str::to_string),
            visibility: visibility.unwrap_or(self.visibility),
            trait_name: Some(
                self.trait_name
                    .clone()
                    .unwrap_or_else(|| self.class.name().to_string()),
            ),
        })
    }

    pub fn declaring_class(&self) -> &Rc<ReflectionClass> {
        &self.class
    }

    pub fn declaring_class_name(&self) -> &str {
        self.class.name()
    }

    /// Trait the method was imported from, if any.
    pub fn trait_name(&self) -> Option<&str> {
        self.trait_name.as_deref()
    }

    /// Name in the declaring source; differs from `name()` for trait aliases.
    pub fn original_name(&self) -> &str {
        self.core
            .node()
            .name
            .as_ref()
            .map_or(self.name.as_str(), |name| name.name.as_str())
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility == Visibility::Protected
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_static(&self) -> bool {
        self.core.node().modifiers.is_static
    }

    pub fn is_final(&self) -> bool {
        self.core.node().modifiers.is_final
    }

    pub fn is_abstract(&self) -> bool {
        self.core.node().modifiers.is_abstract || self.class.is_interface()
    }

    pub fn is_constructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__construct")
    }

    pub fn is_destructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__destruct")
    }

    /// The method this one overrides or implements: the nearest ancestor
    /// class declaring a non-private method of the same name, else an
    /// interface declaring it.
    pub fn prototype(&self) -> Result<Option<Rc<ReflectionMethod>>> {
        let mut ancestor = self.class.parent_class()?;
        let mut depth = 0;
        while let Some(class) = ancestor {
            depth += 1;
            check_depth(depth, self.class.name())?;
            if let Some(method) = class.immediate_method(&self.name)?
                && !method.is_private()
            {
                return Ok(Some(method));
            }
            ancestor = class.parent_class()?;
        }

        for interface in self.class.interfaces()? {
            if let Some(method) = interface.immediate_method(&self.name)? {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }
}

impl FunctionLike for ReflectionMethod {
    fn core(&self) -> &FunctionCore {
        &self.core
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn short_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ReflectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectionMethod({} {}::{})",
            super::visibility_name(self.visibility),
            self.class.name(),
            self.name
        )
    }
}
