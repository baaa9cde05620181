use std::rc::Rc;

use super::Reflector;
use crate::error::Result;
use crate::identifier::IdentifierType;
use crate::reflection::{Reflection, ReflectionClass, ReflectionConstant, ReflectionFunction};

#[derive(Debug, Clone)]
pub struct ClassReflector {
    reflector: Reflector,
}

impl ClassReflector {
    pub fn new(reflector: Reflector) -> Self {
        Self { reflector }
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn reflect(&self, class_name: &str) -> Result<Rc<ReflectionClass>> {
        self.reflector.reflect_class(class_name)
    }

    pub fn reflect_all(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        Ok(self
            .reflector
            .reflect_all(IdentifierType::Class)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Class(class) => Some(class),
                _ => None,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct FunctionReflector {
    reflector: Reflector,
}

impl FunctionReflector {
    pub fn new(reflector: Reflector) -> Self {
        Self { reflector }
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn reflect(&self, function_name: &str) -> Result<Rc<ReflectionFunction>> {
        self.reflector.reflect_function(function_name)
    }

    pub fn has(&self, function_name: &str) -> Result<bool> {
        self.reflector.has_function(function_name)
    }

    pub fn reflect_all(&self) -> Result<Vec<Rc<ReflectionFunction>>> {
        Ok(self
            .reflector
            .reflect_all(IdentifierType::Function)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Function(function) => Some(function),
                _ => None,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct ConstantReflector {
    reflector: Reflector,
}

impl ConstantReflector {
    pub fn new(reflector: Reflector) -> Self {
        Self { reflector }
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn reflect(&self, constant_name: &str) -> Result<Rc<ReflectionConstant>> {
        self.reflector.reflect_constant(constant_name)
    }

    pub fn reflect_all(&self) -> Result<Vec<Rc<ReflectionConstant>>> {
        Ok(self
            .reflector
            .reflect_all(IdentifierType::Constant)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Constant(constant) => Some(constant),
                _ => None,
            })
            .collect())
    }
}
