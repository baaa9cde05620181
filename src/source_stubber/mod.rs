//! Stub source for symbols that have no PHP file: runtime built-ins and
//! classes declared through `eval()`.

mod core_stubs;

use std::collections::HashMap;

pub use core_stubs::CoreStubs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubData {
    /// Complete PHP file text, opening tag included.
    pub code: String,
    pub extension: Option<String>,
}

impl StubData {
    pub fn new(code: impl Into<String>, extension: Option<&str>) -> Self {
        Self {
            code: code.into(),
            extension: extension.map(str::to_string),
        }
    }
}

pub trait SourceStubber {
    fn generate_class_stub(&self, class_name: &str) -> Option<StubData>;

    fn generate_function_stub(&self, function_name: &str) -> Option<StubData>;

    fn generate_constant_stub(&self, constant_name: &str) -> Option<StubData>;
}

/// Stubber backed by lookup tables. Class and function names match
/// case-insensitively, constants exactly.
#[derive(Debug, Clone, Default)]
pub struct MapSourceStubber {
    classes: HashMap<String, StubData>,
    functions: HashMap<String, StubData>,
    constants: HashMap<String, StubData>,
}

impl MapSourceStubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: &str, stub: StubData) -> Self {
        self.classes.insert(normalize(name).to_ascii_lowercase(), stub);
        self
    }

    pub fn with_function(mut self, name: &str, stub: StubData) -> Self {
        self.functions
            .insert(normalize(name).to_ascii_lowercase(), stub);
        self
    }

    pub fn with_constant(mut self, name: &str, stub: StubData) -> Self {
        self.constants.insert(normalize(name).to_string(), stub);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.functions.len() + self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SourceStubber for MapSourceStubber {
    fn generate_class_stub(&self, class_name: &str) -> Option<StubData> {
        self.classes
            .get(&normalize(class_name).to_ascii_lowercase())
            .cloned()
    }

    fn generate_function_stub(&self, function_name: &str) -> Option<StubData> {
        self.functions
            .get(&normalize(function_name).to_ascii_lowercase())
            .cloned()
    }

    fn generate_constant_stub(&self, constant_name: &str) -> Option<StubData> {
        self.constants.get(normalize(constant_name)).cloned()
    }
}

fn normalize(name: &str) -> &str {
    name.strip_prefix('\\').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_stubber_matches_classes_case_insensitively() {
        let stubber = MapSourceStubber::new()
            .with_class("Foo\\Bar", StubData::new("<?php namespace Foo; class Bar {}", Some("foo")))
            .with_constant("LIMIT", StubData::new("<?php const LIMIT = 1;", None));

        let stub = stubber.generate_class_stub("\\foo\\BAR").unwrap();
        assert_eq!(stub.extension.as_deref(), Some("foo"));
        assert!(stubber.generate_constant_stub("limit").is_none());
        assert!(stubber.generate_constant_stub("LIMIT").is_some());
        assert!(stubber.generate_function_stub("Bar").is_none());
    }
}
