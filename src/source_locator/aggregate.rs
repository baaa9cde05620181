use std::rc::Rc;

use tracing::warn;

use super::{ReflectionScan, ScanFailure, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflection::Reflection;
use crate::reflector::Reflector;

/// Asks each child in order; the first one that finds the symbol wins.
pub struct AggregateSourceLocator {
    locators: Vec<Rc<dyn SourceLocator>>,
}

impl AggregateSourceLocator {
    pub fn new(locators: Vec<Rc<dyn SourceLocator>>) -> Self {
        Self { locators }
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl SourceLocator for AggregateSourceLocator {
    fn locate_one(&self, reflector: &Reflector, identifier: &Identifier) -> Result<Option<Reflection>> {
        for locator in &self.locators {
            if let Some(reflection) = locator.locate_one(reflector, identifier)? {
                return Ok(Some(reflection));
            }
        }
        Ok(None)
    }

    /// Concatenates every child's results. A child that fails is recorded as
    /// a failure and the scan continues.
    fn locate_all_of_kind(&self, reflector: &Reflector, kind: IdentifierType) -> Result<ReflectionScan> {
        let mut scan = ReflectionScan::default();
        for locator in &self.locators {
            match locator.locate_all_of_kind(reflector, kind) {
                Ok(found) => scan.extend(found),
                Err(err) => {
                    let failure = ScanFailure {
                        location: failure_location(&err),
                        message: err.to_string(),
                    };
                    warn!(location = %failure.location, error = %err, "skipping source during scan");
                    scan.failures.push(failure);
                }
            }
        }
        Ok(scan)
    }
}

fn failure_location(err: &crate::error::ReflectionError) -> String {
    match err {
        crate::error::ReflectionError::ParseToAstFailure { location, .. } => location.clone(),
        crate::error::ReflectionError::InvalidFileLocation { path, .. } => {
            path.display().to_string()
        }
        _ => String::new(),
    }
}
