//! Static reflection for PHP source code.
//!
//! Classes, functions and constants are located in PHP files, strings,
//! directories, autoloader mappings or runtime stubs, parsed, and exposed
//! through a reflection model, all without executing any PHP.

pub mod ast_locator;
pub mod config;
pub mod error;
pub mod identifier;
pub mod located_source;
pub mod names;
pub mod node_compiler;
pub mod parser;
pub mod reflection;
pub mod reflector;
pub mod runtime;
pub mod source_locator;
pub mod source_stubber;

pub use config::{ReflectionBuilder, ReflectionEnvironment};
pub use error::{ReflectionError, Result};
pub use identifier::{Identifier, IdentifierType};
pub use located_source::LocatedSource;
pub use node_compiler::{ArrayKey, Value};
pub use reflection::{
    FunctionLike, Reflection, ReflectionClass, ReflectionClassConstant, ReflectionConstant,
    ReflectionEnumCase, ReflectionFunction, ReflectionMethod, ReflectionNamedType,
    ReflectionParameter, ReflectionProperty, ReflectionType,
};
pub use reflector::{ClassReflector, ConstantReflector, FunctionReflector, Reflector};
