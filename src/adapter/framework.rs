//! Core adapter framework
//!
//! Two seams live here. A [`LanguageExtractor`] turns one source file into
//! [`FileFacts`]; a [`FrameworkAdapter`] recognizes one web framework's
//! route decorators and router constructors inside already-lowered calls.

use super::callsite::CallSite;
use crate::facts::FileFacts;
use crate::{Error, Result};
use std::path::Path;

/// Module layout rules of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConventions {
    /// Extension of a module file, without the dot
    pub module_extension: &'static str,
    /// Stem of the file that makes a directory a package
    pub package_init: &'static str,
    /// Base-class names that mark a class as a schema model
    pub model_base_markers: &'static [&'static str],
}

impl SourceConventions {
    /// `a/b` → `a/b.py`
    pub fn module_file(&self, candidate: &str) -> String {
        format!("{}.{}", candidate, self.module_extension)
    }

    /// `a/b` → `a/b/__init__.py`
    pub fn package_file(&self, candidate: &str) -> String {
        format!("{}/{}.{}", candidate, self.package_init, self.module_extension)
    }

    pub fn is_model_base(&self, base: &str) -> bool {
        self.model_base_markers
            .iter()
            .any(|marker| base.contains(marker))
    }
}

pub const PYTHON_CONVENTIONS: SourceConventions = SourceConventions {
    module_extension: "py",
    package_init: "__init__",
    model_base_markers: &["BaseModel", "SQLModel", "Schema", "Model"],
};

/// Trait for language extractors
///
/// Each extractor is responsible for:
/// 1. Identifying files it can parse
/// 2. Extracting declaration facts using tree-sitter
/// 3. Describing the module conventions the resolvers must follow
pub trait LanguageExtractor: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this extractor handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this extractor can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    fn conventions(&self) -> &SourceConventions;

    /// Extract the facts of one file. Fails on unparseable source.
    fn extract(&self, file_key: &str, source: &str) -> Result<FileFacts>;
}

/// A route binding recognized on a decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecorator {
    pub method: String,
    pub path: String,
    /// Keyword argument naming the response model, if the framework has one
    pub response_model_kwarg: Option<&'static str>,
}

/// A router construction recognized on an assignment's right-hand side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterInit {
    pub prefix: String,
    pub parent: Option<String>,
    pub owned_model: Option<String>,
}

/// Trait for web framework adapters
pub trait FrameworkAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize a route decorator on the function `function_name`.
    fn parse_route_decorator(&self, decorator: &CallSite, function_name: &str) -> Option<RouteDecorator>;

    /// Recognize a router constructor call.
    fn parse_router_init(&self, call: &CallSite) -> Option<RouterInit>;

    /// Whether the call constructs the application object.
    fn is_application(&self, _call: &CallSite) -> bool {
        false
    }

    /// Whether the call is the nested-children inclusion convention.
    fn is_nested_include(&self, _call: &CallSite) -> bool {
        false
    }
}

/// Registry of framework adapters
///
/// Adapters are consulted in registration order; the first match wins.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn FrameworkAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter
    pub fn register(&mut self, adapter: impl FrameworkAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Build a registry from adapter names, in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut registry = Self::new();
        for name in names {
            match name.as_ref() {
                "crud" => registry.register(super::crud::CrudRouterAdapter),
                "fastapi" => registry.register(super::fastapi::FastApiAdapter),
                other => {
                    return Err(Error::Config(format!("unknown framework adapter '{}'", other)));
                }
            }
        }
        Ok(registry)
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[Box<dyn FrameworkAdapter>] {
        &self.adapters
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn route_decorator(&self, decorator: &CallSite, function_name: &str) -> Option<RouteDecorator> {
        self.adapters
            .iter()
            .find_map(|a| a.parse_route_decorator(decorator, function_name))
    }

    pub fn router_init(&self, call: &CallSite) -> Option<RouterInit> {
        self.adapters.iter().find_map(|a| a.parse_router_init(call))
    }

    pub fn is_application(&self, call: &CallSite) -> bool {
        self.adapters.iter().any(|a| a.is_application(call))
    }

    pub fn is_nested_include(&self, call: &CallSite) -> bool {
        self.adapters.iter().any(|a| a.is_nested_include(call))
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(super::crud::CrudRouterAdapter);
    registry.register(super::fastapi::FastApiAdapter);
    registry
}
