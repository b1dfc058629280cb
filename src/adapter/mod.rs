//! Extraction Adapter Framework
//!
//! A language extractor walks one file's syntax tree and emits declaration
//! facts. Framework adapters plug into it and recognize route decorators and
//! router constructors. The resolvers downstream never see syntax.

pub mod callsite;
pub mod crud;
pub mod dependencies;
pub mod fastapi;
pub mod framework;
pub mod python;

pub use callsite::{CallSite, Expr};
pub use crud::CrudRouterAdapter;
pub use fastapi::FastApiAdapter;
pub use framework::{
    AdapterRegistry, FrameworkAdapter, LanguageExtractor, PYTHON_CONVENTIONS, RouteDecorator,
    RouterInit, SourceConventions, default_registry,
};
pub use python::PythonExtractor;
