//! Cross-file linking
//!
//! Everything here reads a finished [`FactStore`](crate::store::FactStore)
//! and derives new values; nothing mutates the facts.

pub mod finalize;
pub mod hierarchy;
pub mod imports;
pub mod path;
pub mod types;

pub use finalize::{ResolvedDependencies, ResolvedRoute, finalize_route};
pub use hierarchy::{ResolutionStats, RouterHierarchyResolver, RouterIndex};
pub use imports::{ImportResolver, ResolvedImport};
pub use path::join_path;
pub use types::TypeResolver;
