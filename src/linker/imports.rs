//! Import Resolver
//!
//! Maps dotted module references onto scanned file keys by longest prefix,
//! and expands local names through a file's import table.

use crate::adapter::SourceConventions;
use crate::facts::FileFacts;
use crate::router_id::RouterId;
use crate::store::FactStore;

/// A reference resolved to a scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub file: String,
    /// Remaining dotted segments past the module, if any
    pub member: Option<String>,
}

pub struct ImportResolver<'a> {
    store: &'a FactStore,
    conventions: &'a SourceConventions,
}

impl<'a> ImportResolver<'a> {
    pub fn new(store: &'a FactStore, conventions: &'a SourceConventions) -> Self {
        Self { store, conventions }
    }

    /// Resolve `a.b.c` against the store.
    ///
    /// Tries the longest prefix first; at each length the module file wins
    /// over the package file. Relative references (leading dot) never resolve.
    pub fn resolve(&self, reference: &str) -> Option<ResolvedImport> {
        if reference.is_empty() || reference.starts_with('.') {
            return None;
        }

        let parts: Vec<&str> = reference.split('.').collect();
        for len in (1..=parts.len()).rev() {
            let candidate = parts[..len].join("/");
            let keys = [
                self.conventions.module_file(&candidate),
                self.conventions.package_file(&candidate),
            ];
            if let Some(file) = keys.into_iter().find(|key| self.store.contains(key)) {
                let member = (len < parts.len()).then(|| parts[len..].join("."));
                return Some(ResolvedImport { file, member });
            }
        }
        None
    }

    /// Expand a local reference through `file`'s imports.
    ///
    /// An exact alias wins; otherwise the first segment is looked up and the
    /// rest re-appended (`users.router` with `users` → `app.api.users`).
    pub fn qualify(&self, file: &FileFacts, reference: &str) -> Option<String> {
        if let Some(target) = file.imports.get(reference) {
            return Some(target.clone());
        }
        let (head, rest) = reference.split_once('.')?;
        file.imports
            .get(head)
            .map(|target| format!("{}.{}", target, rest))
    }

    /// Identify the router a reference in `file` points at.
    ///
    /// Local routers first, then imports. Does not check that the target
    /// file actually declares the router.
    pub fn locate_router(&self, file: &FileFacts, reference: &str) -> Option<RouterId> {
        if file.routers.contains_key(reference) {
            return Some(RouterId::new(&file.file_key, reference));
        }

        let qualified = self.qualify(file, reference)?;
        let target = self.resolve(&qualified)?;
        let variable = target.member.unwrap_or_else(|| last_segment(&qualified).to_string());
        Some(RouterId::new(target.file, variable))
    }
}

fn last_segment(reference: &str) -> &str {
    reference.rsplit('.').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PYTHON_CONVENTIONS;

    fn store(keys: &[&str]) -> FactStore {
        keys.iter().map(|k| FileFacts::new(*k)).collect()
    }

    #[test]
    fn test_longest_prefix_wins() {
        let store = store(&["app/models.py", "app/models/user.py", "app/__init__.py"]);
        let resolver = ImportResolver::new(&store, &PYTHON_CONVENTIONS);

        let resolved = resolver.resolve("app.models.user.User").unwrap();
        assert_eq!(resolved.file, "app/models/user.py");
        assert_eq!(resolved.member.as_deref(), Some("User"));

        let resolved = resolver.resolve("app.models.Item").unwrap();
        assert_eq!(resolved.file, "app/models.py");
        assert_eq!(resolved.member.as_deref(), Some("Item"));

        let resolved = resolver.resolve("app.config.settings.debug").unwrap();
        assert_eq!(resolved.file, "app/__init__.py");
        assert_eq!(resolved.member.as_deref(), Some("config.settings.debug"));
    }

    #[test]
    fn test_module_file_preferred_over_package() {
        let store = store(&["app/api.py", "app/api/__init__.py"]);
        let resolver = ImportResolver::new(&store, &PYTHON_CONVENTIONS);

        let resolved = resolver.resolve("app.api").unwrap();
        assert_eq!(resolved.file, "app/api.py");
        assert_eq!(resolved.member, None);
    }

    #[test]
    fn test_unresolvable_references() {
        let store = store(&["app/main.py"]);
        let resolver = ImportResolver::new(&store, &PYTHON_CONVENTIONS);

        assert!(resolver.resolve("fastapi.APIRouter").is_none());
        assert!(resolver.resolve("").is_none());
        assert!(resolver.resolve(".main").is_none());
    }

    #[test]
    fn test_qualify_and_locate_router() {
        let mut users = FileFacts::new("app/api/users.py");
        users.router_mut("router");
        let mut main = FileFacts::new("app/main.py");
        main.imports.insert("users".into(), "app.api.users".into());
        main.imports.insert("items_router".into(), "app.api.items.router".into());
        main.router_mut("app");
        let store: FactStore = [users, main].into_iter().collect();
        let resolver = ImportResolver::new(&store, &PYTHON_CONVENTIONS);
        let main = store.get("app/main.py").unwrap();

        assert_eq!(resolver.qualify(main, "users.router").as_deref(), Some("app.api.users.router"));
        assert_eq!(resolver.qualify(main, "items_router").as_deref(), Some("app.api.items.router"));
        assert_eq!(resolver.qualify(main, "other.router"), None);

        assert_eq!(
            resolver.locate_router(main, "users.router"),
            Some(RouterId::new("app/api/users.py", "router"))
        );
        assert_eq!(resolver.locate_router(main, "app"), Some(RouterId::new("app/main.py", "app")));
        assert_eq!(resolver.locate_router(main, "items_router"), None);
    }
}
