//! Router Hierarchy Resolver
//!
//! Pass A indexes parent/child relationships declared through the nesting
//! convention across all files. Pass B walks each application's inclusion
//! graph depth-first, composing prefixes and emitting one resolved route per
//! occurrence. Without any application the resolver falls back to emitting
//! every route under its own local path.

use super::finalize::{ResolvedRoute, finalize_route};
use super::imports::ImportResolver;
use super::path::join_path;
use super::types::TypeResolver;
use crate::adapter::SourceConventions;
use crate::facts::{FileFacts, RouterFacts};
use crate::router_id::RouterId;
use crate::store::FactStore;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// Pass A output: who nests under whom, and who opted in to nesting.
#[derive(Debug, Default, Clone)]
pub struct RouterIndex {
    children: HashMap<RouterId, Vec<RouterId>>,
    nested_receivers: HashSet<RouterId>,
}

impl RouterIndex {
    pub fn build(store: &FactStore, imports: &ImportResolver<'_>) -> Self {
        let mut index = Self::default();

        for file in store.files() {
            for router in file.routers.values() {
                let Some(parent) = router.parent_variable.as_deref() else {
                    continue;
                };
                let parent_id = locate_or_local(imports, file, parent);
                let child_id = RouterId::new(&file.file_key, &router.variable);
                trace!("nesting {} under {}", child_id, parent_id);
                index.children.entry(parent_id).or_default().push(child_id);
            }

            for receiver in &file.nested_include_receivers {
                index
                    .nested_receivers
                    .insert(locate_or_local(imports, file, receiver));
            }
        }

        index
    }

    /// Children in scan order (file-key order, then variable order).
    pub fn children(&self, parent: &RouterId) -> &[RouterId] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any file called the nested-children inclusion on `router`.
    pub fn includes_children(&self, router: &RouterId) -> bool {
        self.nested_receivers.contains(router)
    }
}

fn locate_or_local(imports: &ImportResolver<'_>, file: &FileFacts, reference: &str) -> RouterId {
    imports
        .locate_router(file, reference)
        .unwrap_or_else(|| RouterId::new(&file.file_key, reference))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResolutionStats {
    pub entry_points: Vec<RouterId>,
    pub routes: usize,
    pub routers_visited: usize,
    pub unresolved_includes: usize,
    pub fallback: bool,
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Router Resolution Stats:")?;
        writeln!(f, "  Entry points: {}", self.entry_points.len())?;
        writeln!(f, "  Routers visited: {}", self.routers_visited)?;
        writeln!(f, "  Routes: {}", self.routes)?;
        writeln!(f, "  Unresolved includes: {}", self.unresolved_includes)?;
        if self.fallback {
            writeln!(f, "  (no application found, local paths only)")?;
        }
        Ok(())
    }
}

pub struct RouterHierarchyResolver<'a> {
    store: &'a FactStore,
    imports: ImportResolver<'a>,
    types: TypeResolver<'a>,
    index: RouterIndex,
}

impl<'a> RouterHierarchyResolver<'a> {
    /// Build the resolver, running Pass A over the whole store.
    pub fn new(store: &'a FactStore, conventions: &'a SourceConventions) -> Self {
        let imports = ImportResolver::new(store, conventions);
        let index = RouterIndex::build(store, &imports);
        Self {
            store,
            imports,
            types: TypeResolver::new(store, conventions),
            index,
        }
    }

    pub fn index(&self) -> &RouterIndex {
        &self.index
    }

    /// Application routers, in file-key order.
    pub fn entry_points(&self) -> Vec<RouterId> {
        self.store
            .files()
            .filter_map(|file| {
                let app = file.app_variable.as_deref()?;
                file.routers
                    .contains_key(app)
                    .then(|| RouterId::new(&file.file_key, app))
            })
            .collect()
    }

    pub fn resolve(&self) -> Vec<ResolvedRoute> {
        self.resolve_with_stats().0
    }

    /// Pass B. Pure over the store: repeated calls yield identical output.
    pub fn resolve_with_stats(&self) -> (Vec<ResolvedRoute>, ResolutionStats) {
        let mut routes = Vec::new();
        let mut stats = ResolutionStats::default();
        let entry_points = self.entry_points();

        if entry_points.is_empty() {
            debug!("no application object found, emitting routes under local paths");
            stats.fallback = true;
            for file in self.store.files() {
                for router in file.routers.values() {
                    for route in &router.routes {
                        routes.push(finalize_route(route, router, route.path.clone(), &self.types));
                    }
                }
            }
        } else {
            for entry in &entry_points {
                debug!("walking application {}", entry);
                let mut visited = HashSet::new();
                if let Some((file, router)) = self.store.router(entry) {
                    self.traverse(file, router, "", 0, &mut visited, &mut routes, &mut stats);
                }
                stats.routers_visited += visited.len();
            }
        }
        stats.entry_points = entry_points;

        stats.routes = routes.len();
        (routes, stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn traverse(
        &self,
        file: &FileFacts,
        router: &RouterFacts,
        inherited_prefix: &str,
        level: usize,
        visited: &mut HashSet<RouterId>,
        routes: &mut Vec<ResolvedRoute>,
        stats: &mut ResolutionStats,
    ) {
        let id = RouterId::new(&file.file_key, &router.variable);
        if !visited.insert(id.clone()) {
            trace!("{} already visited on this walk", id);
            return;
        }

        let combined = join_path(inherited_prefix, &router.prefix);

        for route in &router.routes {
            let full_path = join_path(&combined, &route.path);
            routes.push(finalize_route(route, router, full_path, &self.types));
        }

        for include in &router.includes {
            let target = self
                .imports
                .locate_router(file, &include.target)
                .and_then(|target| self.store.router(&target));
            match target {
                Some((target_file, target_router)) => {
                    let prefix = join_path(&combined, &include.prefix);
                    self.traverse(target_file, target_router, &prefix, level, visited, routes, stats);
                }
                None => {
                    debug!("{}: include of '{}' did not resolve", id, include.target);
                    stats.unresolved_includes += 1;
                }
            }
        }

        if router.includes_children || self.index.includes_children(&id) {
            let child_prefix = join_path(&combined, &format!("/{{p{}_pk}}", level + 1));
            for child in self.index.children(&id) {
                if let Some((child_file, child_router)) = self.store.router(child) {
                    self.traverse(child_file, child_router, &child_prefix, level + 1, visited, routes, stats);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{LanguageExtractor, PYTHON_CONVENTIONS, PythonExtractor};
    use crate::facts::{IncludeFacts, RouteFacts};

    fn route(file: &str, router: &str, method: &str, path: &str) -> RouteFacts {
        RouteFacts::new(path, method, router, file, 1)
    }

    fn app_file(key: &str) -> FileFacts {
        let mut file = FileFacts::new(key);
        file.app_variable = Some("app".to_string());
        file.router_mut("app");
        file
    }

    fn full_paths(routes: &[ResolvedRoute]) -> Vec<(&str, &str)> {
        routes
            .iter()
            .map(|r| (r.method.as_str(), r.full_path.as_str()))
            .collect()
    }

    #[test]
    fn test_application_includes_imported_router() {
        let mut main = app_file("app.py");
        main.imports.insert("users".into(), "users".into());
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "users.router".into(),
            prefix: String::new(),
        });

        let mut users = FileFacts::new("users.py");
        let router = users.router_mut("router");
        router.prefix = "/users".into();
        router.routes.push(route("users.py", "router", "GET", "/"));

        let store: FactStore = [main, users].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        let routes = resolver.resolve();
        assert_eq!(full_paths(&routes), vec![("GET", "/users")]);
        assert_eq!(routes[0].file_path, "users.py");
        assert_eq!(routes[0].router_var, "router");
    }

    #[test]
    fn test_prefixes_compose_through_includes() {
        let mut main = app_file("main.py");
        main.imports.insert("api_router".into(), "api.router".into());
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "api_router".into(),
            prefix: "/api".into(),
        });
        main.routers.get_mut("app").unwrap().routes.push(route("main.py", "app", "GET", "/health"));

        let mut api = FileFacts::new("api.py");
        api.imports.insert("items".into(), "items".into());
        let router = api.router_mut("router");
        router.prefix = "/v1".into();
        router.includes.push(IncludeFacts {
            target: "items.router".into(),
            prefix: "/items/".into(),
        });

        let mut items = FileFacts::new("items.py");
        let router = items.router_mut("router");
        router.routes.push(route("items.py", "router", "GET", "/"));
        router.routes.push(route("items.py", "router", "DELETE", "/{id}"));

        let store: FactStore = [main, api, items].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        let (routes, stats) = resolver.resolve_with_stats();
        assert_eq!(
            full_paths(&routes),
            vec![
                ("GET", "/health"),
                ("GET", "/api/v1/items"),
                ("DELETE", "/api/v1/items/{id}"),
            ]
        );
        assert_eq!(stats.entry_points, vec![RouterId::new("main.py", "app")]);
        assert_eq!(stats.routers_visited, 3);
        assert!(!stats.fallback);
    }

    #[test]
    fn test_inclusion_cycle_terminates() {
        let mut main = app_file("main.py");
        let app = main.routers.get_mut("app").unwrap();
        app.includes.push(IncludeFacts { target: "a".into(), prefix: "/a".into() });

        let a = main.router_mut("a");
        a.routes.push(route("main.py", "a", "GET", "/x"));
        a.includes.push(IncludeFacts { target: "b".into(), prefix: "/b".into() });

        let b = main.router_mut("b");
        b.routes.push(route("main.py", "b", "GET", "/y"));
        b.includes.push(IncludeFacts { target: "a".into(), prefix: "/again".into() });

        let store: FactStore = [main].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(full_paths(&resolver.resolve()), vec![("GET", "/a/x"), ("GET", "/a/b/y")]);
    }

    #[test]
    fn test_nested_children_get_parent_key_segment() {
        let mut main = app_file("main.py");
        main.imports.insert("posts".into(), "posts".into());
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "posts.router".into(),
            prefix: String::new(),
        });

        let mut posts = FileFacts::new("posts.py");
        let router = posts.router_mut("router");
        router.prefix = "/posts".into();
        router.includes_children = true;
        router.routes.push(route("posts.py", "router", "GET", "/"));

        let mut comments = FileFacts::new("comments.py");
        comments.imports.insert("posts".into(), "posts".into());
        let router = comments.router_mut("router");
        router.prefix = "/comments".into();
        router.parent_variable = Some("posts.router".into());
        router.routes.push(route("comments.py", "router", "GET", "/"));

        let store: FactStore = [main, posts, comments].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(
            resolver.index().children(&RouterId::new("posts.py", "router")),
            &[RouterId::new("comments.py", "router")]
        );
        assert_eq!(
            full_paths(&resolver.resolve()),
            vec![("GET", "/posts"), ("GET", "/posts/{p1_pk}/comments")]
        );
    }

    #[test]
    fn test_children_skipped_without_nested_include() {
        let mut main = app_file("main.py");
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "parent".into(),
            prefix: String::new(),
        });
        main.router_mut("parent").prefix = "/parent".into();
        let child = main.router_mut("child");
        child.parent_variable = Some("parent".into());
        child.routes.push(route("main.py", "child", "GET", "/"));

        let store: FactStore = [main].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);
        assert!(resolver.resolve().is_empty());
    }

    #[test]
    fn test_nested_include_called_from_another_file() {
        let mut main = app_file("main.py");
        main.imports.insert("parent_router".into(), "parents.router".into());
        main.nested_include_receivers.insert("parent_router".into());
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "parent_router".into(),
            prefix: String::new(),
        });

        let mut parents = FileFacts::new("parents.py");
        parents.router_mut("router").prefix = "/parents".into();
        let child = parents.router_mut("child");
        child.prefix = "/kids".into();
        child.parent_variable = Some("router".into());
        child.routes.push(route("parents.py", "child", "GET", "/{id}"));

        let store: FactStore = [main, parents].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert!(resolver.index().includes_children(&RouterId::new("parents.py", "router")));
        assert_eq!(
            full_paths(&resolver.resolve()),
            vec![("GET", "/parents/{p1_pk}/kids/{id}")]
        );
    }

    #[test]
    fn test_fallback_without_application() {
        let mut users = FileFacts::new("users.py");
        let router = users.router_mut("router");
        router.prefix = "/users".into();
        router.routes.push(route("users.py", "router", "GET", "/list"));

        let store: FactStore = [users].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        let (routes, stats) = resolver.resolve_with_stats();
        assert!(stats.fallback);
        assert_eq!(full_paths(&routes), vec![("GET", "/list")]);
    }

    #[test]
    fn test_fallback_keeps_declaration_order() {
        let source = r#"
from fastapi import APIRouter

users = APIRouter()
admin = APIRouter()

@users.get("/u")
def list_users():
    pass

@admin.get("/a")
def list_admins():
    pass
"#;
        let facts = PythonExtractor::new().extract("routes.py", source).unwrap();
        let store: FactStore = [facts].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(full_paths(&resolver.resolve()), vec![("GET", "/u"), ("GET", "/a")]);
    }

    #[test]
    fn test_children_follow_declaration_order() {
        let mut main = app_file("main.py");
        main.imports.insert("tree".into(), "tree".into());
        main.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "tree.router".into(),
            prefix: String::new(),
        });

        let mut tree = FileFacts::new("tree.py");
        let parent = tree.router_mut("router");
        parent.prefix = "/trees".into();
        parent.includes_children = true;
        for name in ["zebra", "alpha"] {
            let child = tree.router_mut(name);
            child.prefix = format!("/{}", name);
            child.parent_variable = Some("router".into());
            child.routes.push(route("tree.py", name, "GET", "/"));
        }

        let store: FactStore = [main, tree].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(
            full_paths(&resolver.resolve()),
            vec![("GET", "/trees/{p1_pk}/zebra"), ("GET", "/trees/{p1_pk}/alpha")]
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut main = app_file("main.py");
        let app = main.routers.get_mut("app").unwrap();
        app.prefix = "/root".into();
        app.routes.push(route("main.py", "app", "GET", "/a"));
        app.includes.push(IncludeFacts { target: "app".into(), prefix: "/self".into() });

        let store: FactStore = [main].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        let first = resolver.resolve();
        let second = resolver.resolve();
        assert_eq!(first, second);
        assert_eq!(full_paths(&first), vec![("GET", "/root/a")]);
    }

    #[test]
    fn test_same_router_under_two_applications() {
        let mut shared = FileFacts::new("shared.py");
        shared.router_mut("router").routes.push(route("shared.py", "router", "GET", "/ping"));

        let mut public = app_file("public.py");
        public.imports.insert("shared".into(), "shared".into());
        public.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "shared.router".into(),
            prefix: "/public".into(),
        });

        let mut admin = app_file("admin.py");
        admin.imports.insert("shared".into(), "shared".into());
        admin.routers.get_mut("app").unwrap().includes.push(IncludeFacts {
            target: "shared.router".into(),
            prefix: "/admin".into(),
        });

        let store: FactStore = [shared, public, admin].into_iter().collect();
        let resolver = RouterHierarchyResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(
            full_paths(&resolver.resolve()),
            vec![("GET", "/admin/ping"), ("GET", "/public/ping")]
        );
    }
}
