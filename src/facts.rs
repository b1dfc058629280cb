//! Declaration facts - the per-file output of an extractor
//!
//! Facts are framework-agnostic statements about one file's declarations:
//! imports, routers and their routes, schema models and string constants.
//! They are produced once during the scan and never mutated afterwards;
//! resolution derives new values from them instead.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One declared field of a schema model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    /// Rendering of the declared annotation, not a resolved type
    #[serde(rename = "type")]
    pub type_label: String,
    pub required: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, type_label: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            required,
        }
    }
}

/// A class recognized as a request/response model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFacts {
    /// Own fields in declaration order
    pub fields: Vec<SchemaField>,
    /// Base classes exactly as written, model bases and others alike
    pub base_class_names: Vec<String>,
}

/// Dependency category of a call made inside a route handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyCategory {
    Services,
    Database,
    External,
    Utilities,
}

impl DependencyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCategory::Services => "services",
            DependencyCategory::Database => "database",
            DependencyCategory::External => "external",
            DependencyCategory::Utilities => "utilities",
        }
    }
}

impl std::fmt::Display for DependencyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Calls attributed to one module within a dependency category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGroup {
    pub module: String,
    pub module_label: String,
    #[serde(rename = "type")]
    pub category: DependencyCategory,
    /// Unique call-site identifiers, first-seen order
    pub items: Vec<String>,
    /// Number of calls recorded against this module
    pub count: usize,
}

/// Everything a route handler was seen calling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDependencies {
    pub services: Vec<DependencyGroup>,
    pub database: Vec<DependencyGroup>,
    pub external: Vec<DependencyGroup>,
    pub utilities: Vec<DependencyGroup>,
    pub tables: Vec<String>,
    pub api_calls: Vec<String>,
}

impl RouteDependencies {
    pub fn category(&self, category: DependencyCategory) -> &[DependencyGroup] {
        match category {
            DependencyCategory::Services => &self.services,
            DependencyCategory::Database => &self.database,
            DependencyCategory::External => &self.external,
            DependencyCategory::Utilities => &self.utilities,
        }
    }

    fn category_mut(&mut self, category: DependencyCategory) -> &mut Vec<DependencyGroup> {
        match category {
            DependencyCategory::Services => &mut self.services,
            DependencyCategory::Database => &mut self.database,
            DependencyCategory::External => &mut self.external,
            DependencyCategory::Utilities => &mut self.utilities,
        }
    }

    /// Record one call against `module`, keeping `item` unique within it.
    pub fn record(&mut self, category: DependencyCategory, module: &str, item: &str) {
        let groups = self.category_mut(category);
        if let Some(group) = groups.iter_mut().find(|g| g.module == module) {
            group.count += 1;
            if !group.items.iter().any(|i| i == item) {
                group.items.push(item.to_string());
            }
            return;
        }
        groups.push(DependencyGroup {
            module: module.to_string(),
            module_label: module.to_string(),
            category,
            items: vec![item.to_string()],
            count: 1,
        });
    }

    pub fn add_table(&mut self, table: &str) {
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
    }

    pub fn add_api_call(&mut self, url: &str) {
        if !self.api_calls.iter().any(|u| u == url) {
            self.api_calls.push(url.to_string());
        }
    }

    /// Concatenation of the four categories, in category order.
    pub fn grouped(&self) -> Vec<DependencyGroup> {
        self.services
            .iter()
            .chain(&self.database)
            .chain(&self.external)
            .chain(&self.utilities)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
            && self.database.is_empty()
            && self.external.is_empty()
            && self.utilities.is_empty()
            && self.tables.is_empty()
            && self.api_calls.is_empty()
    }
}

/// One HTTP method + path binding declared on a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFacts {
    /// Route-local path; empty means the router's own base
    pub path: String,
    /// Uppercase HTTP verb
    pub method: String,
    pub owner_router: String,
    pub source_file: String,
    pub source_line: u32,
    pub function_name: Option<String>,
    pub request_model: Option<String>,
    pub response_model: Option<String>,
    pub dependencies: RouteDependencies,
}

impl RouteFacts {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        owner_router: impl Into<String>,
        source_file: impl Into<String>,
        source_line: u32,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            owner_router: owner_router.into(),
            source_file: source_file.into(),
            source_line,
            function_name: None,
            request_model: None,
            response_model: None,
            dependencies: RouteDependencies::default(),
        }
    }
}

/// An explicit `include_router`-style inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeFacts {
    /// Local or dotted reference to the included router
    pub target: String,
    pub prefix: String,
}

/// The conventional CRUD actions a router can carry default schemas for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl CrudAction {
    pub fn all() -> &'static [CrudAction] {
        &[
            CrudAction::List,
            CrudAction::Retrieve,
            CrudAction::Create,
            CrudAction::Update,
            CrudAction::Delete,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudAction::List => "list",
            CrudAction::Retrieve => "retrieve",
            CrudAction::Create => "create",
            CrudAction::Update => "update",
            CrudAction::Delete => "delete",
        }
    }

    /// The (method, route-local path) the action is served on.
    pub fn endpoint(&self) -> (&'static str, &'static str) {
        match self {
            CrudAction::List => ("GET", "/"),
            CrudAction::Retrieve => ("GET", "/{id}"),
            CrudAction::Create => ("POST", "/"),
            CrudAction::Update => ("PUT", "/{id}"),
            CrudAction::Delete => ("DELETE", "/{id}"),
        }
    }

    /// Match a `register_<action>...` style method name.
    ///
    /// Checked in a fixed order so `register_create_or_update` reads as create.
    pub fn from_method_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("register_")?;
        [
            CrudAction::Create,
            CrudAction::Update,
            CrudAction::Delete,
            CrudAction::List,
            CrudAction::Retrieve,
        ]
        .into_iter()
        .find(|action| rest.contains(action.as_str()))
    }
}

/// Default schema names used when a CRUD route declares none itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSchemas {
    pub list: Option<String>,
    pub retrieve: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

impl DefaultSchemas {
    pub fn get(&self, action: CrudAction) -> Option<&str> {
        match action {
            CrudAction::List => self.list.as_deref(),
            CrudAction::Retrieve => self.retrieve.as_deref(),
            CrudAction::Create => self.create.as_deref(),
            CrudAction::Update => self.update.as_deref(),
            CrudAction::Delete => self.delete.as_deref(),
        }
    }

    pub fn set(&mut self, action: CrudAction, schema: impl Into<String>) {
        let slot = match action {
            CrudAction::List => &mut self.list,
            CrudAction::Retrieve => &mut self.retrieve,
            CrudAction::Create => &mut self.create,
            CrudAction::Update => &mut self.update,
            CrudAction::Delete => &mut self.delete,
        };
        *slot = Some(schema.into());
    }
}

/// A named group of routes sharing a prefix and default schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterFacts {
    pub variable: String,
    /// Raw prefix, already constant-folded by the extractor
    pub prefix: String,
    /// Reference to the parent router under the nesting convention
    pub parent_variable: Option<String>,
    pub owned_model: Option<String>,
    /// Set when this file calls the nested-children inclusion on the router
    pub includes_children: bool,
    pub includes: Vec<IncludeFacts>,
    pub routes: Vec<RouteFacts>,
    pub default_schemas: DefaultSchemas,
}

impl RouterFacts {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            ..Self::default()
        }
    }
}

/// Everything the extractor learned about one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFacts {
    pub file_key: String,
    /// Local alias → fully-qualified dotted reference
    pub imports: BTreeMap<String, String>,
    /// Routers in declaration order
    pub routers: IndexMap<String, RouterFacts>,
    pub app_variable: Option<String>,
    pub models: BTreeMap<String, ModelFacts>,
    pub constants: BTreeMap<String, String>,
    /// Variables receiving the nested-children inclusion call in this file
    pub nested_include_receivers: BTreeSet<String>,
}

impl FileFacts {
    pub fn new(file_key: impl Into<String>) -> Self {
        Self {
            file_key: file_key.into(),
            ..Self::default()
        }
    }

    /// The router bound to the application object, if any.
    pub fn app_router(&self) -> Option<&RouterFacts> {
        self.app_variable
            .as_deref()
            .and_then(|var| self.routers.get(var))
    }

    /// Get or create the router for `variable`.
    pub fn router_mut(&mut self, variable: &str) -> &mut RouterFacts {
        self.routers
            .entry(variable.to_string())
            .or_insert_with(|| RouterFacts::new(variable))
    }

    pub fn route_count(&self) -> usize {
        self.routers.values().map(|r| r.routes.len()).sum()
    }
}
