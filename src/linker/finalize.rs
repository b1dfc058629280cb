//! Route finalization
//!
//! Turns a route occurrence plus its computed full path into an independent
//! [`ResolvedRoute`]: CRUD default schemas filled in, model fields resolved,
//! dependencies flattened into their grouped form.

use super::types::TypeResolver;
use crate::facts::{CrudAction, DependencyGroup, RouteDependencies, RouteFacts, RouterFacts, SchemaField};
use crate::router_id::RouterId;
use serde::Serialize;

/// Actions whose default schema describes the request body.
const REQUEST_DEFAULTS: &[CrudAction] = &[CrudAction::Create, CrudAction::Update];
/// Actions whose default schema describes the response.
const RESPONSE_DEFAULTS: &[CrudAction] = &[CrudAction::List, CrudAction::Retrieve];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependencies {
    #[serde(flatten)]
    pub categories: RouteDependencies,
    pub grouped: Vec<DependencyGroup>,
}

impl From<RouteDependencies> for ResolvedDependencies {
    fn from(categories: RouteDependencies) -> Self {
        let grouped = categories.grouped();
        Self { categories, grouped }
    }
}

/// One concrete endpoint, as emitted to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    pub path: String,
    pub method: String,
    pub router_var: String,
    pub lineno: u32,
    pub file_path: String,
    pub full_path: String,
    pub function_name: Option<String>,
    pub dependencies: ResolvedDependencies,
    pub request_schema: Vec<SchemaField>,
    pub response_schema: Vec<SchemaField>,
    #[serde(skip)]
    pub request_model: Option<String>,
    #[serde(skip)]
    pub response_model: Option<String>,
}

impl ResolvedRoute {
    /// The router this route was declared on.
    pub fn router_id(&self) -> RouterId {
        RouterId::new(&self.file_path, &self.router_var)
    }
}

fn default_schema(owner: &RouterFacts, route: &RouteFacts, actions: &[CrudAction]) -> Option<String> {
    actions
        .iter()
        .find(|action| action.endpoint() == (route.method.as_str(), route.path.as_str()))
        .and_then(|action| owner.default_schemas.get(*action))
        .map(str::to_string)
}

/// Build the emitted route for one occurrence of `route` under `full_path`.
pub fn finalize_route(
    route: &RouteFacts,
    owner: &RouterFacts,
    full_path: String,
    types: &TypeResolver<'_>,
) -> ResolvedRoute {
    let request_model = route
        .request_model
        .clone()
        .or_else(|| default_schema(owner, route, REQUEST_DEFAULTS));
    let response_model = route
        .response_model
        .clone()
        .or_else(|| default_schema(owner, route, RESPONSE_DEFAULTS));

    let schema = |model: &Option<String>| {
        model
            .as_deref()
            .map(|name| types.resolve_fields(&route.source_file, name))
            .unwrap_or_default()
    };

    ResolvedRoute {
        path: route.path.clone(),
        method: route.method.clone(),
        router_var: route.owner_router.clone(),
        lineno: route.source_line,
        file_path: route.source_file.clone(),
        full_path,
        function_name: route.function_name.clone(),
        dependencies: route.dependencies.clone().into(),
        request_schema: schema(&request_model),
        response_schema: schema(&response_model),
        request_model,
        response_model,
    }
}
