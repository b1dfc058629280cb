//! CRUD router conventions
//!
//! A `CrudAPIRouter(Model, prefix=..., parent_router=...)` exposes its
//! endpoints through `@router.register_<action>` decorators and custom
//! actions through `@router.<kind>_action`. Child routers hang off their
//! parent through `parent_router` and are mounted under `/{pN_pk}` once the
//! parent calls `include_child_router()`.

use super::callsite::{CallSite, Expr};
use super::framework::{FrameworkAdapter, RouteDecorator, RouterInit};
use crate::facts::CrudAction;

const ACTION_SCHEMA_KWARG: &str = "read_schema";

pub struct CrudRouterAdapter;

impl CrudRouterAdapter {
    fn custom_action(verb: &str, function_name: &str) -> Option<RouteDecorator> {
        let (method, path) = match verb {
            "list_action" => ("GET", format!("/{}", function_name)),
            "get_action" => ("GET", format!("/{{pk}}/{}", function_name)),
            "post_action" => ("POST", format!("/{}", function_name)),
            "put_action" => ("PUT", format!("/{{pk}}/{}", function_name)),
            other if other.contains("action") => {
                let method = if other.contains("put") {
                    "PUT"
                } else if other.contains("post") {
                    "POST"
                } else {
                    "GET"
                };
                (method, format!("/{}", function_name))
            }
            _ => return None,
        };

        Some(RouteDecorator {
            method: method.to_string(),
            path,
            response_model_kwarg: Some(ACTION_SCHEMA_KWARG),
        })
    }
}

impl FrameworkAdapter for CrudRouterAdapter {
    fn name(&self) -> &str {
        "crud"
    }

    fn parse_route_decorator(&self, decorator: &CallSite, function_name: &str) -> Option<RouteDecorator> {
        let verb = decorator.method_name();
        if verb.starts_with("register_") {
            let (method, path) = CrudAction::from_method_name(verb)?.endpoint();
            return Some(RouteDecorator {
                method: method.to_string(),
                path: path.to_string(),
                response_model_kwarg: None,
            });
        }
        Self::custom_action(verb, function_name)
    }

    fn parse_router_init(&self, call: &CallSite) -> Option<RouterInit> {
        if !call.callee.ends_with("CrudAPIRouter") {
            return None;
        }

        let parent = call
            .kwarg("parent_router")
            .and_then(|expr| match expr {
                Expr::Name { path, .. } => Some(path.clone()),
                _ => None,
            });

        Some(RouterInit {
            prefix: call.kwarg_literal("prefix"),
            parent,
            owned_model: call.arg(0).and_then(Expr::identifier).map(str::to_string),
        })
    }

    fn is_nested_include(&self, call: &CallSite) -> bool {
        call.callee.ends_with("include_child_router")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_decorators() {
        let adapter = CrudRouterAdapter;
        let cases = [
            ("register_create", "POST", "/"),
            ("register_update", "PUT", "/{id}"),
            ("register_delete", "DELETE", "/{id}"),
            ("register_list", "GET", "/"),
            ("register_retrieve", "GET", "/{id}"),
        ];
        for (verb, method, path) in cases {
            let call = CallSite::new(format!("router.{}", verb));
            let route = adapter.parse_route_decorator(&call, "handler").unwrap();
            assert_eq!((route.method.as_str(), route.path.as_str()), (method, path), "{}", verb);
            assert_eq!(route.response_model_kwarg, None);
        }
        assert!(adapter.parse_route_decorator(&CallSite::new("router.register_hook"), "h").is_none());
    }

    #[test]
    fn test_custom_actions() {
        let adapter = CrudRouterAdapter;
        let route = |verb: &str| {
            let call = CallSite::new(format!("router.{}", verb));
            let r = adapter.parse_route_decorator(&call, "archive").unwrap();
            (r.method, r.path)
        };

        assert_eq!(route("list_action"), ("GET".to_string(), "/archive".to_string()));
        assert_eq!(route("get_action"), ("GET".to_string(), "/{pk}/archive".to_string()));
        assert_eq!(route("post_action"), ("POST".to_string(), "/archive".to_string()));
        assert_eq!(route("put_action"), ("PUT".to_string(), "/{pk}/archive".to_string()));
        assert_eq!(route("bulk_put_action"), ("PUT".to_string(), "/archive".to_string()));
        assert_eq!(route("detail_action"), ("GET".to_string(), "/archive".to_string()));
        assert!(adapter.parse_route_decorator(&CallSite::new("router.get"), "x").is_none());
    }

    #[test]
    fn test_router_init() {
        let adapter = CrudRouterAdapter;
        let call = CallSite::new("CrudAPIRouter")
            .with_arg(Expr::name("Comment"))
            .with_kwarg("prefix", Expr::Str("/comments".into()))
            .with_kwarg("parent_router", Expr::name("posts.router"));

        let init = adapter.parse_router_init(&call).unwrap();
        assert_eq!(init.prefix, "/comments");
        assert_eq!(init.parent.as_deref(), Some("posts.router"));
        assert_eq!(init.owned_model.as_deref(), Some("Comment"));

        assert!(adapter.parse_router_init(&CallSite::new("APIRouter")).is_none());
        assert!(adapter.is_nested_include(&CallSite::new("router.include_child_router")));
    }
}
