//! FastAPI conventions: `@router.get(...)` decorators, `APIRouter(prefix=...)`
//! and the `FastAPI()` application object.

use super::callsite::{CallSite, Expr};
use super::framework::{FrameworkAdapter, RouteDecorator, RouterInit};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "options", "head"];

pub struct FastApiAdapter;

impl FrameworkAdapter for FastApiAdapter {
    fn name(&self) -> &str {
        "fastapi"
    }

    fn parse_route_decorator(&self, decorator: &CallSite, _function_name: &str) -> Option<RouteDecorator> {
        let verb = decorator.method_name();
        if !HTTP_METHODS.contains(&verb) {
            return None;
        }

        let path = decorator
            .arg(0)
            .and_then(Expr::literal)
            .or_else(|| decorator.kwarg("path").and_then(Expr::literal))
            .unwrap_or_default();

        Some(RouteDecorator {
            method: verb.to_uppercase(),
            path,
            response_model_kwarg: Some("response_model"),
        })
    }

    fn parse_router_init(&self, call: &CallSite) -> Option<RouterInit> {
        call.callee.ends_with("APIRouter").then(|| RouterInit {
            prefix: call.kwarg_literal("prefix"),
            ..RouterInit::default()
        })
    }

    fn is_application(&self, call: &CallSite) -> bool {
        call.callee.ends_with("FastAPI")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_decorator() {
        let adapter = FastApiAdapter;
        let call = CallSite::new("router.post").with_arg(Expr::Str("/items".into()));
        let route = adapter.parse_route_decorator(&call, "create_item").unwrap();
        assert_eq!(route.method, "POST");
        assert_eq!(route.path, "/items");
        assert_eq!(route.response_model_kwarg, Some("response_model"));

        let by_kwarg = CallSite::new("app.get").with_kwarg("path", Expr::Str("/health".into()));
        assert_eq!(adapter.parse_route_decorator(&by_kwarg, "health").unwrap().path, "/health");

        assert!(adapter.parse_route_decorator(&CallSite::new("app.middleware"), "mw").is_none());
    }

    #[test]
    fn test_router_init_and_application() {
        let adapter = FastApiAdapter;
        let init = CallSite::new("APIRouter").with_kwarg("prefix", Expr::Str("/users".into()));
        assert_eq!(adapter.parse_router_init(&init).unwrap().prefix, "/users");
        assert_eq!(adapter.parse_router_init(&CallSite::new("fastapi.APIRouter")).unwrap().prefix, "");
        assert!(adapter.parse_router_init(&CallSite::new("Depends")).is_none());

        assert!(adapter.is_application(&CallSite::new("fastapi.FastAPI")));
        assert!(!adapter.is_application(&CallSite::new("APIRouter")));
    }
}
