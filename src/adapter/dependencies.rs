//! Handler dependency heuristics
//!
//! Classifies the calls made inside a route handler into services, database
//! access, outbound HTTP and utility helpers. Purely name-based: nothing here
//! resolves what a receiver actually is.

use super::callsite::{CallSite, Expr};
use crate::facts::{DependencyCategory, RouteDependencies};
use std::collections::BTreeMap;

const DB_RECEIVER_HINTS: &[&str] = &["session", "db", "repo"];
const DB_OPERATIONS: &[&str] = &["exec", "add", "commit", "query", "get", "flush", "refresh"];
const SQL_BUILDERS: &[&str] = &["select", "update", "delete", "insert"];
const HTTP_CLIENTS: &[&str] = &["requests.", "httpx."];
const UTILITY_MODULE_HINTS: &[&str] = &["util", "helper"];

const DATABASE_MODULE: &str = "Database";
const EXTERNAL_MODULE: &str = "External API";

fn is_database_call(callee: &str) -> bool {
    if SQL_BUILDERS.contains(&callee) {
        return true;
    }
    DB_RECEIVER_HINTS.iter().any(|hint| callee.contains(hint))
        && DB_OPERATIONS.iter().any(|op| callee.contains(op))
}

/// Model or schema class passed to a database call, e.g. `select(UserModel)`.
fn table_name(arg: &Expr) -> Option<String> {
    let name = arg.base_type_name()?;
    let starts_upper = name.chars().next().is_some_and(char::is_uppercase);
    (starts_upper && (name.contains("Model") || name.contains("Schema"))).then_some(name)
}

/// Record whatever `call` tells us about the enclosing handler's dependencies.
///
/// `imports` is the file's alias table, used to spot utility modules.
pub fn classify_call(call: &CallSite, imports: &BTreeMap<String, String>, deps: &mut RouteDependencies) {
    let callee = call.callee.as_str();
    if callee.is_empty() {
        return;
    }

    if is_database_call(callee) {
        deps.record(DependencyCategory::Database, DATABASE_MODULE, callee);
        for table in call.args.iter().filter_map(table_name) {
            deps.add_table(&table);
        }
    }

    if HTTP_CLIENTS.iter().any(|client| callee.starts_with(client)) {
        deps.record(DependencyCategory::External, EXTERNAL_MODULE, callee);
        if let Some(url) = call.arg(0).and_then(Expr::string_value).filter(|u| !u.is_empty()) {
            deps.add_api_call(url);
        }
    }

    let Some(receiver) = call.receiver() else {
        return;
    };

    if receiver.ends_with("_service") || receiver.ends_with("Service") {
        deps.record(DependencyCategory::Services, receiver, callee);
    } else if let Some(module) = imports.get(receiver) {
        let lowered = module.to_lowercase();
        if UTILITY_MODULE_HINTS.iter().any(|hint| lowered.contains(hint)) {
            deps.record(DependencyCategory::Utilities, module, callee);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(call: CallSite) -> RouteDependencies {
        let mut imports = BTreeMap::new();
        imports.insert("formatting".to_string(), "app.utils.formatting".to_string());
        imports.insert("crud".to_string(), "app.crud".to_string());
        let mut deps = RouteDependencies::default();
        classify_call(&call, &imports, &mut deps);
        deps
    }

    #[test]
    fn test_database_calls_and_tables() {
        let deps = classify(CallSite::new("session.exec").with_arg(Expr::Call { callee: "select".into() }));
        assert_eq!(deps.database[0].module, "Database");
        assert_eq!(deps.database[0].items, vec!["session.exec"]);

        let deps = classify(CallSite::new("select").with_arg(Expr::name("UserModel")));
        assert_eq!(deps.tables, vec!["UserModel"]);

        let deps = classify(CallSite::new("db.add").with_arg(Expr::name("user")));
        assert!(deps.tables.is_empty());
        assert_eq!(deps.database.len(), 1);

        assert!(classify(CallSite::new("logger.info")).is_empty());
    }

    #[test]
    fn test_external_calls() {
        let deps = classify(CallSite::new("httpx.get").with_arg(Expr::Str("https://api.example.com/v1".into())));
        assert_eq!(deps.external[0].module, "External API");
        assert_eq!(deps.api_calls, vec!["https://api.example.com/v1"]);

        let deps = classify(CallSite::new("requests.post").with_arg(Expr::name("url")));
        assert_eq!(deps.external.len(), 1);
        assert!(deps.api_calls.is_empty());
    }

    #[test]
    fn test_services_and_utilities() {
        let deps = classify(CallSite::new("user_service.create"));
        assert_eq!(deps.services[0].module, "user_service");

        let deps = classify(CallSite::new("PaymentService.charge"));
        assert_eq!(deps.services[0].items, vec!["PaymentService.charge"]);

        let deps = classify(CallSite::new("formatting.slugify"));
        assert_eq!(deps.utilities[0].module, "app.utils.formatting");

        assert!(classify(CallSite::new("crud.update_user")).utilities.is_empty());
    }
}
