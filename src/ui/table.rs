use crate::linker::ResolvedRoute;
use crate::facts::SchemaField;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct RouteRow {
    #[tabled(rename = "Method")]
    pub method: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Handler")]
    pub handler: String,
    #[tabled(rename = "Request")]
    pub request: String,
    #[tabled(rename = "Response")]
    pub response: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

impl From<&ResolvedRoute> for RouteRow {
    fn from(route: &ResolvedRoute) -> Self {
        Self {
            method: route.method.clone(),
            path: route.full_path.clone(),
            handler: route.function_name.clone().unwrap_or_else(|| "-".to_string()),
            request: schema_label(route.request_model.as_deref(), &route.request_schema),
            response: schema_label(route.response_model.as_deref(), &route.response_schema),
            location: format!("{}:{}", route.file_path, route.lineno),
        }
    }
}

fn schema_label(model: Option<&str>, fields: &[SchemaField]) -> String {
    match model {
        Some(name) if fields.is_empty() => name.to_string(),
        Some(name) => format!("{} ({} fields)", name, fields.len()),
        None => "-".to_string(),
    }
}

pub fn route_table(routes: &[ResolvedRoute]) -> String {
    if routes.is_empty() {
        return String::new();
    }
    let rows: Vec<RouteRow> = routes.iter().map(RouteRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::RouteDependencies;

    fn route(full_path: &str, request_model: Option<&str>) -> ResolvedRoute {
        ResolvedRoute {
            path: "/".into(),
            method: "POST".into(),
            router_var: "router".into(),
            lineno: 12,
            file_path: "api/users.py".into(),
            full_path: full_path.into(),
            function_name: Some("create_user".into()),
            dependencies: RouteDependencies::default().into(),
            request_schema: vec![SchemaField::new("name", "str", true)],
            response_schema: Vec::new(),
            request_model: request_model.map(str::to_string),
            response_model: None,
        }
    }

    #[test]
    fn test_route_row_labels() {
        let row = RouteRow::from(&route("/users", Some("UserIn")));
        assert_eq!(row.path, "/users");
        assert_eq!(row.request, "UserIn (1 fields)");
        assert_eq!(row.response, "-");
        assert_eq!(row.location, "api/users.py:12");
    }

    #[test]
    fn test_route_table_renders_rows() {
        let table = route_table(&[route("/users", None)]);
        assert!(table.contains("Method"));
        assert!(table.contains("/users"));
        assert!(table.contains("create_user"));
        assert!(route_table(&[]).is_empty());
    }

    #[test]
    fn test_stats_builder() {
        let mut builder = TableBuilder::new();
        assert!(builder.build().is_empty());
        builder.add_row("Routes", 3);
        assert!(builder.build().contains("Routes"));
    }
}
