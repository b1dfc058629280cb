//! Python fact extractor
//!
//! Walks a tree-sitter syntax tree once, top to bottom, and records imports,
//! constants, routers, routes, includes and schema models. Anything framework
//! specific is asked of the [`AdapterRegistry`] through lowered [`CallSite`]s.

use super::callsite::{CallSite, Expr};
use super::dependencies;
use super::framework::{
    AdapterRegistry, LanguageExtractor, PYTHON_CONVENTIONS, SourceConventions, default_registry,
};
use crate::facts::{CrudAction, FileFacts, IncludeFacts, ModelFacts, RouterFacts, RouteFacts, SchemaField};
use crate::{Error, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parameter types that never carry a request body.
const NON_BODY_TYPES: &[&str] = &[
    "Request", "Response", "BackgroundTasks", "Session", "AsyncSession",
    "HTTPConnection", "WebSocket", "HTTPException",
    "int", "str", "float", "bool", "bytes", "dict", "list", "set", "tuple",
    "Any", "UUID", "datetime", "date",
];

/// Deepest syntax tree the recursive visitor will walk.
const MAX_SYNTAX_DEPTH: usize = 500;

/// Base-class fragments that make a class a schema model.
const MODEL_DECLARATION_MARKERS: &[&str] = &["BaseModel", "SQLModel", "Schema", "Model", "pydantic"];

/// Python extractor backed by tree-sitter-python
pub struct PythonExtractor {
    registry: AdapterRegistry,
}

impl PythonExtractor {
    /// Create an extractor with the built-in framework adapters
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    pub fn with_registry(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    fn parse(&self, file_key: &str, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::Adapter(format!("failed to load Python grammar: {}", e)))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::Parse(format!("{}: parser produced no tree", file_key)))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root);
            return Err(Error::Parse(format!("{}: syntax error near line {}", file_key, line)));
        }
        if exceeds_depth(&tree, MAX_SYNTAX_DEPTH) {
            return Err(Error::Parse(format!(
                "{}: nesting deeper than {} syntax levels",
                file_key, MAX_SYNTAX_DEPTH
            )));
        }
        Ok(tree)
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PythonExtractor {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn conventions(&self) -> &SourceConventions {
        &PYTHON_CONVENTIONS
    }

    fn extract(&self, file_key: &str, source: &str) -> Result<FileFacts> {
        let tree = self.parse(file_key, source)?;
        let mut visitor = FactVisitor::new(file_key, source.as_bytes(), &self.registry);
        visitor.visit(tree.root_node());
        Ok(visitor.facts)
    }
}

fn first_error_line(root: Node<'_>) -> usize {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            break;
        }
        let mut cursor = node.walk();
        let next = node.children(&mut cursor).find(|child| child.has_error());
        match next {
            Some(child) => node = child,
            None => break,
        }
    }
    node.start_position().row + 1
}

/// Whether any node sits more than `limit` levels below the root.
fn exceeds_depth(tree: &Tree, limit: usize) -> bool {
    let mut cursor = tree.walk();
    let mut depth = 0;
    loop {
        if depth > limit {
            return true;
        }
        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return false;
            }
            depth -= 1;
        }
    }
}

fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// `register_<action>_schema` → the action whose default schema it sets
fn default_schema_action(method: &str) -> Option<CrudAction> {
    let action = method.strip_prefix("register_")?.strip_suffix("_schema")?;
    CrudAction::all().iter().copied().find(|a| a.as_str() == action)
}

/// `from <source> import <member>` → fully-qualified reference
fn qualify_from(source: &str, member: &str) -> String {
    if source.is_empty() {
        member.to_string()
    } else if source.ends_with('.') {
        format!("{}{}", source, member)
    } else {
        format!("{}.{}", source, member)
    }
}

/// Syntax nodes the visitor records facts from
enum FactNode<'t> {
    Import(Node<'t>),
    ImportFrom(Node<'t>),
    Assignment(Node<'t>),
    Class(Node<'t>),
    Decorated(Node<'t>),
    Call(Node<'t>),
    Other(Node<'t>),
}

impl<'t> From<Node<'t>> for FactNode<'t> {
    fn from(node: Node<'t>) -> Self {
        match node.kind() {
            "import_statement" => FactNode::Import(node),
            "import_from_statement" => FactNode::ImportFrom(node),
            "assignment" => FactNode::Assignment(node),
            "class_definition" => FactNode::Class(node),
            "decorated_definition" => FactNode::Decorated(node),
            "call" => FactNode::Call(node),
            _ => FactNode::Other(node),
        }
    }
}

struct FactVisitor<'a> {
    source: &'a [u8],
    registry: &'a AdapterRegistry,
    facts: FileFacts,
    /// (router variable, route index) of the handler being walked
    current_route: Option<(String, usize)>,
}

impl<'a> FactVisitor<'a> {
    fn new(file_key: &str, source: &'a [u8], registry: &'a AdapterRegistry) -> Self {
        Self {
            source,
            registry,
            facts: FileFacts::new(file_key),
            current_route: None,
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn visit(&mut self, node: Node<'_>) {
        match FactNode::from(node) {
            FactNode::Import(n) => self.visit_import(n),
            FactNode::ImportFrom(n) => self.visit_import_from(n),
            FactNode::Assignment(n) => {
                self.visit_assignment(n);
                self.visit_children(n);
            }
            FactNode::Class(n) => {
                self.visit_class(n);
                self.visit_children(n);
            }
            FactNode::Decorated(n) => {
                if !self.visit_decorated(n) {
                    self.visit_children(n);
                }
            }
            FactNode::Call(n) => {
                self.visit_call(n);
                self.visit_children(n);
            }
            FactNode::Other(n) => self.visit_children(n),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    /// (imported name, alias) of a `dotted_name` or `aliased_import`
    fn import_name(&self, node: Node<'_>) -> (&'a str, Option<&'a str>) {
        if node.kind() == "aliased_import" {
            let name = node.child_by_field_name("name").map(|n| self.text(n)).unwrap_or("");
            let alias = node.child_by_field_name("alias").map(|n| self.text(n));
            (name, alias)
        } else {
            (self.text(node), None)
        }
    }

    fn visit_import(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (module, alias) = self.import_name(name);
            if module.is_empty() {
                continue;
            }
            self.facts
                .imports
                .insert(alias.unwrap_or(module).to_string(), module.to_string());
        }
    }

    fn visit_import_from(&mut self, node: Node<'_>) {
        let source = node
            .child_by_field_name("module_name")
            .map(|n| self.text(n))
            .unwrap_or("");
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (member, alias) = self.import_name(name);
            if member.is_empty() {
                continue;
            }
            self.facts
                .imports
                .insert(alias.unwrap_or(member).to_string(), qualify_from(source, member));
        }
    }

    fn visit_assignment(&mut self, node: Node<'_>) {
        let Some(left) = node.child_by_field_name("left").filter(|l| l.kind() == "identifier") else {
            return;
        };
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };
        let target = self.text(left).to_string();
        let annotated = node.child_by_field_name("type").is_some();

        match right.kind() {
            "string" | "concatenated_string" if !annotated => {
                if let Expr::Str(value) = self.lower(right) {
                    self.facts.constants.insert(target, value);
                }
            }
            "integer" | "float" | "true" | "false" if !annotated => {
                let value = self.text(right).to_string();
                self.facts.constants.insert(target, value);
            }
            "call" => {
                let call = self.call_site(right);
                if let Some(init) = self.registry.router_init(&call) {
                    let router = RouterFacts {
                        variable: target.clone(),
                        prefix: init.prefix,
                        parent_variable: init.parent,
                        owned_model: init.owned_model,
                        ..RouterFacts::default()
                    };
                    self.facts.routers.insert(target, router);
                } else if self.registry.is_application(&call) {
                    self.facts.app_variable = Some(target.clone());
                    self.facts.routers.insert(target.clone(), RouterFacts::new(target));
                }
            }
            _ => {}
        }
    }

    fn visit_class(&mut self, node: Node<'_>) {
        let Some(name) = node.child_by_field_name("name").map(|n| self.text(n)) else {
            return;
        };

        let mut bases = Vec::new();
        let mut is_table = false;
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for arg in superclasses.named_children(&mut cursor) {
                match arg.kind() {
                    "keyword_argument" => {
                        let keyword = arg.child_by_field_name("name").map(|n| self.text(n));
                        if keyword == Some("table") {
                            is_table = true;
                        }
                    }
                    "comment" | "list_splat" | "dictionary_splat" => {}
                    _ => bases.push(self.lower(arg).render()),
                }
            }
        }

        let is_model = is_table
            || bases
                .iter()
                .any(|base| MODEL_DECLARATION_MARKERS.iter().any(|m| base.contains(m)));
        if !is_model {
            return;
        }

        let fields = node
            .child_by_field_name("body")
            .map(|body| self.model_fields(body))
            .unwrap_or_default();

        self.facts.models.insert(
            name.to_string(),
            ModelFacts {
                fields,
                base_class_names: bases,
            },
        );
    }

    /// Annotated assignments directly in a class body, in order.
    fn model_fields(&self, body: Node<'_>) -> Vec<SchemaField> {
        let mut fields = Vec::new();
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(assignment) = statement.named_child(0).filter(|n| n.kind() == "assignment") else {
                continue;
            };
            let (Some(left), Some(annotation)) = (
                assignment.child_by_field_name("left"),
                assignment.child_by_field_name("type"),
            ) else {
                continue;
            };
            if left.kind() != "identifier" {
                continue;
            }
            let required = assignment.child_by_field_name("right").is_none();
            fields.push(SchemaField::new(
                self.text(left),
                self.lower(annotation).render(),
                required,
            ));
        }
        fields
    }

    /// Returns true when the definition was a route and its body has been walked.
    fn visit_decorated(&mut self, node: Node<'_>) -> bool {
        let Some(function) = node
            .child_by_field_name("definition")
            .filter(|d| d.kind() == "function_definition")
        else {
            return false;
        };
        let function_name = function
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or("");

        let mut cursor = node.walk();
        let decorators: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .collect();

        for decorator in decorators {
            let Some(expr) = decorator.named_child(0).filter(|e| e.kind() == "call") else {
                continue;
            };
            let call = self.call_site(expr);
            let Some(binding) = self.registry.route_decorator(&call, function_name) else {
                continue;
            };

            let router_var = call.receiver().unwrap_or("app").to_string();
            let mut route = RouteFacts::new(
                binding.path,
                binding.method,
                &router_var,
                &self.facts.file_key,
                line_of(function),
            );
            route.function_name = Some(function_name.to_string());
            route.request_model = function
                .child_by_field_name("parameters")
                .and_then(|params| self.request_model(params));
            route.response_model = binding
                .response_model_kwarg
                .and_then(|kwarg| call.kwarg(kwarg))
                .and_then(Expr::base_type_name)
                .or_else(|| {
                    function
                        .child_by_field_name("return_type")
                        .and_then(|ret| self.lower(ret).base_type_name())
                });

            let router = self.facts.router_mut(&router_var);
            router.routes.push(route);
            let index = router.routes.len() - 1;

            let previous = self.current_route.replace((router_var, index));
            self.visit(function);
            self.current_route = previous;
            return true;
        }
        false
    }

    /// First positional parameter annotated with a body type.
    fn request_model(&self, parameters: Node<'_>) -> Option<String> {
        let mut cursor = parameters.walk();
        for param in parameters.named_children(&mut cursor) {
            let (name, annotation) = match param.kind() {
                "typed_parameter" => (param.named_child(0), param.child_by_field_name("type")),
                "typed_default_parameter" => {
                    if self.is_injected_default(param) {
                        continue;
                    }
                    (param.child_by_field_name("name"), param.child_by_field_name("type"))
                }
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => continue,
            };

            let Some(name) = name else { continue };
            if name.kind() != "identifier" {
                break;
            }
            if self.text(name) == "self" {
                continue;
            }
            let Some(annotation) = annotation else { continue };
            if let Some(type_name) = self.lower(annotation).base_type_name() {
                if !NON_BODY_TYPES.contains(&type_name.as_str()) {
                    return Some(type_name);
                }
            }
        }
        None
    }

    /// `x: T = Depends(...)` is injected, never the body.
    fn is_injected_default(&self, param: Node<'_>) -> bool {
        param
            .child_by_field_name("value")
            .filter(|v| v.kind() == "call")
            .and_then(|v| v.child_by_field_name("function"))
            .is_some_and(|f| self.dotted(f).ends_with("Depends"))
    }

    fn visit_call(&mut self, node: Node<'_>) {
        let call = self.call_site(node);
        if call.callee.is_empty() {
            return;
        }

        if let Some((router_var, index)) = &self.current_route {
            let route = self
                .facts
                .routers
                .get_mut(router_var)
                .and_then(|r| r.routes.get_mut(*index));
            if let Some(route) = route {
                dependencies::classify_call(&call, &self.facts.imports, &mut route.dependencies);
            }
        }

        let Some(receiver) = call.receiver().map(str::to_string) else {
            return;
        };

        if call.callee.contains("include_router") {
            let target = call.arg(0).and_then(Expr::dotted_name).unwrap_or("").to_string();
            let prefix = call.kwarg_literal("prefix");
            if let Some(router) = self.facts.routers.get_mut(&receiver) {
                if !target.is_empty() {
                    router.includes.push(IncludeFacts { target, prefix });
                }
            }
        }

        if self.registry.is_nested_include(&call) {
            self.facts.nested_include_receivers.insert(receiver.clone());
            if let Some(router) = self.facts.routers.get_mut(&receiver) {
                router.includes_children = true;
            }
        }

        if let Some(action) = default_schema_action(call.method_name()) {
            let schema = call.arg(0).and_then(Expr::base_type_name);
            if let (Some(schema), Some(router)) = (schema, self.facts.routers.get_mut(&receiver)) {
                router.default_schemas.set(action, schema);
            }
        }
    }

    fn call_site(&self, node: Node<'_>) -> CallSite {
        let callee = node
            .child_by_field_name("function")
            .map(|f| self.dotted(f))
            .unwrap_or_default();
        let mut call = CallSite::new(callee);
        call.line = line_of(node);

        let Some(arguments) = node
            .child_by_field_name("arguments")
            .filter(|a| a.kind() == "argument_list")
        else {
            return call;
        };

        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            match arg.kind() {
                "keyword_argument" => {
                    let name = arg.child_by_field_name("name");
                    let value = arg.child_by_field_name("value");
                    if let (Some(name), Some(value)) = (name, value) {
                        call.kwargs.push((self.text(name).to_string(), self.lower(value)));
                    }
                }
                "list_splat" | "dictionary_splat" | "comment" => {}
                _ => call.args.push(self.lower(arg)),
            }
        }
        call
    }

    /// Dotted name of an identifier/attribute chain; calls reduce to their callee.
    fn dotted(&self, node: Node<'_>) -> String {
        match node.kind() {
            "identifier" => self.text(node).to_string(),
            "attribute" => {
                let object = node
                    .child_by_field_name("object")
                    .map(|o| self.dotted(o))
                    .unwrap_or_default();
                let attribute = node
                    .child_by_field_name("attribute")
                    .map(|a| self.text(a))
                    .unwrap_or("");
                format!("{}.{}", object, attribute)
            }
            "call" => node
                .child_by_field_name("function")
                .map(|f| self.dotted(f))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn lower(&self, node: Node<'_>) -> Expr {
        match node.kind() {
            "identifier" => {
                let name = self.text(node);
                Expr::Name {
                    path: name.to_string(),
                    constant: self.facts.constants.get(name).cloned(),
                }
            }
            "attribute" => Expr::name(self.dotted(node)),
            "call" => Expr::Call {
                callee: node
                    .child_by_field_name("function")
                    .map(|f| self.dotted(f))
                    .unwrap_or_default(),
            },
            "string" => Expr::Str(self.fold_string(node)),
            "concatenated_string" => {
                let mut cursor = node.walk();
                let folded: String = node
                    .named_children(&mut cursor)
                    .filter(|part| part.kind() == "string")
                    .map(|part| self.fold_string(part))
                    .collect();
                Expr::Str(folded)
            }
            "binary_operator" => self.lower_concatenation(node),
            "subscript" => {
                let value = node
                    .child_by_field_name("value")
                    .map(|v| self.lower(v))
                    .unwrap_or_else(|| Expr::Other(String::new()));
                let mut cursor = node.walk();
                let args = node
                    .children_by_field_name("subscript", &mut cursor)
                    .map(|arg| self.lower(arg))
                    .collect();
                Expr::Subscript {
                    value: Box::new(value),
                    args,
                }
            }
            "generic_type" => {
                let value = node
                    .named_child(0)
                    .map(|v| self.lower(v))
                    .unwrap_or_else(|| Expr::Other(String::new()));
                let mut args = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "type_parameter" {
                        let mut inner = child.walk();
                        args.extend(child.named_children(&mut inner).map(|t| self.lower(t)));
                    }
                }
                Expr::Subscript {
                    value: Box::new(value),
                    args,
                }
            }
            "member_type" => {
                let owner = node.named_child(0).map(|t| self.lower(t).render()).unwrap_or_default();
                let member = node.named_child(1).map(|m| self.text(m)).unwrap_or("");
                Expr::name(format!("{}.{}", owner, member))
            }
            "type" | "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.lower(inner),
                None => Expr::Other(self.text(node).to_string()),
            },
            _ => Expr::Other(self.text(node).to_string()),
        }
    }

    /// `"a" + CONST` folds when both sides are known strings.
    fn lower_concatenation(&self, node: Node<'_>) -> Expr {
        let is_plus = node
            .child_by_field_name("operator")
            .is_some_and(|op| op.kind() == "+");
        if let (true, Some(l), Some(r)) = (
            is_plus,
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            let left = self.lower(l);
            let right = self.lower(r);
            if let (Some(a), Some(b)) = (left.string_value(), right.string_value()) {
                return Expr::Str(format!("{}{}", a, b));
            }
        }
        Expr::Other(self.text(node).to_string())
    }

    /// Literal text of a string; interpolated names use their constant value or `{}`.
    fn fold_string(&self, node: Node<'_>) -> String {
        let mut folded = String::new();
        let mut cursor = node.walk();
        for part in node.named_children(&mut cursor) {
            match part.kind() {
                "string_content" | "escape_sequence" => folded.push_str(self.text(part)),
                "interpolation" => {
                    let value = part
                        .child_by_field_name("expression")
                        .or_else(|| part.named_child(0))
                        .filter(|e| e.kind() == "identifier")
                        .and_then(|e| self.facts.constants.get(self.text(e)));
                    folded.push_str(value.map(String::as_str).unwrap_or("{}"));
                }
                _ => {}
            }
        }
        folded
    }
}
