//! Lowered call sites
//!
//! The extractor lowers every syntax-level call into a [`CallSite`] whose
//! arguments are small owned [`Expr`] values. Framework adapters only ever
//! see these, never the syntax tree, so they stay independent of the parser.

/// Generic wrappers whose first type argument is the interesting one.
const TYPE_WRAPPERS: &[&str] = &[
    "Annotated", "List", "Optional", "Union", "ApiResponse", "Type", "Generic",
];

/// An argument or annotation, reduced to what fact extraction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A string literal, with interpolations and constants already folded
    Str(String),
    /// An identifier or dotted attribute chain
    Name {
        path: String,
        /// Literal value of a module-level constant bound to this identifier
        constant: Option<String>,
    },
    /// A call, reduced to the dotted name of its callee
    Call { callee: String },
    /// A subscripted (generic) expression such as `List[User]`
    Subscript { value: Box<Expr>, args: Vec<Expr> },
    /// Anything else, kept as raw source text
    Other(String),
}

impl Expr {
    pub fn name(path: impl Into<String>) -> Self {
        Expr::Name {
            path: path.into(),
            constant: None,
        }
    }

    /// String value of the expression, if it can be folded to one.
    ///
    /// A bare identifier without a known constant folds to its own name.
    pub fn literal(&self) -> Option<String> {
        match self {
            Expr::Str(s) => Some(s.clone()),
            Expr::Name { constant: Some(value), .. } => Some(value.clone()),
            Expr::Name { path, constant: None } if !path.contains('.') => Some(path.clone()),
            _ => None,
        }
    }

    /// Like [`Expr::literal`] but without the identifier fallback.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            Expr::Str(s) => Some(s),
            Expr::Name { constant: Some(value), .. } => Some(value),
            _ => None,
        }
    }

    /// Dotted name of a reference or of a call's callee.
    pub fn dotted_name(&self) -> Option<&str> {
        match self {
            Expr::Name { path, .. } => Some(path),
            Expr::Call { callee } => Some(callee),
            _ => None,
        }
    }

    /// Plain identifier, no attribute access.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Expr::Name { path, .. } if !path.contains('.') => Some(path),
            _ => None,
        }
    }

    /// The type name a model reference boils down to.
    ///
    /// Unwraps `Optional[X]`, `List[X]`, `Annotated[X, ...]` and friends.
    pub fn base_type_name(&self) -> Option<String> {
        match self {
            Expr::Name { path, .. } => Some(path.clone()),
            Expr::Call { callee } => Some(callee.clone()),
            Expr::Subscript { value, args } => {
                let outer = value.base_type_name()?;
                if TYPE_WRAPPERS.contains(&outer.as_str()) {
                    args.first().and_then(Expr::base_type_name)
                } else {
                    Some(outer)
                }
            }
            Expr::Str(_) | Expr::Other(_) => None,
        }
        .filter(|name| !name.is_empty())
    }

    /// Human rendering of an annotation, e.g. `Optional[List[str]]`.
    pub fn render(&self) -> String {
        match self {
            Expr::Str(s) => s.clone(),
            Expr::Name { path, .. } => path.clone(),
            Expr::Call { callee } => callee.clone(),
            Expr::Subscript { value, args } => {
                let inner: Vec<String> = args.iter().map(Expr::render).collect();
                format!("{}[{}]", value.render(), inner.join(", "))
            }
            Expr::Other(text) => text.clone(),
        }
    }
}

/// A call expression with its arguments lowered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Dotted callee, e.g. `router.include_router`
    pub callee: String,
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
    pub line: u32,
}

impl CallSite {
    pub fn new(callee: impl Into<String>) -> Self {
        Self {
            callee: callee.into(),
            args: Vec::new(),
            kwargs: Vec::new(),
            line: 0,
        }
    }

    pub fn with_arg(mut self, arg: Expr) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.kwargs.push((name.into(), value));
        self
    }

    pub fn arg(&self, index: usize) -> Option<&Expr> {
        self.args.get(index)
    }

    pub fn kwarg(&self, name: &str) -> Option<&Expr> {
        self.kwargs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Last segment of the callee (`get` in `router.get`).
    pub fn method_name(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }

    /// First segment of a dotted callee (`router` in `router.get`).
    pub fn receiver(&self) -> Option<&str> {
        self.callee.split_once('.').map(|(head, _)| head)
    }

    /// Folded string of a keyword argument, empty when absent or unfoldable.
    pub fn kwarg_literal(&self, name: &str) -> String {
        self.kwarg(name).and_then(Expr::literal).unwrap_or_default()
    }
}
