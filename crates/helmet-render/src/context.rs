//! Render contexts and their split into functions and variables.
//!
//! A component's setup step produces a [`Context`]: an ordered list of named
//! bindings. Each binding is either a callable, which becomes a template
//! function (`{{ Catify("hi") }}` or `{{ "hi" | Catify }}`), or a plain value,
//! which becomes a template variable under the reserved [`NAMESPACE`] key
//! (`{{ Helmet.Number }}`).
//!
//! # Example
//!
//! ```rust
//! use helmet_render::Context;
//!
//! let ctx = Context::new()
//!     .var("Number", 2)
//!     .func("Catify", |s: String| format!("🐈 {} 🐈", s));
//!
//! let (functions, variables) = ctx.split().unwrap();
//! assert!(functions.contains_key("Catify"));
//! assert_eq!(variables.get("Number").map(|v| v.to_string()), Some("2".into()));
//! ```
//!
//! # User-Defined Context Types
//!
//! Setup functions may return their own types. Implementing [`ToContext`] is all
//! that is needed to hand them to the renderer:
//!
//! ```rust
//! use helmet_render::{Context, ContextError, ToContext};
//!
//! struct DeploymentContext {
//!     replicas: u32,
//! }
//!
//! impl ToContext for DeploymentContext {
//!     fn to_context(&self) -> Result<Context, ContextError> {
//!         Ok(Context::new().var("Replicas", self.replicas))
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult};
use minijinja::Value;
use serde::Serialize;

use crate::error::ContextError;

/// Top-level key under which context variables are exposed to templates.
///
/// User variables live in their own namespace so they can never shadow the
/// engine's own globals.
pub const NAMESPACE: &str = "Helmet";

/// Mapping from identifier to callable template function.
pub type FunctionMap = BTreeMap<String, Value>;

/// Non-callable context fields, keyed by name.
pub type VariableBag = BTreeMap<String, Value>;

/// A single named entry of a [`Context`].
#[derive(Debug, Clone)]
pub enum Binding {
    /// A function callable from the template.
    Callable(Value),
    /// A plain value readable as `Helmet.<name>`.
    Variable(Value),
}

impl Binding {
    /// Returns true for [`Binding::Callable`].
    pub fn is_callable(&self) -> bool {
        matches!(self, Binding::Callable(_))
    }

    /// Returns the wrapped value.
    pub fn value(&self) -> &Value {
        match self {
            Binding::Callable(value) | Binding::Variable(value) => value,
        }
    }
}

/// Per-call record of template-visible variables and callables.
///
/// Bindings keep their insertion order. Names are case-sensitive and must be
/// unique; duplicates are reported by [`split`](Self::split).
#[derive(Debug, Clone, Default)]
pub struct Context {
    bindings: Vec<(String, Binding)>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn var<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert(name, Binding::Variable(Value::from_serialize(&value)));
        self
    }

    /// Adds a callable.
    ///
    /// Anything minijinja accepts as a function works here: closures taking
    /// `String`, numbers, [`Value`]s, an optional `&State`, and returning either
    /// a value or a `Result<_, minijinja::Error>`.
    pub fn func<F, Rv, Args>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Function<Rv, Args> + Send + Sync + 'static,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.insert(name, Binding::Callable(Value::from_function(f)));
        self
    }

    /// Appends a binding.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.push((name.into(), binding));
    }

    /// Builds a context from any record-like serializable value.
    ///
    /// Every field becomes a variable. Values that do not serialize to a map
    /// (numbers, strings, sequences) are rejected.
    pub fn from_serialize<T: Serialize + ?Sized>(record: &T) -> Result<Self, ContextError> {
        let json = serde_json::to_value(record)
            .map_err(|e| ContextError::Serialization(e.to_string()))?;

        let serde_json::Value::Object(fields) = json else {
            return Err(ContextError::NotARecord(json_kind(&json).to_string()));
        };

        let mut context = Context::new();
        for (name, value) in fields {
            context.insert(name, Binding::Variable(Value::from_serialize(&value)));
        }
        Ok(context)
    }

    /// Returns the bindings in insertion order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(name, b)| (name.as_str(), b))
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if the context has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Partitions the bindings into template functions and template variables.
    pub fn split(&self) -> Result<(FunctionMap, VariableBag), ContextError> {
        let mut seen = HashSet::new();
        let mut functions = FunctionMap::new();
        let mut variables = VariableBag::new();

        for (name, binding) in &self.bindings {
            if !seen.insert(name.as_str()) {
                return Err(ContextError::DuplicateBinding(name.clone()));
            }
            match binding {
                Binding::Callable(f) => {
                    functions.insert(name.clone(), f.clone());
                }
                Binding::Variable(v) => {
                    variables.insert(name.clone(), v.clone());
                }
            }
        }

        Ok((functions, variables))
    }
}

/// Conversion of a setup result into a [`Context`].
pub trait ToContext {
    /// Produces the bindings exposed to the template.
    fn to_context(&self) -> Result<Context, ContextError>;
}

impl ToContext for Context {
    fn to_context(&self) -> Result<Context, ContextError> {
        Ok(self.clone())
    }
}

/// Wraps the variable bag under [`NAMESPACE`], producing the root value the
/// template is evaluated against.
pub fn namespaced(variables: VariableBag) -> Value {
    let mut root = BTreeMap::new();
    root.insert(NAMESPACE.to_string(), Value::from_serialize(&variables));
    Value::from_serialize(&root)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a record",
    }
}
