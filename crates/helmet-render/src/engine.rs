//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait which keeps the render
//! pipeline independent of the expression language. The default
//! implementation is [`MiniJinjaEngine`].

use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, Output, State, UndefinedBehavior, Value};

use crate::context::FunctionMap;
use crate::error::RenderError;

/// Text emitted for missing values in [`MissingKey::Zero`] mode.
///
/// The render pipeline scrubs every occurrence from the output.
pub const MISSING_VALUE: &str = "<no value>";

/// How references to undefined identifiers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Render the [`MISSING_VALUE`] sentinel, later removed from the output.
    #[default]
    Zero,
    /// Fail with an execution error.
    Error,
}

/// A template engine that can parse and execute a template.
pub trait TemplateEngine: Send + Sync {
    /// Parses `source` with `functions` bound, then executes it against `data`.
    ///
    /// Output may still contain [`MISSING_VALUE`] sentinels.
    fn render(
        &self,
        name: &str,
        source: &str,
        functions: &FunctionMap,
        data: &Value,
    ) -> Result<String, RenderError>;
}

/// MiniJinja-based template engine.
///
/// A fresh environment is built for every render, so no state leaks between
/// calls. Auto-escaping is disabled: output is structured text, not HTML.
///
/// # Example
///
/// ```rust
/// use helmet_render::engine::{MiniJinjaEngine, TemplateEngine};
/// use helmet_render::FunctionMap;
/// use minijinja::context;
///
/// let engine = MiniJinjaEngine::new();
/// let out = engine
///     .render("greeting", "Hello, {{ name }}!", &FunctionMap::new(), &context! { name => "World" })
///     .unwrap();
/// assert_eq!(out, "Hello, World!");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiniJinjaEngine {
    missing_key: MissingKey,
}

impl MiniJinjaEngine {
    /// Creates an engine in [`MissingKey::Zero`] mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that fails on undefined identifiers.
    pub fn strict() -> Self {
        Self::with_missing_key(MissingKey::Error)
    }

    /// Creates an engine with the given missing-key mode.
    pub fn with_missing_key(missing_key: MissingKey) -> Self {
        Self { missing_key }
    }

    /// Current missing-key mode.
    pub fn missing_key(&self) -> MissingKey {
        self.missing_key
    }

    fn environment<'source>(&self, functions: &FunctionMap) -> Environment<'source> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        let strict = self.missing_key == MissingKey::Error;
        env.set_undefined_behavior(if strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        env.set_formatter(move |out, state, value| format_value(out, state, value, strict));

        register_functions(&mut env, functions);
        env
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(
        &self,
        name: &str,
        source: &str,
        functions: &FunctionMap,
        data: &Value,
    ) -> Result<String, RenderError> {
        let env = self.environment(functions);
        let tmpl = env
            .template_from_named_str(name, source)
            .map_err(|source| RenderError::Parse {
                component: name.to_string(),
                source,
            })?;
        tmpl.render(data)
            .map_err(|err| RenderError::from_engine(name, err))
    }
}

/// Installs every entry of `functions` as a global callable and as a filter.
///
/// Later entries in the map do not shadow anything here: callers merge their
/// sources into one map first, which decides precedence.
pub fn register_functions(env: &mut Environment<'_>, functions: &FunctionMap) {
    for (name, callable) in functions {
        env.add_global(name.clone(), callable.clone());

        let callable = callable.clone();
        env.add_filter(
            name.clone(),
            move |state: &State, args: Rest<Value>| -> Result<Value, Error> {
                callable.call(state, &args.0)
            },
        );
    }
}

fn format_value(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
    strict: bool,
) -> Result<(), Error> {
    if value.is_undefined() && strict {
        return Err(Error::new(
            ErrorKind::UndefinedError,
            "undefined value in template output",
        ));
    }
    if value.is_undefined() || value.is_none() {
        return out
            .write_str(MISSING_VALUE)
            .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write output"));
    }
    minijinja::escape_formatter(out, state, value)
}
