//! Error types for template rendering.
//!
//! This module provides [`RenderError`], the error type for every stage of the
//! render pipeline. Each variant carries the name of the component (or
//! template) that failed so messages stay useful once they bubble up through
//! several layers of composition.

use thiserror::Error;

/// Errors raised while building a context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The value handed to [`Context::from_serialize`](crate::Context::from_serialize)
    /// does not serialize to a record.
    #[error("context must be a record with named fields, got {0}")]
    NotARecord(String),

    /// Serialization of the context value failed.
    #[error("context could not be serialized: {0}")]
    Serialization(String),

    /// Two bindings share the same name.
    #[error("duplicate context binding {0:?}")]
    DuplicateBinding(String),
}

/// Error type for template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The context could not be split into functions and variables.
    #[error("failed to process context in {component:?}: {source}")]
    ContextIntrospection {
        component: String,
        #[source]
        source: ContextError,
    },

    /// Template syntax error.
    #[error("parse error in {component:?}: {source}")]
    Parse {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    /// Evaluation failed (bad arity, undefined value in strict mode, a helper
    /// returning an error, ...).
    #[error("render error in {component:?}: {source}")]
    Execution {
        component: String,
        #[source]
        source: minijinja::Error,
    },
}

impl RenderError {
    /// Name of the component the error was raised for.
    pub fn component(&self) -> &str {
        match self {
            RenderError::ContextIntrospection { component, .. }
            | RenderError::Parse { component, .. }
            | RenderError::Execution { component, .. } => component,
        }
    }

    /// Classifies an engine error raised while compiling or evaluating
    /// `component`.
    ///
    /// Syntax errors are parse failures regardless of when the engine noticed
    /// them; everything else happened while executing.
    pub(crate) fn from_engine(component: &str, err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Parse {
                component: component.to_string(),
                source: err,
            },
            _ => RenderError::Execution {
                component: component.to_string(),
                source: err,
            },
        }
    }
}
