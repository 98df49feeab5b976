//! Error types for components.
//!
//! [`Error`] covers every failure a component can report, from reading its
//! template file to decoding the rendered documents. Each variant names the
//! component; [`Error::stage`] tells which step of the pipeline failed.

use std::path::PathBuf;

use helmet_render::{ContextError, RenderError};
use thiserror::Error;

use crate::decode::DecodeError;

/// Boxed error returned by user-supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for component operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Pipeline step an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the template file.
    Load,
    /// Normalizing the template text.
    Preprocess,
    /// Turning the input into a context.
    Setup,
    /// Splitting the context into functions and variables.
    Context,
    /// Parsing the template.
    Parse,
    /// Executing the template.
    Execute,
    /// Obtaining instance blueprints and matching them to documents.
    Instances,
    /// Decoding documents, or running a custom render override.
    Decode,
    /// Component configuration, checked at creation.
    Configure,
    /// A panic caught anywhere during rendering.
    Panic,
}

/// Errors raised while creating or rendering a component.
#[derive(Debug, Error)]
pub enum Error {
    /// The template file is missing or unreadable.
    #[error("error reading template file {path:?} in {component:?}: {source}")]
    FileRead {
        component: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A custom preprocessing hook failed.
    #[error("failed to preprocess template in {component:?}: {source}")]
    Preprocess {
        component: String,
        #[source]
        source: BoxError,
    },

    /// The caller's input-to-context transform failed.
    #[error("setup failed in {component:?}: {source}")]
    Setup {
        component: String,
        #[source]
        source: BoxError,
    },

    /// The context could not be turned into functions and variables.
    #[error("failed to process context in {component:?}: {source}")]
    ContextIntrospection {
        component: String,
        #[source]
        source: ContextError,
    },

    /// Malformed template syntax.
    #[error("parse error in {component:?}: {source}")]
    Parse {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    /// The template failed while executing.
    #[error("render error in {component:?}: {source}")]
    Execution {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    /// The instance declaration callback failed.
    #[error("failed to get instances in {component:?}: {source}")]
    Instances {
        component: String,
        #[source]
        source: BoxError,
    },

    /// The number of rendered documents differs from the number of declared
    /// instances.
    #[error(
        "found {found} documents in the template of {component:?}, but there are {expected} \
         instances to decode them into. These must match; review the component's instance \
         declaration and the template"
    )]
    CountMismatch {
        component: String,
        expected: usize,
        found: usize,
    },

    /// A document does not match the target schema.
    #[error("validation error in {component:?}{}: {source}", document_suffix(.document))]
    Validation {
        component: String,
        /// Position of the document for multi-document components.
        document: Option<usize>,
        #[source]
        source: DecodeError,
    },

    /// A custom render override failed.
    #[error("custom render failed in {component:?}: {source}")]
    CustomRender {
        component: String,
        #[source]
        source: BoxError,
    },

    /// Frontloading is enabled but there is nothing to render it with.
    #[error("frontloading is enabled for {component:?} but no frontload input was given")]
    MissingFrontloadInput { component: String },

    /// A panic raised during rendering, typically by a user callback.
    #[error("failed rendering component {component:?}: {message}")]
    Panicked { component: String, message: String },
}

impl Error {
    /// Name of the component that failed.
    pub fn component(&self) -> &str {
        match self {
            Error::FileRead { component, .. }
            | Error::Preprocess { component, .. }
            | Error::Setup { component, .. }
            | Error::ContextIntrospection { component, .. }
            | Error::Parse { component, .. }
            | Error::Execution { component, .. }
            | Error::Instances { component, .. }
            | Error::CountMismatch { component, .. }
            | Error::Validation { component, .. }
            | Error::CustomRender { component, .. }
            | Error::MissingFrontloadInput { component }
            | Error::Panicked { component, .. } => component,
        }
    }

    /// Pipeline step the error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            Error::FileRead { .. } => Stage::Load,
            Error::Preprocess { .. } => Stage::Preprocess,
            Error::Setup { .. } => Stage::Setup,
            Error::ContextIntrospection { .. } => Stage::Context,
            Error::Parse { .. } => Stage::Parse,
            Error::Execution { .. } => Stage::Execute,
            Error::Instances { .. } | Error::CountMismatch { .. } => Stage::Instances,
            Error::Validation { .. } | Error::CustomRender { .. } => Stage::Decode,
            Error::MissingFrontloadInput { .. } => Stage::Configure,
            Error::Panicked { .. } => Stage::Panic,
        }
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::ContextIntrospection { component, source } => {
                Error::ContextIntrospection { component, source }
            }
            RenderError::Parse { component, source } => Error::Parse { component, source },
            RenderError::Execution { component, source } => Error::Execution { component, source },
        }
    }
}

fn document_suffix(document: &Option<usize>) -> String {
    match document {
        Some(index) => format!(" (document {})", index),
        None => String::new(),
    }
}
