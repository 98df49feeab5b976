//! # Helmet Render - Templates for Structured Documents
//!
//! `helmet-render` renders parameterized templates into YAML or JSON text. It
//! is the engine behind the `helmet` component system, but can be used on its
//! own wherever a template needs caller-supplied functions and variables.
//!
//! ## Core Concepts
//!
//! - [`Context`]: Named bindings produced per render; callables become
//!   template functions, everything else becomes a variable under
//!   `Helmet.<name>`
//! - [`preprocess`]: Normalizes inline templates (blank lines, tabs, indentation)
//! - [`escape`](escape::escape): Protects `{{! ... }}` actions meant for a
//!   second-stage template processor such as Helm
//! - [`Renderer`]: Runs the full pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use helmet_render::{preprocess, Context, Renderer};
//!
//! let template = preprocess(
//!     r#"
//!     name: {{ Helmet.Name }}
//!     image: {{ Image(Helmet.Name) | quote }}
//!     tag: {{! .Values.tag }}
//!     "#,
//!     None,
//! );
//!
//! let ctx = Context::new()
//!     .var("Name", "kuard")
//!     .func("Image", |name: String| format!("gcr.io/kuar-demo/{}", name));
//!
//! let out = Renderer::new().render("kuard", &template, &ctx).unwrap();
//! assert_eq!(
//!     out,
//!     "name: kuard\nimage: \"gcr.io/kuar-demo/kuard\"\ntag: {{ .Values.tag }}"
//! );
//! ```

pub mod context;
pub mod engine;
mod error;
pub mod escape;
pub mod functions;
mod preprocess;
mod renderer;

pub use context::{Binding, Context, FunctionMap, ToContext, VariableBag, NAMESPACE};
pub use engine::{MiniJinjaEngine, MissingKey, TemplateEngine, MISSING_VALUE};
pub use error::{ContextError, RenderError};
pub use preprocess::{preprocess, trim_blank_lines, unindent};
pub use renderer::{merge_functions, render, Renderer};

// Re-export minijinja so callers can build values and helper signatures
// without pinning their own version.
pub use minijinja;
