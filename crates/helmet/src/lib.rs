//! # Helmet - Typed Components from YAML Templates
//!
//! Helmet turns parameterized templates into typed, schema-validated values.
//! A component pairs a template with a setup function; rendering it with an
//! input produces both the raw text and the decoded value, and fails if the
//! text contains any field the target type does not declare.
//!
//! ## Core Concepts
//!
//! - [`Component`] / [`ComponentMulti`]: created once from a [`Def`] or
//!   [`DefMulti`], rendered many times
//! - [`Context`]: what setup returns; callables become template functions,
//!   everything else a variable under `Helmet.<name>`
//! - [`Options`]: tab handling, document separator, missing-key mode,
//!   frontloading and panic mode
//! - [`decode`]: strict YAML decoding with unknown-field rejection
//! - [`Error`]: every failure, tagged with the component and its [`Stage`]
//!
//! ## Multi-Document Components
//!
//! Templates rendering several `---`-separated documents declare what each
//! document decodes into. The count must match:
//!
//! ```rust
//! use helmet::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Deployment {
//!     name: String,
//!     #[serde(default)]
//!     replicas: u32,
//! }
//!
//! let component = ComponentMulti::create(DefMulti::new(
//!     "Deployments",
//!     TemplateSource::inline(
//!         r#"
//!         name: kuard
//!         replicas: {{ Helmet.Replicas }}
//!         ---
//!         name: certbot
//!         "#,
//!     ),
//!     |replicas: &u32| Ok(Context::new().var("Replicas", *replicas)),
//!     InstanceSource::Static(vec![Deployment::default(), Deployment::default()]),
//! ))
//! .unwrap();
//!
//! let (deployments, documents) = component.render(&3).unwrap();
//! assert_eq!(deployments[0].replicas, 3);
//! assert_eq!(deployments[1].name, "certbot");
//! assert_eq!(documents.len(), 2);
//! ```
//!
//! ## Second-Stage Templates
//!
//! Actions written `{{! ... }}` are passed through untouched (minus the `!`),
//! so the output can itself be a template, for example a Helm chart:
//!
//! ```rust
//! use helmet::prelude::*;
//!
//! let component: Component<serde_json::Value, ()> = Component::create(
//!     Def::without_setup("chart", TemplateSource::inline("image: '{{! .Values.image }}'")),
//! )
//! .unwrap();
//! let (_, text) = component.render(&()).unwrap();
//! assert_eq!(text, "image: '{{ .Values.image }}'");
//! ```

pub mod component;
pub mod decode;
mod defaults;
pub mod documents;
mod error;
mod options;
pub mod prelude;

pub use component::{Component, ComponentMulti, Def, DefMulti, InstanceSource, TemplateSource};
pub use decode::{decode_into, decode_strict, DecodeError};
pub use defaults::apply_defaults;
pub use documents::{split_documents, DEFAULT_SEPARATOR};
pub use error::{BoxError, Error, Result, Stage};
pub use options::{Options, PreprocessFn, UnmarshalFn};

pub use helmet_render::{Context, MissingKey, ToContext};
