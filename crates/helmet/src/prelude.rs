//! Prelude for convenient imports.
//!
//! Brings in everything needed to define and render components:
//!
//! ```rust
//! use helmet::prelude::*;
//!
//! let component: Component<serde_json::Value, ()> = Component::create(Def::new(
//!     "hello",
//!     TemplateSource::inline("greeting: {{ Helmet.Name }}"),
//!     |_: &()| Ok(Context::new().var("Name", "world")),
//! ))
//! .unwrap();
//!
//! let (value, _) = component.render(&()).unwrap();
//! assert_eq!(value["greeting"], "world");
//! ```

// Components
pub use crate::component::{
    Component, ComponentMulti, Def, DefMulti, InstanceSource, TemplateSource,
};

// Configuration
pub use crate::options::Options;
pub use helmet_render::MissingKey;

// Contexts
pub use helmet_render::{Binding, Context, ContextError, ToContext};

// Errors
pub use crate::error::{BoxError, Error, Stage};
