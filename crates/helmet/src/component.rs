//! Component definitions and their render pipeline.
//!
//! A component is created once from a definition ([`Def`] or [`DefMulti`])
//! and rendered any number of times:
//!
//! ```text
//! input ──setup──► context ──render──► text ──split──► documents ──decode──► values
//! ```
//!
//! The template is loaded and preprocessed at creation. Everything after
//! `setup` is rebuilt on every call, so a component can be shared freely
//! between threads.
//!
//! # Example
//!
//! ```rust
//! use helmet::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Spec {
//!     my: String,
//!     spec: Vec<String>,
//! }
//!
//! struct Input {
//!     number: i64,
//! }
//!
//! let component: Component<Spec, Input> = Component::create(Def::new(
//!     "BasicComponent",
//!     TemplateSource::inline(
//!         r#"
//!         my: cool
//!         spec:
//!           - Hello
//!           - {{ Helmet.Number | quote }}
//!           - {{ Catify("I LOVE CATS") }}
//!         "#,
//!     ),
//!     |input: &Input| {
//!         Ok(Context::new()
//!             .var("Number", input.number)
//!             .func("Catify", |s: String| format!("cat {} cat", s)))
//!     },
//! ))
//! .unwrap();
//!
//! let (spec, text) = component.render(&Input { number: 2 }).unwrap();
//! assert_eq!(spec.spec[1], "2");
//! assert_eq!(spec.spec[2], "cat I LOVE CATS cat");
//! assert!(text.starts_with("my: cool\n"));
//! ```

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use helmet_render::{preprocess, Context, Renderer, ToContext};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::decode::{decode_document, decode_strict, DecodeError};
use crate::documents::{match_instances, split_documents};
use crate::error::{BoxError, Error, Result};
use crate::options::Options;

/// Where a component's template text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The template itself.
    Inline(String),
    /// A file read once, when the component is created.
    File(PathBuf),
}

impl TemplateSource {
    pub fn inline(template: impl Into<String>) -> Self {
        TemplateSource::Inline(template.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        TemplateSource::File(path.into())
    }
}

/// Transforms the render input into the template context.
pub type SetupFn<I, C> = Arc<dyn Fn(&I) -> Result<C, BoxError> + Send + Sync>;

/// Custom replacement for decoding a single document.
pub type RenderFn<T, I, C> = Arc<dyn Fn(&I, &C, &str) -> Result<T, BoxError> + Send + Sync>;

/// Custom replacement for decoding all documents of a multi component.
pub type RenderMultiFn<T, I, C> =
    Arc<dyn Fn(&I, &C, &[String]) -> Result<Vec<T>, BoxError> + Send + Sync>;

/// Produces the blueprints a multi component decodes into.
pub type InstancesFn<T, I, C> = Arc<dyn Fn(&I, &C) -> Result<Vec<T>, BoxError> + Send + Sync>;

/// How a multi component learns what to decode each document into.
pub enum InstanceSource<T, I, C = Context> {
    /// The same blueprints on every render. Each render decodes into copies.
    Static(Vec<T>),
    /// Blueprints computed from the input and context of each render.
    FromFn(InstancesFn<T, I, C>),
    /// No blueprints: every document is decoded into a fresh value, and any
    /// number of documents is accepted.
    PerDocument,
}

impl<T, I, C> InstanceSource<T, I, C> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&I, &C) -> Result<Vec<T>, BoxError> + Send + Sync + 'static,
    {
        InstanceSource::FromFn(Arc::new(f))
    }
}

impl<T: fmt::Debug, I, C> fmt::Debug for InstanceSource<T, I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceSource::Static(instances) => f.debug_tuple("Static").field(instances).finish(),
            InstanceSource::FromFn(_) => f.write_str("FromFn(..)"),
            InstanceSource::PerDocument => f.write_str("PerDocument"),
        }
    }
}

/// Definition of a single-document component.
///
/// `T` is the decoded type, `I` the render input and `C` the context produced
/// by setup.
pub struct Def<T, I, C = Context> {
    name: String,
    template: TemplateSource,
    setup: SetupFn<I, C>,
    render: Option<RenderFn<T, I, C>>,
    options: Options<T, I>,
}

impl<T, I, C> Def<T, I, C> {
    pub fn new<F>(name: impl Into<String>, template: TemplateSource, setup: F) -> Self
    where
        F: Fn(&I) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            template,
            setup: Arc::new(setup),
            render: None,
            options: Options::default(),
        }
    }

    /// Definition whose context is always `C::default()`.
    pub fn without_setup(name: impl Into<String>, template: TemplateSource) -> Self
    where
        I: 'static,
        C: Default + 'static,
    {
        Self::new(name, template, |_: &I| Ok(C::default()))
    }

    /// Replaces the decode step. The rendered text is still returned.
    pub fn render_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&I, &C, &str) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn options(mut self, options: Options<T, I>) -> Self {
        self.options = options;
        self
    }
}

/// Definition of a multi-document component.
pub struct DefMulti<T, I, C = Context> {
    name: String,
    template: TemplateSource,
    setup: SetupFn<I, C>,
    instances: InstanceSource<T, I, C>,
    render: Option<RenderMultiFn<T, I, C>>,
    options: Options<T, I>,
}

impl<T, I, C> DefMulti<T, I, C> {
    pub fn new<F>(
        name: impl Into<String>,
        template: TemplateSource,
        setup: F,
        instances: InstanceSource<T, I, C>,
    ) -> Self
    where
        F: Fn(&I) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            template,
            setup: Arc::new(setup),
            instances,
            render: None,
            options: Options::default(),
        }
    }

    /// Replaces the per-document decode step. Runs after the document count
    /// has been checked against the instances.
    pub fn render_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&I, &C, &[String]) -> Result<Vec<T>, BoxError> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn options(mut self, options: Options<T, I>) -> Self {
        self.options = options;
        self
    }
}

/// State shared by both component kinds: the prepared template and the
/// steps up to the rendered text.
struct Core<T, I, C> {
    name: String,
    template: String,
    setup: SetupFn<I, C>,
    options: Options<T, I>,
    renderer: Renderer,
}

impl<T, I, C: ToContext> Core<T, I, C> {
    fn new(
        name: String,
        source: TemplateSource,
        setup: SetupFn<I, C>,
        options: Options<T, I>,
    ) -> Result<Self> {
        let template = load_template(&name, source, &options)?;
        let renderer = Renderer::with_missing_key(options.missing_key);
        Ok(Self {
            name,
            template,
            setup,
            options,
            renderer,
        })
    }

    fn setup(&self, input: &I) -> Result<C> {
        (self.setup)(input).map_err(|source| Error::Setup {
            component: self.name.clone(),
            source,
        })
    }

    fn render_text(&self, context: &C) -> Result<String> {
        let bindings = context
            .to_context()
            .map_err(|source| Error::ContextIntrospection {
                component: self.name.clone(),
                source,
            })?;
        Ok(self.renderer.render(&self.name, &self.template, &bindings)?)
    }

    fn unmarshal(&self, document: &str, blueprint: Option<&T>) -> Option<Result<T, DecodeError>> {
        self.options
            .unmarshal
            .as_ref()
            .map(|hook| hook(document, blueprint))
    }

    /// Runs `f` under the component's error policy.
    ///
    /// In panic mode an error aborts with its message. Otherwise panics raised
    /// inside `f` are caught and returned as [`Error::Panicked`].
    fn guard<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        if self.options.panic_on_error {
            return Ok(f().unwrap_or_else(|err| panic!("{err}")));
        }
        panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
            Err(Error::Panicked {
                component: self.name.clone(),
                message: panic_message(payload.as_ref()),
            })
        })
    }

    fn frontload_input(&self) -> Result<Option<&I>> {
        if !self.options.frontload {
            return Ok(None);
        }
        match self.options.frontload_input.as_ref() {
            Some(input) => Ok(Some(input)),
            None => Err(Error::MissingFrontloadInput {
                component: self.name.clone(),
            }),
        }
    }

    /// Applies the panic policy to a creation error.
    fn fail<R>(&self, err: Error) -> Result<R> {
        if self.options.panic_on_error {
            panic!("{err}");
        }
        Err(err)
    }
}

impl<T, I, C> fmt::Debug for Core<T, I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A component rendering to exactly one document.
pub struct Component<T, I, C = Context> {
    core: Core<T, I, C>,
    render: Option<RenderFn<T, I, C>>,
}

impl<T, I, C> Component<T, I, C>
where
    T: DeserializeOwned,
    C: ToContext,
{
    /// Loads and preprocesses the template, then frontloads if enabled.
    pub fn create(def: Def<T, I, C>) -> Result<Self> {
        let panic_on_error = def.options.panic_on_error;
        let core = match Core::new(def.name, def.template, def.setup, def.options) {
            Ok(core) => core,
            Err(err) if panic_on_error => panic!("{err}"),
            Err(err) => return Err(err),
        };
        info!(component = %core.name, "created component");

        let component = Self {
            core,
            render: def.render,
        };
        match component.core.frontload_input() {
            Ok(Some(input)) => {
                info!(component = %component.core.name, "frontloading component");
                component.render(input)?;
            }
            Ok(None) => {}
            Err(err) => return component.core.fail(err),
        }
        Ok(component)
    }

    /// Renders `input`, returning the decoded value and the rendered text.
    pub fn render(&self, input: &I) -> Result<(T, String)> {
        self.core.guard(|| self.try_render(input))
    }

    fn try_render(&self, input: &I) -> Result<(T, String)> {
        let core = &self.core;
        let context = core.setup(input)?;
        let content = core.render_text(&context)?;

        let value = match &self.render {
            Some(render) => render(input, &context, &content).map_err(|source| {
                Error::CustomRender {
                    component: core.name.clone(),
                    source,
                }
            })?,
            None => {
                debug!(component = %core.name, "decoding document");
                core.unmarshal(&content, None)
                    .unwrap_or_else(|| decode_strict(&content))
                    .map_err(|source| Error::Validation {
                        component: core.name.clone(),
                        document: None,
                        source,
                    })?
            }
        };
        Ok((value, content))
    }
}

impl<T, I, C> Component<T, I, C> {
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The template after preprocessing.
    pub fn template(&self) -> &str {
        &self.core.template
    }

    pub fn options(&self) -> &Options<T, I> {
        &self.core.options
    }
}

impl<T, I, C> fmt::Debug for Component<T, I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt(f)
    }
}

/// A component rendering to a sequence of documents.
pub struct ComponentMulti<T, I, C = Context> {
    core: Core<T, I, C>,
    instances: InstanceSource<T, I, C>,
    render: Option<RenderMultiFn<T, I, C>>,
}

impl<T, I, C> ComponentMulti<T, I, C>
where
    T: Clone + Serialize + DeserializeOwned,
    C: ToContext,
{
    /// Loads and preprocesses the template, then frontloads if enabled.
    pub fn create(def: DefMulti<T, I, C>) -> Result<Self> {
        let panic_on_error = def.options.panic_on_error;
        let core = match Core::new(def.name, def.template, def.setup, def.options) {
            Ok(core) => core,
            Err(err) if panic_on_error => panic!("{err}"),
            Err(err) => return Err(err),
        };
        info!(component = %core.name, "created multi-document component");

        let component = Self {
            core,
            instances: def.instances,
            render: def.render,
        };
        match component.core.frontload_input() {
            Ok(Some(input)) => {
                info!(component = %component.core.name, "frontloading component");
                component.render(input)?;
            }
            Ok(None) => {}
            Err(err) => return component.core.fail(err),
        }
        Ok(component)
    }

    /// Renders `input`, returning one decoded value per document together
    /// with the document texts.
    pub fn render(&self, input: &I) -> Result<(Vec<T>, Vec<String>)> {
        self.core.guard(|| self.try_render(input))
    }

    fn try_render(&self, input: &I) -> Result<(Vec<T>, Vec<String>)> {
        let core = &self.core;
        let context = core.setup(input)?;
        let content = core.render_text(&context)?;
        let documents = split_documents(&content, core.options.effective_separator());
        debug!(component = %core.name, documents = documents.len(), "split rendered text");

        let blueprints = match &self.instances {
            InstanceSource::Static(instances) => Some(instances.clone()),
            InstanceSource::FromFn(f) => Some(f(input, &context).map_err(|source| {
                Error::Instances {
                    component: core.name.clone(),
                    source,
                }
            })?),
            InstanceSource::PerDocument => None,
        };

        let blueprints: Vec<Option<T>> = match blueprints {
            Some(blueprints) => match_instances(&documents, blueprints)
                .map_err(|mismatch| Error::CountMismatch {
                    component: core.name.clone(),
                    expected: mismatch.expected,
                    found: mismatch.found,
                })?
                .into_iter()
                .map(|(_, blueprint)| Some(blueprint))
                .collect(),
            None => documents.iter().map(|_| None).collect(),
        };

        if let Some(render) = &self.render {
            let values = render(input, &context, &documents).map_err(|source| {
                Error::CustomRender {
                    component: core.name.clone(),
                    source,
                }
            })?;
            return Ok((values, documents));
        }

        let mut values = Vec::with_capacity(documents.len());
        for (index, (document, blueprint)) in documents.iter().zip(&blueprints).enumerate() {
            debug!(component = %core.name, document = index, "decoding document");
            let value = core
                .unmarshal(document, blueprint.as_ref())
                .unwrap_or_else(|| decode_document(document, blueprint.as_ref()))
                .map_err(|source| Error::Validation {
                    component: core.name.clone(),
                    document: Some(index),
                    source,
                })?;
            values.push(value);
        }
        Ok((values, documents))
    }
}

impl<T, I, C> ComponentMulti<T, I, C> {
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The template after preprocessing.
    pub fn template(&self) -> &str {
        &self.core.template
    }

    pub fn options(&self) -> &Options<T, I> {
        &self.core.options
    }
}

impl<T, I, C> fmt::Debug for ComponentMulti<T, I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt(f)
    }
}

fn load_template<T, I>(name: &str, source: TemplateSource, options: &Options<T, I>) -> Result<String> {
    let raw = match source {
        TemplateSource::Inline(template) => template,
        TemplateSource::File(path) => {
            debug!(component = name, path = %path.display(), "reading template file");
            fs::read_to_string(&path).map_err(|source| Error::FileRead {
                component: name.to_string(),
                path,
                source,
            })?
        }
    };

    match &options.preprocess {
        Some(hook) => hook(&raw, options.tab_size).map_err(|source| Error::Preprocess {
            component: name.to_string(),
            source,
        }),
        None => Ok(preprocess(&raw, options.tab_size)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
