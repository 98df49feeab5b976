//! The render pipeline.
//!
//! [`Renderer::render`] turns a (preprocessed) template and a [`Context`] into
//! text:
//!
//! 1. Split the context into functions and variables.
//! 2. Merge the function map: [`builtin_functions`], then
//!    [`custom_functions`], then the context's callables. Later sources win.
//! 3. Wrap the variables under [`NAMESPACE`].
//! 4. Swap escaped `{{! ... }}` actions for placeholder tokens.
//! 5. Parse and execute with the configured [`TemplateEngine`].
//! 6. Scrub [`MISSING_VALUE`] sentinels.
//! 7. Restore the escaped actions.
//!
//! Every call builds its function map, variables and slots from scratch; a
//! `Renderer` holds no per-call state and can be shared between threads.
//!
//! [`NAMESPACE`]: crate::NAMESPACE

use std::sync::Arc;

use tracing::debug;

use crate::context::{namespaced, Context, FunctionMap};
use crate::engine::{MiniJinjaEngine, MissingKey, TemplateEngine, MISSING_VALUE};
use crate::error::RenderError;
use crate::escape::{escape, unescape};
use crate::functions::{builtin_functions, custom_functions};

/// Renders templates against contexts.
///
/// # Example
///
/// ```rust
/// use helmet_render::{Context, Renderer};
///
/// let ctx = Context::new()
///     .var("X", "2")
///     .func("Fn", |s: String| s);
///
/// let out = Renderer::new()
///     .render("greeting", "Hello {{ Fn(Helmet.X) }} {{! .Other.Y }}", &ctx)
///     .unwrap();
/// assert_eq!(out, "Hello 2 {{ .Other.Y }}");
/// ```
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn TemplateEngine>,
}

impl Renderer {
    /// Creates a renderer backed by [`MiniJinjaEngine`] in
    /// [`MissingKey::Zero`] mode.
    pub fn new() -> Self {
        Self::with_engine(MiniJinjaEngine::new())
    }

    /// Creates a renderer with the given missing-key behavior.
    pub fn with_missing_key(missing_key: MissingKey) -> Self {
        Self::with_engine(MiniJinjaEngine::with_missing_key(missing_key))
    }

    /// Creates a renderer with a custom engine.
    pub fn with_engine<E: TemplateEngine + 'static>(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Renders `template` for the component `name`.
    pub fn render(
        &self,
        name: &str,
        template: &str,
        context: &Context,
    ) -> Result<String, RenderError> {
        let (context_functions, variables) =
            context
                .split()
                .map_err(|source| RenderError::ContextIntrospection {
                    component: name.to_string(),
                    source,
                })?;

        debug!(
            component = name,
            functions = context_functions.len(),
            variables = variables.len(),
            "rendering template"
        );

        let functions = merge_functions([builtin_functions(), custom_functions(), context_functions]);
        let data = namespaced(variables);

        let (escaped, slots) = escape(template);
        let output = self.engine.render(name, &escaped, &functions, &data)?;
        let output = output.replace(MISSING_VALUE, "");

        Ok(unescape(&output, &slots))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}

/// Renders with a default [`Renderer`].
pub fn render(name: &str, template: &str, context: &Context) -> Result<String, RenderError> {
    Renderer::new().render(name, template, context)
}

/// Merges function maps in order; on collisions the later map wins.
pub fn merge_functions<I>(sources: I) -> FunctionMap
where
    I: IntoIterator<Item = FunctionMap>,
{
    let mut merged = FunctionMap::new();
    for source in sources {
        merged.extend(source);
    }
    merged
}
