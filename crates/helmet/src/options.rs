//! Component options.
//!
//! [`Options`] is a builder; every setting has a default, so most components
//! only touch one or two:
//!
//! ```rust
//! use helmet::{MissingKey, Options};
//!
//! #[derive(serde::Serialize, serde::Deserialize)]
//! struct Manifest {}
//!
//! let opts: Options<Manifest, u32> = Options::default()
//!     .tab_size(4)
//!     .missing_key(MissingKey::Error)
//!     .frontload(2);
//! assert!(opts.frontload_enabled());
//! ```

use std::fmt;
use std::sync::Arc;

use helmet_render::MissingKey;

use crate::decode::DecodeError;
use crate::documents::DEFAULT_SEPARATOR;
use crate::error::BoxError;

/// Replacement for the built-in template preprocessing.
///
/// Receives the raw template and the configured tab size.
pub type PreprocessFn = Arc<dyn Fn(&str, Option<usize>) -> Result<String, BoxError> + Send + Sync>;

/// Replacement for the built-in strict decode step.
///
/// Receives one rendered document and, for multi-document components, the
/// blueprint declared for its position.
pub type UnmarshalFn<T> = Arc<dyn Fn(&str, Option<&T>) -> Result<T, DecodeError> + Send + Sync>;

/// Settings shared by single and multi-document components.
///
/// `T` is the decoded value type, `I` the render input type.
pub struct Options<T, I> {
    pub(crate) panic_on_error: bool,
    pub(crate) preprocess: Option<PreprocessFn>,
    pub(crate) unmarshal: Option<UnmarshalFn<T>>,
    pub(crate) separator: String,
    pub(crate) tab_size: Option<usize>,
    pub(crate) missing_key: MissingKey,
    pub(crate) frontload: bool,
    pub(crate) frontload_input: Option<I>,
}

impl<T, I> Options<T, I> {
    /// Aborts with a panic instead of returning errors, at creation and on
    /// every render.
    pub fn panic_on_error(mut self, enabled: bool) -> Self {
        self.panic_on_error = enabled;
        self
    }

    /// Replaces the built-in template preprocessing.
    pub fn preprocess_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<usize>) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.preprocess = Some(Arc::new(f));
        self
    }

    /// Replaces the built-in strict decode step.
    pub fn unmarshal_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<&T>) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        self.unmarshal = Some(Arc::new(f));
        self
    }

    /// Sets the line that separates documents. Empty means `---`.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Replaces tabs with `spaces` spaces during preprocessing.
    pub fn tab_size(mut self, spaces: usize) -> Self {
        self.tab_size = Some(spaces);
        self
    }

    /// Sets how undefined identifiers are treated while rendering.
    pub fn missing_key(mut self, missing_key: MissingKey) -> Self {
        self.missing_key = missing_key;
        self
    }

    /// Enables frontloading: the component renders `input` once at creation
    /// and fails to build if that render fails.
    pub fn frontload(mut self, input: I) -> Self {
        self.frontload = true;
        self.frontload_input = Some(input);
        self
    }

    /// Enables or disables frontloading without changing the input.
    pub fn frontload_enabled_with(mut self, enabled: bool) -> Self {
        self.frontload = enabled;
        self
    }

    /// Whether errors panic instead of being returned.
    pub fn is_panic_on_error(&self) -> bool {
        self.panic_on_error
    }

    /// Effective document separator.
    pub fn effective_separator(&self) -> &str {
        if self.separator.trim().is_empty() {
            DEFAULT_SEPARATOR
        } else {
            &self.separator
        }
    }

    /// Tab width used when preprocessing, if set.
    pub fn tab_size_value(&self) -> Option<usize> {
        self.tab_size
    }

    /// Missing-key mode passed to the engine.
    pub fn missing_key_mode(&self) -> MissingKey {
        self.missing_key
    }

    pub fn frontload_enabled(&self) -> bool {
        self.frontload
    }

    pub fn frontload_input(&self) -> Option<&I> {
        self.frontload_input.as_ref()
    }
}

impl<T, I> Default for Options<T, I> {
    fn default() -> Self {
        Self {
            panic_on_error: false,
            preprocess: None,
            unmarshal: None,
            separator: String::new(),
            tab_size: None,
            missing_key: MissingKey::Zero,
            frontload: false,
            frontload_input: None,
        }
    }
}

impl<T, I: Clone> Clone for Options<T, I> {
    fn clone(&self) -> Self {
        Self {
            panic_on_error: self.panic_on_error,
            preprocess: self.preprocess.clone(),
            unmarshal: self.unmarshal.clone(),
            separator: self.separator.clone(),
            tab_size: self.tab_size,
            missing_key: self.missing_key,
            frontload: self.frontload,
            frontload_input: self.frontload_input.clone(),
        }
    }
}

impl<T, I> fmt::Debug for Options<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("panic_on_error", &self.panic_on_error)
            .field("preprocess", &self.preprocess.is_some())
            .field("unmarshal", &self.unmarshal.is_some())
            .field("separator", &self.effective_separator())
            .field("tab_size", &self.tab_size)
            .field("missing_key", &self.missing_key)
            .field("frontload", &self.frontload)
            .finish_non_exhaustive()
    }
}
