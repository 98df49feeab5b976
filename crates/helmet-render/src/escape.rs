//! Escaped actions for second-stage template processors.
//!
//! Rendered output is often itself a template: a Helm chart, for example, is
//! rendered again by Helm at install time. Actions meant for that later stage
//! would fail here, since their identifiers are unknown to this engine.
//!
//! Writing `{{! .Values.image }}` instead of `{{ .Values.image }}` marks the
//! action as escaped. [`escape`] swaps each escaped action for an inert
//! placeholder token before rendering, and [`unescape`] restores the action
//! (minus the `!`) afterwards.
//!
//! ```rust
//! use helmet_render::escape::{escape, unescape};
//!
//! let (escaped, slots) = escape("image: {{! .Values.image }}");
//! assert!(!escaped.contains("{{"));
//! assert_eq!(unescape(&escaped, &slots), "image: {{ .Values.image }}");
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker that follows the opening delimiter of an escaped action.
pub const ESCAPE_MARKER: &str = "{{!";

const DEFAULT_TOKEN_PREFIX: &str = "__helmet__slot_";
const TOKEN_SUFFIX: &str = "__";

static ESCAPED_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{![^}]*\}\}").expect("escaped action pattern is valid"));

/// Placeholder tokens and the actions they stand for.
///
/// Produced by [`escape`], consumed by [`unescape`]. Tokens are
/// `<prefix>0__`, `<prefix>1__`, ... in order of appearance. The suffix ends
/// the slot number, so text written right after a token is never read as
/// part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMap {
    prefix: String,
    slots: HashMap<String, String>,
}

impl SlotMap {
    /// Returns the action stored for `token`.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.slots.get(token).map(String::as_str)
    }

    /// Returns the number of escaped actions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the template contained no escaped actions.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Token prefix used for this template.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Replaces every escaped action with a placeholder token.
///
/// The token prefix is extended until it does not occur anywhere in the
/// template, so tokens never collide with literal text.
pub fn escape(template: &str) -> (String, SlotMap) {
    let mut prefix = DEFAULT_TOKEN_PREFIX.to_string();
    while template.contains(prefix.as_str()) {
        prefix.insert(0, '_');
    }

    let mut slots = HashMap::new();
    let escaped = ESCAPED_ACTION.replace_all(template, |caps: &regex::Captures| {
        let token = format!("{}{}{}", prefix, slots.len(), TOKEN_SUFFIX);
        let action = caps[0].replacen(ESCAPE_MARKER, "{{", 1);
        slots.insert(token.clone(), action);
        token
    });

    (escaped.into_owned(), SlotMap { prefix, slots })
}

/// Puts escaped actions back in place of their tokens.
///
/// Text that does not match a known token is left untouched.
pub fn unescape(text: &str, slots: &SlotMap) -> String {
    if slots.is_empty() {
        return text.to_string();
    }

    let pattern = format!(
        r"{}\d+{}",
        regex::escape(&slots.prefix),
        regex::escape(TOKEN_SUFFIX)
    );
    let Ok(token) = Regex::new(&pattern) else {
        return text.to_string();
    };

    token
        .replace_all(text, |caps: &regex::Captures| {
            slots
                .get(&caps[0])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
