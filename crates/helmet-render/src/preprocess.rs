//! Template normalization.
//!
//! Templates are usually written inline, indented to match the surrounding
//! source code. Before parsing, [`preprocess`] shaves off the leading and
//! trailing blank lines, optionally expands tabs, and removes the common
//! indentation so the rendered output starts at column zero.
//!
//! ```rust
//! use helmet_render::preprocess;
//!
//! let tmpl = "
//!     my: cool
//!     spec:
//!       - Hello
//! ";
//! assert_eq!(preprocess(tmpl, None), "my: cool\nspec:\n  - Hello");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_BLANK_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*\n)+").expect("leading blank line pattern is valid")
});

static TRAILING_BLANK_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\n\s*)+$").expect("trailing blank line pattern is valid")
});

/// Normalizes raw template text.
///
/// Steps, in order: [`trim_blank_lines`], tab expansion (only when `tab_size`
/// is given), [`unindent`].
///
/// YAML does not accept tabs for indentation, so templates that use them need
/// a `tab_size`.
pub fn preprocess(raw: &str, tab_size: Option<usize>) -> String {
    let mut tmpl = trim_blank_lines(raw);

    if let Some(size) = tab_size {
        tmpl = tmpl.replace('\t', &" ".repeat(size));
    }

    unindent(&tmpl)
}

/// Removes leading and trailing lines that contain only whitespace.
///
/// Whitespace on the first and last non-blank lines is preserved.
pub fn trim_blank_lines(tmpl: &str) -> String {
    let tmpl = LEADING_BLANK_LINES.replace(tmpl, "");
    TRAILING_BLANK_LINES.replace(&tmpl, "").into_owned()
}

/// Strips the smallest leading-space count of all non-blank lines from every
/// line.
///
/// Blank lines lose at most that many leading spaces. If every line is blank
/// the input is returned unchanged.
pub fn unindent(input: &str) -> String {
    let smallest = input
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(leading_spaces)
        .min();

    let Some(smallest) = smallest else {
        return input.to_string();
    };

    input
        .split('\n')
        .map(|line| &line[leading_spaces(line).min(smallest)..])
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}
