//! Multi-document splitting and instance matching.

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = "---";

/// Splits rendered text into documents on lines equal to `separator`.
///
/// Lines are compared after trimming surrounding whitespace, so `"  ---  "`
/// separates as well as `"---"`. An empty separator falls back to
/// [`DEFAULT_SEPARATOR`]. The result always holds at least one document, and
/// a leading or trailing separator produces an empty document at that end.
///
/// ```rust
/// use helmet::documents::split_documents;
///
/// let docs = split_documents("a: 1\n---\nb: 2", "---");
/// assert_eq!(docs, vec!["a: 1", "b: 2"]);
/// ```
pub fn split_documents(rendered: &str, separator: &str) -> Vec<String> {
    let separator = match separator.trim() {
        "" => DEFAULT_SEPARATOR,
        sep => sep,
    };

    let mut documents = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in rendered.split('\n') {
        if line.trim() == separator {
            documents.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    documents.push(current.join("\n"));
    documents
}

/// Counts of a failed [`match_instances`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    /// Number of declared instances.
    pub expected: usize,
    /// Number of rendered documents.
    pub found: usize,
}

/// Pairs documents with instances by position.
///
/// Fails when the two sequences differ in length; nothing is paired in that
/// case.
pub fn match_instances<D, T>(documents: &[D], instances: Vec<T>) -> Result<Vec<(&D, T)>, CountMismatch> {
    if documents.len() != instances.len() {
        return Err(CountMismatch {
            expected: instances.len(),
            found: documents.len(),
        });
    }
    Ok(documents.iter().zip(instances).collect())
}
