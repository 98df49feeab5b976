//! Built-in template helpers.
//!
//! Two groups are provided, mirroring what Helm chart authors expect to find:
//!
//! - [`builtin_functions`]: general helpers (`to_yaml`, `to_json`, `from_yaml`,
//!   `from_json`, `quote`, `squote`, `indent`, `nindent`, `env`, `required`).
//! - [`custom_functions`]: helpers specific to this crate (`indent_rest`,
//!   `yaml_to_json`, `json_to_yaml`).
//!
//! Every helper is registered both as a function and as a filter, so
//! `{{ quote(Helmet.Name) }}` and `{{ Helmet.Name | quote }}` are equivalent.
//! Functions take their subject as the first argument.

use minijinja::{Error, ErrorKind, Value};

use crate::context::FunctionMap;

/// General-purpose helpers, registered before [`custom_functions`].
pub fn builtin_functions() -> FunctionMap {
    let mut map = FunctionMap::new();
    map.insert("to_yaml".into(), Value::from_function(to_yaml));
    map.insert("to_json".into(), Value::from_function(to_json));
    map.insert("from_yaml".into(), Value::from_function(from_yaml));
    map.insert("from_json".into(), Value::from_function(from_json));
    map.insert("quote".into(), Value::from_function(quote));
    map.insert("squote".into(), Value::from_function(squote));
    map.insert("indent".into(), Value::from_function(indent));
    map.insert("nindent".into(), Value::from_function(nindent));
    map.insert("env".into(), Value::from_function(env));
    map.insert("required".into(), Value::from_function(required));
    map
}

/// Helpers specific to this crate. They override same-named built-ins.
pub fn custom_functions() -> FunctionMap {
    let mut map = FunctionMap::new();
    map.insert("indent_rest".into(), Value::from_function(indent_rest));
    map.insert("yaml_to_json".into(), Value::from_function(yaml_to_json));
    map.insert("json_to_yaml".into(), Value::from_function(json_to_yaml));
    map
}

/// Serializes a value to YAML, without the trailing newline.
pub fn to_yaml(value: Value) -> Result<String, Error> {
    let yaml = serde_yaml::to_string(&value).map_err(|e| invalid("to_yaml", e))?;
    Ok(yaml.trim_end_matches('\n').to_string())
}

/// Serializes a value to compact JSON.
pub fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|e| invalid("to_json", e))
}

/// Parses a YAML document into a template value.
pub fn from_yaml(source: String) -> Result<Value, Error> {
    let parsed: serde_json::Value =
        serde_yaml::from_str(&source).map_err(|e| invalid("from_yaml", e))?;
    Ok(Value::from_serialize(&parsed))
}

/// Parses a JSON document into a template value.
pub fn from_json(source: String) -> Result<Value, Error> {
    let parsed: serde_json::Value =
        serde_json::from_str(&source).map_err(|e| invalid("from_json", e))?;
    Ok(Value::from_serialize(&parsed))
}

/// Wraps the value in double quotes, escaping as needed.
pub fn quote(value: Value) -> String {
    serde_json::Value::String(display(&value)).to_string()
}

/// Wraps the value in single quotes.
pub fn squote(value: Value) -> String {
    format!("'{}'", display(&value))
}

/// Indents every line by `spaces`.
pub fn indent(text: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    format!("{}{}", pad, text.replace('\n', &format!("\n{}", pad)))
}

/// Like [`indent`], prefixed with a newline.
pub fn nindent(text: String, spaces: usize) -> String {
    format!("\n{}", indent(text, spaces))
}

/// Indents every line except the first.
///
/// Useful when the first line continues a line of the template:
/// `key: {{ Helmet.Block | indent_rest(2) }}`.
pub fn indent_rest(text: String, spaces: usize) -> String {
    match text.split_once('\n') {
        Some((head, rest)) => format!("{}\n{}", head, indent(rest.to_string(), spaces)),
        None => text,
    }
}

/// Converts a YAML document to compact JSON.
pub fn yaml_to_json(source: String) -> Result<String, Error> {
    let parsed: serde_json::Value =
        serde_yaml::from_str(&source).map_err(|e| invalid("yaml_to_json", e))?;
    serde_json::to_string(&parsed).map_err(|e| invalid("yaml_to_json", e))
}

/// Converts a JSON document to YAML.
pub fn json_to_yaml(source: String) -> Result<String, Error> {
    let parsed: serde_json::Value =
        serde_json::from_str(&source).map_err(|e| invalid("json_to_yaml", e))?;
    serde_yaml::to_string(&parsed).map_err(|e| invalid("json_to_yaml", e))
}

/// Reads an environment variable, empty when unset.
pub fn env(name: String) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Fails rendering with `message` when the value is undefined, none or empty.
pub fn required(value: Value, message: String) -> Result<Value, Error> {
    let missing = value.is_undefined()
        || value.is_none()
        || value.as_str().map(str::is_empty).unwrap_or(false);
    if missing {
        Err(Error::new(ErrorKind::InvalidOperation, message))
    } else {
        Ok(value)
    }
}

fn display(value: &Value) -> String {
    if value.is_undefined() || value.is_none() {
        return String::new();
    }
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn invalid(helper: &str, err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::new(ErrorKind::InvalidOperation, format!("{} failed", helper)).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_indent_rest_single_line() {
        assert_eq!(indent_rest("  Hello there!".into(), 4), "  Hello there!");
    }

    #[test]
    fn test_indent_rest_multiple_lines() {
        assert_eq!(
            indent_rest("  Hello there!\nTraveller\n  What a nice day.".into(), 4),
            "  Hello there!\n    Traveller\n      What a nice day."
        );
    }

    #[test]
    fn test_indent_and_nindent() {
        assert_eq!(indent("a\nb".into(), 2), "  a\n  b");
        assert_eq!(nindent("a".into(), 2), "\n  a");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(Value::from("a\"b")), r#""a\"b""#);
        assert_eq!(quote(Value::from(2)), r#""2""#);
        assert_eq!(quote(Value::UNDEFINED), r#""""#);
        assert_eq!(squote(Value::from("x")), "'x'");
    }

    #[test]
    fn test_yaml_json_conversion() {
        assert_eq!(yaml_to_json("a: 1\nb: [x]".into()).unwrap(), r#"{"a":1,"b":["x"]}"#);
        assert_eq!(json_to_yaml(r#"{"a":1}"#.into()).unwrap(), "a: 1\n");
        assert!(yaml_to_json("a: [".into()).is_err());
    }

    #[test]
    fn test_to_yaml_trims_newline() {
        let value = Value::from_serialize(serde_json::json!({"name": "web"}));
        assert_eq!(to_yaml(value).unwrap(), "name: web");
    }

    #[test]
    fn test_from_yaml_builds_value() {
        let value = from_yaml("name: web\nreplicas: 2".into()).unwrap();
        assert_eq!(value.get_attr("replicas").unwrap(), Value::from(2));
    }

    #[test]
    fn test_required() {
        assert!(required(Value::UNDEFINED, "need it".into()).is_err());
        assert!(required(Value::from(""), "need it".into()).is_err());
        assert_eq!(required(Value::from(0), "x".into()).unwrap(), Value::from(0));
    }

    #[test]
    #[serial]
    fn test_env_lookup() {
        std::env::set_var("HELMET_TEST_ENV", "value");
        assert_eq!(env("HELMET_TEST_ENV".into()), "value");
        std::env::remove_var("HELMET_TEST_ENV");
        assert_eq!(env("HELMET_TEST_ENV".into()), "");
    }

    #[test]
    fn test_custom_overrides_are_disjoint_from_builtins() {
        let builtins = builtin_functions();
        assert!(custom_functions().keys().all(|k| !builtins.contains_key(k)));
    }
}
