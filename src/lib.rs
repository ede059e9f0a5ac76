pub mod clone;
pub mod ddl;
pub mod merge;
pub mod schema;
pub mod structure;

use wasm_bindgen::prelude::*;

pub use clone::clone;
pub use ddl::{DdlOptions, Layout, to_sql, to_sql_with};
pub use merge::{MergeError, merge, merge_owned};
pub use schema::{Field, ForeignKey, Literal, SchemaError, Table, Tables};
pub use structure::{Key, Path, PathParseError, Primitive, Structure};

/// Errors of the JSON-string entry points.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid {what} JSON: {source}")]
    Json {
        what: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn parse_arg<T: serde::de::DeserializeOwned>(
    what: &'static str,
    input: &str,
) -> Result<T, ApiError> {
    serde_json::from_str(input).map_err(|source| ApiError::Json { what, source })
}

/// Merge over JSON text. `path` is a JSON array of keys, e.g. `["users", 0]`.
pub fn merge_json(target: &str, path: &str, delta: &str) -> Result<String, ApiError> {
    let target: Structure = parse_arg("target", target)?;
    let path: Path = parse_arg("path", path)?;
    let delta: Structure = parse_arg("delta", delta)?;
    Ok(merge_owned(target, &path, &delta)?.to_string())
}

/// Deep-copy JSON text, normalizing its formatting.
pub fn clone_json(target: &str) -> Result<String, ApiError> {
    let target: Structure = parse_arg("target", target)?;
    Ok(clone(&target).to_string())
}

/// Render DDL for a JSON schema description.
pub fn schema_json_to_sql(schema: &str, options: &DdlOptions) -> Result<String, ApiError> {
    let tables = schema::from_json(schema)?;
    Ok(to_sql_with(&tables, options))
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn js_error(err: ApiError) -> js_sys::Error {
    js_sys::Error::new(&err.to_string())
}

#[wasm_bindgen(js_name = "merge")]
pub fn merge_js(target: &str, path: &str, delta: &str) -> Result<String, js_sys::Error> {
    merge_json(target, path, delta).map_err(js_error)
}

#[wasm_bindgen(js_name = "clone")]
pub fn clone_js(target: &str) -> Result<String, js_sys::Error> {
    clone_json(target).map_err(js_error)
}

#[wasm_bindgen(js_name = "toSql")]
pub fn to_sql_js(schema: &str, compact: Option<bool>) -> Result<String, js_sys::Error> {
    let options = DdlOptions {
        layout: if compact.unwrap_or(false) {
            Layout::Compact
        } else {
            Layout::Multiline
        },
        ..DdlOptions::default()
    };
    schema_json_to_sql(schema, &options).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_json() {
        let out = merge_json(r#"{"a":[{"b":1}],"c":2}"#, r#"["a",0]"#, r#"{"d":3}"#).unwrap();
        assert_eq!(out, r#"{"a":[{"b":1,"d":3}],"c":2}"#);
    }

    #[test]
    fn test_merge_json_reports_which_argument_is_bad() {
        let err = merge_json("{}", "a.b", "{}").unwrap_err();
        assert!(matches!(err, ApiError::Json { what: "path", .. }));

        let err = merge_json("5", r#"["a"]"#, "{}").unwrap_err();
        assert!(matches!(err, ApiError::Merge(MergeError::Primitive { .. })));
    }

    #[test]
    fn test_merge_json_rejects_huge_indices() {
        let err = merge_json("[]", "[]", r#"{"18446744073709551615":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::Merge(MergeError::IndexTooLarge { .. })));

        let err = merge_json("[]", "[1099511627776]", "1").unwrap_err();
        assert!(matches!(err, ApiError::Merge(MergeError::IndexTooLarge { .. })));
    }

    #[test]
    fn test_clone_json() {
        assert_eq!(
            clone_json(r#"{ "b": [1, 2], "a": null }"#).unwrap(),
            r#"{"b":[1,2],"a":null}"#
        );
    }

    #[test]
    fn test_schema_json_to_sql() {
        let schema =
            r#"{"t":{"name":"t","fields":[{"name":"id","type":"INTEGER","primaryKey":true}]}}"#;
        let options = DdlOptions {
            layout: Layout::Compact,
            ..DdlOptions::default()
        };
        assert_eq!(
            schema_json_to_sql(schema, &options).unwrap(),
            "CREATE TABLE t(id INTEGER, PRIMARY KEY (id));"
        );
        assert!(matches!(
            schema_json_to_sql("[", &options),
            Err(ApiError::Schema(_))
        ));
    }
}
