//! Schema description consumed by the DDL generator.
//!
//! Every attribute is optional in JSON; anything missing means "feature absent".
//! Attribute values of the wrong type are read loosely instead of rejected: flags
//! follow JSON truthiness and unusable values count as absent.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Table definitions keyed by identifier, kept in input order.
pub type Tables = IndexMap<String, Table>;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON schema description.
pub fn from_json(input: &str) -> Result<Tables, SchemaError> {
    let tables: Tables = serde_json::from_str(input)?;
    tracing::debug!(tables = tables.len(), "schema loaded");
    Ok(tables)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "field_list")]
    pub fields: Vec<Field>,
}

impl Table {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    #[serde(deserialize_with = "text")]
    pub name: String,
    /// Raw SQL type token, emitted verbatim.
    #[serde(rename = "type", deserialize_with = "text")]
    pub typ: String,
    #[serde(deserialize_with = "truthy")]
    pub primary_key: bool,
    #[serde(deserialize_with = "truthy")]
    pub unique: bool,
    #[serde(deserialize_with = "truthy")]
    pub not_null: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "literal"
    )]
    pub default_value: Option<Literal>,
    /// Raw SQL appended directly after the field name inside `CHECK (...)`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub check_condition: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "foreign_key"
    )]
    pub foreign_key: Option<ForeignKey>,
}

impl Field {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            ..Self::default()
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Literal>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn check(mut self, condition: impl Into<String>) -> Self {
        self.check_condition = Some(condition.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table_name: table.into(),
            field_name: field.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForeignKey {
    #[serde(deserialize_with = "text")]
    pub table_name: String,
    #[serde(deserialize_with = "text")]
    pub field_name: String,
}

/// A default value. Text is emitted as-is, so string constants carry their own quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    /// The literal a JSON value stands for. Null, arrays and objects have none.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Literal::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(Literal::Integer)
                .or_else(|| n.as_f64().map(Literal::Float)),
            Value::String(s) => Some(Literal::Text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Integer(n)
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Float(x)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

/// Null, `false`, `0` and `""` are off; any other value is on.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Like [`text`], but empty text counts as absent.
fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
}

fn literal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Literal>, D::Error> {
    Ok(Literal::from_json(Value::deserialize(deserializer)?))
}

fn foreign_key<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ForeignKey>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => ForeignKey::deserialize(value).ok(),
        _ => None,
    })
}

/// Null reads as no fields. Entries that are not objects are skipped.
fn field_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Field>, D::Error> {
    let Some(items) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => Field::deserialize(item).ok(),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_json_full_field() {
        let input = r#"{
            "orders": {
                "name": "orders",
                "fields": [
                    {
                        "name": "user_id",
                        "type": "INTEGER",
                        "notNull": true,
                        "defaultValue": 0,
                        "checkCondition": " >= 0",
                        "foreignKey": { "tableName": "users", "fieldName": "id" }
                    }
                ]
            }
        }"#;
        let tables = from_json(input).unwrap();
        let field = &tables["orders"].fields[0];

        assert_eq!(
            *field,
            Field::new("user_id", "INTEGER")
                .not_null()
                .default_value(0i64)
                .check(" >= 0")
                .references("users", "id")
        );
    }

    #[test]
    fn test_from_json_missing_attributes_are_absent() {
        let tables = from_json(r#"{"t":{"name":"t","fields":[{"name":"a"}]}}"#).unwrap();
        let field = &tables["t"].fields[0];
        assert_eq!(*field, Field::new("a", ""));
        assert!(field.default_value.is_none());
    }

    #[test]
    fn test_from_json_keeps_table_order() {
        let tables = from_json(r#"{"b":{"name":"b"},"a":{"name":"a"},"c":{"name":"c"}}"#).unwrap();
        let names: Vec<&str> = tables.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_from_json_null_default_is_absent() {
        let tables =
            from_json(r#"{"t":{"name":"t","fields":[{"name":"a","defaultValue":null}]}}"#).unwrap();
        assert!(tables["t"].fields[0].default_value.is_none());
    }

    #[test]
    fn test_from_json_reads_flags_by_truthiness() {
        let input = r#"{"t":{"name":"t","fields":[
            {"name":"a","type":"INT","unique":null,"primaryKey":1,"notNull":"yes"},
            {"name":"b","type":"INT","unique":0,"primaryKey":"","notNull":false}
        ]}}"#;
        let tables = from_json(input).unwrap();
        let fields = &tables["t"].fields;
        assert_eq!(fields[0], Field::new("a", "INT").primary_key().not_null());
        assert_eq!(fields[1], Field::new("b", "INT"));
    }

    #[test]
    fn test_from_json_unusable_values_are_absent() {
        let input = r#"{"t":{"name":null,"fields":[{
            "name":"a",
            "type":null,
            "defaultValue":{"x":1},
            "checkCondition":"",
            "foreignKey":"users.id"
        }]}}"#;
        let tables = from_json(input).unwrap();
        assert_eq!(tables["t"], Table::new("", vec![Field::new("a", "")]));
    }

    #[test]
    fn test_from_json_loose_values() {
        let input = r#"{"t":{"name":7,"fields":null},"u":{"name":"u","fields":[
            5,
            {"name":"n","defaultValue":[1],"foreignKey":{"tableName":"t","fieldName":null}},
            {"name":"big","defaultValue":18446744073709551615}
        ]}}"#;
        let tables = from_json(input).unwrap();
        assert_eq!(tables["t"], Table::new("7", vec![]));

        let fields = &tables["u"].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], Field::new("n", "").references("t", ""));
        assert_eq!(fields[1].default_value, Some(Literal::Float(u64::MAX as f64)));
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(matches!(from_json("{"), Err(SchemaError::Json(_))));
        assert!(from_json(r#"{"t":{"fields":"nope"}}"#).is_err());
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::from(true).to_string(), "TRUE");
        assert_eq!(Literal::from(42i64).to_string(), "42");
        assert_eq!(Literal::from(1.5f64).to_string(), "1.5");
        assert_eq!(Literal::from("'active'").to_string(), "'active'");
        assert_eq!(Literal::from("CURRENT_TIMESTAMP").to_string(), "CURRENT_TIMESTAMP");
    }
}
