//! Schema description to `CREATE TABLE` statements.
//!
//! Identifiers, types, defaults and check conditions are emitted verbatim. Nothing is
//! escaped or validated, so the output must not be built from untrusted input.

use crate::schema::{Field, ForeignKey, Table, Tables};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One clause per line.
    #[default]
    Multiline,
    /// Whole statement on one line.
    Compact,
}

impl Layout {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "multiline" => Some(Self::Multiline),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlOptions {
    pub layout: Layout,
    /// Emit `CREATE TABLE IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Pad column names so types line up (multiline layout only).
    pub align_columns: bool,
}

/// Render one `CREATE TABLE` statement per table, in map order.
pub fn to_sql(tables: &Tables) -> String {
    to_sql_with(tables, &DdlOptions::default())
}

pub fn to_sql_with(tables: &Tables, options: &DdlOptions) -> String {
    let separator = match options.layout {
        Layout::Multiline => "\n\n",
        Layout::Compact => "\n",
    };

    tables
        .values()
        .map(|table| create_table(table, options))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Render a single table.
pub fn create_table(table: &Table, options: &DdlOptions) -> String {
    debug!(table = %table.name, fields = table.fields.len(), "create table");

    let name_width = match options.layout {
        Layout::Multiline if options.align_columns => table
            .fields
            .iter()
            .map(|f| f.name.width())
            .max()
            .unwrap_or(0),
        _ => 0,
    };

    // Fresh per table so keys never leak into the next statement.
    let mut keys = TableKeys::default();
    let mut clauses = Vec::with_capacity(table.fields.len() + 3);
    for field in &table.fields {
        clauses.push(column_clause(field, name_width));
        keys.record(field);
    }
    clauses.extend(keys.into_clauses());

    let head = if options.if_not_exists {
        "CREATE TABLE IF NOT EXISTS"
    } else {
        "CREATE TABLE"
    };

    if clauses.is_empty() {
        return format!("{} {}();", head, table.name);
    }

    match options.layout {
        Layout::Multiline => format!(
            "{} {}(\n{}{}\n);",
            head,
            table.name,
            INDENT,
            clauses.join(format!(",\n{}", INDENT).as_str())
        ),
        Layout::Compact => format!("{} {}({});", head, table.name, clauses.join(", ")),
    }
}

fn column_clause(field: &Field, name_width: usize) -> String {
    let mut clause = field.name.clone();
    if !field.typ.is_empty() {
        let pad = name_width.saturating_sub(field.name.width());
        clause.extend(std::iter::repeat_n(' ', pad));
        clause.push(' ');
        clause.push_str(&field.typ);
    }

    if field.not_null {
        clause.push_str(" NOT NULL");
    }
    if let Some(default) = &field.default_value {
        let default = default.to_string();
        if !default.is_empty() {
            clause.push_str(" DEFAULT ");
            clause.push_str(&default);
        }
    }
    if let Some(condition) = &field.check_condition {
        clause.push_str(&format!(" CHECK ({}{})", field.name, condition));
    }

    clause
}

/// Table-level constraints collected while walking the fields.
///
/// Only one primary key and one foreign key are kept; the last marked field wins.
#[derive(Default)]
struct TableKeys<'a> {
    primary: Option<&'a str>,
    foreign: Option<(&'a str, &'a ForeignKey)>,
    unique: Vec<&'a str>,
}

impl<'a> TableKeys<'a> {
    fn record(&mut self, field: &'a Field) {
        if field.primary_key {
            self.primary = Some(field.name.as_str());
        }
        if let Some(fk) = &field.foreign_key {
            self.foreign = Some((field.name.as_str(), fk));
        }
        if field.unique {
            self.unique.push(&field.name);
        }
    }

    fn into_clauses(self) -> Vec<String> {
        let mut clauses = Vec::new();
        if let Some(name) = self.primary {
            clauses.push(format!("PRIMARY KEY ({})", name));
        }
        if let Some((name, fk)) = self.foreign {
            clauses.push(format!(
                "FOREIGN KEY ({}) REFERENCES {}({})",
                name, fk.table_name, fk.field_name
            ));
        }
        if !self.unique.is_empty() {
            clauses.push(format!("UNIQUE ({})", self.unique.join(", ")));
        }
        clauses
    }
}
