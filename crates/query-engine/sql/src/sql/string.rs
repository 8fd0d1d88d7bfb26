//! Type definitions of a low-level SQL string representation.
//!
//! Text can only enter a statement in three ways: syntax fixed at compile time,
//! identifiers (always quoted), and integers. Everything else is a [`Param`] and
//! is bound by the database driver.

use serde::Serialize;

/// A parameterized SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SQL {
    #[serde(rename = "statement")]
    sql: String,
    #[serde(rename = "parameters")]
    params: Vec<Param>,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Param(pub serde_json::Value);

impl SQL {
    pub fn new() -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
        }
    }

    /// The statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The parameters, in `$1, $2, ...` order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Param>) {
        (self.sql, self.params)
    }

    pub fn append_syntax(&mut self, sql: &'static str) {
        self.sql.push_str(sql);
    }

    /// Append a double-quoted identifier. Embedded quotes are doubled.
    pub fn append_identifier(&mut self, identifier: &str) {
        self.sql.push('"');
        self.sql.push_str(&identifier.replace('"', "\"\""));
        self.sql.push('"');
    }

    pub fn append_integer(&mut self, value: u32) {
        self.sql.push_str(&value.to_string());
    }

    /// Append a `$n` placeholder and record the parameter it stands for.
    pub fn append_param(&mut self, param: Param) {
        self.params.push(param);
        self.sql.push('$');
        self.sql.push_str(&self.params.len().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_cannot_escape_their_quotes() {
        let mut sql = SQL::new();
        sql.append_identifier("products\"; DROP TABLE x; --");
        assert_eq!(sql.sql(), "\"products\"\"; DROP TABLE x; --\"");
    }

    #[test]
    fn params_are_numbered_from_one() {
        let mut sql = SQL::new();
        sql.append_param(Param(serde_json::json!("a")));
        sql.append_syntax(", ");
        sql.append_param(Param(serde_json::json!(2)));
        assert_eq!(sql.sql(), "$1, $2");
        assert_eq!(
            sql.params(),
            &[Param(serde_json::json!("a")), Param(serde_json::json!(2))]
        );
    }

    #[test]
    fn serializes_as_statement_and_parameters() {
        let mut sql = SQL::new();
        sql.append_syntax("LIMIT ");
        sql.append_integer(5);
        assert_eq!(
            serde_json::to_value(&sql).unwrap(),
            serde_json::json!({ "statement": "LIMIT 5", "parameters": [] })
        );
    }
}
