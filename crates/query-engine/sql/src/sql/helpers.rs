//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;
use super::string::Param;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    true_expr()
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// An empty `LIMIT` clause.
pub fn empty_limit() -> Limit {
    Limit { limit: None }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

// Aliasing //

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: String) -> TableAlias {
    TableAlias { name }
}

/// Generate a column expression refering to a specific aliased table.
pub fn make_column(table: TableAlias, name: String) -> Expression {
    Expression::ColumnReference(ColumnReference {
        table,
        name: ColumnName(name),
    })
}

// Expressions //

/// A bound parameter.
pub fn make_param(value: serde_json::Value) -> Expression {
    Expression::Value(Value::Parameter(Param(value)))
}

/// Cast an expression to a database type.
pub fn cast(expression: Expression, r#type: ScalarType) -> Expression {
    Expression::Cast {
        expression: Box::new(expression),
        r#type,
    }
}

/// Combine expressions with AND, left to right. No expressions means `true`.
pub fn conjunction(expressions: Vec<Expression>) -> Expression {
    expressions
        .into_iter()
        .reduce(|left, right| Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        })
        .unwrap_or_else(true_expr)
}

// SELECTs //

/// Build a simple select from a table with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<Expression>, from: From) -> Select {
    Select {
        select_list: SelectList(select_list),
        from,
        joins: vec![],
        where_: Where(empty_where()),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}
