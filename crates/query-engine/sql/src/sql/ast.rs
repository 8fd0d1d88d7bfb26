//! Type definitions of a SQL AST representation.
//!
//! Only read-only statements can be represented.

use super::string::Param;

/// An EXPLAIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Explain<'a> {
    Select(&'a Select),
}

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: From,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// A select list. Columns keep the names they have in their table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectList(pub Vec<Expression>);

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub struct From {
    pub table: TableName,
    pub alias: TableAlias,
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// INNER JOIN
    InnerJoin(InnerJoin),
    /// LEFT OUTER JOIN
    LeftOuterJoin(LeftOuterJoin),
}

impl Join {
    /// Get the table alias regardless of the join type.
    pub fn alias(&self) -> &TableAlias {
        match self {
            Join::InnerJoin(InnerJoin { alias, .. })
            | Join::LeftOuterJoin(LeftOuterJoin { alias, .. }) => alias,
        }
    }
}

/// An INNER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct InnerJoin {
    pub table: TableName,
    pub alias: TableAlias,
    pub on: Expression,
}

/// A LEFT OUTER JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct LeftOuterJoin {
    pub table: TableName,
    pub alias: TableAlias,
    pub on: Expression,
}

/// A WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Expression);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// A LIMIT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u32>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A BETWEEN range check, inclusive on both ends
    Between {
        expression: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    Cast {
        expression: Box<Expression>,
        r#type: ScalarType,
    },
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    CaseInsensitiveLike,
}

/// A scalar function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `ANY(array)`, used on the right of a comparison
    Any,
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// A value supplied by the caller. It never appears in the statement text.
    Parameter(Param),
}

/// Scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    BaseType(ScalarTypeName),
    ArrayType(ScalarTypeName),
}

/// The database types we cast parameters to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarTypeName {
    Text,
    Numeric,
    Boolean,
    Timestamptz,
    Uuid,
}

/// A database table or view name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column of an aliased table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    pub table: TableAlias,
    pub name: ColumnName,
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableAlias {
    pub name: String,
}
