//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::helpers;
use super::string::SQL;

/// Convert a SELECT to a parameterized statement.
pub fn select_to_sql(select: &Select) -> SQL {
    let mut sql = SQL::new();
    select.to_sql(&mut sql);
    sql
}

/// Convert an EXPLAIN of a SELECT to a parameterized statement.
pub fn explain_to_sql(explain: &Explain) -> SQL {
    let mut sql = SQL::new();
    explain.to_sql(&mut sql);
    sql
}

impl Explain<'_> {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("EXPLAIN ");
        match self {
            Explain::Select(select) => select.to_sql(sql),
        }
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        sql.append_syntax(" ");

        self.from.to_sql(sql);

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SelectList(columns) = self;
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                sql.append_syntax(", ");
            }
            column.to_sql(sql);
        }
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        self.table.to_sql(sql);
        sql.append_syntax(" AS ");
        self.alias.to_sql(sql);
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        let (table, alias, on) = match self {
            Join::InnerJoin(InnerJoin { table, alias, on }) => {
                sql.append_syntax(" INNER JOIN ");
                (table, alias, on)
            }
            Join::LeftOuterJoin(LeftOuterJoin { table, alias, on }) => {
                sql.append_syntax(" LEFT JOIN ");
                (table, alias, on)
            }
        };
        table.to_sql(sql);
        sql.append_syntax(" AS ");
        alias.to_sql(sql);
        sql.append_syntax(" ON ");
        on.to_sql(sql);
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Between {
                expression,
                low,
                high,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                sql.append_syntax(" BETWEEN ");
                low.to_sql(sql);
                sql.append_syntax(" AND ");
                high.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    arg.to_sql(sql);
                }
                sql.append_syntax(")");
            }
            Expression::Cast { expression, r#type } => {
                sql.append_syntax("CAST(");
                expression.to_sql(sql);
                sql.append_syntax(" AS ");
                r#type.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::GreaterThanOrEqualTo => sql.append_syntax(" >= "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
            BinaryOperator::LessThanOrEqualTo => sql.append_syntax(" <= "),
            BinaryOperator::CaseInsensitiveLike => sql.append_syntax(" ILIKE "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Any => sql.append_syntax("ANY"),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Bool(true) => sql.append_syntax("true"),
            Value::Bool(false) => sql.append_syntax("false"),
            Value::Parameter(param) => sql.append_param(param.clone()),
        }
    }
}

impl ScalarType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ScalarType::BaseType(name) => name.to_sql(sql),
            ScalarType::ArrayType(name) => {
                name.to_sql(sql);
                sql.append_syntax("[]");
            }
        }
    }
}

impl ScalarTypeName {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ScalarTypeName::Text => sql.append_syntax("text"),
            ScalarTypeName::Numeric => sql.append_syntax("numeric"),
            ScalarTypeName::Boolean => sql.append_syntax("boolean"),
            ScalarTypeName::Timestamptz => sql.append_syntax("timestamptz"),
            ScalarTypeName::Uuid => sql.append_syntax("uuid"),
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, order_by_item) in self.elements.iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(", ");
                }
                order_by_item.to_sql(sql);
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        if let Some(limit) = self.limit {
            sql.append_syntax(" LIMIT ");
            sql.append_integer(limit);
        }
    }
}

// names
impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let TableName(name) = self;
        sql.append_identifier(name);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.table.to_sql(sql);
        sql.append_syntax(".");
        let ColumnName(name) = &self.name;
        sql.append_identifier(name);
    }
}
