//! Handle filtering.

use query_engine_metadata::metadata::FieldType;
use query_engine_sql::sql;

use super::values;
use crate::translation::helpers::Env;
use crate::translation::validation::{Operator, Predicate};

/// Translate every predicate of the plan and combine them with AND.
pub fn translate_filters(env: &Env) -> sql::ast::Expression {
    sql::helpers::conjunction(
        env.plan
            .filters()
            .iter()
            .map(|predicate| translate_predicate(env, predicate))
            .collect(),
    )
}

fn translate_predicate(env: &Env, predicate: &Predicate) -> sql::ast::Expression {
    let column = env.column(&predicate.field);
    let field_type = match env.lookup_field(&predicate.field) {
        Some(info) => info.r#type,
        None => {
            tracing::warn!(
                field = %predicate.field,
                "no type for filtered field, comparing as text"
            );
            FieldType::Text
        }
    };
    let value = predicate.value.clone();

    match predicate.operator {
        Operator::Eq => comparison(
            column,
            sql::ast::BinaryOperator::Equals,
            values::translate_scalar(value, field_type),
        ),
        Operator::Gt => comparison(
            column,
            sql::ast::BinaryOperator::GreaterThan,
            values::translate_scalar(value, field_type),
        ),
        Operator::Lt => comparison(
            column,
            sql::ast::BinaryOperator::LessThan,
            values::translate_scalar(value, field_type),
        ),
        Operator::Gte => comparison(
            column,
            sql::ast::BinaryOperator::GreaterThanOrEqualTo,
            values::translate_scalar(value, field_type),
        ),
        Operator::Lte => comparison(
            column,
            sql::ast::BinaryOperator::LessThanOrEqualTo,
            values::translate_scalar(value, field_type),
        ),
        Operator::Contains => comparison(
            column,
            sql::ast::BinaryOperator::CaseInsensitiveLike,
            values::translate_pattern(&value, "%", "%"),
        ),
        Operator::StartsWith => comparison(
            column,
            sql::ast::BinaryOperator::CaseInsensitiveLike,
            values::translate_pattern(&value, "", "%"),
        ),
        Operator::Between => {
            let (low, high) = values::range_bounds(value);
            sql::ast::Expression::Between {
                expression: Box::new(column),
                low: Box::new(values::translate_scalar(low, field_type)),
                high: Box::new(values::translate_scalar(high, field_type)),
            }
        }
        Operator::In => comparison(
            column,
            sql::ast::BinaryOperator::Equals,
            sql::ast::Expression::FunctionCall {
                function: sql::ast::Function::Any,
                args: vec![values::translate_array(value, field_type)],
            },
        ),
    }
}

fn comparison(
    left: sql::ast::Expression,
    operator: sql::ast::BinaryOperator,
    right: sql::ast::Expression,
) -> sql::ast::Expression {
    sql::ast::Expression::BinaryOperation {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}
