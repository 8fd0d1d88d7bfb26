//! Handle sorting.

use query_engine_sql::sql;

use crate::translation::helpers::Env;
use crate::translation::validation::{Direction, FieldRef, Operator};

/// The field that is sorted on when a plan filters on it with a lower bound and sorts on nothing.
const DISCOUNT_FIELD: &str = "discount";

/// Convert the sort keys of the plan to an ORDER BY clause.
pub fn translate_order_by(env: &Env) -> sql::ast::OrderBy {
    let sort = env.plan.sort();
    if !sort.is_empty() {
        return sql::ast::OrderBy {
            elements: sort
                .iter()
                .map(|key| sql::ast::OrderByElement {
                    target: env.column(&key.field),
                    direction: translate_direction(key.direction),
                })
                .collect(),
        };
    }

    if filters_on_minimum_discount(env) {
        return sql::ast::OrderBy {
            elements: vec![sql::ast::OrderByElement {
                target: env.column(&FieldRef::parse(DISCOUNT_FIELD)),
                direction: sql::ast::OrderByDirection::Desc,
            }],
        };
    }

    sql::helpers::empty_order_by()
}

fn filters_on_minimum_discount(env: &Env) -> bool {
    env.base.has_field(DISCOUNT_FIELD)
        && env.plan.filters().iter().any(|predicate| {
            predicate.field.field() == DISCOUNT_FIELD
                && matches!(predicate.operator, Operator::Gt | Operator::Gte)
        })
}

fn translate_direction(direction: Direction) -> sql::ast::OrderByDirection {
    match direction {
        Direction::Asc => sql::ast::OrderByDirection::Asc,
        Direction::Desc => sql::ast::OrderByDirection::Desc,
    }
}
