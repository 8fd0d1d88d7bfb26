//! Handle the select list.

use query_engine_sql::sql;

use crate::translation::helpers::Env;

/// One column per selected field, in plan order.
pub fn translate_fields(env: &Env) -> Vec<sql::ast::Expression> {
    env.plan
        .select()
        .iter()
        .map(|field| env.column(field))
        .collect()
}
