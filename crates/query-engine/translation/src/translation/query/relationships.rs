//! Handle joins along relations of the base resource.

use query_engine_metadata::metadata::JoinKind;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::Env;

/// Translate the accepted joins of the plan, in request order, registering each alias.
pub fn translate_joins(env: &mut Env) -> Result<Vec<sql::ast::Join>, Error> {
    let (catalog, plan) = (env.catalog, env.plan);
    let joins = plan.joins();
    let mut translated = Vec::with_capacity(joins.len());

    for join in joins {
        let target = catalog.lookup_resource(&join.target_resource)?;
        env.aliases.insert(&join.relation, &join.alias);

        let alias = sql::helpers::make_table_alias(join.alias.clone());
        let on = sql::ast::Expression::BinaryOperation {
            left: Box::new(sql::helpers::make_column(
                env.aliases.base_alias(),
                join.local_field.clone(),
            )),
            operator: sql::ast::BinaryOperator::Equals,
            right: Box::new(sql::helpers::make_column(
                alias.clone(),
                join.target_field.clone(),
            )),
        };
        let table = sql::ast::TableName(target.view.clone());

        translated.push(match join.kind {
            JoinKind::Inner => sql::ast::Join::InnerJoin(sql::ast::InnerJoin { table, alias, on }),
            JoinKind::Left => {
                sql::ast::Join::LeftOuterJoin(sql::ast::LeftOuterJoin { table, alias, on })
            }
        });
    }

    Ok(translated)
}
