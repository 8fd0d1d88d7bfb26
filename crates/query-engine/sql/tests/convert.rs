use query_engine_sql::sql::ast::*;
use query_engine_sql::sql::execution_plan::simple_exec_plan;
use query_engine_sql::sql::helpers;
use query_engine_sql::sql::string::Param;
use similar_asserts::assert_eq;

fn products() -> From {
    From {
        table: TableName("products".to_string()),
        alias: helpers::make_table_alias("t".to_string()),
    }
}

fn column(alias: &str, name: &str) -> Expression {
    helpers::make_column(
        helpers::make_table_alias(alias.to_string()),
        name.to_string(),
    )
}

#[test]
fn it_converts_simple_select() {
    let select = helpers::simple_select(vec![column("t", "id"), column("t", "title")], products());
    let plan = simple_exec_plan("Product".to_string(), select);

    let sql = plan.query_sql();
    assert_eq!(sql.sql(), r#"SELECT "t"."id", "t"."title" FROM "products" AS "t""#);
    assert!(sql.params().is_empty());
}

#[test]
fn it_converts_join_where_order_and_limit() {
    let mut select = helpers::simple_select(vec![column("t", "id"), column("c", "name")], products());
    select.joins.push(Join::InnerJoin(InnerJoin {
        table: TableName("categories".to_string()),
        alias: helpers::make_table_alias("c".to_string()),
        on: Expression::BinaryOperation {
            left: Box::new(column("t", "category_id")),
            operator: BinaryOperator::Equals,
            right: Box::new(column("c", "id")),
        },
    }));
    select.where_ = Where(helpers::conjunction(vec![
        Expression::BinaryOperation {
            left: Box::new(column("c", "name")),
            operator: BinaryOperator::CaseInsensitiveLike,
            right: Box::new(helpers::make_param(serde_json::json!("%giày%"))),
        },
        Expression::BinaryOperation {
            left: Box::new(column("t", "discount")),
            operator: BinaryOperator::GreaterThanOrEqualTo,
            right: Box::new(helpers::cast(
                helpers::make_param(serde_json::json!(30)),
                ScalarType::BaseType(ScalarTypeName::Numeric),
            )),
        },
    ]));
    select.order_by = OrderBy {
        elements: vec![OrderByElement {
            target: column("t", "discount"),
            direction: OrderByDirection::Desc,
        }],
    };
    select.limit = Limit { limit: Some(5) };

    let (statement, params) = simple_exec_plan("Product".to_string(), select)
        .query_sql()
        .into_parts();

    assert_eq!(
        statement,
        r#"SELECT "t"."id", "c"."name" FROM "products" AS "t" INNER JOIN "categories" AS "c" ON ("t"."category_id" = "c"."id") WHERE (("c"."name" ILIKE $1) AND ("t"."discount" >= CAST($2 AS numeric))) ORDER BY "t"."discount" DESC LIMIT 5"#
    );
    assert_eq!(
        params,
        vec![
            Param(serde_json::json!("%giày%")),
            Param(serde_json::json!(30))
        ]
    );
}

#[test]
fn it_converts_left_join_between_and_any() {
    let mut select = helpers::simple_select(vec![column("t", "id")], products());
    select.joins.push(Join::LeftOuterJoin(LeftOuterJoin {
        table: TableName("v_feedback_stats".to_string()),
        alias: helpers::make_table_alias("fs".to_string()),
        on: Expression::BinaryOperation {
            left: Box::new(column("t", "id")),
            operator: BinaryOperator::Equals,
            right: Box::new(column("fs", "product_id")),
        },
    }));
    select.where_ = Where(helpers::conjunction(vec![
        Expression::Between {
            expression: Box::new(column("t", "sale_price")),
            low: Box::new(helpers::make_param(serde_json::json!(100))),
            high: Box::new(helpers::make_param(serde_json::json!(200))),
        },
        Expression::BinaryOperation {
            left: Box::new(column("t", "id")),
            operator: BinaryOperator::Equals,
            right: Box::new(Expression::FunctionCall {
                function: Function::Any,
                args: vec![helpers::cast(
                    helpers::make_param(serde_json::json!(["a", "b"])),
                    ScalarType::ArrayType(ScalarTypeName::Text),
                )],
            }),
        },
    ]));

    let sql = simple_exec_plan("Product".to_string(), select).query_sql();
    assert_eq!(
        sql.sql(),
        r#"SELECT "t"."id" FROM "products" AS "t" LEFT JOIN "v_feedback_stats" AS "fs" ON ("t"."id" = "fs"."product_id") WHERE (("t"."sale_price" BETWEEN $1 AND $2) AND ("t"."id" = ANY(CAST($3 AS text[]))))"#
    );
    assert_eq!(sql.params().len(), 3);
}

#[test]
fn it_explains_the_query() {
    let select = helpers::simple_select(vec![column("t", "code")], products());
    let sql = simple_exec_plan("Coupon".to_string(), select).explain_query_sql();
    assert_eq!(
        sql.sql(),
        r#"EXPLAIN SELECT "t"."code" FROM "products" AS "t""#
    );
}

#[test]
fn empty_conjunction_omits_where() {
    let mut select = helpers::simple_select(vec![column("t", "id")], products());
    select.where_ = Where(helpers::conjunction(vec![]));
    let sql = simple_exec_plan("Product".to_string(), select).query_sql();
    assert_eq!(sql.sql(), r#"SELECT "t"."id" FROM "products" AS "t""#);
}
