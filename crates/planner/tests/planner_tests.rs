//! Tests of the planner facade. Tests that need a database are ignored by default; run them with
//! `STOREFRONT_DATABASE_URL` pointing at a storefront database.

use serde_json::json;
use similar_asserts::assert_eq;

use query_engine_translation::translation::plan::PlannerResponse;
use storefront_planner::query::clarification_message;
use storefront_planner::Answer;
use tests_common::fixtures;

fn clarification() -> Answer {
    Answer::Clarification {
        message: clarification_message(&[
            "Product".to_string(),
            "Category".to_string(),
            "Coupon".to_string(),
            "FeedbackStat".to_string(),
        ]),
    }
}

#[tokio::test]
async fn chat_messages_pass_through() {
    let planner = fixtures::lazy_planner();
    let answer = planner
        .answer(r#"{"message": "Hello! How can I help?"}"#)
        .await
        .unwrap();
    assert_eq!(
        answer,
        Answer::Chat {
            message: "Hello! How can I help?".to_string()
        }
    );
}

#[tokio::test]
async fn text_that_is_not_json_asks_for_clarification() {
    let planner = fixtures::lazy_planner();
    let answer = planner.answer("SELECT * FROM users").await.unwrap();
    assert_eq!(answer, clarification());
}

#[tokio::test]
async fn objects_without_resource_or_message_ask_for_clarification() {
    let planner = fixtures::lazy_planner();
    let answer = planner.answer(r#"{"select": ["id"]}"#).await.unwrap();
    assert_eq!(answer, clarification());
}

#[tokio::test]
async fn unknown_resources_ask_for_clarification() {
    let planner = fixtures::lazy_planner();
    let response = PlannerResponse::from_json(json!({"resource": "orders"})).unwrap();

    let answer = planner.query(response).await.unwrap();

    assert_eq!(answer, clarification());
    assert_eq!(planner.state().metrics.rejected_plan_total.get(), 1);
    assert_eq!(planner.state().metrics.query_total.get(), 0);
}

#[tokio::test]
async fn empty_selections_ask_for_clarification() {
    let planner = fixtures::lazy_planner();
    let response =
        PlannerResponse::from_json(json!({"resource": "Coupon", "select": ["password"]})).unwrap();

    let answer = planner.query(response).await.unwrap();

    assert_eq!(answer, clarification());
    assert_eq!(planner.state().metrics.rejected_plan_total.get(), 1);
}

#[tokio::test]
async fn explaining_an_unknown_resource_is_an_invalid_request() {
    let planner = fixtures::lazy_planner();
    let result = planner.explain(json!({"resource": "users"})).await;
    assert!(matches!(
        result,
        Err(storefront_planner::explain::ExplainError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn compiles_without_a_database() {
    let planner = fixtures::lazy_planner();
    let compiled = planner
        .compile(json!({
            "resource": "voucher",
            "where": [{"field": "expired", "op": "eq", "value": false}],
            "sort": [{"field": "discount", "dir": "desc"}],
            "limit": "3"
        }))
        .unwrap();

    let sql = compiled.execution_plan.query_sql();
    assert_eq!(
        sql.sql(),
        r#"SELECT "t"."code", "t"."discount", "t"."expiration_date" FROM "coupons" AS "t" WHERE ("t"."expired" = CAST($1 AS boolean)) ORDER BY "t"."discount" DESC LIMIT 3"#
    );
    assert_eq!(compiled.plan.resource(), "Coupon");
}

#[tokio::test]
async fn describes_the_storefront_contract() {
    let planner = fixtures::lazy_planner();
    let description = planner.describe();

    for line in [
        "RESOURCE Product -> products",
        "RESOURCE Category -> categories",
        "RESOURCE Coupon -> coupons",
        "RESOURCE FeedbackStat -> v_feedback_stats",
        "  - Category (inner): Product.category_id = Category.id",
        "  - FeedbackStat (left): Product.id = FeedbackStat.product_id",
    ] {
        assert!(description.contains(line), "missing {line:?} in\n{description}");
    }
    assert!(description.ends_with("Answer with a JSON query plan. Never write SQL.\n"));
}

#[tokio::test]
async fn clarifications_serialize_with_their_mode() {
    let value = serde_json::to_value(clarification()).unwrap();
    assert_eq!(value["mode"], json!("clarification"));
}

#[tokio::test]
#[ignore]
async fn health_check_reaches_the_database() {
    let planner = fixtures::connected_planner().await;
    planner.health_check().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn runs_a_validated_plan() {
    let planner = fixtures::connected_planner().await;
    let answer = planner
        .answer(
            &json!({
                "resource": "Product",
                "where": [{"field": "discount", "op": "gte", "value": 10}]
            })
            .to_string(),
        )
        .await
        .unwrap();

    match answer {
        Answer::Data { sql, result, .. } => {
            assert!(sql.sql().contains(r#"ORDER BY "t"."discount" DESC"#));
            assert_eq!(
                result.column_names,
                ["id", "title", "sale_price", "discount"]
                    .map(str::to_string)
                    .to_vec()
            );
            assert!(result.row_count <= 5);
            assert_eq!(result.row_count, result.rows.len());
        }
        other => panic!("expected data, got {other:?}"),
    }
    assert_eq!(planner.state().metrics.query_total.get(), 1);
}

#[tokio::test]
#[ignore]
async fn explains_a_validated_plan() {
    let planner = fixtures::connected_planner().await;
    let response = planner
        .explain(json!({"resource": "Category", "sort": [{"field": "name"}]}))
        .await
        .unwrap();

    assert!(response.details["Execution Plan"].contains("Limit"));
    assert!(response.details["SQL Query"].contains("categories"));
    assert_eq!(planner.state().metrics.explain_total.get(), 1);
}

#[tokio::test]
#[ignore]
async fn same_named_fields_from_a_join_keep_their_values() {
    let planner = fixtures::connected_planner().await;
    let answer = planner
        .answer(
            &json!({
                "resource": "Product",
                "joins": [{"resource": "Category"}],
                "select": ["id", "created_at", "Category.created_at"]
            })
            .to_string(),
        )
        .await
        .unwrap();

    match answer {
        Answer::Data { result, .. } => {
            assert_eq!(
                result.column_names,
                ["id", "created_at", "created_at_2"]
                    .map(str::to_string)
                    .to_vec()
            );
            for row in &result.rows {
                let row = row.as_object().unwrap();
                assert_eq!(row.len(), 3);
                assert!(result.column_names.iter().all(|name| row.contains_key(name)));
            }
        }
        other => panic!("expected data, got {other:?}"),
    }
}
