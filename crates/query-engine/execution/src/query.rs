//! Execute an execution plan against the database.
//!
//! Every statement runs inside its own transaction which is read only and carries a
//! transaction-scoped `statement_timeout`. The transaction is committed when the statement
//! succeeds and rolled back otherwise.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, Postgres};
use sqlx::query::QueryScalar;
use sqlx::{Column, Executor, Statement, Transaction};
use tracing::{info_span, Instrument};

use query_engine_sql::sql;
use query_engine_sql::sql::string::Param;

use crate::error::Error;
use crate::metrics;

/// The rows a query returned, one JSON object per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub column_names: Vec<String>,
    pub row_count: usize,
    pub rows: Vec<Value>,
}

/// Execute a query against postgres.
pub async fn execute(
    pool: &PgPool,
    metrics: &metrics::Metrics,
    plan: &sql::execution_plan::ExecutionPlan,
    timeout: Duration,
) -> Result<QueryResult, Error> {
    let query = plan.query_sql();

    tracing::info!(
        resource = %plan.root_resource,
        generated_sql = query.sql(),
        params = ?query.params(),
        "executing query"
    );

    let result = async {
        let mut transaction = begin_read_only(pool, timeout).await?;
        let result = fetch_rows(&mut transaction, &query)
            .instrument(info_span!("Database request"))
            .await;
        finish(transaction, result).await
    }
    .await;

    match &result {
        Ok(rows) => tracing::info!(row_count = rows.row_count, "query succeeded"),
        Err(err) => {
            tracing::error!("{}", err);
            metrics.execution_failure_total.inc();
        }
    }
    result
}

/// Explain a query against postgres: the formatted statement and the database's query plan.
pub async fn explain(
    pool: &PgPool,
    metrics: &metrics::Metrics,
    plan: &sql::execution_plan::ExecutionPlan,
    timeout: Duration,
) -> Result<(String, String), Error> {
    let query = plan.query_sql();
    let explain_query = plan.explain_query_sql();

    tracing::info!(
        resource = %plan.root_resource,
        generated_sql = explain_query.sql(),
        params = ?explain_query.params(),
        "explaining query"
    );

    let result = async {
        let mut transaction = begin_read_only(pool, timeout).await?;
        let result = fetch_plan(&mut transaction, &explain_query)
            .instrument(info_span!("Database request"))
            .await;
        finish(transaction, result).await
    }
    .await;

    match result {
        Ok(lines) => {
            let pretty = sqlformat::format(
                query.sql(),
                &sqlformat::QueryParams::None,
                sqlformat::FormatOptions::default(),
            );
            Ok((pretty, lines.join("\n")))
        }
        Err(err) => {
            tracing::error!("{}", err);
            metrics.execution_failure_total.inc();
            Err(err)
        }
    }
}

/// Open a transaction, make it read only and bound its statements by the timeout.
async fn begin_read_only(
    pool: &PgPool,
    timeout: Duration,
) -> Result<Transaction<'static, Postgres>, Error> {
    let mut transaction = pool
        .begin()
        .instrument(info_span!("Acquire connection"))
        .await?;

    let configured = async {
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *transaction)
            .await?;
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(timeout.as_millis().to_string())
            .execute(&mut *transaction)
            .await?;
        Ok::<(), sqlx::Error>(())
    }
    .instrument(info_span!("Configure transaction"))
    .await;

    match configured {
        Ok(()) => Ok(transaction),
        Err(err) => {
            rollback(transaction).await;
            Err(err.into())
        }
    }
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    transaction: Transaction<'static, Postgres>,
    result: Result<T, Error>,
) -> Result<T, Error> {
    match result {
        Ok(value) => {
            transaction.commit().await?;
            Ok(value)
        }
        Err(err) => {
            rollback(transaction).await;
            Err(err)
        }
    }
}

async fn rollback(transaction: Transaction<'static, Postgres>) {
    if let Err(err) = transaction.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}

/// Run the statement and collect every row as a JSON object.
async fn fetch_rows(
    connection: &mut PgConnection,
    query: &sql::string::SQL,
) -> Result<QueryResult, Error> {
    // column names come from describing the statement so they survive an empty result
    let statement = (&mut *connection).prepare(query.sql()).await?;
    let column_names =
        unique_column_names(statement.columns().iter().map(|column| column.name()));

    let wrapped = rows_as_objects(query.sql(), &column_names);
    let rows: Vec<Value> = bind_params(sqlx::query_scalar(&wrapped), query.params())
        .fetch_all(&mut *connection)
        .await?;

    Ok(QueryResult {
        column_names,
        row_count: rows.len(),
        rows,
    })
}

/// Rename repeated column names so every column gets its own key in the row objects. The first
/// occurrence keeps its name, later ones get `_2`, `_3` and so on.
fn unique_column_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .map(|name| {
            let mut unique = name.to_string();
            let mut suffix = 1;
            while taken.contains(&unique) {
                suffix += 1;
                unique = format!("{name}_{suffix}");
            }
            taken.insert(unique.clone());
            unique
        })
        .collect()
}

/// Wrap a statement so each row comes back as one JSON object keyed by `column_names`.
fn rows_as_objects(statement: &str, column_names: &[String]) -> String {
    let columns = column_names
        .iter()
        .map(|name| format!("\"{}\"", name.replace('"', "\"\"")))
        .collect::<Vec<_>>();
    if columns.is_empty() {
        format!("SELECT row_to_json(\"rows\") FROM ({statement}) AS \"rows\"")
    } else {
        format!(
            "SELECT row_to_json(\"rows\") FROM ({statement}) AS \"rows\"({})",
            columns.join(", ")
        )
    }
}

/// Run an `EXPLAIN` statement and collect the lines of the plan.
async fn fetch_plan(
    connection: &mut PgConnection,
    query: &sql::string::SQL,
) -> Result<Vec<String>, Error> {
    let lines: Vec<String> = bind_params(sqlx::query_scalar(query.sql()), query.params())
        .fetch_all(&mut *connection)
        .await?;
    Ok(lines)
}

/// Bind every parameter as text. The statement casts each one to its column type.
fn bind_params<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[Param],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for Param(value) in params {
        query = match value {
            Value::Array(values) => query.bind(values.iter().map(as_text).collect::<Vec<_>>()),
            value => query.bind(as_text(value)),
        };
    }
    query
}

/// The text form of a parameter value. `null` stays NULL.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(string) => Some(string.clone()),
        other => Some(other.to_string()),
    }
}
