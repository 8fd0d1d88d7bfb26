//! The untrusted plan produced by the upstream planner.
//!
//! Every field is optional and type-checked on entry. Anything that does not have the expected
//! shape is either dropped or kept as text so that validation can reject it later.

use serde_json::{Map, Value};

use super::error::Error;

/// A query plan as received. Nothing in it has been checked against the contract.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPlan {
    /// Free-text resource name.
    pub resource: String,
    /// Join requests in request order.
    pub joins: Vec<RawJoin>,
    /// Requested fields. `None` when the plan did not supply a non-empty list.
    pub select: Option<Vec<String>>,
    pub filters: Vec<RawPredicate>,
    pub sort: Vec<RawSortKey>,
    pub limit: Option<Value>,
}

/// A join request. Aliases and join kinds supplied by the planner are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJoin {
    pub resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPredicate {
    pub field: String,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSortKey {
    pub field: String,
    pub direction: Option<String>,
}

impl TryFrom<Value> for RawPlan {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(RawPlan::from_object(&object)),
            other => Err(Error::InvalidPlan(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl RawPlan {
    fn from_object(object: &Map<String, Value>) -> RawPlan {
        let joins = list(object.get("joins"))
            .iter()
            .map(|join| RawJoin {
                resource: join
                    .get("resource")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            })
            .collect();

        let select = match object.get("select") {
            Some(Value::Array(fields)) if !fields.is_empty() => {
                Some(fields.iter().map(text_of).collect())
            }
            _ => None,
        };

        let filters = list(object.get("where"))
            .iter()
            .filter_map(Value::as_object)
            .map(|predicate| RawPredicate {
                field: predicate.get("field").map(text_of).unwrap_or_default(),
                op: predicate
                    .get("op")
                    .filter(|op| !op.is_null())
                    .map(text_of)
                    .unwrap_or_else(|| "eq".to_string()),
                value: predicate.get("value").cloned().unwrap_or(Value::Null),
            })
            .collect();

        let sort = list(object.get("sort"))
            .iter()
            .filter_map(Value::as_object)
            .map(|key| RawSortKey {
                field: key.get("field").map(text_of).unwrap_or_default(),
                direction: key.get("dir").and_then(Value::as_str).map(str::to_string),
            })
            .collect();

        RawPlan {
            resource: object.get("resource").map(text_of).unwrap_or_default(),
            joins,
            select,
            filters,
            sort,
            limit: object.get("limit").cloned(),
        }
    }
}

/// What the upstream planner answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerResponse {
    /// A plan to validate and run.
    Query(RawPlan),
    /// The planner decided no database query applies and answered with a message instead.
    Message(String),
    /// Neither a plan nor a usable message.
    Unclear,
}

impl PlannerResponse {
    /// Classify the planner output. Only an object carrying a `resource` is a query.
    pub fn from_json(value: Value) -> Result<PlannerResponse, Error> {
        let has_resource = value.get("resource").is_some_and(is_truthy);
        if has_resource {
            return Ok(PlannerResponse::Query(RawPlan::try_from(value)?));
        }
        match value.get("message").and_then(Value::as_str).map(str::trim) {
            Some(message) if !message.is_empty() => Ok(PlannerResponse::Message(message.to_string())),
            _ => Ok(PlannerResponse::Unclear),
        }
    }

    /// Parse raw planner text. Text that is not JSON is unclear rather than an error.
    pub fn from_text(text: &str) -> Result<PlannerResponse, Error> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => PlannerResponse::from_json(value),
            Err(err) => {
                tracing::warn!("planner output is not JSON: {}", err);
                Ok(PlannerResponse::Unclear)
            }
        }
    }
}

fn list(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(values)) => values,
        _ => &[],
    }
}

/// Strings as they are, null as nothing, anything else as its JSON text.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_plan() {
        let plan = RawPlan::try_from(json!({
            "resource": "Product",
            "joins": [{"resource": "Category", "alias": "zz", "type": "left"}],
            "select": ["id", "Category.name"],
            "where": [{"field": "discount", "op": ">=", "value": 10}],
            "sort": [{"field": "discount", "dir": "desc"}],
            "limit": 7
        }))
        .unwrap();

        assert_eq!(plan.resource, "Product");
        assert_eq!(
            plan.joins,
            vec![RawJoin {
                resource: Some("Category".to_string())
            }]
        );
        assert_eq!(
            plan.select,
            Some(vec!["id".to_string(), "Category.name".to_string()])
        );
        assert_eq!(
            plan.filters,
            vec![RawPredicate {
                field: "discount".to_string(),
                op: ">=".to_string(),
                value: json!(10)
            }]
        );
        assert_eq!(
            plan.sort,
            vec![RawSortKey {
                field: "discount".to_string(),
                direction: Some("desc".to_string())
            }]
        );
        assert_eq!(plan.limit, Some(json!(7)));
    }

    #[test]
    fn tolerates_garbage_members() {
        let plan = RawPlan::try_from(json!({
            "resource": "Coupon",
            "joins": "Category",
            "select": [],
            "where": [null, "discount > 5", {"field": "code"}],
            "sort": {"field": "code"},
        }))
        .unwrap();

        assert!(plan.joins.is_empty());
        assert_eq!(plan.select, None);
        assert_eq!(
            plan.filters,
            vec![RawPredicate {
                field: "code".to_string(),
                op: "eq".to_string(),
                value: Value::Null
            }]
        );
        assert!(plan.sort.is_empty());
        assert_eq!(plan.limit, None);
    }

    #[test]
    fn join_requests_without_a_name_keep_their_position() {
        let plan = RawPlan::try_from(json!({
            "resource": "Product",
            "joins": [{}, {"resource": "FeedbackStat"}]
        }))
        .unwrap();
        assert_eq!(
            plan.joins,
            vec![
                RawJoin { resource: None },
                RawJoin {
                    resource: Some("FeedbackStat".to_string())
                }
            ]
        );
    }

    #[test]
    fn non_string_select_entries_are_kept_as_text() {
        let plan = RawPlan::try_from(json!({"resource": "Product", "select": [1, "id"]})).unwrap();
        assert_eq!(plan.select, Some(vec!["1".to_string(), "id".to_string()]));
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(
            RawPlan::try_from(json!(["Product"])),
            Err(Error::InvalidPlan(
                "expected a JSON object, got an array".to_string()
            ))
        );
    }

    #[test]
    fn classifies_planner_responses() {
        assert!(matches!(
            PlannerResponse::from_json(json!({"resource": "Product"})),
            Ok(PlannerResponse::Query(_))
        ));
        assert_eq!(
            PlannerResponse::from_json(json!({"message": "  Hello!  "})),
            Ok(PlannerResponse::Message("Hello!".to_string()))
        );
        assert_eq!(
            PlannerResponse::from_json(json!({"resource": "", "message": " "})),
            Ok(PlannerResponse::Unclear)
        );
        assert_eq!(
            PlannerResponse::from_text("not json at all"),
            Ok(PlannerResponse::Unclear)
        );
    }
}
