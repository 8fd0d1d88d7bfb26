//! Check a raw plan against the contract.
//!
//! Unresolvable resources and empty selections are rejected. Everything else that does not fit
//! the contract is dropped or clamped, since plans come from a best-effort interpreter.

use query_engine_metadata::metadata::{JoinKind, ResourceInfo};
use serde::{Serialize, Serializer};

use super::error::Error;
use super::helpers::Catalog;
use super::plan::RawPlan;

/// Only the first join requests of a plan are considered.
pub const MAX_JOINS: usize = 2;
/// Limit used when the plan has none or an unusable one.
pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 30;

/// A plan in which every reference resolves inside the contract.
///
/// Only [`validate`] can construct one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPlan {
    resource: String,
    joins: Vec<ValidatedJoin>,
    select: Vec<FieldRef>,
    #[serde(rename = "where")]
    filters: Vec<Predicate>,
    sort: Vec<SortKey>,
    limit: u32,
}

impl ValidatedPlan {
    /// Canonical name of the base resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn joins(&self) -> &[ValidatedJoin] {
        &self.joins
    }

    pub fn select(&self) -> &[FieldRef] {
        &self.select
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// A join taken from a relation of the base resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedJoin {
    /// The relation name, which is also how fields of the target are qualified.
    pub relation: String,
    pub alias: String,
    pub kind: JoinKind,
    pub local_field: String,
    pub target_resource: String,
    pub target_field: String,
}

/// A field reference, either `field` on the base resource or `Relation.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    relation: Option<String>,
    field: String,
}

impl FieldRef {
    /// Exactly one dot makes a qualified reference. Anything else is a plain field name.
    pub fn parse(reference: &str) -> FieldRef {
        match reference.split('.').collect::<Vec<_>>().as_slice() {
            [relation, field] => FieldRef {
                relation: Some((*relation).to_string()).filter(|relation| !relation.is_empty()),
                field: (*field).to_string(),
            },
            _ => FieldRef {
                relation: None,
                field: reference.to_string(),
            },
        }
    }

    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.relation {
            None => write!(f, "{}", self.field),
            Some(relation) => write!(f, "{}.{}", relation, self.field),
        }
    }
}

impl Serialize for FieldRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Comparison operators a predicate can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    StartsWith,
    Between,
    In,
}

impl Operator {
    /// Map the spellings a planner uses to an operator. Anything unknown is equality.
    pub fn normalize(op: &str) -> Operator {
        match op.to_lowercase().as_str() {
            "gt" | ">" => Operator::Gt,
            "lt" | "<" => Operator::Lt,
            "gte" | ">=" => Operator::Gte,
            "lte" | "<=" => Operator::Lte,
            "contains" => Operator::Contains,
            "startswith" | "starts_with" | "^" => Operator::StartsWith,
            "between" => Operator::Between,
            "in" => Operator::In,
            _ => Operator::Eq,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub field: FieldRef,
    #[serde(rename = "op")]
    pub operator: Operator,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(direction: Option<&str>) -> Direction {
        match direction.map(|dir| dir.trim().to_lowercase()).as_deref() {
            Some("desc" | "descending") => Direction::Desc,
            _ => Direction::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: FieldRef,
    #[serde(rename = "dir")]
    pub direction: Direction,
}

/// Validate a raw plan against the contract.
pub fn validate(catalog: &Catalog, plan: &RawPlan) -> Result<ValidatedPlan, Error> {
    let (resource, base) = catalog.resolve_resource(&plan.resource)?;

    let joins = validate_joins(catalog, base, plan);

    let is_valid = |field: &FieldRef| match field.relation() {
        None => base.has_field(field.field()),
        Some(relation) => joins
            .iter()
            .find(|join| join.relation == relation)
            .and_then(|join| catalog.contract().resource_by_name(&join.target_resource))
            .is_some_and(|target| target.has_field(field.field())),
    };

    let select = match &plan.select {
        Some(requested) => keep_valid(requested.iter().map(|f| FieldRef::parse(f)), &is_valid),
        None => keep_valid(base.default_select.iter().map(|f| FieldRef::parse(f)), &is_valid),
    };
    if select.is_empty() {
        return Err(Error::EmptySelection);
    }

    let filters = plan
        .filters
        .iter()
        .filter_map(|predicate| {
            let field = FieldRef::parse(&predicate.field);
            if is_valid(&field) {
                Some(Predicate {
                    field,
                    operator: Operator::normalize(&predicate.op),
                    value: predicate.value.clone(),
                })
            } else {
                tracing::warn!(field = %predicate.field, "dropping filter on unknown field");
                None
            }
        })
        .collect();

    let sort = plan
        .sort
        .iter()
        .filter_map(|key| {
            let field = FieldRef::parse(&key.field);
            if is_valid(&field) {
                Some(SortKey {
                    field,
                    direction: Direction::parse(key.direction.as_deref()),
                })
            } else {
                tracing::warn!(field = %key.field, "dropping sort key on unknown field");
                None
            }
        })
        .collect();

    Ok(ValidatedPlan {
        resource: resource.to_string(),
        joins,
        select,
        filters,
        sort,
        limit: clamp_limit(plan.limit.as_ref()),
    })
}

/// Accept join requests naming a relation declared on the base resource.
fn validate_joins(catalog: &Catalog, base: &ResourceInfo, plan: &RawPlan) -> Vec<ValidatedJoin> {
    let mut joins: Vec<ValidatedJoin> = vec![];
    for request in plan.joins.iter().take(MAX_JOINS) {
        let Some(name) = &request.resource else {
            continue;
        };
        let Some(relation) = base.relations.get(name) else {
            tracing::warn!(relation = %name, "dropping join on undeclared relation");
            continue;
        };
        if catalog
            .contract()
            .resource_by_name(&relation.target_resource)
            .is_none()
        {
            tracing::warn!(
                relation = %name,
                target = %relation.target_resource,
                "dropping join to unknown resource"
            );
            continue;
        }
        if joins.iter().any(|join| &join.relation == name) {
            continue;
        }
        joins.push(ValidatedJoin {
            relation: name.clone(),
            alias: relation.alias.clone(),
            kind: relation.kind,
            local_field: relation.local_field.clone(),
            target_resource: relation.target_resource.clone(),
            target_field: relation.target_field.clone(),
        });
    }
    if plan.joins.len() > MAX_JOINS {
        tracing::warn!(
            requested = plan.joins.len(),
            "ignoring join requests beyond the first {}",
            MAX_JOINS
        );
    }
    joins
}

fn keep_valid(
    fields: impl Iterator<Item = FieldRef>,
    is_valid: &impl Fn(&FieldRef) -> bool,
) -> Vec<FieldRef> {
    fields
        .filter(|field| {
            let valid = is_valid(field);
            if !valid {
                tracing::warn!(field = %field, "dropping unknown field from selection");
            }
            valid
        })
        .collect()
}

/// Clamp a requested limit to `1..=30`, rounding fractions up. Unusable values become 5.
pub fn clamp_limit(limit: Option<&serde_json::Value>) -> u32 {
    let requested = match limit {
        Some(serde_json::Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(serde_json::Value::String(text)) => number_from_text(text),
        Some(serde_json::Value::Bool(flag)) => f64::from(u8::from(*flag)),
        Some(serde_json::Value::Object(_)) => f64::NAN,
        Some(serde_json::Value::Array(items)) => number_from_list(items),
        Some(serde_json::Value::Null) | None => 0.0,
    };

    if !requested.is_finite() || requested <= 0.0 {
        DEFAULT_LIMIT
    } else if requested > f64::from(MAX_LIMIT) {
        MAX_LIMIT
    } else {
        // within 0 < requested <= 30, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let limit = requested.ceil() as u32;
        limit
    }
}

/// Blank text counts as zero, anything unparseable as NaN.
fn number_from_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        0.0
    } else {
        text.parse::<f64>().unwrap_or(f64::NAN)
    }
}

/// A list is read through its comma-joined text, so only an empty or single-item list is a
/// number.
fn number_from_list(items: &[serde_json::Value]) -> f64 {
    match items {
        [] => 0.0,
        [item] => match item {
            serde_json::Value::Null => 0.0,
            serde_json::Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
            serde_json::Value::String(text) => number_from_text(text),
            serde_json::Value::Array(inner) => number_from_list(inner),
            serde_json::Value::Bool(_) | serde_json::Value::Object(_) => f64::NAN,
        },
        _ => f64::NAN,
    }
}
