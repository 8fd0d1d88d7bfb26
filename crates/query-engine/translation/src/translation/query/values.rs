//! Handle the values a plan compares fields against. Values are always bound as parameters.

use query_engine_metadata::metadata::FieldType;
use query_engine_sql::sql;
use serde_json::Value;

/// The database type a field of a given semantic type is compared as.
pub fn scalar_type_name(field_type: FieldType) -> sql::ast::ScalarTypeName {
    match field_type {
        FieldType::Text => sql::ast::ScalarTypeName::Text,
        FieldType::Number => sql::ast::ScalarTypeName::Numeric,
        FieldType::Boolean => sql::ast::ScalarTypeName::Boolean,
        FieldType::Timestamp => sql::ast::ScalarTypeName::Timestamptz,
        FieldType::Identifier => sql::ast::ScalarTypeName::Uuid,
    }
}

/// A parameter cast to the type of the field it is compared with.
pub fn translate_scalar(value: Value, field_type: FieldType) -> sql::ast::Expression {
    sql::helpers::cast(
        sql::helpers::make_param(value),
        sql::ast::ScalarType::BaseType(scalar_type_name(field_type)),
    )
}

/// A single array parameter cast to an array of the field's type.
/// A value that is not an array becomes a one-element array.
pub fn translate_array(value: Value, field_type: FieldType) -> sql::ast::Expression {
    let values = match value {
        Value::Array(values) => values,
        other => vec![other],
    };
    sql::helpers::cast(
        sql::helpers::make_param(Value::Array(values)),
        sql::ast::ScalarType::ArrayType(scalar_type_name(field_type)),
    )
}

/// The two bounds of a range. Anything but a pair yields two nulls, which match nothing.
pub fn range_bounds(value: Value) -> (Value, Value) {
    match value {
        Value::Array(bounds) => match <[Value; 2]>::try_from(bounds) {
            Ok([low, high]) => (low, high),
            Err(_) => (Value::Null, Value::Null),
        },
        _ => (Value::Null, Value::Null),
    }
}

/// A case-insensitive pattern parameter. The value is used as text.
pub fn translate_pattern(value: &Value, prefix: &str, suffix: &str) -> sql::ast::Expression {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    sql::helpers::make_param(Value::String(format!("{prefix}{text}{suffix}")))
}
