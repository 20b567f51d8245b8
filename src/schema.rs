//! Typed field schemas for entity kinds.
//!
//! Each kind declares its fields once. The remote store derives its request
//! field lists and default ordering from the schema, and checks every inbound
//! payload against it before typed decoding, so a malformed record surfaces as
//! a `ValidationError` naming the offending field.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Wire name of the identifier field shared by every kind.
pub const ID_FIELD: &str = "Id";

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string.
    Text,
    /// Non-negative integer.
    Count,
    /// Identifier of another record.
    Reference,
    /// Decimal amount encoded as a string, e.g. `"12.50"`.
    Amount,
    /// RFC 3339 timestamp.
    Timestamp,
    /// One of a fixed set of lowercase labels.
    Choice(&'static [&'static str]),
    /// Array of record identifiers.
    ReferenceList,
    /// Array of strings.
    TextList,
    /// Array of nested objects, each checked against the given fields.
    ObjectList(&'static [Field]),
}

/// One field of an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl Field {
    /// A field that must be present and non-null.
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Field {
            name,
            field_type,
            required: true,
        }
    }

    /// A field that may be absent or null.
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Field {
            name,
            field_type,
            required: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Default ordering requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: SortDirection,
}

/// Field list and default ordering of one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Entity kind as named by the record store.
    pub kind: &'static str,
    pub fields: &'static [Field],
    pub order_by: OrderBy,
}

impl Schema {
    /// Look up a field by wire name.
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names to request from the store, identifier first.
    pub fn field_names(&self) -> Vec<&'static str> {
        std::iter::once(ID_FIELD)
            .chain(self.fields.iter().map(|f| f.name))
            .collect()
    }

    /// Check a stored record payload: identifier plus every declared field.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` naming the first offending field.
    pub fn check_record(&self, value: &Value) -> Result<()> {
        let object = value.as_object().ok_or_else(|| {
            Error::ValidationError(format!("{}: record payload is not an object", self.kind))
        })?;

        match object.get(ID_FIELD) {
            Some(id) if id.as_i64().is_some() => {}
            _ => {
                return Err(Error::ValidationError(format!(
                    "{}: missing or invalid field '{}'",
                    self.kind, ID_FIELD
                )))
            }
        }

        check_fields(self.kind, self.fields, object)
    }
}

fn check_fields(context: &str, fields: &[Field], object: &Map<String, Value>) -> Result<()> {
    for field in fields {
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(Error::ValidationError(format!(
                    "{}: missing required field '{}'",
                    context, field.name
                )));
            }
            None | Some(Value::Null) => {}
            Some(value) => check_value(context, field, value)?,
        }
    }
    Ok(())
}

fn check_value(context: &str, field: &Field, value: &Value) -> Result<()> {
    let valid = match field.field_type {
        FieldType::Text => value.is_string(),
        FieldType::Count => value.as_u64().is_some_and(|n| n <= u64::from(u32::MAX)),
        FieldType::Reference => value.as_i64().is_some(),
        FieldType::Amount => value
            .as_str()
            .is_some_and(|s| Decimal::from_str(s).is_ok()),
        FieldType::Timestamp => value
            .as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        FieldType::Choice(options) => value.as_str().is_some_and(|s| options.contains(&s)),
        FieldType::ReferenceList => value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| v.as_i64().is_some())),
        FieldType::TextList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldType::ObjectList(nested) => {
            let items = value.as_array().ok_or_else(|| invalid(context, field))?;
            let nested_context = format!("{}.{}", context, field.name);
            for item in items {
                let object = item.as_object().ok_or_else(|| invalid(context, field))?;
                check_fields(&nested_context, nested, object)?;
            }
            true
        }
    };

    if valid {
        Ok(())
    } else {
        Err(invalid(context, field))
    }
}

fn invalid(context: &str, field: &Field) -> Error {
    Error::ValidationError(format!(
        "{}: field '{}' is not a valid {:?}",
        context, field.name, field.field_type
    ))
}
