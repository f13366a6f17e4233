//! Checklist data model.
//!
//! On the wire a checklist item is a positional JSON array:
//!
//! ```text
//! [0, "Check light", 2, "Exterior", "North"]
//!      ^ label          ^ category  ^ location
//! ```
//!
//! Items are converted into [`ChecklistItem`] records at the boundary. The
//! original array is kept alongside so that a payload serializes back to
//! exactly what was uploaded.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Position of the label within an item array.
pub const LABEL_INDEX: usize = 1;
/// Position of the category within an item array.
pub const CATEGORY_INDEX: usize = 3;
/// Position of the location within an item array.
pub const LOCATION_INDEX: usize = 4;

/// One row of inspection data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    /// Row label.
    pub label: String,
    /// First descriptive field (e.g. area of the site).
    pub category: String,
    /// Second descriptive field (e.g. orientation).
    pub location: String,
    fields: Vec<Value>,
}

impl ChecklistItem {
    /// Builds an item from its positional fields.
    #[must_use]
    pub fn from_fields(fields: Vec<Value>) -> Self {
        Self {
            label: field_text(fields.get(LABEL_INDEX)),
            category: field_text(fields.get(CATEGORY_INDEX)),
            location: field_text(fields.get(LOCATION_INDEX)),
            fields,
        }
    }

    /// Returns the positional fields as uploaded.
    #[must_use]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Returns the `category - location` caption shown next to the label.
    #[must_use]
    pub fn caption(&self) -> String {
        format!("{} - {}", self.category, self.location)
    }
}

impl TryFrom<Value> for ChecklistItem {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(fields) => Ok(Self::from_fields(fields)),
            other => Err(Error::invalid_payload(format!(
                "checklist item must be an array, got {}",
                json_type(&other)
            ))),
        }
    }
}

impl Serialize for ChecklistItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChecklistItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Value>::deserialize(deserializer).map(Self::from_fields)
    }
}

/// Ordered sequence of checklist items, uploaded as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistPayload(pub Vec<ChecklistItem>);

impl ChecklistPayload {
    /// Interprets an uploaded `data` value as a checklist.
    ///
    /// Form posts deliver the payload as JSON text, so a string value is
    /// parsed before being checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayload`] if the value is not an array of arrays.
    pub fn from_value(value: Value) -> Result<Self> {
        let value = match value {
            Value::String(text) => serde_json::from_str(&text)
                .map_err(|e| Error::invalid_payload(format!("data is not valid JSON: {e}")))?,
            other => other,
        };

        let rows = match value {
            Value::Array(rows) => rows,
            other => {
                return Err(Error::invalid_payload(format!(
                    "data must be an array, got {}",
                    json_type(&other)
                )));
            },
        };

        rows.into_iter()
            .enumerate()
            .map(|(index, row)| {
                ChecklistItem::try_from(row).map_err(|e| match e {
                    Error::InvalidPayload { message } => {
                        Error::invalid_payload(format!("item {index}: {message}"))
                    },
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Interprets a payload read back from a store.
    ///
    /// A stored value that no longer reads as a checklist is an internal
    /// failure rather than a caller mistake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the value is not an array of arrays.
    pub fn from_stored(value: &Value) -> Result<Self> {
        Self::from_value(value.clone())
            .map_err(|e| Error::internal(format!("stored checklist is malformed: {e}")))
    }

    /// Converts back to the positional wire format.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|item| Value::Array(item.fields.clone()))
                .collect(),
        )
    }

    /// Returns the items.
    #[must_use]
    pub fn items(&self) -> &[ChecklistItem] {
        &self.0
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
