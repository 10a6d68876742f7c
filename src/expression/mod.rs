//! Search expressions sent to the Tamandua backend.
//!
//! A [`SearchExpression`] is the JSON body of search, count and advcount
//! requests:
//!
//! ```json
//! {
//!   "fields": [{ "sender": { "comparator": "re_i", "value": "a@b.com" } }],
//!   "datetime": { "start": "2017/01/19 22:51:45", "end": "" }
//! }
//! ```

pub mod builder;
pub mod comparator;
pub mod datetime;

pub use builder::{ExpressionBuilder, ExpressionLine, LineId, LineInput};
pub use comparator::Comparator;
pub use datetime::{DateTimeRange, WireDateTime};

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Condition on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub comparator: Comparator,
    pub value: String,
}

/// One `{field: {comparator, value}}` entry of `fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionField {
    pub field: String,
    pub condition: Condition,
}

impl ExpressionField {
    pub fn new(field: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            condition: Condition {
                comparator,
                value: value.into(),
            },
        }
    }
}

impl Serialize for ExpressionField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.condition)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExpressionField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, Condition>::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(D::Error::custom(format!(
                "expected exactly 1 key value pair, found {}",
                map.len()
            )));
        }
        let (field, condition) = map
            .into_iter()
            .next()
            .ok_or_else(|| D::Error::custom("empty field entry"))?;
        Ok(Self { field, condition })
    }
}

/// Group-by instruction of an advcount query. `sep` splits the value and
/// keys on the part after it (e.g. `@` for sender domains).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvCount {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchExpression {
    #[serde(default)]
    pub fields: Vec<ExpressionField>,
    #[serde(default)]
    pub datetime: WireDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advcount: Option<AdvCount>,
}

impl SearchExpression {
    pub fn has_criteria(&self) -> bool {
        !self.fields.is_empty() || !self.datetime.start.is_empty() || !self.datetime.end.is_empty()
    }
}

/// Reasons a search is rejected before it reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// At least one line has no value (or no selected choice).
    EmptyFields,
    /// No lines and no datetime bound.
    EmptySearchMask,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyFields => {
                f.write_str("Some Field Values are empty, please delete them or fill in content.")
            }
            BuildError::EmptySearchMask => {
                f.write_str("The searchmask is empty. Specify some search criteria.")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Composes aggregate queries from named parts: a base time window, a
/// category filter and any additional filters, plus an optional group-by.
#[derive(Debug, Clone, Default)]
pub struct QueryComposer {
    window: DateTimeRange,
    category: Vec<ExpressionField>,
    additional: Vec<ExpressionField>,
    advcount: Option<AdvCount>,
}

impl QueryComposer {
    pub fn new(window: DateTimeRange) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn category(mut self, filters: impl IntoIterator<Item = ExpressionField>) -> Self {
        self.category.extend(filters);
        self
    }

    pub fn filter(mut self, field: ExpressionField) -> Self {
        self.additional.push(field);
        self
    }

    pub fn group_by(mut self, field: impl Into<String>, sep: Option<String>) -> Self {
        self.advcount = Some(AdvCount {
            field: field.into(),
            sep,
        });
        self
    }

    pub fn build(self) -> SearchExpression {
        let mut fields = self.category;
        fields.extend(self.additional);
        SearchExpression {
            fields,
            datetime: self.window.to_wire(),
            advcount: self.advcount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_serializes_as_single_key_map() {
        let field = ExpressionField::new("sender", Comparator::RegexInsensitive, "a@b.com");
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({"sender": {"comparator": "re_i", "value": "a@b.com"}})
        );
    }

    #[test]
    fn test_field_rejects_multiple_keys() {
        let raw = json!({
            "a": {"comparator": "=", "value": "1"},
            "b": {"comparator": "=", "value": "2"}
        });
        assert!(serde_json::from_value::<ExpressionField>(raw).is_err());
    }

    #[test]
    fn test_advcount_omitted_when_absent() {
        let expr = SearchExpression::default();
        let value = serde_json::to_value(&expr).unwrap();
        assert!(value.get("advcount").is_none());
        assert_eq!(value["datetime"], json!({"start": "", "end": ""}));
    }

    #[test]
    fn test_composer_orders_category_before_additional() {
        let expr = QueryComposer::new(DateTimeRange::default())
            .filter(ExpressionField::new("sender", Comparator::RegexInsensitive, "x"))
            .category([ExpressionField::new("action", Comparator::Equal, "reject")])
            .group_by("rejectreason", None)
            .build();

        assert_eq!(expr.fields[0].field, "action");
        assert_eq!(expr.fields[1].field, "sender");
        assert_eq!(
            serde_json::to_value(&expr).unwrap()["advcount"],
            json!({"field": "rejectreason"})
        );
    }

    #[test]
    fn test_has_criteria() {
        let mut expr = SearchExpression::default();
        assert!(!expr.has_criteria());
        expr.datetime.end = "2017/01/19 22:51:45".to_string();
        assert!(expr.has_criteria());
    }
}
