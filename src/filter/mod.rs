// filter/mod.rs - in-memory record matching
//
// A filter is an AND of per-field conditions. Conditions compare whole JSON
// values; a field absent from the record compares as null.

mod condition;

pub use condition::Condition;

use serde_json::{Map, Value};

use crate::database::Record;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// The empty filter, matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), Condition::Eq(value.into())));
        self
    }

    /// Require the field value to be one of `values`
    pub fn one_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push((field.into(), Condition::In(values)));
        self
    }

    /// Require `field == value` only when a value is given
    pub fn eq_opt(self, field: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(record.value_of(field)))
    }
}

/// Object shorthand: array values mean membership, anything else equality
impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        let conditions = map
            .into_iter()
            .map(|(field, value)| {
                let condition = match value {
                    Value::Array(values) => Condition::In(values),
                    other => Condition::Eq(other),
                };
                (field, condition)
            })
            .collect();
        Self { conditions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student(grade: &str, section: Option<&str>) -> Record {
        let mut record = Record::new().with("schoolId", "school-1").with("grade", grade);
        if let Some(section) = section {
            record.set("section", section);
        }
        record
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&Record::new()));
    }

    #[test]
    fn conditions_are_anded() {
        let filter = Filter::new().eq("schoolId", "school-1").eq("grade", "10");
        assert!(filter.matches(&student("10", None)));
        assert!(!filter.matches(&student("11", None)));
    }

    #[test]
    fn membership_condition() {
        let filter = Filter::new().one_of("grade", ["9", "10"]);
        assert!(filter.matches(&student("9", None)));
        assert!(!filter.matches(&student("12", None)));
    }

    #[test]
    fn missing_field_compares_as_null() {
        assert!(Filter::new().eq("section", Value::Null).matches(&student("10", None)));
        assert!(!Filter::new().eq("section", "A").matches(&student("10", None)));
    }

    #[test]
    fn object_shorthand_uses_arrays_for_membership() {
        let map = json!({ "grade": ["10", "11"], "section": "A" });
        let filter = Filter::from(map.as_object().cloned().unwrap());
        assert!(filter.matches(&student("11", Some("A"))));
        assert!(!filter.matches(&student("11", Some("B"))));
    }
}
