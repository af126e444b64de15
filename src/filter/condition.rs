use serde_json::Value;

/// A single field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact JSON equality
    Eq(Value),
    /// Array membership
    In(Vec<Value>),
}

impl Condition {
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Condition::Eq(expected) => expected == actual,
            Condition::In(values) => values.iter().any(|v| v == actual),
        }
    }
}
