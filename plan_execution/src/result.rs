//! Execution state threaded through plan nodes.
use std::collections::BTreeMap;

use crate::raw::RawValue;

/// The materialized value of a single plan node, keyed by name in the state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantResult {
    pub value: RawValue,
}

impl ConstantResult {
    pub fn new(value: RawValue) -> ConstantResult {
        ConstantResult { value }
    }
}

/// Named results plus the enumeration definitions visible to validation.
#[derive(Debug, Default, Clone)]
pub struct ExecutionState {
    results: BTreeMap<String, ConstantResult>,
    enumerations: BTreeMap<String, Vec<String>>,
}

impl ExecutionState {
    pub fn new() -> ExecutionState {
        ExecutionState::default()
    }

    pub fn add_result(&mut self, name: impl Into<String>, result: ConstantResult) {
        self.results.insert(name.into(), result);
    }

    pub fn result(&self, name: &str) -> Option<&ConstantResult> {
        self.results.get(name)
    }

    /// Make an enumeration's values available for parameter validation.
    pub fn register_enumeration(&mut self, path: impl Into<String>, values: Vec<String>) {
        self.enumerations.insert(path.into(), values);
    }

    pub(crate) fn enumeration(&self, path: &str) -> Option<&[String]> {
        self.enumerations.get(path).map(Vec::as_slice)
    }

    pub(crate) fn replace(&mut self, name: &str, value: RawValue) {
        self.results
            .insert(name.to_string(), ConstantResult::new(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_overwrites_result() {
        let mut state = ExecutionState::new();
        state.add_result("x", ConstantResult::new(RawValue::String("5".to_string())));
        state.replace("x", RawValue::Integer(5));
        assert_eq!(state.result("x").map(|r| &r.value), Some(&RawValue::Integer(5)));
    }
}
