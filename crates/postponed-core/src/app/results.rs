//! Ordered results of one batch.

use serde_json::Value;

use crate::domain::errors::TaskError;

/// One entry per submitted task, in submission order.
///
/// A failed slot never hides the others: every result stays reachable, and
/// [`BatchResults::into_values`] only reports the first failure by position.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResults {
    results: Vec<Result<Value, TaskError>>,
}

impl BatchResults {
    pub fn new(results: Vec<Result<Value, TaskError>>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Result<Value, TaskError>> {
        self.results.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Result<Value, TaskError>> {
        self.results.iter()
    }

    /// (index, value) of every task that succeeded.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().ok().map(|v| (i, v)))
    }

    /// (index, error) of every task that failed.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &TaskError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    /// All values, or the first error in submission order.
    pub fn into_values(self) -> Result<Vec<Value>, TaskError> {
        self.results.into_iter().collect()
    }

    pub fn into_inner(self) -> Vec<Result<Value, TaskError>> {
        self.results
    }
}

impl IntoIterator for BatchResults {
    type Item = Result<Value, TaskError>;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::InvocationError;
    use serde_json::json;

    fn mixed() -> BatchResults {
        BatchResults::new(vec![
            Ok(json!(1)),
            Err(TaskError::Invocation(InvocationError::failed("first"))),
            Ok(json!(3)),
            Err(TaskError::Panicked("second".to_string())),
        ])
    }

    #[test]
    fn into_values_reports_first_failure_by_position() {
        let err = mixed().into_values().unwrap_err();
        assert_eq!(err, TaskError::Invocation(InvocationError::failed("first")));
    }

    #[test]
    fn failures_do_not_hide_successes() {
        let results = mixed();
        assert_eq!(
            results.successes().collect::<Vec<_>>(),
            vec![(0, &json!(1)), (2, &json!(3))]
        );
        assert_eq!(results.failures().map(|(i, _)| i).collect::<Vec<_>>(), vec![1, 3]);
        assert!(!results.all_succeeded());
    }

    #[test]
    fn all_ok_gives_values() {
        let results = BatchResults::new(vec![Ok(json!("a")), Ok(json!("b"))]);
        assert_eq!(results.into_values().unwrap(), vec![json!("a"), json!("b")]);
    }
}
