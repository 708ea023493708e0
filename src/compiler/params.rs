use crate::core::Value;

/// Ordered parameter bag: name -> value, in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, Value)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Position of `name` in the bag
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Add a parameter; a repeated name replaces the earlier value
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name.into(), value.into());
        self
    }

    pub(crate) fn insert(&mut self, name: String, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_insertion_order() {
        let params = Parameters::new()
            .bind("p0", "Electronics")
            .bind("p1", 20)
            .bind("p10", true)
            .bind("p2", 1.5);
        let names: Vec<&str> = params.names().collect();
        assert_eq!(names, vec!["p0", "p1", "p10", "p2"]);
        assert_eq!(params.get("p1"), Some(&Value::Integer(20)));
        assert_eq!(params.position("p10"), Some(2));
        assert_eq!(params.get("p3"), None);
    }

    #[test]
    fn test_repeated_name_replaces() {
        let params = Parameters::new().bind("id", 1).bind("id", 2);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some(&Value::Integer(2)));
    }
}
