use std::collections::HashSet;

/// Per-file dedup keyed on `(ruleFailure, event.type, event.params.message)`
/// (§4.H). Scoped to one file's scan, never shared across files.
#[derive(Debug, Default)]
pub struct DedupScope {
    seen: HashSet<(String, String, Option<String>)>,
}

impl DedupScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time this key is seen in this scope.
    pub fn insert(&mut self, rule_failure: &str, event_type: &str, message: Option<&str>) -> bool {
        self.seen.insert((
            rule_failure.to_string(),
            event_type.to_string(),
            message.map(str::to_string),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_is_kept_repeats_are_dropped() {
        let mut scope = DedupScope::new();
        assert!(scope.insert("no-todo", "warning", Some("found a TODO")));
        assert!(!scope.insert("no-todo", "warning", Some("found a TODO")));
    }

    #[test]
    fn different_messages_are_distinct_keys() {
        let mut scope = DedupScope::new();
        assert!(scope.insert("no-todo", "warning", Some("line 1")));
        assert!(scope.insert("no-todo", "warning", Some("line 2")));
    }
}
