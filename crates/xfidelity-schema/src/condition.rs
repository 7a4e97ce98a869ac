use serde::{Deserialize, Serialize};

/// A leaf test: evaluate `fact` (optionally narrowed by `path`) with
/// `operator` against `value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeafCondition {
    pub fact: String,
    pub operator: String,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// A condition is either a nested boolean combinator or a leaf test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Condition {
    Set(ConditionSet),
    Leaf(LeafCondition),
}

/// The boolean combinator that every rule's top-level `conditions`
/// object, and every nested condition, must be.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ConditionSet {
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl ConditionSet {
    pub fn children(&self) -> &[Condition] {
        match self {
            ConditionSet::All(c) | ConditionSet::Any(c) => c,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ConditionSet::All(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_condition_roundtrips() {
        let json = r#"{"fact":"fileContent","operator":"contains","value":"TODO"}"#;
        let leaf: LeafCondition = serde_json::from_str(json).unwrap();
        assert_eq!(leaf.fact, "fileContent");
        assert!(leaf.path.is_none());
    }

    #[test]
    fn nested_condition_set_parses() {
        let json = r#"{
            "all": [
                {"fact": "a", "operator": "equal", "value": 1},
                {"any": [
                    {"fact": "b", "operator": "equal", "value": 2}
                ]}
            ]
        }"#;
        let set: ConditionSet = serde_json::from_str(json).unwrap();
        assert!(set.is_all());
        assert_eq!(set.children().len(), 2);
        match &set.children()[1] {
            Condition::Set(ConditionSet::Any(inner)) => assert_eq!(inner.len(), 1),
            other => panic!("expected nested any set, got {other:?}"),
        }
    }
}
