use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Operators that take two bounds (`value` and `value_to`).
pub const RANGE_OPERATORS: &[&str] = &["inRange", "between"];

pub fn is_range_operator(operator: &str) -> bool {
    RANGE_OPERATORS.contains(&operator)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Join {
    #[default]
    And,
    Or,
}

impl Join {
    /// Parse a join keyword, ignoring case. Accepts both `and` and `#and`.
    pub fn parse(s: &str) -> Option<Self> {
        let word = s.strip_prefix('#').unwrap_or(s);
        if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Token used in the text pattern.
    pub fn token(&self) -> &'static str {
        match self {
            Self::And => "#and",
            Self::Or => "#or",
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Currency,
    Date,
}

impl ColumnType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "currency" => Some(Self::Currency),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// Column descriptor supplied by the caller. Stored as-is, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterColumn {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl FilterColumn {
    pub fn new(field: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<FilterColumn>,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, rename = "valueTo", skip_serializing_if = "Option::is_none")]
    pub value_to: Option<String>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column: None,
            operator: operator.into(),
            value: None,
            value_to: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_value_to(mut self, value_to: impl Into<String>) -> Self {
        self.value_to = Some(value_to.into());
        self
    }

    /// A condition without a value has not been filled in yet and gets no badge.
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_range(&self) -> bool {
        is_range_operator(&self.operator)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub join: Join,
    #[serde(default)]
    pub nodes: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn new(join: Join, nodes: Vec<FilterNode>) -> Self {
        Self { join, nodes }
    }

    pub fn empty(join: Join) -> Self {
        Self::new(join, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterNode {
    Condition(Arc<FilterCondition>),
    Group(Arc<FilterGroup>),
}

impl FilterNode {
    pub fn as_condition(&self) -> Option<&Arc<FilterCondition>> {
        match self {
            Self::Condition(c) => Some(c),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Arc<FilterGroup>> {
        match self {
            Self::Group(g) => Some(g),
            Self::Condition(_) => None,
        }
    }

    /// Reference equality of the underlying node.
    pub fn ptr_eq(&self, other: &FilterNode) -> bool {
        match (self, other) {
            (Self::Condition(a), Self::Condition(b)) => Arc::ptr_eq(a, b),
            (Self::Group(a), Self::Group(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<FilterCondition> for FilterNode {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(Arc::new(condition))
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        Self::Group(Arc::new(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_parse_ignores_case() {
        assert_eq!(Join::parse("#AND"), Some(Join::And));
        assert_eq!(Join::parse("or"), Some(Join::Or));
        assert_eq!(Join::parse("#to"), None);
    }

    #[test]
    fn test_range_operator() {
        assert!(is_range_operator("inRange"));
        assert!(!is_range_operator("contains"));
        assert!(FilterCondition::new("price", "between").is_range());
    }

    #[test]
    fn test_yaml_tree() {
        let yaml = r#"
join: OR
nodes:
  - kind: condition
    field: name
    operator: contains
    value: aspirin
  - kind: group
    join: AND
    nodes:
      - kind: condition
        field: price
        operator: inRange
        value: "1"
        valueTo: "5"
"#;
        let group: FilterGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(group.join, Join::Or);
        assert_eq!(group.nodes.len(), 2);
        let inner = group.nodes[1].as_group().unwrap();
        let price = inner.nodes[0].as_condition().unwrap();
        assert_eq!(price.value_to.as_deref(), Some("5"));
        assert!(group.nodes[0].as_condition().unwrap().is_filled());
    }
}
