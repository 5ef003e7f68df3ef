/// Mapping and structured-text filter forms
///
/// A filter mapping holds `and`/`or`/`not` group keys and lookup keys.
/// Sibling keys at one level are AND-ed. The structured-text form is YAML
/// that parses to the same mapping shape and goes through the same rules.
use super::filter::FilterNode;
use super::lookup::FieldLookup;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::str::FromStr;

impl FilterNode {
    /// Builds a filter from a mapping such as
    /// `{"or": [{"question__startswith": "Who"}, {"integer__gte": 1}]}`.
    pub fn from_mapping(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => parse_mapping(map),
            other => Err(Error::InvalidFilterGroup {
                group: "filter".to_string(),
                reason: format!("filter must be a mapping, got {}", other),
            }),
        }
    }

    /// Builds a filter from a YAML document whose top level is a mapping.
    pub fn from_text(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_mapping(&value)
    }

    /// Renders the tree back into mapping form.
    ///
    /// Leaves become single-key mappings, groups become `{"and": [...]}`,
    /// `{"or": [...]}` and `{"not": {...}}`.
    pub fn to_mapping(&self) -> Value {
        let mut map = Map::new();
        match self {
            FilterNode::Leaf(lookup) => {
                map.insert(lookup.wire_key(), lookup.value().clone());
            }
            FilterNode::And(children) => {
                map.insert(
                    "and".to_string(),
                    Value::Array(children.iter().map(FilterNode::to_mapping).collect()),
                );
            }
            FilterNode::Or(children) => {
                map.insert(
                    "or".to_string(),
                    Value::Array(children.iter().map(FilterNode::to_mapping).collect()),
                );
            }
            FilterNode::Not(inner) => {
                map.insert("not".to_string(), inner.to_mapping());
            }
        }
        Value::Object(map)
    }
}

impl TryFrom<&Value> for FilterNode {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        FilterNode::from_mapping(value)
    }
}

impl TryFrom<Value> for FilterNode {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        FilterNode::from_mapping(&value)
    }
}

impl FromStr for FilterNode {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        FilterNode::from_text(text)
    }
}

fn parse_mapping(map: &Map<String, Value>) -> Result<FilterNode> {
    let mut children = map
        .iter()
        .map(|(key, value)| parse_entry(key, value))
        .collect::<Result<Vec<_>>>()?;

    Ok(match children.len() {
        1 => children.remove(0),
        _ => FilterNode::And(children),
    })
}

fn parse_entry(key: &str, value: &Value) -> Result<FilterNode> {
    match key {
        "and" => parse_group(key, value).map(FilterNode::And),
        "or" => parse_group(key, value).map(FilterNode::Or),
        "not" => parse_not(value),
        _ => FieldLookup::parse(key, value.clone()).map(FilterNode::Leaf),
    }
}

/// Operands of an `and`/`or` group: a list of mappings, or one mapping whose
/// entries are taken as separate operands.
fn parse_group(group: &str, value: &Value) -> Result<Vec<FilterNode>> {
    let invalid = |reason: String| Error::InvalidFilterGroup {
        group: group.to_string(),
        reason,
    };

    let operands = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => parse_mapping(map),
                other => Err(invalid(format!(
                    "group members must be mappings, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| parse_entry(key, value))
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(invalid(format!(
                "value must be a list of mappings or a mapping, got {}",
                other
            )))
        }
    };

    if operands.is_empty() {
        return Err(invalid("group is empty".to_string()));
    }
    Ok(operands)
}

fn parse_not(value: &Value) -> Result<FilterNode> {
    let invalid = |reason: String| Error::InvalidFilterGroup {
        group: "not".to_string(),
        reason,
    };

    let inner = match value {
        Value::Object(map) if !map.is_empty() => parse_mapping(map)?,
        Value::Array(items) => match items.as_slice() {
            [Value::Object(map)] if !map.is_empty() => parse_mapping(map)?,
            [_] => return Err(invalid("negated expression must be a mapping".to_string())),
            [] => return Err(invalid("nothing to negate".to_string())),
            _ => {
                return Err(invalid(format!(
                    "'not' wraps exactly one expression, got {}",
                    items.len()
                )))
            }
        },
        Value::Object(_) => return Err(invalid("nothing to negate".to_string())),
        other => {
            return Err(invalid(format!(
                "negated expression must be a mapping, got {}",
                other
            )))
        }
    };
    Ok(inner.negate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Q;
    use serde_json::json;

    #[test]
    fn test_sibling_keys_are_anded() {
        let filter = FilterNode::from_mapping(&json!({"question__startswith": "What", "integer__gte": 1}))
            .unwrap();
        assert_eq!(
            filter,
            Q::lookup("question__startswith", "What").unwrap() & Q::lookup("integer__gte", 1).unwrap()
        );
    }

    #[test]
    fn test_or_group_matches_builder() {
        let mapping = FilterNode::from_mapping(&json!({
            "or": [
                {"question__startswith": "Who"},
                {"question__startswith": "What", "integer__gte": 1}
            ]
        }))
        .unwrap();
        let builder = Q::lookup("question__startswith", "Who").unwrap()
            | (Q::lookup("question__startswith", "What").unwrap()
                & Q::lookup("integer__gte", 1).unwrap());
        assert_eq!(mapping, builder);
    }

    #[test]
    fn test_text_form_matches_mapping() {
        let text = "
or:
  - question__startswith: Who
  - question__startswith: What
    integer__gte: 1
";
        let from_text: FilterNode = text.parse().unwrap();
        let from_mapping = FilterNode::from_mapping(&json!({
            "or": [
                {"question__startswith": "Who"},
                {"question__startswith": "What", "integer__gte": 1}
            ]
        }))
        .unwrap();
        assert_eq!(from_text, from_mapping);
    }

    #[test]
    fn test_group_mapping_entries_are_operands() {
        let filter = FilterNode::from_mapping(&json!({"or": {"a": 1, "b": 2}})).unwrap();
        assert!(matches!(filter, FilterNode::Or(ref c) if c.len() == 2));
    }

    #[test]
    fn test_not_forms() {
        let as_list = FilterNode::from_mapping(&json!({"not": [{"field1": 1}]})).unwrap();
        let as_map = FilterNode::from_mapping(&json!({"not": {"field1": 1}})).unwrap();
        assert_eq!(as_list, as_map);
        assert_eq!(as_map, !Q::lookup("field1", 1).unwrap());
    }

    #[test]
    fn test_not_of_several_fails() {
        let err = FilterNode::from_mapping(&json!({"not": [{"a": 1}, {"b": 2}]})).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterGroup { ref group, .. } if group == "not"));
    }

    #[test]
    fn test_bad_group_values() {
        for bad in [
            json!({"and": 1}),
            json!({"or": "a"}),
            json!({"or": []}),
            json!({"and": [1, 2]}),
            json!({"not": 3}),
            json!({"not": {}}),
        ] {
            let err = FilterNode::from_mapping(&bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidFilterGroup { .. }),
                "{bad} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_non_mapping_filter() {
        assert!(FilterNode::from_mapping(&json!([1, 2])).is_err());
        assert!(FilterNode::from_text("invalid").is_err());
        assert!(matches!(
            FilterNode::from_text("a: [1"),
            Err(Error::StructuredText(_))
        ));
    }

    #[test]
    fn test_empty_mapping_matches_everything() {
        assert!(FilterNode::from_mapping(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_to_mapping_reparses_to_same_tree() {
        let tree = Q::lookup("field1", 1).unwrap() & !Q::lookup("field2", 2).unwrap()
            | Q::lookup("field3__in", json!([3, 4])).unwrap();
        assert_eq!(
            tree.to_mapping(),
            json!({"or": [
                {"and": [{"field1": 1}, {"not": {"field2": 2}}]},
                {"field3__in": [3, 4]}
            ]})
        );
        assert_eq!(FilterNode::from_mapping(&tree.to_mapping()).unwrap(), tree);
    }
}
