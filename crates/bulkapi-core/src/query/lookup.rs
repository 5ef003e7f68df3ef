/// Field lookups: a relation-traversing field path, a comparison operator
/// and the value to compare against.
///
/// Keys are written the way the remote relational-lookup API expects them:
/// `field[__relation...][__operator]`, with a bare field meaning `exact`.
use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;

/// Separator used both for relation traversal and for the operator suffix
pub const JOIN: &str = "__";

/// Group keywords that can never name a field
pub const GROUP_KEYWORDS: [&str; 3] = ["and", "or", "not"];

/// Comparison operators understood by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOperator {
    Exact,
    IExact,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Contains,
    IContains,
    IsNull,
    Range,
    Regex,
    IRegex,
}

impl LookupOperator {
    /// Every recognized operator, in suffix-table order
    pub const ALL: [LookupOperator; 17] = [
        LookupOperator::Exact,
        LookupOperator::IExact,
        LookupOperator::In,
        LookupOperator::Gt,
        LookupOperator::Gte,
        LookupOperator::Lt,
        LookupOperator::Lte,
        LookupOperator::StartsWith,
        LookupOperator::IStartsWith,
        LookupOperator::EndsWith,
        LookupOperator::IEndsWith,
        LookupOperator::Contains,
        LookupOperator::IContains,
        LookupOperator::IsNull,
        LookupOperator::Range,
        LookupOperator::Regex,
        LookupOperator::IRegex,
    ];

    /// Looks up an operator by its wire suffix
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == suffix)
    }

    /// Wire suffix of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOperator::Exact => "exact",
            LookupOperator::IExact => "iexact",
            LookupOperator::In => "in",
            LookupOperator::Gt => "gt",
            LookupOperator::Gte => "gte",
            LookupOperator::Lt => "lt",
            LookupOperator::Lte => "lte",
            LookupOperator::StartsWith => "startswith",
            LookupOperator::IStartsWith => "istartswith",
            LookupOperator::EndsWith => "endswith",
            LookupOperator::IEndsWith => "iendswith",
            LookupOperator::Contains => "contains",
            LookupOperator::IContains => "icontains",
            LookupOperator::IsNull => "isnull",
            LookupOperator::Range => "range",
            LookupOperator::Regex => "regex",
            LookupOperator::IRegex => "iregex",
        }
    }

    /// Operators whose value is a sequence rather than a scalar
    pub fn takes_sequence(&self) -> bool {
        matches!(self, LookupOperator::In | LookupOperator::Range)
    }
}

impl fmt::Display for LookupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty sequence of field names joined by relation traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses `a__b__c` into a path. Every segment must be non-empty.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split(JOIN).map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidLookup {
                key: path.to_string(),
                reason: "field path has an empty segment".to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment (the field on the last related model)
    pub fn last(&self) -> &str {
        // parse() guarantees at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The path in wire form
    pub fn joined(&self) -> String {
        self.segments.join(JOIN)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

/// A single field comparison, the leaf of a filter tree
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLookup {
    path: FieldPath,
    operator: LookupOperator,
    value: Value,
}

impl FieldLookup {
    /// Builds a lookup from a keyword-style key such as `integer__gte` or
    /// `author__name__startswith`.
    ///
    /// The last segment is read as the operator when it is a recognized
    /// suffix; otherwise the whole key is the field path and the operator is
    /// `exact`. A misspelt suffix (`integer__gtee`) therefore reads as a
    /// relation traversal and is left for the server to reject; use
    /// [`FieldLookup::with_operator`] to get `InvalidFilterOperator` locally.
    pub fn parse(key: &str, value: impl Into<Value>) -> Result<Self> {
        let path = FieldPath::parse(key)?;
        let mut segments = path.segments;

        let operator = match segments.last().and_then(|s| LookupOperator::from_suffix(s)) {
            Some(op) if segments.len() > 1 => {
                segments.pop();
                op
            }
            _ => LookupOperator::Exact,
        };

        Self::build(key, FieldPath { segments }, operator, value.into())
    }

    /// Builds a lookup from a field path and an explicitly named operator.
    pub fn with_operator(path: &str, operator: &str, value: impl Into<Value>) -> Result<Self> {
        let op = LookupOperator::from_suffix(operator).ok_or_else(|| {
            Error::InvalidFilterOperator {
                key: format!("{}{}{}", path, JOIN, operator),
                operator: operator.to_string(),
            }
        })?;
        let field_path = FieldPath::parse(path)?;
        if field_path.segments.len() > 1 && LookupOperator::from_suffix(field_path.last()).is_some()
        {
            return Err(Error::InvalidLookup {
                key: path.to_string(),
                reason: format!(
                    "field path already ends in operator '{}'",
                    field_path.last()
                ),
            });
        }
        Self::build(path, field_path, op, value.into())
    }

    fn build(key: &str, path: FieldPath, operator: LookupOperator, value: Value) -> Result<Self> {
        if path.segments.len() == 1 && GROUP_KEYWORDS.contains(&path.segments[0].as_str()) {
            return Err(Error::InvalidLookup {
                key: key.to_string(),
                reason: "group keywords cannot be used as field names".to_string(),
            });
        }
        check_value(key, operator, &value)?;
        Ok(Self {
            path,
            operator,
            value,
        })
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn operator(&self) -> LookupOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Parameter key sent to the remote API; `exact` is implied by a bare
    /// field path and therefore omitted.
    pub fn wire_key(&self) -> String {
        match self.operator {
            LookupOperator::Exact => self.path.joined(),
            op => format!("{}{}{}", self.path.joined(), JOIN, op),
        }
    }

    /// Parameter value sent to the remote API.
    ///
    /// Sequence operators are encoded as one comma-joined string
    /// (`[1, 2, 3]` becomes `"1,2,3"`).
    pub fn wire_value(&self) -> Value {
        match (&self.value, self.operator.takes_sequence()) {
            (Value::Array(items), true) => Value::String(
                items
                    .iter()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            (value, _) => value.clone(),
        }
    }
}

impl fmt::Display for FieldLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.wire_key(), self.value)
    }
}

fn check_value(key: &str, operator: LookupOperator, value: &Value) -> Result<()> {
    let invalid = |reason: String| Error::InvalidLookup {
        key: key.to_string(),
        reason,
    };

    if value.is_object() {
        return Err(invalid(format!(
            "mapping value {} cannot be compared with '{}'",
            value, operator
        )));
    }

    match operator {
        LookupOperator::In | LookupOperator::Range => {
            let items = value.as_array().ok_or_else(|| {
                invalid(format!("'{}' requires a sequence value, got {}", operator, value))
            })?;
            if items.is_empty() {
                return Err(invalid(format!("'{}' requires at least one value", operator)));
            }
            if operator == LookupOperator::Range && items.len() != 2 {
                return Err(invalid(format!(
                    "'range' requires exactly two values, got {}",
                    items.len()
                )));
            }
            for item in items {
                if item.is_array() || item.is_object() {
                    return Err(invalid(format!(
                        "'{}' values must be scalars, got {}",
                        operator, item
                    )));
                }
                if item.as_str().is_some_and(|s| s.contains(',')) {
                    return Err(invalid(format!(
                        "'{}' value {} contains a comma and cannot be encoded",
                        operator, item
                    )));
                }
            }
            Ok(())
        }
        LookupOperator::IsNull => match value {
            Value::Bool(_) => Ok(()),
            other => Err(invalid(format!("'isnull' requires a boolean, got {}", other))),
        },
        op => {
            if value.is_array() {
                Err(invalid(format!(
                    "'{}' requires a scalar value, got {}",
                    op, value
                )))
            } else {
                Ok(())
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_field_is_exact() {
        let lookup = FieldLookup::parse("question", "Who").unwrap();
        assert_eq!(lookup.operator(), LookupOperator::Exact);
        assert_eq!(lookup.wire_key(), "question");
    }

    #[test]
    fn test_operator_suffix() {
        let lookup = FieldLookup::parse("question__startswith", "Who").unwrap();
        assert_eq!(lookup.operator(), LookupOperator::StartsWith);
        assert_eq!(lookup.path().segments(), &["question".to_string()]);
        assert_eq!(lookup.wire_key(), "question__startswith");
    }

    #[test]
    fn test_explicit_exact_is_dropped_from_key() {
        let lookup = FieldLookup::parse("id__exact", 3).unwrap();
        assert_eq!(lookup.wire_key(), "id");
        assert_eq!(lookup, FieldLookup::parse("id", 3).unwrap());
    }

    #[test]
    fn test_relation_traversal() {
        let lookup = FieldLookup::parse("author__country__name__iexact", "fr").unwrap();
        assert_eq!(lookup.path().segments().len(), 3);
        assert_eq!(lookup.path().last(), "name");
        assert_eq!(lookup.wire_key(), "author__country__name__iexact");

        let lookup = FieldLookup::parse("author__name", "Ann").unwrap();
        assert_eq!(lookup.operator(), LookupOperator::Exact);
        assert_eq!(lookup.path().joined(), "author__name");
    }

    #[test]
    fn test_field_named_like_operator() {
        // a lone segment is always a field
        let lookup = FieldLookup::parse("range", 4).unwrap();
        assert_eq!(lookup.operator(), LookupOperator::Exact);
        assert_eq!(lookup.wire_key(), "range");
    }

    #[test]
    fn test_unknown_suffix_reads_as_relation() {
        let lookup = FieldLookup::parse("integer__gtee", 1).unwrap();
        assert_eq!(lookup.operator(), LookupOperator::Exact);
        assert_eq!(lookup.path().segments().len(), 2);
        assert_eq!(lookup.wire_key(), "integer__gtee");
    }

    #[test]
    fn test_unknown_explicit_operator() {
        let err = FieldLookup::with_operator("id", "gtee", 1).unwrap_err();
        match err {
            Error::InvalidFilterOperator { key, operator } => {
                assert_eq!(key, "id__gtee");
                assert_eq!(operator, "gtee");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_segment() {
        assert!(matches!(
            FieldLookup::parse("name__", 1),
            Err(Error::InvalidLookup { .. })
        ));
        assert!(matches!(
            FieldLookup::parse("", 1),
            Err(Error::InvalidLookup { .. })
        ));
    }

    #[test]
    fn test_in_requires_sequence() {
        assert!(matches!(
            FieldLookup::parse("id__in", 1),
            Err(Error::InvalidLookup { .. })
        ));
        assert!(matches!(
            FieldLookup::parse("id__gte", json!([1, 2])),
            Err(Error::InvalidLookup { .. })
        ));
        assert!(matches!(
            FieldLookup::parse("id__in", json!([])),
            Err(Error::InvalidLookup { .. })
        ));
    }

    #[test]
    fn test_in_is_comma_joined() {
        let lookup = FieldLookup::parse("id__in", json!([1, 2, 3])).unwrap();
        assert_eq!(lookup.wire_value(), json!("1,2,3"));

        let lookup = FieldLookup::parse("code__in", json!(["a", "b"])).unwrap();
        assert_eq!(lookup.wire_value(), json!("a,b"));
    }

    #[test]
    fn test_in_rejects_commas() {
        let err = FieldLookup::parse("name__in", json!(["Smith, J", "Doe"])).unwrap_err();
        assert!(err.to_string().contains("Smith, J"));
    }

    #[test]
    fn test_range_needs_two_values() {
        assert!(FieldLookup::parse("integer__range", json!([1, 5])).is_ok());
        assert!(FieldLookup::parse("integer__range", json!([1, 5, 9])).is_err());
    }

    #[test]
    fn test_isnull_requires_bool() {
        assert!(FieldLookup::parse("imported_from__isnull", true).is_ok());
        assert!(FieldLookup::parse("imported_from__isnull", "yes").is_err());
    }

    #[test]
    fn test_group_keyword_as_field() {
        assert!(matches!(
            FieldLookup::parse("or", 1),
            Err(Error::InvalidLookup { .. })
        ));
        // fine once it is traversed through
        assert!(FieldLookup::parse("or__name", 1).is_ok());
    }

    #[test]
    fn test_mapping_value_rejected() {
        assert!(FieldLookup::parse("meta", json!({"a": 1})).is_err());
    }

    #[test]
    fn test_with_operator_path_ending_in_operator() {
        assert!(FieldLookup::with_operator("id__gte", "lt", 1).is_err());
        let lookup = FieldLookup::with_operator("integer", "gte", 1).unwrap();
        assert_eq!(lookup.wire_key(), "integer__gte");
    }
}
