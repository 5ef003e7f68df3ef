/// Field specification normalizer
///
/// Field lists arrive as plain names, `{path: rename}` mappings, an ordered
/// path→rename mapping, or a YAML document holding either. All of them
/// become one ordered list of (source path, output name) pairs.
use super::lookup::FieldPath;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;

/// One projected column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    source: FieldPath,
    output_name: String,
}

impl FieldEntry {
    /// Column under its own (final segment) name
    pub fn new(path: &str) -> Result<Self> {
        let source = parse_path(path)?;
        let output_name = source.last().to_string();
        Ok(Self {
            source,
            output_name,
        })
    }

    /// Column renamed to `output_name`
    pub fn renamed(path: &str, output_name: &str) -> Result<Self> {
        let source = parse_path(path)?;
        if output_name.is_empty() {
            return Err(Error::InvalidFieldSpec(format!(
                "empty output name for field '{}'",
                path
            )));
        }
        Ok(Self {
            source,
            output_name: output_name.to_string(),
        })
    }

    pub fn source(&self) -> &FieldPath {
        &self.source
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// `true` when the output name differs from the path's final segment
    pub fn is_renamed(&self) -> bool {
        self.output_name != self.source.last()
    }

    fn to_wire(&self) -> Value {
        if self.is_renamed() {
            let mut map = Map::new();
            map.insert(self.source.joined(), Value::String(self.output_name.clone()));
            Value::Object(map)
        } else {
            Value::String(self.source.joined())
        }
    }
}

/// Ordered, duplicate-free list of projected columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    entries: Vec<FieldEntry>,
}

impl FieldSpec {
    /// Normalizes an optional field document. `None` and `null` are
    /// rejected; callers that allow "all fields" keep the spec optional
    /// themselves.
    pub fn normalize(input: Option<&Value>) -> Result<Self> {
        match input {
            None | Some(Value::Null) => Err(Error::InvalidFieldSpec(
                "a field spec is required".to_string(),
            )),
            Some(value) => Self::from_value(value),
        }
    }

    /// From plain field paths
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = names
            .into_iter()
            .map(|name| FieldEntry::new(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    /// From ordered (path, rename) pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(path, rename)| FieldEntry::renamed(path.as_ref(), rename.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    /// From a document: a list of strings and/or single-key mappings, or a
    /// mapping of path to rename.
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = match value {
            Value::Array(items) => items
                .iter()
                .map(entry_from_value)
                .collect::<Result<Vec<_>>>()?,
            Value::Object(map) => map
                .iter()
                .map(|(path, rename)| entry_from_pair(path, rename))
                .collect::<Result<Vec<_>>>()?,
            Value::Null => {
                return Err(Error::InvalidFieldSpec(
                    "a field spec is required".to_string(),
                ))
            }
            other => {
                return Err(Error::InvalidFieldSpec(format!(
                    "fields must be a list or a mapping, got {}",
                    other
                )))
            }
        };
        Self::from_entries(entries)
    }

    /// From a YAML document
    pub fn from_text(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// From already-built entries; checks emptiness and output-name clashes.
    pub fn from_entries(entries: Vec<FieldEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidFieldSpec("field spec is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.output_name.as_str()) {
                return Err(Error::InvalidFieldSpec(format!(
                    "duplicate output name '{}' (from field '{}')",
                    entry.output_name, entry.source
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Output names in column order
    pub fn output_names(&self) -> Vec<&str> {
        self.entries.iter().map(FieldEntry::output_name).collect()
    }

    /// The `fields` parameter: plain strings, renamed entries as
    /// single-key mappings.
    pub fn to_wire(&self) -> Value {
        Value::Array(self.entries.iter().map(FieldEntry::to_wire).collect())
    }
}

impl FromStr for FieldSpec {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        FieldSpec::from_text(text)
    }
}

impl<'a> IntoIterator for &'a FieldSpec {
    type Item = &'a FieldEntry;
    type IntoIter = std::slice::Iter<'a, FieldEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn parse_path(path: &str) -> Result<FieldPath> {
    FieldPath::parse(path).map_err(|_| {
        Error::InvalidFieldSpec(format!("'{}' is not a valid field path", path))
    })
}

fn entry_from_value(value: &Value) -> Result<FieldEntry> {
    match value {
        Value::String(path) => FieldEntry::new(path),
        Value::Object(map) if map.len() == 1 => {
            let (path, rename) = map.iter().next().ok_or_else(|| {
                Error::InvalidFieldSpec("empty field mapping".to_string())
            })?;
            entry_from_pair(path, rename)
        }
        Value::Object(map) => Err(Error::InvalidFieldSpec(format!(
            "field mapping must have exactly one key, got {} ({})",
            map.len(),
            map.keys().cloned().collect::<Vec<_>>().join(", ")
        ))),
        other => Err(Error::InvalidFieldSpec(format!(
            "field entries must be strings or single-key mappings, got {}",
            other
        ))),
    }
}

fn entry_from_pair(path: &str, rename: &Value) -> Result<FieldEntry> {
    match rename {
        Value::String(name) => FieldEntry::renamed(path, name),
        Value::Null => FieldEntry::new(path),
        other => Err(Error::InvalidFieldSpec(format!(
            "rename for field '{}' must be a string, got {}",
            path, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(spec: &FieldSpec) -> Vec<(String, String)> {
        spec.iter()
            .map(|e| (e.source().joined(), e.output_name().to_string()))
            .collect()
    }

    #[test]
    fn test_mixed_list() {
        let spec = FieldSpec::from_value(&json!(["a", {"b": "b2"}])).unwrap();
        assert_eq!(
            pairs(&spec),
            vec![
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "b2".to_string())
            ]
        );
    }

    #[test]
    fn test_ordered_mapping_keeps_order() {
        let spec = FieldSpec::from_pairs([("zeta", "z"), ("alpha", "a")]).unwrap();
        assert_eq!(spec.output_names(), vec!["z", "a"]);

        let spec = FieldSpec::from_value(&json!({"zeta": "z", "alpha": "a"})).unwrap();
        assert_eq!(spec.output_names(), vec!["z", "a"]);
    }

    #[test]
    fn test_text_form() {
        let spec: FieldSpec = "- id\n- text\n- author__name: author\n".parse().unwrap();
        assert_eq!(spec.output_names(), vec!["id", "text", "author"]);
        assert_eq!(spec.entries()[2].source().segments().len(), 2);
    }

    #[test]
    fn test_relation_defaults_to_last_segment() {
        let spec = FieldSpec::from_names(["author__name"]).unwrap();
        assert_eq!(spec.output_names(), vec!["name"]);
        assert!(!spec.entries()[0].is_renamed());
    }

    #[test]
    fn test_wire_form() {
        let spec = FieldSpec::from_value(&json!(["id", {"text": "body"}, {"integer": "integer"}])).unwrap();
        assert_eq!(spec.to_wire(), json!(["id", {"text": "body"}, "integer"]));
    }

    #[test]
    fn test_multi_key_mapping_entry() {
        let err = FieldSpec::from_value(&json!([{"a": "x", "b": "y"}])).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldSpec(_)));
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn test_none_is_rejected() {
        assert!(matches!(
            FieldSpec::normalize(None),
            Err(Error::InvalidFieldSpec(_))
        ));
        assert!(FieldSpec::normalize(Some(&Value::Null)).is_err());
        assert!(FieldSpec::normalize(Some(&json!(["id"]))).is_ok());
    }

    #[test]
    fn test_duplicate_output_names() {
        let err = FieldSpec::from_value(&json!(["name", "author__name"])).unwrap_err();
        assert!(err.to_string().contains("'name'"));

        let err = FieldSpec::from_value(&json!(["a", {"b": "a"}])).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldSpec(_)));
    }

    #[test]
    fn test_bad_inputs() {
        assert!(FieldSpec::from_text("invalid_field").is_err());
        assert!(FieldSpec::from_value(&json!([])).is_err());
        assert!(FieldSpec::from_value(&json!([1])).is_err());
        assert!(FieldSpec::from_value(&json!([{"a": 1}])).is_err());
        assert!(FieldSpec::from_value(&json!(["a__"])).is_err());
    }
}
